use std::io::{self, Cursor, ErrorKind, Read};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use rstest::rstest;
use soiling_hardware::LineReader;
use soiling_hardware::error::HwError;
use soiling_traits::LineSource;

#[rstest]
#[case(b"LUX:100.5\n", "LUX:100.5")]
#[case(b"LUX:100.5\r\n", "LUX:100.5")]
#[case(b"  250  \n", "250")]
#[case(b"\n", "")]
#[case(b"no-terminator", "no-terminator")]
fn frames_single_line(#[case] input: &'static [u8], #[case] expected: &str) {
    let mut r = LineReader::new(Cursor::new(input));
    assert_eq!(r.next_line().unwrap().as_deref(), Some(expected));
}

#[test]
fn several_lines_then_closed() {
    let mut r = LineReader::new(Cursor::new(&b"1\n2\nLUX:3\n"[..]));
    let mut got = Vec::new();
    loop {
        match r.read_line() {
            Ok(Some(line)) => got.push(line),
            Ok(None) => continue,
            Err(e) => {
                assert!(e.downcast_ref::<HwError>().is_some_and(|h| matches!(h, HwError::Closed)));
                break;
            }
        }
    }
    assert_eq!(got, vec!["1", "2", "LUX:3"]);
}

/// Never produces a newline; every read hands back a few bytes then times out.
struct Babbler {
    toggle: bool,
}

impl Read for Babbler {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.toggle = !self.toggle;
        if self.toggle {
            let n = buf.len().min(512);
            buf[..n].fill(b'x');
            Ok(n)
        } else {
            Err(io::Error::new(ErrorKind::TimedOut, "timeout"))
        }
    }
}

#[test]
fn runaway_line_is_a_hard_error() {
    let mut r = LineReader::new(Babbler { toggle: false });
    let mut timeouts = 0;
    let err = loop {
        match r.next_line() {
            Ok(None) => timeouts += 1,
            Ok(Some(line)) => panic!("unexpected line of {} bytes", line.len()),
            Err(e) => break e,
        }
    };
    assert!(timeouts >= 1);
    assert!(matches!(err, HwError::LineTooLong(_)));
}

#[test]
fn other_io_errors_propagate() {
    struct Broken;
    impl Read for Broken {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::new(ErrorKind::BrokenPipe, "unplugged"))
        }
    }
    let mut r = LineReader::new(Broken);
    assert!(matches!(r.next_line(), Err(HwError::Io(_))));
}

/// Streams `x` forever: no newline, no timeout.
struct Firehose {
    served: Arc<AtomicUsize>,
}

impl Read for Firehose {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        buf.fill(b'x');
        self.served.fetch_add(buf.len(), Ordering::Relaxed);
        Ok(buf.len())
    }
}

#[test]
fn endless_stream_without_newline_is_cut_off() {
    let served = Arc::new(AtomicUsize::new(0));
    let mut r = LineReader::new(Firehose {
        served: served.clone(),
    });
    assert!(matches!(r.next_line(), Err(HwError::LineTooLong(4096))));
    // BufReader pulls at most one 8 KiB buffer past the cap
    assert!(served.load(Ordering::Relaxed) <= 4096 + 8 * 1024);
}

#[test]
fn long_line_followed_by_newline_is_rejected_then_framing_resumes() {
    let mut input = vec![b'7'; 1_000_000];
    input.extend_from_slice(b"\nLUX:5\n");
    let mut r = LineReader::new(Cursor::new(input));
    let mut rejected = 0;
    let good = loop {
        match r.next_line() {
            Err(HwError::LineTooLong(_)) => rejected += 1,
            Ok(Some(line)) if line.len() <= 4096 => {
                if line == "LUX:5" {
                    break line;
                }
            }
            other => panic!("unexpected {other:?}"),
        }
    };
    assert!(rejected >= 1);
    assert_eq!(good, "LUX:5");
}
