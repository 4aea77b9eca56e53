#![no_main]
use libfuzzer_sys::fuzz_target;
use soiling_hardware::LineReader;
use soiling_hardware::error::HwError;

fuzz_target!(|data: &[u8]| {
    // Raw bytes through the framer, then every line through the parser.
    let mut reader = LineReader::new(data);
    loop {
        match reader.next_line() {
            Ok(Some(line)) => {
                if let Some(v) = soiling_core::parse_line(&line) {
                    assert!(v.is_finite());
                    if !line.contains(':') {
                        assert_eq!(soiling_core::parse_line(&format!("LUX:{line}")), Some(v));
                    }
                }
            }
            Ok(None) => {}
            Err(HwError::Closed) | Err(HwError::LineTooLong(_)) => break,
            Err(e) => panic!("unexpected framing error: {e}"),
        }
    }
});
