//! Test and helper mocks for soiling_core

use crossbeam_channel as xch;
use soiling_traits::{Connector, LineSource};
use std::time::Duration;

/// Hands out [`FeedSource`]s that replay lines pushed through the paired sender.
///
/// Dropping every sender makes open sources fail, like an unplugged cable.
#[derive(Clone)]
pub struct FeedConnector {
    rx: xch::Receiver<String>,
    fail_open: Option<String>,
}

/// Create a connector plus the sender that feeds it.
pub fn feed() -> (xch::Sender<String>, FeedConnector) {
    let (tx, rx) = xch::unbounded();
    (tx, FeedConnector { rx, fail_open: None })
}

impl FeedConnector {
    /// A connector whose `open` always fails with `reason`.
    pub fn failing(reason: &str) -> Self {
        let (_tx, rx) = xch::unbounded();
        Self {
            rx,
            fail_open: Some(reason.to_string()),
        }
    }
}

impl Connector for FeedConnector {
    type Source = FeedSource;

    fn open(
        &self,
        _port: &str,
        _baud: u32,
        read_timeout: Duration,
    ) -> Result<Self::Source, Box<dyn std::error::Error + Send + Sync>> {
        if let Some(reason) = &self.fail_open {
            return Err(reason.clone().into());
        }
        Ok(FeedSource {
            rx: self.rx.clone(),
            timeout: read_timeout,
        })
    }
}

pub struct FeedSource {
    rx: xch::Receiver<String>,
    timeout: Duration,
}

impl LineSource for FeedSource {
    fn read_line(&mut self) -> Result<Option<String>, Box<dyn std::error::Error + Send + Sync>> {
        match self.rx.recv_timeout(self.timeout) {
            Ok(line) => Ok(Some(line)),
            Err(xch::RecvTimeoutError::Timeout) => Ok(None),
            Err(xch::RecvTimeoutError::Disconnected) => {
                Err(Box::new(std::io::Error::other("link closed")))
            }
        }
    }
}

/// A source that never yields and blocks for `hold` per read, ignoring any timeout.
pub struct StuckSource {
    pub hold: Duration,
}

impl LineSource for StuckSource {
    fn read_line(&mut self) -> Result<Option<String>, Box<dyn std::error::Error + Send + Sync>> {
        std::thread::sleep(self.hold);
        Ok(None)
    }
}
