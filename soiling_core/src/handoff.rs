//! Worker→coordinator channel with a drop-oldest overflow policy.
//!
//! Live telemetry favours freshness: a full queue sheds its oldest entry
//! instead of blocking the producer.
use crossbeam_channel as xch;

pub struct HandoffSender<T> {
    tx: xch::Sender<T>,
    // Producer-side handle used only to evict the oldest entry on overflow.
    evict: xch::Receiver<T>,
}

/// Bounded handoff; a zero capacity is raised to one.
pub fn handoff<T>(capacity: usize) -> (HandoffSender<T>, xch::Receiver<T>) {
    let (tx, rx) = xch::bounded(capacity.max(1));
    (
        HandoffSender {
            tx,
            evict: rx.clone(),
        },
        rx,
    )
}

impl<T> HandoffSender<T> {
    /// Enqueue without blocking. Returns how many queued items were evicted.
    pub fn push(&self, item: T) -> usize {
        let mut item = item;
        let mut evicted = 0;
        loop {
            match self.tx.try_send(item) {
                Ok(()) => return evicted,
                Err(xch::TrySendError::Full(back)) => {
                    if self.evict.try_recv().is_ok() {
                        evicted += 1;
                    }
                    item = back;
                }
                // The sender keeps a receiver alive, so this cannot be observed.
                Err(xch::TrySendError::Disconnected(_)) => return evicted,
            }
        }
    }
}
