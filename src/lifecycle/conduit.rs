//! Single-slot error conduit from the listener task to the coordinator.
//!
//! Only the first reported error is kept. Reporting never blocks, so a
//! listener task is never stuck on a coordinator that has moved on.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::mpsc;

/// Create a conduit. The reporter may be cloned for several producers.
pub fn channel<E>() -> (ErrorReporter<E>, ErrorConduit<E>) {
    let (tx, rx) = mpsc::channel(1);
    let reporter = ErrorReporter {
        tx,
        filled: Arc::new(AtomicBool::new(false)),
    };
    (reporter, ErrorConduit { rx })
}

/// Producer half.
#[derive(Debug)]
pub struct ErrorReporter<E> {
    tx: mpsc::Sender<E>,
    filled: Arc<AtomicBool>,
}

impl<E> Clone for ErrorReporter<E> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
            filled: Arc::clone(&self.filled),
        }
    }
}

impl<E> ErrorReporter<E> {
    /// Offer an error. Returns `true` if it took the slot; later errors,
    /// or errors sent after the consumer is gone, are dropped.
    pub fn report(&self, err: E) -> bool {
        if self
            .filled
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return false;
        }
        self.tx.try_send(err).is_ok()
    }
}

/// Consumer half.
#[derive(Debug)]
pub struct ErrorConduit<E> {
    rx: mpsc::Receiver<E>,
}

impl<E> ErrorConduit<E> {
    /// Take the error if one is waiting.
    pub fn try_take(&mut self) -> Option<E> {
        self.rx.try_recv().ok()
    }

    /// Wait for the error. `None` once every reporter is gone without
    /// reporting.
    pub async fn recv(&mut self) -> Option<E> {
        self.rx.recv().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn empty_conduit_polls_none() {
        let (_reporter, mut conduit) = channel::<&str>();
        assert_eq!(conduit.try_take(), None);
    }

    #[test]
    fn only_first_error_is_kept() {
        let (reporter, mut conduit) = channel();
        assert!(reporter.report("first"));
        assert!(!reporter.report("second"));

        assert_eq!(conduit.try_take(), Some("first"));
        assert_eq!(conduit.try_take(), None);
    }

    #[test]
    fn slot_is_not_reused_after_take() {
        let (reporter, mut conduit) = channel();
        reporter.report(1);
        assert_eq!(conduit.try_take(), Some(1));

        assert!(!reporter.report(2));
        assert_eq!(conduit.try_take(), None);
    }

    #[test]
    fn report_after_consumer_dropped_does_not_block() {
        let (reporter, conduit) = channel();
        drop(conduit);
        assert!(!reporter.report("late"));
    }

    #[tokio::test]
    async fn recv_is_none_when_reporters_vanish() {
        let (reporter, mut conduit) = channel::<()>();
        drop(reporter);
        assert_eq!(conduit.recv().await, None);
    }

    #[tokio::test]
    async fn concurrent_producers_never_block() {
        let (reporter, mut conduit) = channel();

        let producers: Vec<_> = (0..2)
            .map(|n| {
                let reporter = reporter.clone();
                tokio::spawn(async move { reporter.report(n) })
            })
            .collect();

        let mut accepted = 0;
        for producer in producers {
            let took_slot = tokio::time::timeout(Duration::from_millis(100), producer)
                .await
                .expect("producer must not block")
                .unwrap();
            accepted += usize::from(took_slot);
        }
        assert_eq!(accepted, 1);

        let first = conduit.recv().await;
        assert!(matches!(first, Some(0) | Some(1)));
        assert_eq!(conduit.try_take(), None);
    }
}
