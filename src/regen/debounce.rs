use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{Instant, sleep_until};

/// Trailing-edge debounce over an mpsc receiver.
///
/// Every received value restarts the quiet period; only the latest value is yielded once
/// the period elapses. A value still pending when the channel closes is flushed.
#[derive(Debug)]
pub struct Debouncer<T> {
    rx: mpsc::UnboundedReceiver<T>,
    delay: Duration,
    pending: Option<(T, Instant)>,
    closed: bool,
}

impl<T> Debouncer<T> {
    pub fn new(rx: mpsc::UnboundedReceiver<T>, delay: Duration) -> Self {
        Self {
            rx,
            delay,
            pending: None,
            closed: false,
        }
    }

    /// Stops accepting input. Values already sent are still delivered, and the last one
    /// is flushed without waiting for the quiet period.
    pub fn close(&mut self) {
        self.rx.close();
    }

    pub fn is_closed(&self) -> bool {
        self.closed && self.pending.is_none()
    }

    /// Waits for the next settled value. Returns `None` once the input is closed and
    /// drained. Cancel safe: a dropped call loses nothing.
    pub async fn next(&mut self) -> Option<T> {
        loop {
            if self.closed {
                return self.pending.take().map(|(value, _)| value);
            }
            match &self.pending {
                None => match self.rx.recv().await {
                    Some(value) => self.pending = Some((value, Instant::now() + self.delay)),
                    None => self.closed = true,
                },
                Some((_, deadline)) => {
                    let deadline = *deadline;
                    tokio::select! {
                        received = self.rx.recv() => match received {
                            Some(value) => {
                                self.pending = Some((value, Instant::now() + self.delay))
                            }
                            None => self.closed = true,
                        },
                        _ = sleep_until(deadline) => {
                            return self.pending.take().map(|(value, _)| value);
                        }
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_burst_collapses_to_last_value() {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut debouncer = Debouncer::new(rx, Duration::from_millis(600));
        tx.send(1).unwrap();
        tx.send(2).unwrap();
        tx.send(3).unwrap();

        let started = Instant::now();
        assert_eq!(debouncer.next().await, Some(3));
        assert!(started.elapsed() >= Duration::from_millis(600));
    }

    #[tokio::test(start_paused = true)]
    async fn test_pending_value_flushed_on_close() {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut debouncer = Debouncer::new(rx, Duration::from_secs(5));
        tx.send("last").unwrap();
        drop(tx);
        assert_eq!(debouncer.next().await, Some("last"));
        assert_eq!(debouncer.next().await, None);
        assert!(debouncer.is_closed());
    }
}
