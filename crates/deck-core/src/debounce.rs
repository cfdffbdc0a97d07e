//! Trailing-edge debouncing and stale-response discarding.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Delivers only the last value pushed within `window`.
///
/// Each `push` aborts the pending timer and arms a new one; when a timer
/// survives the whole window its value is sent on the channel.
pub struct Debouncer<T> {
    window: Duration,
    tx: mpsc::UnboundedSender<T>,
    pending: Option<JoinHandle<()>>,
}

impl<T: Send + 'static> Debouncer<T> {
    pub fn new(window: Duration, tx: mpsc::UnboundedSender<T>) -> Self {
        Self {
            window,
            tx,
            pending: None,
        }
    }

    pub fn push(&mut self, value: T) {
        self.cancel();
        let tx = self.tx.clone();
        let window = self.window;
        self.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(window).await;
            let _ = tx.send(value);
        }));
    }

    /// Send immediately, dropping anything pending.
    pub fn flush(&mut self, value: T) {
        self.cancel();
        let _ = self.tx.send(value);
    }

    pub fn cancel(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
    }
}

impl<T> Drop for Debouncer<T> {
    fn drop(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
    }
}

/// Monotonic request ids.  Only the most recently issued one is current.
#[derive(Debug, Default, Clone)]
pub struct RequestTokens {
    latest: u64,
}

impl RequestTokens {
    pub fn issue(&mut self) -> u64 {
        self.latest += 1;
        self.latest
    }

    pub fn is_current(&self, token: u64) -> bool {
        token == self.latest
    }

    pub fn latest(&self) -> u64 {
        self.latest
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_newest_token_is_current() {
        let mut tokens = RequestTokens::default();
        let a = tokens.issue();
        let b = tokens.issue();
        assert!(b > a);
        assert!(!tokens.is_current(a));
        assert!(tokens.is_current(b));
    }

    #[tokio::test(start_paused = true)]
    async fn flush_cancels_pending_value() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut d = Debouncer::new(Duration::from_millis(280), tx);
        d.push("slow");
        d.flush("now");
        assert_eq!(rx.recv().await, Some("now"));
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert!(rx.try_recv().is_err());
    }
}
