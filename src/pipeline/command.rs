//! Edge-triggered command signaling.

use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::Notify;

/// One pending slot per command kind: repeated `set` calls before the
/// owning controller drains collapse into a single action.
#[derive(Default)]
pub struct CommandChannel {
    pending: AtomicBool,
    wake: Notify,
}

impl CommandChannel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark the command pending. No effect while already pending.
    pub fn set(&self) {
        if !self.pending.swap(true, Ordering::AcqRel) {
            self.wake.notify_waiters();
        }
    }

    /// Suspend until the command is pending.
    ///
    /// The `Notified` future is created before the pending check, so a
    /// `set` racing with the check is still observed.
    pub async fn wait(&self) {
        loop {
            let notified = self.wake.notified();
            if self.pending.load(Ordering::Acquire) {
                return;
            }
            notified.await;
        }
    }

    /// Test-and-clear. Returns whether the command was pending.
    pub fn consume(&self) -> bool {
        self.pending.swap(false, Ordering::AcqRel)
    }

    /// Wait for a pending command and consume it.
    pub async fn recv(&self) {
        loop {
            self.wait().await;
            if self.consume() {
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    #[test]
    fn repeated_sets_collapse_to_one_consume() {
        let chan = CommandChannel::new();
        for _ in 0..5 {
            chan.set();
        }

        let results: Vec<bool> = (0..5).map(|_| chan.consume()).collect();
        assert_eq!(results, vec![true, false, false, false, false]);
    }

    #[test]
    fn consume_rearms_the_channel() {
        let chan = CommandChannel::new();
        chan.set();
        assert!(chan.consume());
        chan.set();
        assert!(chan.consume());
    }

    #[tokio::test]
    async fn set_wakes_a_waiting_task() {
        let chan = Arc::new(CommandChannel::new());

        let waiter = {
            let chan = Arc::clone(&chan);
            tokio::spawn(async move {
                chan.recv().await;
            })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        chan.set();

        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("waiter woke up")
            .unwrap();
        assert!(!chan.consume());
    }

    #[tokio::test]
    async fn wait_returns_immediately_when_already_pending() {
        let chan = CommandChannel::new();
        chan.set();
        tokio::time::timeout(Duration::from_millis(50), chan.wait())
            .await
            .expect("wait should not block");
        assert!(chan.consume());
    }
}
