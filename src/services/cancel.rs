use std::sync::Arc;

use tokio::sync::watch;

/// Cooperative cancellation flag shared between a caller and its extractions.
///
/// Clones observe the same flag. Cancellation is one-way.
#[derive(Debug, Clone)]
pub struct CancelSignal {
    tx: Arc<watch::Sender<bool>>,
    rx: watch::Receiver<bool>,
}

impl CancelSignal {
    pub fn new() -> Self {
        let (tx, rx) = watch::channel(false);
        Self { tx: Arc::new(tx), rx }
    }

    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once `cancel` has been called on any clone.
    pub async fn cancelled(&self) {
        let mut rx = self.rx.clone();
        // The sender lives in self, so wait_for cannot see a closed channel here.
        let _ = rx.wait_for(|cancelled| *cancelled).await;
    }

    /// Cancels the signal when the returned guard is dropped.
    pub fn drop_guard(&self) -> CancelOnDrop {
        CancelOnDrop {
            signal: self.clone(),
        }
    }
}

impl Default for CancelSignal {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug)]
pub struct CancelOnDrop {
    signal: CancelSignal,
}

impl Drop for CancelOnDrop {
    fn drop(&mut self) {
        self.signal.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn clones_share_the_flag() {
        let signal = CancelSignal::new();
        let observer = signal.clone();
        assert!(!observer.is_cancelled());

        signal.cancel();
        assert!(observer.is_cancelled());
        tokio::time::timeout(Duration::from_secs(1), observer.cancelled())
            .await
            .expect("cancelled() should resolve after cancel()");
    }

    #[test]
    fn guard_cancels_on_drop() {
        let signal = CancelSignal::new();
        {
            let _guard = signal.drop_guard();
        }
        assert!(signal.is_cancelled());
    }
}
