// Shutdown / Cancellation Token
//
// One watch channel serves both roles: the host signals it once at
// process shutdown, and every component (poller loop, scheduler entries,
// in-flight executor runs) observes it cooperatively.

use tokio::sync::watch;

/// Cancellation signal for graceful termination
#[derive(Clone)]
pub struct ShutdownToken {
    rx: watch::Receiver<bool>,
}

impl ShutdownToken {
    /// Check if shutdown was requested
    pub fn is_shutdown(&self) -> bool {
        *self.rx.borrow()
    }

    /// Wait for the shutdown signal
    pub async fn wait(&mut self) {
        let _ = self.rx.changed().await;
    }

    /// A token that never fires (tests, one-shot tools)
    pub fn never() -> Self {
        let (tx, rx) = watch::channel(false);
        // Keep the sender alive forever so changed() never resolves
        std::mem::forget(tx);
        Self { rx }
    }
}

/// Shutdown sender held by the host
pub struct ShutdownSender {
    tx: watch::Sender<bool>,
}

impl ShutdownSender {
    /// Signal shutdown to every observer
    pub fn shutdown(&self) {
        let _ = self.tx.send(true);
    }
}

/// Create a shutdown channel
pub fn shutdown_channel() -> (ShutdownSender, ShutdownToken) {
    let (tx, rx) = watch::channel(false);
    (ShutdownSender { tx }, ShutdownToken { rx })
}
