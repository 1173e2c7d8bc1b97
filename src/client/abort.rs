//! Cooperative cancellation for an in-flight query.

use tokio::sync::watch;

/// Owner side. Dropping the handle without calling [`AbortHandle::abort`]
/// never cancels anything.
#[derive(Debug)]
pub struct AbortHandle {
    sender: watch::Sender<bool>,
}

/// Observer side, checked by the poll loop at each suspension point.
#[derive(Debug, Clone)]
pub struct AbortSignal {
    receiver: watch::Receiver<bool>,
}

impl AbortHandle {
    pub fn new() -> (Self, AbortSignal) {
        let (sender, receiver) = watch::channel(false);
        (Self { sender }, AbortSignal { receiver })
    }

    pub fn abort(&self) {
        self.sender.send_replace(true);
    }

    pub fn signal(&self) -> AbortSignal {
        AbortSignal {
            receiver: self.sender.subscribe(),
        }
    }
}

impl AbortSignal {
    /// A signal that never fires.
    pub fn never() -> Self {
        let (_, signal) = AbortHandle::new();
        signal
    }

    pub fn is_aborted(&self) -> bool {
        *self.receiver.borrow()
    }

    /// Resolves once abort has been requested. Pending forever if the handle
    /// is dropped first.
    pub async fn aborted(&self) {
        let mut receiver = self.receiver.clone();
        let fired = receiver.wait_for(|aborted| *aborted).await.is_ok();
        if !fired {
            std::future::pending::<()>().await;
        }
    }
}
