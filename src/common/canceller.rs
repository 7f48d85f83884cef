use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Owner side of a background service: cancels it and waits until every
/// [`CancellerGuard`] clone handed to the service has been dropped.
pub(crate) struct Canceller {
    token: CancellationToken,
    receiver: mpsc::Receiver<()>,
}

#[derive(Clone)]
pub(crate) struct CancellerGuard {
    token: CancellationToken,
    _sender: mpsc::Sender<()>,
}

impl Canceller {
    pub(crate) fn new() -> (Self, CancellerGuard) {
        let (sender, receiver) = mpsc::channel(1);
        let token = CancellationToken::new();
        let guard = CancellerGuard {
            token: token.clone(),
            _sender: sender,
        };
        (Self { token, receiver }, guard)
    }

    pub(crate) async fn cancel_and_wait(&mut self) {
        self.token.cancel();
        // resolves with None once all guards are gone
        self.receiver.recv().await;
    }
}

impl CancellerGuard {
    pub(crate) async fn into_cancelled_owned(self) {
        self.token.cancelled_owned().await;
    }
}
