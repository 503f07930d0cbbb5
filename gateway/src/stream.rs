//! Stream of remote "vote cast" notifications.

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use turing_types::VoteCast;

/// Receiving end of a vote-cast subscription.
///
/// Dropping the stream releases the subscription: the feeding task, if any,
/// is aborted and the sender side observes a closed channel.
pub struct VoteCastStream {
    rx: mpsc::Receiver<VoteCast>,
    feeder: Option<JoinHandle<()>>,
}

impl VoteCastStream {
    /// A stream fed through the returned sender.
    pub fn channel(capacity: usize) -> (mpsc::Sender<VoteCast>, Self) {
        let (tx, rx) = mpsc::channel(capacity);
        (tx, Self { rx, feeder: None })
    }

    /// Tie a background task to the stream's lifetime.
    pub fn with_feeder(mut self, feeder: JoinHandle<()>) -> Self {
        self.feeder = Some(feeder);
        self
    }

    /// Wait for the next notification. `None` once the remote side is gone.
    pub async fn next(&mut self) -> Option<VoteCast> {
        self.rx.recv().await
    }
}

impl Drop for VoteCastStream {
    fn drop(&mut self) {
        self.rx.close();
        if let Some(feeder) = self.feeder.take() {
            feeder.abort();
        }
    }
}
