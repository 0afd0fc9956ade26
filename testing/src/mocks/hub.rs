//! In-memory raw event channel.

use composable_identity_core::events::{HubEvent, HubEventStream};
use tokio::sync::broadcast;

/// Push channel standing in for the provider's global event hub.
///
/// Every call to [`stream`](Self::stream) is one upstream subscription;
/// [`subscriber_count`](Self::subscriber_count) lets tests check that the
/// coordinator holds exactly one and releases it on close.
#[derive(Debug, Clone)]
pub struct HubEventSource {
    sender: broadcast::Sender<HubEvent>,
}

impl HubEventSource {
    /// Create a channel with room for 64 undelivered events per subscriber.
    #[must_use]
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(64);
        Self { sender }
    }

    /// Publish a raw event by name.
    ///
    /// Returns the number of subscribers it reached.
    pub fn publish(&self, name: &str) -> usize {
        self.publish_event(HubEvent::new(name))
    }

    /// Publish a raw event.
    pub fn publish_event(&self, event: HubEvent) -> usize {
        self.sender.send(event).unwrap_or(0)
    }

    /// Number of live upstream subscriptions.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// Open a new subscription as a stream.
    #[must_use]
    pub fn stream(&self) -> HubEventStream {
        let mut receiver = self.sender.subscribe();
        Box::pin(async_stream::stream! {
            loop {
                match receiver.recv().await {
                    Ok(event) => yield event,
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "Hub subscriber lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        })
    }
}

impl Default for HubEventSource {
    fn default() -> Self {
        Self::new()
    }
}
