//! Raw events pushed by the identity provider.
//!
//! The provider publishes connection and session events on a single global
//! channel. The session coordinator subscribes once, translates a small
//! whitelist of these into [`AuthenticationStatus`](crate::status::AuthenticationStatus)
//! values and ignores the rest.

use futures::Stream;
use serde::{Deserialize, Serialize};
use std::pin::Pin;

/// Raw event names emitted by the identity provider.
pub mod names {
    /// A user completed sign-in.
    pub const SIGNED_IN: &str = "signed-in";
    /// The current user signed out (locally or globally).
    pub const SIGNED_OUT: &str = "signed-out";
    /// The session could not be refreshed and has expired.
    pub const SESSION_EXPIRED: &str = "session-expired";
    /// The current user's account was deleted.
    pub const USER_DELETED: &str = "user-deleted";
    /// Session tokens were refreshed.
    pub const TOKEN_REFRESH: &str = "token-refresh";
    /// Refreshing session tokens failed.
    pub const TOKEN_REFRESH_FAILURE: &str = "token-refresh-failure";
}

/// One event as delivered by the identity provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HubEvent {
    /// Event identifier (see [`names`]).
    pub name: String,
    /// Provider-specific payload, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<serde_json::Value>,
}

impl HubEvent {
    /// Create an event without payload.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            payload: None,
        }
    }

    /// Attach a payload.
    #[must_use]
    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = Some(payload);
        self
    }
}

/// Push stream of raw provider events.
///
/// The stream ends when the provider tears down its channel. Dropping the
/// stream cancels the subscription.
pub type HubEventStream = Pin<Box<dyn Stream<Item = HubEvent> + Send>>;

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use futures::StreamExt;

    #[test]
    fn test_event_without_payload_serializes_name_only() {
        let json = serde_json::to_string(&HubEvent::new(names::SIGNED_OUT)).unwrap();
        assert_eq!(json, r#"{"name":"signed-out"}"#);
    }

    #[test]
    fn test_payload_round_trips() {
        let event = HubEvent::new(names::TOKEN_REFRESH_FAILURE)
            .with_payload(serde_json::json!({ "reason": "expired refresh token" }));
        let parsed: HubEvent = serde_json::from_str(&serde_json::to_string(&event).unwrap()).unwrap();
        assert_eq!(parsed, event);
    }

    #[tokio::test]
    async fn test_stream_yields_in_publish_order() {
        let stream: HubEventStream = Box::pin(futures::stream::iter(vec![
            HubEvent::new(names::SIGNED_IN),
            HubEvent::new(names::SIGNED_OUT),
        ]));
        let received: Vec<String> = stream.map(|event| event.name).collect().await;
        assert_eq!(received, vec![names::SIGNED_IN, names::SIGNED_OUT]);
    }
}
