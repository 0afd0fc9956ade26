//! Non-replaying multi-subscriber broadcast of [`AuthenticationStatus`].
//!
//! The notifier is the fan-out point between the single upstream provider
//! subscription and any number of local consumers. Each subscriber owns an
//! unbounded `tokio::sync::mpsc` queue registered with the notifier, so
//! subscribers attach and detach without affecting each other and a slow
//! subscriber never blocks the emitter.
//!
//! # Delivery
//!
//! - Every subscriber registered at emission time sees the status exactly
//!   once, in emission order, however far behind it is
//! - Subscribers never see statuses emitted before they subscribed
//! - After [`close`](StatusNotifier::close) subscribers drain their queue
//!   and then end
//!
//! # Example
//!
//! ```
//! use composable_identity_core::AuthenticationStatus;
//! use composable_identity_runtime::notifier::StatusNotifier;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let notifier = StatusNotifier::new();
//! let mut subscription = notifier.subscribe()?;
//!
//! notifier.emit(AuthenticationStatus::Authenticated)?;
//! assert_eq!(subscription.recv().await, Some(AuthenticationStatus::Authenticated));
//!
//! notifier.close();
//! assert_eq!(subscription.recv().await, None);
//! # Ok(())
//! # }
//! ```

use crate::metrics::StatusMetrics;
use composable_identity_core::{AuthError, AuthenticationStatus, Result};
use futures::Stream;
use std::panic::AssertUnwindSafe;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

struct Inner {
    // `None` once closed.
    subscribers: Option<Vec<mpsc::UnboundedSender<AuthenticationStatus>>>,
    last: AuthenticationStatus,
}

/// Broadcast channel of authentication statuses.
pub struct StatusNotifier {
    inner: Mutex<Inner>,
}

impl StatusNotifier {
    /// Create an open notifier with no subscribers.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                subscribers: Some(Vec::new()),
                last: AuthenticationStatus::Unknown,
            }),
        }
    }

    // Only plain values live behind the lock, so a poisoned guard is still consistent.
    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a new subscriber.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Disposed`] if the notifier is closed.
    pub fn subscribe(&self) -> Result<StatusSubscription> {
        let mut inner = self.lock();
        let subscribers = inner.subscribers.as_mut().ok_or(AuthError::Disposed)?;
        let (sender, receiver) = mpsc::unbounded_channel();
        subscribers.retain(|subscriber| !subscriber.is_closed());
        subscribers.push(sender);
        StatusMetrics::record_subscribers(subscribers.len());
        tracing::debug!(subscribers = subscribers.len(), "Status subscriber attached");
        Ok(StatusSubscription { receiver })
    }

    /// Register a callback invoked once per emitted status.
    ///
    /// The callback runs on its own task. A panicking callback is logged and
    /// keeps receiving later statuses; other subscribers are unaffected.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Disposed`] if the notifier is closed.
    pub fn listen<F>(&self, mut callback: F) -> Result<ListenerHandle>
    where
        F: FnMut(AuthenticationStatus) + Send + 'static,
    {
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| AuthError::Internal(format!("No Tokio runtime for listener: {e}")))?;
        let mut subscription = self.subscribe()?;
        let task = runtime.spawn(async move {
            while let Some(status) = subscription.recv().await {
                let delivered = std::panic::catch_unwind(AssertUnwindSafe(|| callback(status)));
                if delivered.is_err() {
                    tracing::warn!(%status, "Status listener panicked");
                }
            }
        });
        Ok(ListenerHandle { task: Some(task) })
    }

    /// Deliver `status` to every current subscriber.
    ///
    /// Never blocks and never drops: each subscriber's queue grows until it
    /// reads. Subscribers that have gone away are pruned.
    ///
    /// # Returns
    ///
    /// The number of subscribers the status was queued for.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Disposed`] if the notifier is closed.
    pub fn emit(&self, status: AuthenticationStatus) -> Result<usize> {
        let mut inner = self.lock();
        let subscribers = inner.subscribers.as_mut().ok_or(AuthError::Disposed)?;
        subscribers.retain(|subscriber| subscriber.send(status).is_ok());
        let delivered = subscribers.len();
        inner.last = status;
        StatusMetrics::record_emitted(status);
        StatusMetrics::record_subscribers(delivered);
        tracing::debug!(%status, subscribers = delivered, "Status emitted");
        Ok(delivered)
    }

    /// The most recently emitted status (`Unknown` before the first emission).
    #[must_use]
    pub fn current(&self) -> AuthenticationStatus {
        self.lock().last
    }

    /// Number of live subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.lock().subscribers.as_ref().map_or(0, |subscribers| {
            subscribers
                .iter()
                .filter(|subscriber| !subscriber.is_closed())
                .count()
        })
    }

    /// Whether [`close`](Self::close) has been called.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.lock().subscribers.is_none()
    }

    /// Close the channel.
    ///
    /// Subscribers drain what was already emitted and then end. Further
    /// emissions and subscriptions fail with [`AuthError::Disposed`].
    ///
    /// # Returns
    ///
    /// `true` if this call closed the notifier, `false` if it was already closed.
    pub fn close(&self) -> bool {
        let subscribers = self.lock().subscribers.take();
        match subscribers {
            Some(subscribers) => {
                tracing::info!(subscribers = subscribers.len(), "Status notifier closed");
                StatusMetrics::record_subscribers(0);
                true
            }
            None => false,
        }
    }
}

impl Default for StatusNotifier {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for StatusNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StatusNotifier")
            .field("current", &self.current())
            .field("subscribers", &self.subscriber_count())
            .field("closed", &self.is_closed())
            .finish()
    }
}

/// One subscriber's view of the status channel.
///
/// Dropping the subscription unsubscribes.
#[derive(Debug)]
pub struct StatusSubscription {
    receiver: mpsc::UnboundedReceiver<AuthenticationStatus>,
}

impl StatusSubscription {
    /// Wait for the next status.
    ///
    /// Returns `None` once the notifier is closed and everything emitted
    /// before closing has been received.
    pub async fn recv(&mut self) -> Option<AuthenticationStatus> {
        self.receiver.recv().await
    }

    /// Take the next status if one is already queued.
    pub fn try_recv(&mut self) -> Option<AuthenticationStatus> {
        self.receiver.try_recv().ok()
    }

    /// Turn the subscription into a [`Stream`].
    pub fn into_stream(self) -> impl Stream<Item = AuthenticationStatus> + Send {
        futures::stream::unfold(self, |mut subscription| async move {
            subscription
                .recv()
                .await
                .map(|status| (status, subscription))
        })
    }
}

/// Handle to a callback registered with [`StatusNotifier::listen`].
///
/// Dropping the handle unsubscribes the callback.
#[derive(Debug)]
#[must_use = "dropping the handle unsubscribes the listener"]
pub struct ListenerHandle {
    task: Option<JoinHandle<()>>,
}

impl ListenerHandle {
    /// Stop delivering statuses to the callback.
    pub fn cancel(mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }

    /// Wait until the notifier closes and the callback has seen every
    /// status emitted before closing.
    pub async fn closed(mut self) {
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                tracing::warn!(error = %e, "Status listener task failed");
            }
        }
    }

    /// Whether the listener task has ended.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.task.as_ref().is_none_or(JoinHandle::is_finished)
    }
}

impl Drop for ListenerHandle {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}
