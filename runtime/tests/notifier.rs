//! Integration tests for the status notifier fan-out.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)] // Test code can use unwrap/expect/panic

use composable_identity_core::AuthenticationStatus::{
    self, Authenticated, AuthenticatedOnSignUp, Unauthenticated,
};
use composable_identity_runtime::StatusNotifier;
use composable_identity_testing::helpers::{collect_statuses, next_status, stays_quiet};
use futures::StreamExt;
use std::sync::{Arc, Mutex};
use std::time::Duration;

const WAIT: Duration = Duration::from_secs(1);
const QUIET: Duration = Duration::from_millis(50);

/// Every subscriber sees every emission once, in order.
#[tokio::test]
async fn test_broadcast_reaches_every_subscriber_in_order() {
    let notifier = StatusNotifier::new();
    let mut first = notifier.subscribe().unwrap();
    let mut second = notifier.subscribe().unwrap();

    let sequence = [Authenticated, Unauthenticated, AuthenticatedOnSignUp, Authenticated];
    for status in sequence {
        assert_eq!(notifier.emit(status).unwrap(), 2);
    }

    assert_eq!(collect_statuses(&mut first, 4, WAIT).await, sequence);
    assert_eq!(collect_statuses(&mut second, 4, WAIT).await, sequence);
    assert!(stays_quiet(&mut first, QUIET).await);
}

/// A subscriber that has not read yet still gets every status, however many pile up.
#[tokio::test]
async fn test_slow_subscriber_receives_every_status() {
    let notifier = StatusNotifier::new();
    let mut slow = notifier.subscribe().unwrap();
    let mut fast = notifier.subscribe().unwrap();

    let sequence: Vec<AuthenticationStatus> = (0..200)
        .map(|i| if i % 2 == 0 { Authenticated } else { Unauthenticated })
        .collect();
    for &status in &sequence {
        assert_eq!(notifier.emit(status).unwrap(), 2);
        assert_eq!(fast.try_recv(), Some(status));
    }
    notifier.close();

    let mut drained = Vec::new();
    while let Some(status) = slow.recv().await {
        drained.push(status);
    }
    assert_eq!(drained, sequence);
}

/// Late subscribers never see earlier emissions.
#[tokio::test]
async fn test_no_replay_for_late_subscribers() {
    let notifier = StatusNotifier::new();
    let mut early = notifier.subscribe().unwrap();

    notifier.emit(Authenticated).unwrap();
    let mut late = notifier.subscribe().unwrap();
    notifier.emit(Unauthenticated).unwrap();

    assert_eq!(
        collect_statuses(&mut early, 2, WAIT).await,
        vec![Authenticated, Unauthenticated]
    );
    assert_eq!(next_status(&mut late, WAIT).await, Some(Unauthenticated));
    assert!(stays_quiet(&mut late, QUIET).await);
}

/// Dropping one subscription does not disturb the others.
#[tokio::test]
async fn test_detaching_subscriber_is_independent() {
    let notifier = StatusNotifier::new();
    let first = notifier.subscribe().unwrap();
    let mut second = notifier.subscribe().unwrap();

    drop(first);
    assert_eq!(notifier.emit(Authenticated).unwrap(), 1);
    assert_eq!(next_status(&mut second, WAIT).await, Some(Authenticated));
}

/// Closing ends subscriptions after they drain what was already emitted.
#[tokio::test]
async fn test_close_drains_then_ends() {
    let notifier = StatusNotifier::new();
    let mut subscription = notifier.subscribe().unwrap();

    notifier.emit(Authenticated).unwrap();
    assert!(notifier.close());

    assert_eq!(subscription.recv().await, Some(Authenticated));
    assert_eq!(subscription.recv().await, None);
    assert!(notifier.emit(Unauthenticated).is_err());
}

/// A panicking listener keeps its own subscription and leaves others untouched.
#[tokio::test]
async fn test_panicking_listener_does_not_affect_others() {
    let notifier = StatusNotifier::new();
    let seen = Arc::new(Mutex::new(Vec::new()));

    let failing = notifier
        .listen(|status| {
            if status == Authenticated {
                panic!("listener failure");
            }
        })
        .unwrap();
    let recorded = Arc::clone(&seen);
    let healthy = notifier
        .listen(move |status| recorded.lock().unwrap().push(status))
        .unwrap();

    notifier.emit(Authenticated).unwrap();
    notifier.emit(Unauthenticated).unwrap();
    notifier.close();

    failing.closed().await;
    healthy.closed().await;
    assert_eq!(*seen.lock().unwrap(), vec![Authenticated, Unauthenticated]);
}

/// Cancelling a listener unsubscribes it.
#[tokio::test]
async fn test_cancelled_listener_stops_receiving() {
    let notifier = StatusNotifier::new();
    let handle = notifier.listen(|_| {}).unwrap();
    assert_eq!(notifier.subscriber_count(), 1);

    handle.cancel();
    tokio::time::timeout(WAIT, async {
        while notifier.subscriber_count() > 0 {
            tokio::task::yield_now().await;
        }
    })
    .await
    .expect("listener should detach");
}

/// Dropping a listener handle detaches the callback.
#[tokio::test]
async fn test_dropped_listener_handle_detaches() {
    let notifier = StatusNotifier::new();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let recorded = Arc::clone(&seen);

    let handle = notifier
        .listen(move |status| recorded.lock().unwrap().push(status))
        .unwrap();
    drop(handle);

    tokio::time::timeout(WAIT, async {
        while notifier.subscriber_count() > 0 {
            tokio::task::yield_now().await;
        }
    })
    .await
    .expect("listener should detach");
    assert_eq!(notifier.emit(Authenticated).unwrap(), 0);
    assert!(seen.lock().unwrap().is_empty());
}

/// Subscriptions work as streams.
#[tokio::test]
async fn test_subscription_stream() {
    let notifier = StatusNotifier::new();
    let stream = notifier.subscribe().unwrap().into_stream();

    notifier.emit(Unauthenticated).unwrap();
    notifier.emit(Authenticated).unwrap();
    notifier.close();

    let received: Vec<AuthenticationStatus> = stream.collect().await;
    assert_eq!(received, vec![Unauthenticated, Authenticated]);
}

/// The notifier caches the last emission.
#[tokio::test]
async fn test_current_tracks_last_emission() {
    let notifier = StatusNotifier::new();
    assert_eq!(notifier.current(), AuthenticationStatus::Unknown);
    notifier.emit(AuthenticatedOnSignUp).unwrap();
    assert_eq!(notifier.current(), AuthenticatedOnSignUp);
}
