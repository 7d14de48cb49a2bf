//! Integration tests for the lock coordinator.

use flowdeck::session::LockCoordinator;
use std::sync::Arc;
use std::time::Duration;

#[tokio::test]
async fn acquire_returns_descriptor_with_fresh_token() {
    let lock = LockCoordinator::new();

    let descriptor = lock.acquire("alice").await;
    assert!(descriptor.locked);
    assert_eq!(descriptor.locked_by.as_deref(), Some("alice"));
    assert!(descriptor.locked_at.is_some());
    let token = descriptor.token.expect("token on successful acquire");
    assert!(token.starts_with("lock-"));
}

#[tokio::test]
async fn acquire_while_held_reports_holder_without_token() {
    let lock = LockCoordinator::new();
    let first = lock.acquire("alice").await;
    assert!(first.locked);

    let second = lock.acquire("bob").await;
    assert!(!second.locked);
    assert_eq!(second.locked_by.as_deref(), Some("alice"));
    assert!(second.token.is_none());

    // The rejection did not disturb the held lock.
    let status = lock.status().await;
    assert!(status.locked);
    assert_eq!(status.locked_by.as_deref(), Some("alice"));
    assert_eq!(status.token, first.token);
}

#[tokio::test]
async fn exactly_one_concurrent_acquire_wins() {
    let lock = Arc::new(LockCoordinator::with_latency(Duration::from_millis(5)));

    let mut handles = Vec::new();
    for i in 0..8 {
        let lock = Arc::clone(&lock);
        handles.push(tokio::spawn(
            async move { lock.acquire(&format!("actor-{i}")).await },
        ));
    }

    let mut winners = 0;
    let mut losers = Vec::new();
    for handle in handles {
        let descriptor = handle.await.expect("acquire task");
        if descriptor.locked {
            winners += 1;
        } else {
            losers.push(descriptor);
        }
    }

    assert_eq!(winners, 1, "exactly one concurrent acquire must win");
    assert_eq!(losers.len(), 7);

    let holder = lock.status().await.locked_by.expect("winner identity");
    for descriptor in losers {
        assert_eq!(descriptor.locked_by.as_deref(), Some(holder.as_str()));
    }
}

#[tokio::test]
async fn release_requires_matching_token() {
    let lock = LockCoordinator::new();
    let descriptor = lock.acquire("alice").await;
    let token = descriptor.token.expect("token");

    // A stale token must not unlock the held session.
    assert!(!lock.release("lock-stale").await);
    let status = lock.status().await;
    assert!(status.locked);
    assert_eq!(status.locked_by.as_deref(), Some("alice"));

    assert!(lock.release(&token).await);
    assert!(!lock.status().await.locked);
}

#[tokio::test]
async fn release_when_unlocked_is_reported() {
    let lock = LockCoordinator::new();
    assert!(!lock.release("lock-anything").await);
    assert!(!lock.status().await.locked);
}

#[tokio::test]
async fn released_lock_can_be_reacquired_with_new_token() {
    let lock = LockCoordinator::new();
    let first = lock.acquire("alice").await;
    let first_token = first.token.expect("token");
    assert!(lock.release(&first_token).await);

    let second = lock.acquire("bob").await;
    assert!(second.locked);
    assert_eq!(second.locked_by.as_deref(), Some("bob"));
    assert_ne!(second.token.as_deref(), Some(first_token.as_str()));

    // The old token is dead: it cannot release bob's session.
    assert!(!lock.release(&first_token).await);
    assert!(lock.status().await.locked);
}

#[tokio::test]
async fn force_clear_drops_the_held_lock() {
    let lock = LockCoordinator::new();
    let descriptor = lock.acquire("alice").await;
    assert!(descriptor.locked);

    lock.force_clear().await;

    let status = lock.status().await;
    assert!(!status.locked);
    assert!(status.locked_by.is_none());
    assert!(status.token.is_none());
}

#[tokio::test]
async fn status_does_not_mutate_state() {
    let lock = LockCoordinator::new();
    assert!(!lock.status().await.locked);
    assert!(!lock.status().await.locked);

    let descriptor = lock.acquire("alice").await;
    for _ in 0..3 {
        let status = lock.status().await;
        assert!(status.locked);
        assert_eq!(status.token, descriptor.token);
    }
}
