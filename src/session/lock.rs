/// Single-resource editing-lock coordination
///
/// The coordinator serializes write access to the one editable graph session.
/// All operations are asynchronous and totally ordered by arrival at the
/// mutex critical section: of any number of concurrent `acquire` calls while
/// unlocked, exactly one wins. Acquisition is non-blocking immediate-reject;
/// there is no wait queue and no expiry timer (an orphaned lock stays held
/// until `force_clear`).

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::future::Future;
use std::time::Duration;
use tokio::sync::Mutex;
use uuid::Uuid;

/// Observable lock state returned by every coordinator operation
#[derive(Debug, Clone, Serialize)]
pub struct LockDescriptor {
    pub locked: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub locked_by: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub locked_at: Option<DateTime<Utc>>,
    /// Present on successful acquisition and in `status` while held; absent on
    /// a rejected acquisition.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

impl LockDescriptor {
    fn unlocked() -> Self {
        Self {
            locked: false,
            locked_by: None,
            locked_at: None,
            token: None,
        }
    }
}

#[derive(Debug, Clone)]
struct HeldLock {
    holder: String,
    token: String,
    acquired_at: DateTime<Utc>,
}

/// Transport seam between the edit session controller and the coordinator
///
/// Coordinator operations are modeled as remote round-trips even when
/// colocated; a transport error is distinct from a soft rejection and leaves
/// the caller assuming "not held".
pub trait LockBackend: Send + Sync + 'static {
    fn acquire(&self, actor: &str) -> impl Future<Output = Result<LockDescriptor>> + Send;
    fn release(&self, token: &str) -> impl Future<Output = Result<bool>> + Send;
    fn status(&self) -> impl Future<Output = Result<LockDescriptor>> + Send;
}

/// In-process lock coordinator
///
/// State lives behind a `tokio::sync::Mutex`; an optional simulated round-trip
/// latency widens race windows in tests.
#[derive(Debug, Default)]
pub struct LockCoordinator {
    state: Mutex<Option<HeldLock>>,
    latency: Duration,
}

impl LockCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Coordinator that sleeps for `latency` on every operation
    pub fn with_latency(latency: Duration) -> Self {
        Self {
            state: Mutex::new(None),
            latency,
        }
    }

    async fn round_trip(&self) {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
    }

    /// Try to take the lock for `actor`
    ///
    /// Returns `locked: true` with a fresh token on success. If the lock is
    /// already held the current holder's identity and timestamp come back with
    /// `locked: false` and no state change.
    pub async fn acquire(&self, actor: &str) -> LockDescriptor {
        self.round_trip().await;
        let mut state = self.state.lock().await;
        if let Some(held) = state.as_ref() {
            tracing::info!(actor, holder = %held.holder, "lock acquisition rejected");
            return LockDescriptor {
                locked: false,
                locked_by: Some(held.holder.clone()),
                locked_at: Some(held.acquired_at),
                token: None,
            };
        }

        let held = HeldLock {
            holder: actor.to_string(),
            token: format!("lock-{}", Uuid::new_v4()),
            acquired_at: Utc::now(),
        };
        let descriptor = LockDescriptor {
            locked: true,
            locked_by: Some(held.holder.clone()),
            locked_at: Some(held.acquired_at),
            token: Some(held.token.clone()),
        };
        tracing::info!(actor, "lock acquired");
        *state = Some(held);
        descriptor
    }

    /// Release the lock if `token` matches the held token
    ///
    /// Returns whether the lock actually transitioned to unlocked. A
    /// mismatched or stale token is logged and ignored; it never unlocks
    /// another actor's session.
    pub async fn release(&self, token: &str) -> bool {
        self.round_trip().await;
        let mut state = self.state.lock().await;
        match state.as_ref() {
            Some(held) if held.token == token => {
                tracing::info!(holder = %held.holder, "lock released");
                *state = None;
                true
            }
            Some(held) => {
                tracing::warn!(holder = %held.holder, "release ignored: token mismatch");
                false
            }
            None => {
                tracing::debug!("release ignored: lock not held");
                false
            }
        }
    }

    /// Read the current state without mutating it
    pub async fn status(&self) -> LockDescriptor {
        self.round_trip().await;
        let state = self.state.lock().await;
        match state.as_ref() {
            Some(held) => LockDescriptor {
                locked: true,
                locked_by: Some(held.holder.clone()),
                locked_at: Some(held.acquired_at),
                token: Some(held.token.clone()),
            },
            None => LockDescriptor::unlocked(),
        }
    }

    /// Out-of-band reset, dropping whatever is held
    ///
    /// Exists for the force-unlock escape hatch; ordinary callers go through
    /// `release`.
    pub async fn force_clear(&self) {
        let mut state = self.state.lock().await;
        if let Some(held) = state.take() {
            tracing::warn!(holder = %held.holder, "lock force-cleared");
        }
    }
}

impl LockBackend for LockCoordinator {
    async fn acquire(&self, actor: &str) -> Result<LockDescriptor> {
        Ok(LockCoordinator::acquire(self, actor).await)
    }

    async fn release(&self, token: &str) -> Result<bool> {
        Ok(LockCoordinator::release(self, token).await)
    }

    async fn status(&self) -> Result<LockDescriptor> {
        Ok(LockCoordinator::status(self).await)
    }
}
