//! Session credential and its single-writer store

use chrono::{DateTime, Duration, Utc};
use std::fmt;
use std::sync::Mutex as StdMutex;
use tokio::sync::{Mutex, MutexGuard, RwLock};

/// Source of the current time
pub trait Clock: Send + Sync + fmt::Debug {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock that only moves when told to; used to drive expiry in tests and replays
#[derive(Debug)]
pub struct ManualClock {
    now: StdMutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: StdMutex::new(start),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        *now += by;
    }

    pub fn set(&self, to: DateTime<Utc>) {
        *self.now.lock().unwrap_or_else(std::sync::PoisonError::into_inner) = to;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

/// Session token and the moment it stops being trusted
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    pub token: Option<String>,
    pub expires_at: DateTime<Utc>,
}

impl Credential {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Owner of the process-wide [`Credential`]
///
/// Readers take a snapshot under the read lock, so they see either the old
/// token or the refreshed one, never a mix. Refreshes are serialised by a
/// separate mutex: only the holder of [`CredentialStore::begin_refresh`]'s
/// guard performs the network call.
#[derive(Debug)]
pub struct CredentialStore {
    credential: RwLock<Credential>,
    refresh_lock: Mutex<()>,
    ttl: Duration,
}

impl CredentialStore {
    /// Store a token valid for `ttl` starting at `now`
    pub fn new(token: Option<String>, now: DateTime<Utc>, ttl: Duration) -> Self {
        Self {
            credential: RwLock::new(Credential {
                token,
                expires_at: now + ttl,
            }),
            refresh_lock: Mutex::new(()),
            ttl,
        }
    }

    /// Current credential
    pub async fn snapshot(&self) -> Credential {
        self.credential.read().await.clone()
    }

    pub async fn token(&self) -> Option<String> {
        self.credential.read().await.token.clone()
    }

    pub async fn expires_at(&self) -> DateTime<Utc> {
        self.credential.read().await.expires_at
    }

    pub async fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.credential.read().await.is_expired_at(now)
    }

    /// Wait for exclusive refresh rights
    ///
    /// Callers must re-check expiry after acquiring the guard: another
    /// task may have refreshed while they waited.
    pub async fn begin_refresh(&self) -> MutexGuard<'_, ()> {
        self.refresh_lock.lock().await
    }

    /// Install a freshly minted token valid until `now + ttl`
    pub async fn install(&self, token: String, now: DateTime<Utc>) {
        let mut credential = self.credential.write().await;
        credential.token = Some(token);
        credential.expires_at = now + self.ttl;
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 15, 10, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn test_expiry_follows_ttl() {
        let clock = ManualClock::new(start());
        let store = CredentialStore::new(Some("t0".into()), clock.now(), Duration::minutes(15));

        assert!(!store.is_expired_at(clock.now()).await);
        clock.advance(Duration::minutes(15));
        assert!(!store.is_expired_at(clock.now()).await);
        clock.advance(Duration::seconds(1));
        assert!(store.is_expired_at(clock.now()).await);
    }

    #[tokio::test]
    async fn test_install_moves_expiry_forward() {
        let clock = ManualClock::new(start());
        let store = CredentialStore::new(None, clock.now(), Duration::minutes(15));

        clock.advance(Duration::minutes(20));
        store.install("t1".into(), clock.now()).await;

        assert_eq!(store.token().await.as_deref(), Some("t1"));
        assert_eq!(
            store.expires_at().await,
            start() + Duration::minutes(35)
        );
    }

    #[test]
    fn test_refresh_guard_is_exclusive() {
        use tokio_test::{assert_pending, assert_ready, task};

        let store = CredentialStore::new(None, start(), Duration::minutes(15));
        let mut first = task::spawn(store.begin_refresh());
        let guard = assert_ready!(first.poll());

        let mut second = task::spawn(store.begin_refresh());
        assert_pending!(second.poll());

        drop(guard);
        assert!(second.is_woken());
        let _guard = assert_ready!(second.poll());
    }

    #[test]
    fn test_debug_redacts_token() {
        let credential = Credential {
            token: Some("secret-token".into()),
            expires_at: start(),
        };
        let rendered = format!("{credential:?}");
        assert!(!rendered.contains("secret-token"));
        assert!(rendered.contains("<redacted>"));
    }
}
