//! Lazily established, process-shared database connection.
//!
//! The pool is not opened at startup: the first caller of
//! [`ConnectionCache::acquire`] triggers establishment and everyone arriving
//! while that attempt is in flight awaits the same future instead of opening
//! a second connection. Failures are never cached.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use futures_util::future::{BoxFuture, Shared};
use futures_util::FutureExt;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use thiserror::Error;

use crate::config::Config;

/// Connection establishment failure. Cloneable so that every caller awaiting
/// the same attempt receives the same error.
#[derive(Debug, Clone, Error)]
#[error("database connection failed: {0}")]
pub struct ConnectError(Arc<dyn std::error::Error + Send + Sync>);

impl ConnectError {
    pub fn new(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self(Arc::new(err))
    }
}

/// Seam between the cache and the actual datastore, so tests can count
/// establishment attempts with a fake.
#[async_trait]
pub trait Connect: Send + Sync + 'static {
    type Handle: Clone + Send + Sync + 'static;

    async fn establish(&self) -> Result<Self::Handle, ConnectError>;
}

type Attempt<H> = Shared<BoxFuture<'static, Result<H, ConnectError>>>;

enum CacheState<H> {
    Absent,
    Pending { id: u64, attempt: Attempt<H> },
    Established(H),
}

/// Memoizes one datastore handle across all request tasks.
///
/// At most one establishment attempt is in flight at a time; concurrent
/// callers share it. A successful attempt is cached indefinitely, a failed
/// one resets the state so the next call retries from scratch. There is no
/// backoff here: retry happens purely by calling [`acquire`](Self::acquire)
/// again.
pub struct ConnectionCache<C: Connect> {
    connector: Arc<C>,
    state: Mutex<CacheState<C::Handle>>,
    next_attempt_id: AtomicU64,
}

impl<C: Connect> ConnectionCache<C> {
    pub fn new(connector: C) -> Self {
        Self {
            connector: Arc::new(connector),
            state: Mutex::new(CacheState::Absent),
            next_attempt_id: AtomicU64::new(0),
        }
    }

    pub async fn acquire(&self) -> Result<C::Handle, ConnectError> {
        let (id, attempt) = {
            let mut state = self.state.lock().expect("connection cache lock poisoned");
            match &*state {
                CacheState::Established(handle) => return Ok(handle.clone()),
                CacheState::Pending { id, attempt } => (*id, attempt.clone()),
                CacheState::Absent => {
                    let id = self.next_attempt_id.fetch_add(1, Ordering::Relaxed);
                    let connector = Arc::clone(&self.connector);
                    let attempt = async move { connector.establish().await }.boxed().shared();
                    *state = CacheState::Pending {
                        id,
                        attempt: attempt.clone(),
                    };
                    tracing::info!(attempt = id, "establishing database connection");
                    (id, attempt)
                }
            }
        };

        let outcome = attempt.await;

        let mut state = self.state.lock().expect("connection cache lock poisoned");
        // Only the attempt we awaited may settle the state; by the time a
        // failed caller gets here a fresh attempt may already be pending.
        if matches!(&*state, CacheState::Pending { id: current, .. } if *current == id) {
            *state = match &outcome {
                Ok(handle) => CacheState::Established(handle.clone()),
                Err(err) => {
                    tracing::error!(attempt = id, error = %err, "database connection attempt failed");
                    CacheState::Absent
                }
            };
        }

        outcome
    }
}

/// Opens the Postgres pool and applies pending migrations inside the same
/// establishment attempt, so schema setup also happens exactly once.
pub struct PgConnector {
    database_url: String,
    max_connections: u32,
}

impl PgConnector {
    pub fn new(config: &Config) -> Self {
        Self {
            database_url: config.database_url.clone(),
            max_connections: config.max_connections,
        }
    }
}

#[async_trait]
impl Connect for PgConnector {
    type Handle = PgPool;

    async fn establish(&self) -> Result<PgPool, ConnectError> {
        let pool = PgPoolOptions::new()
            .max_connections(self.max_connections)
            .connect(&self.database_url)
            .await
            .map_err(ConnectError::new)?;

        sqlx::migrate!().run(&pool).await.map_err(ConnectError::new)?;

        tracing::info!("Successfully connected to database");
        Ok(pool)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    /// Counts establishment attempts; the first `fail_first` of them fail.
    /// Each successful attempt hands out its attempt number as the handle.
    struct FakeConnector {
        attempts: AtomicUsize,
        fail_first: usize,
        delay: Duration,
    }

    impl FakeConnector {
        fn new(fail_first: usize, delay: Duration) -> Self {
            Self {
                attempts: AtomicUsize::new(0),
                fail_first,
                delay,
            }
        }

        fn attempts(&self) -> usize {
            self.attempts.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Connect for FakeConnector {
        type Handle = usize;

        async fn establish(&self) -> Result<usize, ConnectError> {
            let attempt = self.attempts.fetch_add(1, Ordering::SeqCst) + 1;
            tokio::time::sleep(self.delay).await;
            if attempt <= self.fail_first {
                Err(ConnectError::new(io::Error::new(
                    io::ErrorKind::ConnectionRefused,
                    "connection refused",
                )))
            } else {
                Ok(attempt)
            }
        }
    }

    #[tokio::test]
    async fn repeated_acquire_reuses_the_handle() {
        let cache = ConnectionCache::new(FakeConnector::new(0, Duration::ZERO));

        let first = cache.acquire().await.unwrap();
        let second = cache.acquire().await.unwrap();

        assert_eq!(first, second);
        assert_eq!(cache.connector.attempts(), 1);
    }

    #[tokio::test]
    async fn concurrent_first_use_shares_one_attempt() {
        let cache = Arc::new(ConnectionCache::new(FakeConnector::new(
            0,
            Duration::from_millis(20),
        )));

        let tasks: Vec<_> = (0..16)
            .map(|_| {
                let cache = Arc::clone(&cache);
                tokio::spawn(async move { cache.acquire().await })
            })
            .collect();

        for task in tasks {
            assert_eq!(task.await.unwrap().unwrap(), 1);
        }
        assert_eq!(cache.connector.attempts(), 1);
    }

    #[tokio::test]
    async fn concurrent_callers_share_the_same_failure() {
        let cache = Arc::new(ConnectionCache::new(FakeConnector::new(
            usize::MAX,
            Duration::from_millis(20),
        )));

        let tasks: Vec<_> = (0..8)
            .map(|_| {
                let cache = Arc::clone(&cache);
                tokio::spawn(async move { cache.acquire().await })
            })
            .collect();

        for task in tasks {
            assert!(task.await.unwrap().is_err());
        }
        // One underlying attempt, not one per caller.
        assert_eq!(cache.connector.attempts(), 1);
    }

    #[tokio::test]
    async fn failure_is_not_cached() {
        let cache = ConnectionCache::new(FakeConnector::new(1, Duration::ZERO));

        assert!(cache.acquire().await.is_err());

        // The next call starts a fresh attempt instead of replaying the error.
        let handle = cache.acquire().await.unwrap();
        assert_eq!(handle, 2);
        assert_eq!(cache.connector.attempts(), 2);
    }
}
