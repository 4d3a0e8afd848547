use chrono::{DateTime, Duration, Utc};
use std::future::Future;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

/// Default freshness window for computed history, 12 hours.
pub const DEFAULT_TTL_SECS: i64 = 43_200;

struct Slot<V> {
    data: Option<V>,
    fetched_at: Option<DateTime<Utc>>,
}

/// Single-slot cache holding the latest computed value and when it was made.
///
/// The lock is held while refreshing, so concurrent callers that find the
/// slot stale wait for one refresh instead of each running their own.
#[derive(Clone)]
pub struct ResultCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    inner: Arc<Mutex<Slot<V>>>,
    ttl: Duration,
}

impl<V> ResultCache<V>
where
    V: Clone + Send + Sync,
{
    pub fn new(ttl: Duration) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Slot {
                data: None,
                fetched_at: None,
            })),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Returns the cached value if it is younger than the TTL at `now`,
    /// otherwise runs `refresh` and stores its result stamped with `now`.
    ///
    /// A failed refresh leaves the previous value and timestamp in place.
    pub async fn refresh_if_stale<F, Fut, E>(&self, now: DateTime<Utc>, refresh: F) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        let mut slot = self.inner.lock().await;
        if let (Some(data), Some(fetched_at)) = (&slot.data, slot.fetched_at) {
            if now - fetched_at < self.ttl {
                debug!(%fetched_at, "Cache HIT");
                return Ok(data.clone());
            }
            debug!(%fetched_at, "Cache STALE");
        } else {
            debug!("Cache MISS");
        }

        let value = refresh().await?;
        *slot = Slot {
            data: Some(value.clone()),
            fetched_at: Some(now),
        };
        debug!("Cache PUT");
        Ok(value)
    }

    /// Timestamp of the value currently held, if any.
    pub async fn fetched_at(&self) -> Option<DateTime<Utc>> {
        self.inner.lock().await.fetched_at
    }
}

impl<V> Default for ResultCache<V>
where
    V: Clone + Send + Sync,
{
    fn default() -> Self {
        Self::new(Duration::seconds(DEFAULT_TTL_SECS))
    }
}
