//! Cached bKash session token.
//!
//! The token is only a cache over the merchant credentials. It is refreshed
//! once it is within [`REFRESH_MARGIN`] of its lifetime, and acquisition is
//! single-flight: while one caller holds the write lock and talks to the grant
//! endpoint, everyone else waits for that result.

use std::{fmt, time::Duration};

#[allow(
    redundant_imports,
    reason = "Future needed for generic bound despite being in Edition 2024 prelude"
)]
use std::future::Future;

use tokio::{sync::RwLock, time::Instant};
use tracing::debug;

/// Lifetime assumed when the grant does not report one.
pub const DEFAULT_TOKEN_TTL: Duration = Duration::from_secs(3600);

/// A token this close to expiry is treated as expired.
pub const REFRESH_MARGIN: Duration = Duration::from_secs(60);

/// A granted token and when it was obtained.
#[derive(Clone)]
pub struct CachedToken {
    token: String,
    obtained_at: Instant,
    ttl: Duration,
}

impl CachedToken {
    /// Records a token obtained now.
    #[must_use]
    pub fn new(token: String, ttl: Duration) -> Self {
        Self { token, obtained_at: Instant::now(), ttl }
    }

    /// Returns true while the token may still be sent.
    #[must_use]
    pub fn is_fresh(&self) -> bool {
        self.obtained_at.elapsed() < self.usable_for()
    }

    /// How long after the grant the token is reused.
    ///
    /// Tokens that live longer than twice the margin are dropped
    /// [`REFRESH_MARGIN`] before expiry; shorter ones at half their lifetime.
    fn usable_for(&self) -> Duration {
        if self.ttl > REFRESH_MARGIN * 2 {
            self.ttl - REFRESH_MARGIN
        } else {
            self.ttl / 2
        }
    }
}

impl fmt::Debug for CachedToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CachedToken")
            .field("token", &"[REDACTED]")
            .field("obtained_at", &self.obtained_at)
            .field("ttl", &self.ttl)
            .finish()
    }
}

#[derive(Debug, Default)]
pub(crate) struct TokenCache {
    slot: RwLock<Option<CachedToken>>,
}

impl TokenCache {
    /// Returns the cached token, or runs `fetch` once to obtain a new one.
    ///
    /// A failed fetch leaves the cache empty.
    pub(crate) async fn get_or_fetch<F, Fut, E>(&self, fetch: F) -> Result<String, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<CachedToken, E>>,
    {
        {
            let slot = self.slot.read().await;
            if let Some(cached) = slot.as_ref()
                && cached.is_fresh()
            {
                return Ok(cached.token.clone());
            }
        }

        let mut slot = self.slot.write().await;

        // Another caller may have refreshed while we waited for the lock.
        if let Some(cached) = slot.as_ref()
            && cached.is_fresh()
        {
            debug!("token refreshed by concurrent caller");
            return Ok(cached.token.clone());
        }

        if slot.take().is_some() {
            debug!("cached token expired");
        }

        let fresh = fetch().await?;
        let token = fresh.token.clone();
        debug!(ttl_secs = fresh.ttl.as_secs(), "token granted");
        *slot = Some(fresh);

        Ok(token)
    }

    /// Drops the cached token unconditionally.
    pub(crate) async fn invalidate(&self) {
        *self.slot.write().await = None;
    }

    /// Drops the cached token if it is still `token`.
    ///
    /// A token granted after `token` was rejected is kept.
    pub(crate) async fn invalidate_if(&self, token: &str) {
        let mut slot = self.slot.write().await;
        if slot.as_ref().is_some_and(|cached| cached.token == token) {
            *slot = None;
            debug!("cached token rejected by provider, invalidated");
        }
    }

    #[cfg(test)]
    pub(crate) async fn is_cached(&self) -> bool {
        self.slot.read().await.is_some()
    }
}
