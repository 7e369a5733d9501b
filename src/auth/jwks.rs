//! Time-bounded cache of signing keys fetched from a JWK Set URL.
//!
//! Keys are refetched when the cache is older than its TTL, or when a token names a
//! `kid` the cached set does not contain (the provider rotated its keys). A set younger
//! than the minimum refresh interval is trusted as complete, so unknown `kid`s cannot
//! force more than one fetch per interval. A failed fetch fails the request; there is
//! no retry.

use crate::error::AppError;
use jsonwebtoken::jwk::JwkSet;
use jsonwebtoken::DecodingKey;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, RwLock};

const FETCH_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_MIN_REFRESH_INTERVAL: Duration = Duration::from_secs(30);

struct SigningKey {
    kid: Option<String>,
    key: DecodingKey,
}

struct CachedKeys {
    keys: Vec<SigningKey>,
    fetched_at: Instant,
}

impl CachedKeys {
    fn from_jwk_set(set: JwkSet) -> Self {
        let keys = set
            .keys
            .iter()
            .filter_map(|jwk| match DecodingKey::from_jwk(jwk) {
                Ok(key) => Some(SigningKey {
                    kid: jwk.common.key_id.clone(),
                    key,
                }),
                Err(e) => {
                    log::warn!("Skipping unusable JWK {:?}: {}", jwk.common.key_id, e);
                    None
                }
            })
            .collect();

        Self {
            keys,
            fetched_at: Instant::now(),
        }
    }

    fn is_fresh(&self, ttl: Duration) -> bool {
        self.fetched_at.elapsed() < ttl
    }

    /// A token without `kid` is only accepted when the set holds exactly one key.
    fn find(&self, kid: Option<&str>) -> Option<DecodingKey> {
        match kid {
            Some(kid) => self
                .keys
                .iter()
                .find(|signing_key| signing_key.kid.as_deref() == Some(kid))
                .map(|signing_key| signing_key.key.clone()),
            None if self.keys.len() == 1 => Some(self.keys[0].key.clone()),
            None => None,
        }
    }

    fn require(&self, kid: Option<&str>) -> Result<DecodingKey, AppError> {
        self.find(kid).ok_or_else(|| {
            AppError::InvalidToken(format!("no signing key matches kid {:?}", kid))
        })
    }
}

pub struct JwksCache {
    url: String,
    ttl: Duration,
    min_refresh_interval: Duration,
    client: reqwest::Client,
    state: RwLock<Option<CachedKeys>>,
    // Held for the duration of a fetch so concurrent misses share one request.
    refresh: Mutex<()>,
}

impl JwksCache {
    pub fn new(url: impl Into<String>, ttl: Duration) -> Self {
        Self {
            url: url.into(),
            ttl,
            min_refresh_interval: DEFAULT_MIN_REFRESH_INTERVAL,
            client: reqwest::Client::new(),
            state: RwLock::new(None),
            refresh: Mutex::new(()),
        }
    }

    /// Minimum age of the cached set before an unknown `kid` may trigger a refetch.
    pub fn min_refresh_interval(mut self, interval: Duration) -> Self {
        self.min_refresh_interval = interval;
        self
    }

    /// Returns the decoding key for `kid`, fetching the key set when needed.
    pub async fn decoding_key(&self, kid: Option<&str>) -> Result<DecodingKey, AppError> {
        let requested_at = Instant::now();

        {
            let state = self.state.read().await;
            if let Some(key) = state
                .as_ref()
                .filter(|cached| cached.is_fresh(self.ttl))
                .and_then(|cached| cached.find(kid))
            {
                return Ok(key);
            }
        }

        let _refresh = self.refresh.lock().await;

        {
            let state = self.state.read().await;
            if let Some(cached) = state.as_ref() {
                // Refreshed by another request while this one waited.
                if cached.fetched_at >= requested_at {
                    return cached.require(kid);
                }
                if cached.is_fresh(self.ttl)
                    && cached.fetched_at.elapsed() < self.min_refresh_interval
                {
                    log::debug!("Unknown kid {:?} within the refresh interval", kid);
                    return cached.require(kid);
                }
            }
        }

        let fetched = CachedKeys::from_jwk_set(self.fetch().await?);
        log::info!("Fetched {} signing key(s) from {}", fetched.keys.len(), self.url);
        let key = fetched.require(kid);
        *self.state.write().await = Some(fetched);

        key
    }

    async fn fetch(&self) -> Result<JwkSet, AppError> {
        let response = self
            .client
            .get(&self.url)
            .timeout(FETCH_TIMEOUT)
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .map_err(|e| {
                log::error!("Failed to fetch JWKS from {}: {}", self.url, e);
                AppError::InvalidToken(format!("signing keys unavailable: {}", e))
            })?;

        response.json::<JwkSet>().await.map_err(|e| {
            log::error!("Malformed JWKS from {}: {}", self.url, e);
            AppError::InvalidToken(format!("signing keys unavailable: {}", e))
        })
    }
}
