/// Throttling for unauthenticated routes
///
/// GCRA limiter per client IP, kept in process memory (`governor` keyed
/// store). The client IP comes from `SmartIpKeyExtractor`: forwarding
/// headers first, then the socket address. Requests without either share
/// one anonymous key.
///
/// - Burst: the configured requests per minute
/// - Replenish: one request every 60 s / limit
///
/// Successful responses carry `X-RateLimit-Limit` and
/// `X-RateLimit-Remaining`; throttled requests get 429 with `Retry-After`.
///
/// # Example
///
/// ```no_run
/// use imcm_api::middleware::throttle::{AnonThrottle, ANONYMOUS_KEY};
///
/// let throttle = AnonThrottle::new(30);
/// assert!(throttle.check(ANONYMOUS_KEY).is_ok());
/// ```

use crate::app::AppState;
use crate::error::ApiError;
use axum::{
    extract::{Request, State},
    http::HeaderValue,
    middleware::Next,
    response::Response,
};
use governor::{
    clock::{Clock, DefaultClock},
    middleware::StateInformationMiddleware,
    state::keyed::DefaultKeyedStateStore,
    Quota, RateLimiter,
};
use std::net::{IpAddr, Ipv4Addr};
use std::num::NonZeroU32;
use std::sync::Arc;
use tower_governor::key_extractor::{KeyExtractor, SmartIpKeyExtractor};

/// Key used when the client address is unknown
pub const ANONYMOUS_KEY: IpAddr = IpAddr::V4(Ipv4Addr::UNSPECIFIED);

/// Prune idle clients once the store holds this many
const SWEEP_THRESHOLD: usize = 10_000;

type KeyedLimiter =
    RateLimiter<IpAddr, DefaultKeyedStateStore<IpAddr>, DefaultClock, StateInformationMiddleware>;

/// Outcome of an admitted request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Admitted {
    pub limit: u32,
    pub remaining: u32,
}

/// Shared in-memory throttle, cheap to clone
#[derive(Clone)]
pub struct AnonThrottle {
    limiter: Arc<KeyedLimiter>,
    clock: DefaultClock,
    limit: NonZeroU32,
}

impl std::fmt::Debug for AnonThrottle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnonThrottle")
            .field("limit", &self.limit)
            .field("clients", &self.limiter.len())
            .finish()
    }
}

impl AnonThrottle {
    /// Creates a throttle admitting `requests_per_minute` per client
    pub fn new(requests_per_minute: u32) -> Self {
        let limit = NonZeroU32::new(requests_per_minute).unwrap_or(NonZeroU32::MIN);
        let clock = DefaultClock::default();
        let limiter = RateLimiter::dashmap_with_clock(Quota::per_minute(limit), &clock)
            .with_middleware::<StateInformationMiddleware>();

        Self {
            limiter: Arc::new(limiter),
            clock,
            limit,
        }
    }

    /// Admits one request from `key`
    ///
    /// Returns the seconds to wait when the client is over its limit.
    pub fn check(&self, key: IpAddr) -> Result<Admitted, u64> {
        if self.limiter.len() >= SWEEP_THRESHOLD {
            self.limiter.retain_recent();
            self.limiter.shrink_to_fit();
        }

        match self.limiter.check_key(&key) {
            Ok(snapshot) => Ok(Admitted {
                limit: self.limit.get(),
                remaining: snapshot.remaining_burst_capacity(),
            }),
            Err(not_until) => {
                let wait = not_until.wait_time_from(self.clock.now());
                let seconds = wait.as_secs() + u64::from(wait.subsec_nanos() > 0);
                Err(seconds.max(1))
            }
        }
    }
}

/// Identifies the client of a request
pub fn client_key(request: &Request) -> IpAddr {
    SmartIpKeyExtractor.extract(request).unwrap_or(ANONYMOUS_KEY)
}

/// Throttling middleware for public routes
///
/// # Errors
///
/// - 429 Too Many Requests: the client is over its limit
pub async fn anon_throttle_layer(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let key = client_key(&request);

    let admitted = state.throttle.check(key).map_err(|retry_after| {
        tracing::warn!(client = %key, retry_after, "Anonymous request throttled");
        ApiError::RateLimitExceeded {
            retry_after,
            message: format!("Request was throttled. Expected available in {} seconds.", retry_after),
        }
    })?;

    let mut response = next.run(request).await;

    let headers = response.headers_mut();
    headers.insert("X-RateLimit-Limit", HeaderValue::from(admitted.limit));
    headers.insert("X-RateLimit-Remaining", HeaderValue::from(admitted.remaining));

    Ok(response)
}
