use chrono::{DateTime, Duration, Utc};
use posprint_store::MessageStore;

/// Rate-limit settings for one origin.
#[derive(Clone, Copy, Debug)]
pub struct RateLimitConfig {
    /// Maximum submissions allowed inside the window.
    pub max_messages: u32,

    /// Window length in hours.
    pub window_hours: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_messages: 10,
            window_hours: 24,
        }
    }
}

/// Advisory sliding-window limiter over past submissions.
///
/// Counts records in `[now − window, now]` with an inclusive lower bound.
/// The check is not atomic with the subsequent write: concurrent submissions
/// from one origin can transiently exceed the limit by a small margin, which
/// is accepted for abuse mitigation.
#[derive(Clone, Debug)]
pub struct RateLimiter<S>
where
    S: MessageStore,
{
    store: S,
    config: RateLimitConfig,
}

/// Outcome of a rate-limit check.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RateLimitDecision {
    /// Under the limit; the submission may proceed.
    Allowed,
    /// At or over the limit, with the observed count.
    Limited(u32),
}

impl<S> RateLimiter<S>
where
    S: MessageStore,
{
    /// Creates a new `RateLimiter` over the given store.
    pub const fn new(store: S, config: RateLimitConfig) -> Self {
        Self { store, config }
    }

    /// Checks whether the origin may submit another message at `now`.
    pub async fn check(
        &self,
        origin: &str,
        now: DateTime<Utc>,
    ) -> Result<RateLimitDecision, S::Error> {
        let window_start = now - Duration::hours(i64::from(self.config.window_hours));
        let count = self
            .store
            .count_for_origin_since(origin, window_start)
            .await?;

        if count >= self.config.max_messages {
            Ok(RateLimitDecision::Limited(count))
        } else {
            Ok(RateLimitDecision::Allowed)
        }
    }
}
