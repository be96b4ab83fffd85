//! Per-user interaction rate limiting for the controller.

use dashmap::DashMap;
use std::time::{Duration, Instant};
use tracing::debug;

use super::player::UserKey;

/// Token bucket of one user.
#[derive(Debug, Clone, Copy)]
struct Bucket {
    window_start: Instant,
    tokens: u32,
}

/// Allows at most `rate` interactions per `per` for each user.
///
/// A window opens with the first interaction on a full bucket and the bucket
/// refills once the window has fully elapsed.
#[derive(Debug)]
pub struct RateLimiter {
    rate: u32,
    per: Duration,
    buckets: DashMap<UserKey, Bucket>,
}

impl RateLimiter {
    pub fn new(rate: u32, per: Duration) -> Self {
        Self {
            rate,
            per,
            buckets: DashMap::new(),
        }
    }

    /// Spends one interaction of `user` at `now`, or reports how long until
    /// the next one is allowed.
    pub fn check(&self, user: UserKey, now: Instant) -> Result<(), Duration> {
        self.evict_expired(now);

        let mut bucket = self.buckets.entry(user).or_insert(Bucket {
            window_start: now,
            tokens: self.rate,
        });

        if now.duration_since(bucket.window_start) >= self.per {
            bucket.tokens = self.rate;
        }

        if bucket.tokens == self.rate {
            bucket.window_start = now;
        }

        if bucket.tokens == 0 {
            let retry_after = self.per - now.duration_since(bucket.window_start);
            debug!("User {} rate limited for {:?}", user, retry_after);
            return Err(retry_after);
        }

        bucket.tokens -= 1;
        Ok(())
    }

    /// `true` when `user` is within the limit; spends an interaction.
    pub fn check_rate(&self, user: UserKey, now: Instant) -> bool {
        self.check(user, now).is_ok()
    }

    /// Drops buckets whose window has elapsed.
    pub fn evict_expired(&self, now: Instant) {
        self.buckets
            .retain(|_, bucket| now.duration_since(bucket.window_start) < self.per);
    }

    /// Number of users with a live bucket.
    pub fn tracked_users(&self) -> usize {
        self.buckets.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const ALICE: UserKey = UserKey(1);
    const BOB: UserKey = UserKey(2);

    fn limiter() -> RateLimiter {
        RateLimiter::new(2, Duration::from_secs(10))
    }

    #[test]
    fn test_third_interaction_in_window_is_denied() {
        let limiter = limiter();
        let start = Instant::now();

        assert!(limiter.check_rate(ALICE, start));
        assert!(limiter.check_rate(ALICE, start + Duration::from_secs(1)));
        assert_eq!(
            limiter.check(ALICE, start + Duration::from_secs(2)),
            Err(Duration::from_secs(8))
        );
    }

    #[test]
    fn test_counter_resets_after_window() {
        let limiter = limiter();
        let start = Instant::now();

        assert!(limiter.check_rate(ALICE, start));
        assert!(limiter.check_rate(ALICE, start + Duration::from_secs(1)));
        assert!(!limiter.check_rate(ALICE, start + Duration::from_secs(5)));

        let later = start + Duration::from_secs(10);
        assert!(limiter.check_rate(ALICE, later));
        assert!(limiter.check_rate(ALICE, later + Duration::from_secs(1)));
        assert!(!limiter.check_rate(ALICE, later + Duration::from_secs(2)));
    }

    #[test]
    fn test_users_are_limited_independently() {
        let limiter = limiter();
        let start = Instant::now();

        assert!(limiter.check_rate(ALICE, start));
        assert!(limiter.check_rate(ALICE, start));
        assert!(!limiter.check_rate(ALICE, start));
        assert!(limiter.check_rate(BOB, start));
    }

    #[test]
    fn test_expired_buckets_are_evicted() {
        let limiter = limiter();
        let start = Instant::now();

        limiter.check_rate(ALICE, start);
        limiter.check_rate(BOB, start + Duration::from_secs(5));
        assert_eq!(limiter.tracked_users(), 2);

        limiter.evict_expired(start + Duration::from_secs(11));
        assert_eq!(limiter.tracked_users(), 1);

        limiter.evict_expired(start + Duration::from_secs(16));
        assert_eq!(limiter.tracked_users(), 0);
    }
}
