//! Per-User Message Rate Limiter
//!
//! Fixed-window limiter guarding chat message throughput. Entries live in a
//! concurrent map keyed by user, so unrelated users never contend on a shared
//! lock; atomicity is per entry only.

use std::time::{Duration, Instant};

use dashmap::DashMap;
use uuid::Uuid;

/// Per-user window state. Transient: created on first message in a window,
/// reset when the window elapses, never persisted.
#[derive(Debug)]
struct WindowEntry {
    window_start: Instant,
    count: u32,
}

/// Fixed-window per-user rate limiter.
pub struct MessageRateLimiter {
    entries: DashMap<Uuid, WindowEntry>,
    window: Duration,
    max_per_window: u32,
}

impl MessageRateLimiter {
    /// Create a limiter allowing `max_per_window` messages per `window`.
    pub fn new(window: Duration, max_per_window: u32) -> Self {
        Self {
            entries: DashMap::new(),
            window,
            max_per_window,
        }
    }

    /// Check whether the user may send another message right now.
    ///
    /// Consumes one slot from the user's current window on success. Rejected
    /// calls have no side effect beyond the window bookkeeping.
    pub fn allow(&self, user_id: Uuid) -> bool {
        self.allow_at(user_id, Instant::now())
    }

    fn allow_at(&self, user_id: Uuid, now: Instant) -> bool {
        // The entry guard holds the shard lock for this key, making the
        // check-and-increment atomic per user.
        let mut entry = self.entries.entry(user_id).or_insert_with(|| WindowEntry {
            window_start: now,
            count: 0,
        });

        if now.duration_since(entry.window_start) >= self.window {
            entry.window_start = now;
            entry.count = 0;
        }

        if entry.count >= self.max_per_window {
            return false;
        }

        entry.count += 1;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limiter() -> MessageRateLimiter {
        MessageRateLimiter::new(Duration::from_secs(1), 5)
    }

    #[test]
    fn sixth_message_in_window_is_rejected() {
        let limiter = limiter();
        let user = Uuid::from_u128(1);
        let start = Instant::now();

        for _ in 0..5 {
            assert!(limiter.allow_at(user, start));
        }
        assert!(!limiter.allow_at(user, start));
        // Still rejected later within the same window
        assert!(!limiter.allow_at(user, start + Duration::from_millis(500)));
    }

    #[test]
    fn window_elapse_resets_the_counter() {
        let limiter = limiter();
        let user = Uuid::from_u128(1);
        let start = Instant::now();

        for _ in 0..5 {
            assert!(limiter.allow_at(user, start));
        }
        assert!(!limiter.allow_at(user, start));

        assert!(limiter.allow_at(user, start + Duration::from_secs(1)));
    }

    #[test]
    fn windows_are_independent_per_user() {
        let limiter = limiter();
        let a = Uuid::from_u128(1);
        let b = Uuid::from_u128(2);
        let start = Instant::now();

        for _ in 0..5 {
            assert!(limiter.allow_at(a, start));
        }
        assert!(!limiter.allow_at(a, start));

        // User B is untouched by A's exhausted window
        assert!(limiter.allow_at(b, start));
    }
}
