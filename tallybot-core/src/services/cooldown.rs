// File: tallybot-core/src/services/cooldown.rs
//! Process-local command rate limiting.

use chrono::{DateTime, Utc};
use dashmap::DashMap;

/// Tracks the last honored firing of each resolved command, keyed by
/// `(channel id, canonical command key)` so every alias of one counter
/// shares a single bucket. State lives only in process memory and resets
/// on restart.
///
/// Constructed explicitly and shared via `Arc` so it can be swapped for a
/// distributed cache and exercised in isolated tests.
#[derive(Debug, Default)]
pub struct CooldownTracker {
    last_fired: DashMap<(String, String), DateTime<Utc>>,
}

impl CooldownTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` and records `now` as the firing timestamp when the
    /// command may run; `false` when a previous firing is still inside
    /// its window. A zero or negative `cooldown_seconds` never
    /// suppresses.
    pub fn try_acquire(
        &self,
        channel_id: &str,
        key: &str,
        cooldown_seconds: i64,
        now: DateTime<Utc>,
    ) -> bool {
        let bucket = (channel_id.to_string(), key.to_string());
        let mut entry = self.last_fired.entry(bucket).or_insert(DateTime::<Utc>::MIN_UTC);
        if cooldown_seconds > 0 {
            let elapsed = now.signed_duration_since(*entry).num_seconds();
            if elapsed < cooldown_seconds {
                return false;
            }
        }
        *entry = now;
        true
    }
}
