use std::collections::{HashMap, HashSet};
use serde::{Serialize, Deserialize};

/// Per-channel milestone thresholds, keyed by canonical counter id.
/// Lists are kept sorted ascending and deduplicated.
#[derive(Debug, Clone, Default)]
pub struct MilestoneThresholds {
    thresholds: HashMap<String, Vec<i64>>,
}

impl MilestoneThresholds {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, counter_id: &str, mut thresholds: Vec<i64>) {
        thresholds.sort_unstable();
        thresholds.dedup();
        self.thresholds.insert(counter_id.to_lowercase(), thresholds);
    }

    pub fn for_counter(&self, counter_id: &str) -> &[i64] {
        self.thresholds
            .get(&counter_id.to_lowercase())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

/// Channel-level notification configuration. Every field gates dispatch;
/// an unmet gate is a silent no-op, never an error.
#[derive(Debug, Clone, Default)]
pub struct NotificationSettings {
    pub notifications_enabled: bool,

    /// Delivery target for outbound events. Empty/absent suppresses all
    /// dispatch for the channel.
    pub webhook_url: Option<String>,

    /// Event types the streamer opted into, e.g. `death_milestone`,
    /// `stream_online`.
    pub enabled_events: HashSet<String>,
}

impl NotificationSettings {
    pub fn is_event_enabled(&self, event_type: &str) -> bool {
        self.enabled_events.contains(event_type)
    }

    /// The delivery target, if the channel has notifications switched on
    /// and a non-empty target configured.
    pub fn delivery_target(&self) -> Option<&str> {
        if !self.notifications_enabled {
            return None;
        }
        self.webhook_url.as_deref().filter(|url| !url.trim().is_empty())
    }
}

/// Outbound milestone notification payload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MilestoneEvent {
    pub event_type: String,

    /// Counter value after the mutation that crossed the threshold.
    pub count: i64,

    /// Highest configured threshold below the crossed one; 0 when none.
    pub previous_milestone: i64,
}
