use std::collections::HashMap;
use chrono::{DateTime, Utc};
use serde::{Serialize, Deserialize};
use uuid::Uuid;

/// Identifies one counter within a channel: a fixed built-in slot or an
/// open custom entry keyed by its configured id.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CounterId {
    Deaths,
    Swears,
    Screams,
    Bits,
    Custom(String),
}

impl CounterId {
    /// Parses a stored counter id. Anything that is not one of the fixed
    /// slots is an open custom-counter id, lowercased for lookup.
    pub fn parse(raw: &str) -> CounterId {
        match raw.trim().to_lowercase().as_str() {
            "deaths" => CounterId::Deaths,
            "swears" => CounterId::Swears,
            "screams" => CounterId::Screams,
            "bits" => CounterId::Bits,
            other => CounterId::Custom(other.to_string()),
        }
    }

    /// Canonical id used in storage, config, and milestone threshold keys.
    pub fn as_str(&self) -> &str {
        match self {
            CounterId::Deaths => "deaths",
            CounterId::Swears => "swears",
            CounterId::Screams => "screams",
            CounterId::Bits => "bits",
            CounterId::Custom(id) => id.as_str(),
        }
    }

    /// Event-type string for milestone notifications, e.g. `death_milestone`.
    pub fn milestone_event_type(&self) -> String {
        match self {
            CounterId::Deaths => "death_milestone".to_string(),
            CounterId::Swears => "swear_milestone".to_string(),
            CounterId::Screams => "scream_milestone".to_string(),
            CounterId::Bits => "bits_milestone".to_string(),
            CounterId::Custom(id) => format!("{id}_milestone"),
        }
    }

    pub fn is_custom(&self) -> bool {
        matches!(self, CounterId::Custom(_))
    }
}

/// Per-channel counter state. One row per channel; every value stays >= 0.
/// Mutated only by the counter service, created lazily all-zero on first use.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelCounters {
    pub channel_id: String,
    pub deaths: i64,
    pub swears: i64,
    pub screams: i64,
    pub bits: i64,

    /// Open custom-counter map: counter id -> current value.
    pub custom: HashMap<String, i64>,

    pub stream_started: Option<DateTime<Utc>>,
    pub last_updated: DateTime<Utc>,

    /// Stream instance id that most recently produced a stream-start
    /// notification; the claim-once guard conditions its writes on this.
    pub last_notified_stream_id: Option<String>,
}

impl ChannelCounters {
    pub fn new(channel_id: &str) -> Self {
        Self {
            channel_id: channel_id.to_string(),
            deaths: 0,
            swears: 0,
            screams: 0,
            bits: 0,
            custom: HashMap::new(),
            stream_started: None,
            last_updated: Utc::now(),
            last_notified_stream_id: None,
        }
    }

    /// Current value of one counter; 0 for a custom counter never set.
    pub fn value(&self, counter: &CounterId) -> i64 {
        match counter {
            CounterId::Deaths => self.deaths,
            CounterId::Swears => self.swears,
            CounterId::Screams => self.screams,
            CounterId::Bits => self.bits,
            CounterId::Custom(id) => self.custom.get(id).copied().unwrap_or(0),
        }
    }

    /// Writes one counter value. Inserts the entry for a custom counter;
    /// callers enforce the create-on-increment-only rule before calling.
    pub fn set_value(&mut self, counter: &CounterId, value: i64) {
        match counter {
            CounterId::Deaths => self.deaths = value,
            CounterId::Swears => self.swears = value,
            CounterId::Screams => self.screams = value,
            CounterId::Bits => self.bits = value,
            CounterId::Custom(id) => {
                self.custom.insert(id.clone(), value);
            }
        }
    }

    /// Whether the counter exists in this row. Fixed slots always exist;
    /// a custom counter exists only once an increment has created it.
    pub fn has_counter(&self, counter: &CounterId) -> bool {
        match counter {
            CounterId::Custom(id) => self.custom.contains_key(id),
            _ => true,
        }
    }
}

/// A counters row together with the version token it carried when read.
/// The token changes on every write; the claim-once guard uses it for its
/// compare-and-swap updates.
#[derive(Debug, Clone)]
pub struct VersionedCounters {
    pub counters: ChannelCounters,
    pub version: Uuid,
}
