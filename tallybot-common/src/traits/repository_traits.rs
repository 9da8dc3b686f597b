// File: tallybot-common/src/traits/repository_traits.rs

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::Error;
use crate::models::command::{ChannelCommandConfig, CommandUsage};
use crate::models::counter::{ChannelCounters, VersionedCounters};
use crate::models::milestone::{MilestoneThresholds, NotificationSettings};

/// Durable per-channel counter storage. One row per channel id.
///
/// `upsert` is the ordinary last-writer-wins full-row replace used by the
/// mutation engine. `try_insert` and `update_if_version` exist for the
/// claim-once guard, which is the only caller that needs conditional
/// writes.
#[async_trait]
pub trait CounterRepository: Send + Sync {
    /// Fetch the channel row together with its current version token.
    /// `None` when the channel has never been written.
    async fn get(&self, channel_id: &str) -> Result<Option<VersionedCounters>, Error>;

    /// Full-row upsert, last-writer-wins. Stamps a fresh version token.
    async fn upsert(&self, counters: &ChannelCounters) -> Result<(), Error>;

    /// Insert a brand-new row; returns `false` when a row for the channel
    /// already exists (concurrent create).
    async fn try_insert(&self, counters: &ChannelCounters) -> Result<bool, Error>;

    /// Replace the row only if its version token still matches `expected`.
    /// Returns `false` when the token moved (someone else wrote first).
    async fn update_if_version(
        &self,
        counters: &ChannelCounters,
        expected: Uuid,
    ) -> Result<bool, Error>;
}

/// Read-only access to streamer-authored channel configuration. Free-text
/// action/permission fields are parsed into their closed enums here, at
/// load time; rows that fail validation are dropped with a warning.
#[async_trait]
pub trait ChannelConfigRepository: Send + Sync {
    async fn get_command_config(&self, channel_id: &str) -> Result<ChannelCommandConfig, Error>;

    async fn get_milestone_thresholds(&self, channel_id: &str)
        -> Result<MilestoneThresholds, Error>;

    async fn get_notification_settings(&self, channel_id: &str)
        -> Result<NotificationSettings, Error>;
}

#[async_trait]
pub trait CommandUsageRepository: Send + Sync {
    async fn insert_usage(&self, usage: &CommandUsage) -> Result<(), Error>;

    async fn list_usage_for_channel(
        &self,
        channel_id: &str,
        limit: i64,
    ) -> Result<Vec<CommandUsage>, Error>;
}
