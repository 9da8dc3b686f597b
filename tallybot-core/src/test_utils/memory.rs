// File: tallybot-core/src/test_utils/memory.rs
//! In-memory repository and collaborator implementations for tests.
//!
//! The counter repository honors the same version-token contract as the
//! Postgres implementation, so the claim-once guard can be exercised
//! without a database.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::mpsc;
use uuid::Uuid;

use tallybot_common::error::Error;
use tallybot_common::models::command::ChannelCommandConfig;
use tallybot_common::models::command::CommandUsage;
use tallybot_common::models::counter::{ChannelCounters, VersionedCounters};
use tallybot_common::models::milestone::{MilestoneEvent, MilestoneThresholds, NotificationSettings};
use tallybot_common::traits::collaborator_traits::{
    ChatResponder, MilestoneNotifier, OverlayPublisher,
};
use tallybot_common::traits::repository_traits::{
    ChannelConfigRepository, CommandUsageRepository, CounterRepository,
};

#[derive(Default)]
pub struct InMemoryCounterRepository {
    rows: Mutex<HashMap<String, VersionedCounters>>,
    saves: AtomicUsize,
}

impl InMemoryCounterRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_counters(counters: ChannelCounters) -> Self {
        let repo = Self::new();
        repo.rows.lock().unwrap().insert(
            counters.channel_id.clone(),
            VersionedCounters { counters, version: Uuid::new_v4() },
        );
        repo
    }

    /// Number of writes committed so far, across all channels.
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CounterRepository for InMemoryCounterRepository {
    async fn get(&self, channel_id: &str) -> Result<Option<VersionedCounters>, Error> {
        Ok(self.rows.lock().unwrap().get(channel_id).cloned())
    }

    async fn upsert(&self, counters: &ChannelCounters) -> Result<(), Error> {
        let mut rows = self.rows.lock().unwrap();
        rows.insert(
            counters.channel_id.clone(),
            VersionedCounters { counters: counters.clone(), version: Uuid::new_v4() },
        );
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn try_insert(&self, counters: &ChannelCounters) -> Result<bool, Error> {
        let mut rows = self.rows.lock().unwrap();
        if rows.contains_key(&counters.channel_id) {
            return Ok(false);
        }
        rows.insert(
            counters.channel_id.clone(),
            VersionedCounters { counters: counters.clone(), version: Uuid::new_v4() },
        );
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(true)
    }

    async fn update_if_version(
        &self,
        counters: &ChannelCounters,
        expected: Uuid,
    ) -> Result<bool, Error> {
        let mut rows = self.rows.lock().unwrap();
        match rows.get_mut(&counters.channel_id) {
            Some(row) if row.version == expected => {
                *row = VersionedCounters { counters: counters.clone(), version: Uuid::new_v4() };
                self.saves.fetch_add(1, Ordering::SeqCst);
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

#[derive(Default)]
pub struct InMemoryConfigRepository {
    configs: Mutex<HashMap<String, ChannelCommandConfig>>,
    thresholds: Mutex<HashMap<String, MilestoneThresholds>>,
    settings: Mutex<HashMap<String, NotificationSettings>>,
}

impl InMemoryConfigRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_config(&self, config: ChannelCommandConfig) {
        self.configs.lock().unwrap().insert(config.channel_id.clone(), config);
    }

    pub fn set_thresholds(&self, channel_id: &str, thresholds: MilestoneThresholds) {
        self.thresholds.lock().unwrap().insert(channel_id.to_string(), thresholds);
    }

    pub fn set_settings(&self, channel_id: &str, settings: NotificationSettings) {
        self.settings.lock().unwrap().insert(channel_id.to_string(), settings);
    }
}

#[async_trait]
impl ChannelConfigRepository for InMemoryConfigRepository {
    async fn get_command_config(&self, channel_id: &str) -> Result<ChannelCommandConfig, Error> {
        Ok(self
            .configs
            .lock()
            .unwrap()
            .get(channel_id)
            .cloned()
            .unwrap_or_else(|| ChannelCommandConfig {
                channel_id: channel_id.to_string(),
                ..Default::default()
            }))
    }

    async fn get_milestone_thresholds(
        &self,
        channel_id: &str,
    ) -> Result<MilestoneThresholds, Error> {
        Ok(self
            .thresholds
            .lock()
            .unwrap()
            .get(channel_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn get_notification_settings(
        &self,
        channel_id: &str,
    ) -> Result<NotificationSettings, Error> {
        Ok(self
            .settings
            .lock()
            .unwrap()
            .get(channel_id)
            .cloned()
            .unwrap_or_default())
    }
}

#[derive(Default)]
pub struct InMemoryCommandUsageRepository {
    usages: Mutex<Vec<CommandUsage>>,
}

impl InMemoryCommandUsageRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn usages(&self) -> Vec<CommandUsage> {
        self.usages.lock().unwrap().clone()
    }
}

#[async_trait]
impl CommandUsageRepository for InMemoryCommandUsageRepository {
    async fn insert_usage(&self, usage: &CommandUsage) -> Result<(), Error> {
        self.usages.lock().unwrap().push(usage.clone());
        Ok(())
    }

    async fn list_usage_for_channel(
        &self,
        channel_id: &str,
        limit: i64,
    ) -> Result<Vec<CommandUsage>, Error> {
        let usages = self.usages.lock().unwrap();
        Ok(usages
            .iter()
            .filter(|u| u.channel_id == channel_id)
            .take(limit.max(0) as usize)
            .cloned()
            .collect())
    }
}

#[derive(Default)]
pub struct RecordingResponder {
    messages: Mutex<Vec<(String, String)>>,
}

impl RecordingResponder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> Vec<(String, String)> {
        self.messages.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatResponder for RecordingResponder {
    async fn send_message(&self, channel_id: &str, text: &str) -> Result<(), Error> {
        self.messages
            .lock()
            .unwrap()
            .push((channel_id.to_string(), text.to_string()));
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingOverlay {
    updates: Mutex<Vec<ChannelCounters>>,
}

impl RecordingOverlay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn updates(&self) -> Vec<ChannelCounters> {
        self.updates.lock().unwrap().clone()
    }
}

#[async_trait]
impl OverlayPublisher for RecordingOverlay {
    async fn publish_counters(&self, counters: &ChannelCounters) -> Result<(), Error> {
        self.updates.lock().unwrap().push(counters.clone());
        Ok(())
    }
}

/// One captured notifier call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotifierCall {
    Milestone {
        target: String,
        channel_id: String,
        event: MilestoneEvent,
    },
    StreamOnline {
        target: String,
        channel_id: String,
        stream_id: String,
    },
}

/// Notifier that forwards calls onto a channel, so tests can await
/// fire-and-forget dispatches with `tokio::time::timeout`.
pub struct RecordingNotifier {
    tx: mpsc::UnboundedSender<NotifierCall>,
}

impl RecordingNotifier {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<NotifierCall>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

#[async_trait]
impl MilestoneNotifier for RecordingNotifier {
    async fn notify_milestone(
        &self,
        target: &str,
        channel_id: &str,
        event: &MilestoneEvent,
    ) -> Result<(), Error> {
        let _ = self.tx.send(NotifierCall::Milestone {
            target: target.to_string(),
            channel_id: channel_id.to_string(),
            event: event.clone(),
        });
        Ok(())
    }

    async fn notify_stream_online(
        &self,
        target: &str,
        channel_id: &str,
        stream_id: &str,
    ) -> Result<(), Error> {
        let _ = self.tx.send(NotifierCall::StreamOnline {
            target: target.to_string(),
            channel_id: channel_id.to_string(),
            stream_id: stream_id.to_string(),
        });
        Ok(())
    }
}
