// File: tallybot-core/src/services/stream_notifier.rs
//! "Fire exactly once" guard for per-stream-instance notifications.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, warn};

use tallybot_common::models::counter::ChannelCounters;
use tallybot_common::traits::collaborator_traits::MilestoneNotifier;
use tallybot_common::traits::repository_traits::{ChannelConfigRepository, CounterRepository};

use crate::Error;

/// Event type used for the settings gate on stream-start notifications.
pub const STREAM_ONLINE_EVENT: &str = "stream_online";

/// Guards the stream-start notification with optimistic concurrency so a
/// given stream instance notifies at most once.
///
/// Unlike every other write path (plain last-writer-wins upserts), this
/// guard conditions its update on the row's version token and retries a
/// lost race exactly once. A naive read-then-write here duplicates
/// notifications under concurrent stream.online deliveries.
pub struct StreamStartNotifier {
    counter_repo: Arc<dyn CounterRepository>,
    config_repo: Arc<dyn ChannelConfigRepository>,
    notifier: Arc<dyn MilestoneNotifier>,
}

impl StreamStartNotifier {
    pub fn new(
        counter_repo: Arc<dyn CounterRepository>,
        config_repo: Arc<dyn ChannelConfigRepository>,
        notifier: Arc<dyn MilestoneNotifier>,
    ) -> Self {
        Self { counter_repo, config_repo, notifier }
    }

    /// Entry point for a stream.online delivery: claims the stream id
    /// and, on a won claim, dispatches the notification detached from
    /// the caller. Storage errors after the bounded retry propagate; the
    /// caller may simply retry on the next delivery.
    pub async fn handle_stream_online(
        &self,
        channel_id: &str,
        stream_id: &str,
    ) -> Result<(), Error> {
        if !self.claim(channel_id, stream_id).await? {
            debug!("stream {stream_id} on {channel_id} already notified");
            return Ok(());
        }
        self.dispatch(channel_id, stream_id).await;
        Ok(())
    }

    /// Attempts to claim `stream_id` for the channel. Exactly one of any
    /// set of concurrent callers proposing the same id observes `true`.
    pub async fn claim(&self, channel_id: &str, stream_id: &str) -> Result<bool, Error> {
        let mut current = self.counter_repo.get(channel_id).await?;

        if current.is_none() {
            let mut row = ChannelCounters::new(channel_id);
            row.stream_started = Some(Utc::now());
            row.last_notified_stream_id = Some(stream_id.to_string());
            if self.counter_repo.try_insert(&row).await? {
                return Ok(true);
            }
            // Lost the create race; re-read and fall through to the
            // version-conditioned attempt.
            current = self.counter_repo.get(channel_id).await?;
        }

        let mut attempts = 0;
        while let Some(vc) = current {
            if vc.counters.last_notified_stream_id.as_deref() == Some(stream_id) {
                return Ok(false);
            }
            let mut row = vc.counters;
            row.stream_started = Some(Utc::now());
            row.last_notified_stream_id = Some(stream_id.to_string());
            row.last_updated = Utc::now();
            if self.counter_repo.update_if_version(&row, vc.version).await? {
                return Ok(true);
            }
            attempts += 1;
            if attempts > 1 {
                break;
            }
            current = self.counter_repo.get(channel_id).await?;
        }
        Ok(false)
    }

    async fn dispatch(&self, channel_id: &str, stream_id: &str) {
        let settings = match self.config_repo.get_notification_settings(channel_id).await {
            Ok(s) => s,
            Err(e) => {
                warn!("failed to load notification settings for {channel_id}: {e}");
                return;
            }
        };
        let Some(target) = settings.delivery_target() else {
            debug!("notifications disabled for {channel_id}, dropping stream-online");
            return;
        };
        if !settings.is_event_enabled(STREAM_ONLINE_EVENT) {
            debug!("stream-online events not enabled for {channel_id}");
            return;
        }

        let notifier = self.notifier.clone();
        let target = target.to_string();
        let channel = channel_id.to_string();
        let stream = stream_id.to_string();
        tokio::spawn(async move {
            if let Err(e) = notifier.notify_stream_online(&target, &channel, &stream).await {
                warn!("stream-online dispatch failed for {channel}: {e}");
            }
        });
    }
}
