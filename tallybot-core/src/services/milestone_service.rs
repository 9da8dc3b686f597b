// File: tallybot-core/src/services/milestone_service.rs
//! Threshold-crossing detection and notification dispatch.

use std::sync::Arc;

use tracing::{debug, warn};

use tallybot_common::models::counter::CounterId;
use tallybot_common::models::milestone::MilestoneEvent;
use tallybot_common::traits::collaborator_traits::MilestoneNotifier;
use tallybot_common::traits::repository_traits::ChannelConfigRepository;

/// Watches committed mutations for upward threshold crossings.
///
/// A milestone fires when some configured threshold `T` satisfies
/// `previous < T <= new`. A jump that crosses several thresholds at once
/// reports only the highest one, so a `+50` does not burst out a
/// notification per threshold.
pub struct MilestoneService {
    config_repo: Arc<dyn ChannelConfigRepository>,
    notifier: Arc<dyn MilestoneNotifier>,
}

impl MilestoneService {
    pub fn new(
        config_repo: Arc<dyn ChannelConfigRepository>,
        notifier: Arc<dyn MilestoneNotifier>,
    ) -> Self {
        Self { config_repo, notifier }
    }

    /// Called by the counter service after a mutation has committed.
    /// Must never fail or block the mutation path: every unmet gate is a
    /// silent no-op and dispatch runs detached.
    pub async fn handle_mutation(
        &self,
        channel_id: &str,
        counter: &CounterId,
        previous: i64,
        new: i64,
    ) {
        if new <= previous {
            return;
        }

        let thresholds = match self.config_repo.get_milestone_thresholds(channel_id).await {
            Ok(t) => t,
            Err(e) => {
                warn!("failed to load milestone thresholds for {channel_id}: {e}");
                return;
            }
        };
        let configured = thresholds.for_counter(counter.as_str());
        let Some(crossed) = configured
            .iter()
            .copied()
            .filter(|t| previous < *t && *t <= new)
            .max()
        else {
            return;
        };
        let previous_milestone = configured
            .iter()
            .copied()
            .filter(|t| *t < crossed)
            .max()
            .unwrap_or(0);

        let settings = match self.config_repo.get_notification_settings(channel_id).await {
            Ok(s) => s,
            Err(e) => {
                warn!("failed to load notification settings for {channel_id}: {e}");
                return;
            }
        };
        let Some(target) = settings.delivery_target() else {
            debug!("notifications disabled for {channel_id}, dropping milestone");
            return;
        };
        let event_type = counter.milestone_event_type();
        if !settings.is_event_enabled(&event_type) {
            debug!("event type {event_type} not enabled for {channel_id}");
            return;
        }

        let event = MilestoneEvent { event_type, count: new, previous_milestone };
        let notifier = self.notifier.clone();
        let target = target.to_string();
        let channel = channel_id.to_string();
        tokio::spawn(async move {
            if let Err(e) = notifier.notify_milestone(&target, &channel, &event).await {
                warn!("milestone dispatch failed for {channel}: {e}");
            }
        });
    }
}
