// File: tallybot-core/src/services/webhook_notifier.rs
//! Outbound notification delivery over HTTP.

use async_trait::async_trait;
use serde_json::json;

use tallybot_common::models::milestone::MilestoneEvent;
use tallybot_common::traits::collaborator_traits::MilestoneNotifier;

use crate::Error;

/// Posts notification events as JSON to the channel's configured
/// delivery target. Failures surface as errors for the dispatch
/// boundary to log; nothing here retries or blocks the mutation path.
pub struct WebhookNotifier {
    client: reqwest::Client,
}

impl WebhookNotifier {
    pub fn new() -> Self {
        Self { client: reqwest::Client::new() }
    }
}

impl Default for WebhookNotifier {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MilestoneNotifier for WebhookNotifier {
    async fn notify_milestone(
        &self,
        target: &str,
        channel_id: &str,
        event: &MilestoneEvent,
    ) -> Result<(), Error> {
        let resp = self
            .client
            .post(target)
            .json(&json!({
                "channelId": channel_id,
                "eventType": event.event_type,
                "count": event.count,
                "previousMilestone": event.previous_milestone,
            }))
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(Error::Platform(format!(
                "notification endpoint returned {}",
                resp.status()
            )));
        }
        Ok(())
    }

    async fn notify_stream_online(
        &self,
        target: &str,
        channel_id: &str,
        stream_id: &str,
    ) -> Result<(), Error> {
        let resp = self
            .client
            .post(target)
            .json(&json!({
                "channelId": channel_id,
                "eventType": "stream_online",
                "streamId": stream_id,
            }))
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(Error::Platform(format!(
                "notification endpoint returned {}",
                resp.status()
            )));
        }
        Ok(())
    }
}
