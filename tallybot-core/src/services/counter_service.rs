// File: tallybot-core/src/services/counter_service.rs
//! Durable counter mutations for a channel.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, warn};

use tallybot_common::models::counter::{ChannelCounters, CounterId};
use tallybot_common::traits::collaborator_traits::OverlayPublisher;
use tallybot_common::traits::repository_traits::CounterRepository;

use crate::Error;
use crate::services::milestone_service::MilestoneService;

/// Applies query/increment/decrement/reset against the per-channel row.
///
/// Every committed mutation persists the full row (last-writer-wins),
/// pushes the new state to the overlay, and feeds the milestone
/// evaluator. Writes for different channels are fully independent.
pub struct CounterService {
    counter_repo: Arc<dyn CounterRepository>,
    overlay: Arc<dyn OverlayPublisher>,
    milestones: Arc<MilestoneService>,
}

impl CounterService {
    pub fn new(
        counter_repo: Arc<dyn CounterRepository>,
        overlay: Arc<dyn OverlayPublisher>,
        milestones: Arc<MilestoneService>,
    ) -> Self {
        Self { counter_repo, overlay, milestones }
    }

    /// Current value of one counter; 0 when the channel has no row yet.
    pub async fn query(&self, channel_id: &str, counter: &CounterId) -> Result<i64, Error> {
        let counters = self.load_or_default(channel_id).await?;
        Ok(counters.value(counter))
    }

    /// Adds `delta` (already multiplied and clamped by the resolver).
    /// An unknown custom counter is created by its first increment.
    pub async fn increment(
        &self,
        channel_id: &str,
        counter: &CounterId,
        delta: i64,
    ) -> Result<ChannelCounters, Error> {
        let mut counters = self.load_or_default(channel_id).await?;
        let previous = counters.value(counter);
        let new = previous.saturating_add(delta.max(0));
        counters.set_value(counter, new);
        let counters = self.commit(counters).await?;
        self.milestones
            .handle_mutation(channel_id, counter, previous, new)
            .await;
        Ok(counters)
    }

    /// Subtracts `delta`, flooring at zero. Never creates a custom
    /// counter: decrementing an unknown one is a no-op.
    pub async fn decrement(
        &self,
        channel_id: &str,
        counter: &CounterId,
        delta: i64,
    ) -> Result<ChannelCounters, Error> {
        let mut counters = self.load_or_default(channel_id).await?;
        if !counters.has_counter(counter) {
            debug!("decrement on unknown custom counter '{}', ignoring", counter.as_str());
            return Ok(counters);
        }
        let previous = counters.value(counter);
        counters.set_value(counter, (previous - delta.max(0)).max(0));
        self.commit(counters).await
    }

    /// Sets one counter to 0. Never creates a custom counter.
    pub async fn reset(
        &self,
        channel_id: &str,
        counter: &CounterId,
    ) -> Result<ChannelCounters, Error> {
        let mut counters = self.load_or_default(channel_id).await?;
        if !counters.has_counter(counter) {
            debug!("reset on unknown custom counter '{}', ignoring", counter.as_str());
            return Ok(counters);
        }
        counters.set_value(counter, 0);
        self.commit(counters).await
    }

    /// Zeroes deaths, swears, and screams. Bits and custom counters are
    /// preserved.
    pub async fn reset_all(&self, channel_id: &str) -> Result<ChannelCounters, Error> {
        let mut counters = self.load_or_default(channel_id).await?;
        counters.deaths = 0;
        counters.swears = 0;
        counters.screams = 0;
        self.commit(counters).await
    }

    async fn load_or_default(&self, channel_id: &str) -> Result<ChannelCounters, Error> {
        Ok(self
            .counter_repo
            .get(channel_id)
            .await?
            .map(|vc| vc.counters)
            .unwrap_or_else(|| ChannelCounters::new(channel_id)))
    }

    /// Persists the mutated row, then pushes the committed state to the
    /// overlay. Overlay failures are logged and never unwind the commit.
    async fn commit(&self, mut counters: ChannelCounters) -> Result<ChannelCounters, Error> {
        counters.last_updated = Utc::now();
        self.counter_repo.upsert(&counters).await?;
        if let Err(e) = self.overlay.publish_counters(&counters).await {
            warn!("overlay push failed for channel {}: {e}", counters.channel_id);
        }
        Ok(counters)
    }
}
