// File: tallybot-common/src/traits/collaborator_traits.rs

use async_trait::async_trait;

use crate::error::Error;
use crate::models::counter::ChannelCounters;
use crate::models::milestone::MilestoneEvent;

/// Outbound chat replies. Invoked at most once per matched query or
/// custom-response command; mutation commands never reply.
#[async_trait]
pub trait ChatResponder: Send + Sync {
    async fn send_message(&self, channel_id: &str, text: &str) -> Result<(), Error>;
}

/// On-stream overlay updates. Receives the full post-mutation counter
/// state after every committed write.
#[async_trait]
pub trait OverlayPublisher: Send + Sync {
    async fn publish_counters(&self, counters: &ChannelCounters) -> Result<(), Error>;
}

/// Outbound notifications to the channel's configured delivery target.
/// Dispatch failures are logged at the call site and never unwind into
/// the mutation that triggered them.
#[async_trait]
pub trait MilestoneNotifier: Send + Sync {
    async fn notify_milestone(
        &self,
        target: &str,
        channel_id: &str,
        event: &MilestoneEvent,
    ) -> Result<(), Error>;

    async fn notify_stream_online(
        &self,
        target: &str,
        channel_id: &str,
        stream_id: &str,
    ) -> Result<(), Error>;
}
