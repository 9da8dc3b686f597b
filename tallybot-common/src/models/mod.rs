// File: tallybot-common/src/models/mod.rs
pub mod command;
pub mod counter;
pub mod milestone;

pub use command::{
    ChatCommandContext, ChatCommandDefinition, ChannelCommandConfig, CommandAction, CommandUsage,
    CustomCounterDefinition, PermissionLevel,
};
pub use counter::{ChannelCounters, CounterId, VersionedCounters};
pub use milestone::{MilestoneEvent, MilestoneThresholds, NotificationSettings};
