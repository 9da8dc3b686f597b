use std::str::FromStr;
use chrono::{DateTime, Utc};
use serde::{Serialize, Deserialize};
use uuid::Uuid;

use crate::error::Error;

/// What a matched chat command does. Stored as free text in config and
/// parsed exactly once at load time; nothing re-interprets strings per
/// message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandAction {
    Query,
    Increment,
    Decrement,
    Reset,
    CustomResponse,
}

impl CommandAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            CommandAction::Query => "query",
            CommandAction::Increment => "increment",
            CommandAction::Decrement => "decrement",
            CommandAction::Reset => "reset",
            CommandAction::CustomResponse => "customresponse",
        }
    }
}

impl FromStr for CommandAction {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "query" => Ok(CommandAction::Query),
            "increment" => Ok(CommandAction::Increment),
            "decrement" => Ok(CommandAction::Decrement),
            "reset" => Ok(CommandAction::Reset),
            "customresponse" | "custom_response" => Ok(CommandAction::CustomResponse),
            other => Err(Error::Config(format!("unknown command action '{other}'"))),
        }
    }
}

/// Who may use a command. Four independent flags, not a hierarchy:
/// a moderator does not implicitly hold broadcaster permission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionLevel {
    Everyone,
    Subscriber,
    Moderator,
    Broadcaster,
}

impl PermissionLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            PermissionLevel::Everyone => "everyone",
            PermissionLevel::Subscriber => "subscriber",
            PermissionLevel::Moderator => "moderator",
            PermissionLevel::Broadcaster => "broadcaster",
        }
    }

    pub fn allows(&self, ctx: &ChatCommandContext) -> bool {
        match self {
            PermissionLevel::Everyone => true,
            PermissionLevel::Subscriber => ctx.is_subscriber,
            PermissionLevel::Moderator => ctx.is_moderator,
            PermissionLevel::Broadcaster => ctx.is_broadcaster,
        }
    }
}

impl FromStr for PermissionLevel {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "everyone" => Ok(PermissionLevel::Everyone),
            "subscriber" => Ok(PermissionLevel::Subscriber),
            "moderator" => Ok(PermissionLevel::Moderator),
            "broadcaster" => Ok(PermissionLevel::Broadcaster),
            other => Err(Error::Config(format!("unknown permission level '{other}'"))),
        }
    }
}

/// One entry in a channel's command table, already validated and
/// canonicalized at config-load time.
#[derive(Debug, Clone)]
pub struct ChatCommandDefinition {
    /// Canonical command token including the leading `!`.
    pub command: String,
    pub action: CommandAction,

    /// Ordered target counter ids; comma-joined in storage for
    /// multi-counter actions. Empty for a `Reset` means reset-all, and
    /// stays empty for `CustomResponse`.
    pub counter_ids: Vec<String>,

    pub required_permission: PermissionLevel,
    pub cooldown_seconds: i64,
    pub is_enabled: bool,

    /// Static reply text for `CustomResponse`.
    pub response: Option<String>,
}

/// Streamer-authored custom counter. Read-only input to the resolver and
/// the mutation engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomCounterDefinition {
    pub counter_id: String,
    pub display_name: String,
    pub alias_command: Option<String>,
    pub long_command: Option<String>,
    pub increment_by: i64,
    pub decrement_by: i64,
}

impl CustomCounterDefinition {
    pub fn new(counter_id: &str, display_name: &str) -> Self {
        Self {
            counter_id: counter_id.to_string(),
            display_name: display_name.to_string(),
            alias_command: None,
            long_command: None,
            increment_by: 1,
            decrement_by: 1,
        }
    }
}

/// Everything the resolver needs for one channel, loaded from the config
/// repository in one shot.
#[derive(Debug, Clone, Default)]
pub struct ChannelCommandConfig {
    pub channel_id: String,
    pub commands: Vec<ChatCommandDefinition>,
    pub custom_counters: Vec<CustomCounterDefinition>,

    /// Ceiling applied to any single resolved mutation amount.
    pub max_increment_amount: i64,
}

impl ChannelCommandConfig {
    pub fn custom_definition(&self, counter_id: &str) -> Option<&CustomCounterDefinition> {
        self.custom_counters
            .iter()
            .find(|c| c.counter_id.eq_ignore_ascii_case(counter_id))
    }
}

/// Ephemeral per-message value handed in by the chat transport.
#[derive(Debug, Clone)]
pub struct ChatCommandContext {
    pub channel_id: String,
    pub message: String,
    pub is_moderator: bool,
    pub is_broadcaster: bool,
    pub is_subscriber: bool,
}

/// Audit record written when a command clears the permission and cooldown
/// gates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandUsage {
    pub usage_id: Uuid,
    pub channel_id: String,
    pub command: String,
    pub used_at: DateTime<Utc>,
    pub usage_text: Option<String>,
}
