// File: tallybot-core/src/services/command_service.rs
//! The chat pipeline: raw message -> resolver -> permission gate ->
//! cooldown gate -> counter mutations / replies.

use std::sync::Arc;

use chrono::Utc;
use dashmap::DashMap;
use tracing::{debug, error, warn};
use uuid::Uuid;

use tallybot_common::models::command::{
    ChannelCommandConfig, ChatCommandContext, CommandAction, CommandUsage,
};
use tallybot_common::models::counter::CounterId;
use tallybot_common::traits::collaborator_traits::ChatResponder;
use tallybot_common::traits::repository_traits::{ChannelConfigRepository, CommandUsageRepository};

use crate::Error;
use crate::services::command_parser::{CommandResolver, ResolvedCommand};
use crate::services::cooldown::CooldownTracker;
use crate::services::counter_service::CounterService;

struct ChannelEntry {
    config: ChannelCommandConfig,
    resolver: CommandResolver,
}

/// Orchestrates handling of one inbound chat message. Runs inline on the
/// delivering task; messages for any mix of channels may run
/// concurrently.
pub struct CommandService {
    config_repo: Arc<dyn ChannelConfigRepository>,
    usage_repo: Arc<dyn CommandUsageRepository>,
    counter_service: Arc<CounterService>,
    responder: Arc<dyn ChatResponder>,
    cooldowns: Arc<CooldownTracker>,

    /// Per-channel compiled config, loaded lazily. We avoid re-querying
    /// and re-parsing config on every message.
    channel_cache: DashMap<String, Arc<ChannelEntry>>,
}

impl CommandService {
    pub fn new(
        config_repo: Arc<dyn ChannelConfigRepository>,
        usage_repo: Arc<dyn CommandUsageRepository>,
        counter_service: Arc<CounterService>,
        responder: Arc<dyn ChatResponder>,
        cooldowns: Arc<CooldownTracker>,
    ) -> Self {
        debug!("Initializing CommandService");
        Self {
            config_repo,
            usage_repo,
            counter_service,
            responder,
            cooldowns,
            channel_cache: DashMap::new(),
        }
    }

    /// Drops the compiled config for a channel; the next message reloads
    /// it. Called when the streamer edits commands or counters.
    pub fn invalidate_channel(&self, channel_id: &str) {
        self.channel_cache.remove(channel_id);
    }

    /// Processes one chat message. Non-commands, unknown commands,
    /// denied permissions, and active cooldowns all return quietly.
    pub async fn handle_chat_message(&self, ctx: &ChatCommandContext) -> Result<(), Error> {
        let text = ctx.message.trim();
        if !text.starts_with('!') {
            return Ok(());
        }

        let entry = self.channel_entry(&ctx.channel_id).await?;
        let Some(resolved) = entry.resolver.resolve(&entry.config, text) else {
            debug!("no command matching '{text}' on {}", ctx.channel_id);
            return Ok(());
        };
        if !resolved.is_enabled {
            debug!("command '{}' is disabled on {}", resolved.cooldown_key, ctx.channel_id);
            return Ok(());
        }
        if !resolved.required_permission.allows(ctx) {
            debug!(
                "sender lacks {} permission for '{}' on {}",
                resolved.required_permission.as_str(),
                resolved.cooldown_key,
                ctx.channel_id
            );
            return Ok(());
        }

        let now = Utc::now();
        if !self.cooldowns.try_acquire(
            &ctx.channel_id,
            &resolved.cooldown_key,
            resolved.cooldown_seconds,
            now,
        ) {
            debug!("'{}' on cooldown for {}", resolved.cooldown_key, ctx.channel_id);
            return Ok(());
        }

        let usage = CommandUsage {
            usage_id: Uuid::new_v4(),
            channel_id: ctx.channel_id.clone(),
            command: resolved.cooldown_key.clone(),
            used_at: now,
            usage_text: Some(ctx.message.clone()),
        };
        if let Err(e) = self.usage_repo.insert_usage(&usage).await {
            error!("Error logging command usage: {e:?}");
        }

        self.dispatch(ctx, &entry.config, &resolved).await
    }

    async fn dispatch(
        &self,
        ctx: &ChatCommandContext,
        config: &ChannelCommandConfig,
        resolved: &ResolvedCommand,
    ) -> Result<(), Error> {
        match resolved.action {
            CommandAction::Query => {
                let reply = self.build_query_reply(ctx, config, resolved).await?;
                self.send_reply(&ctx.channel_id, &reply).await;
            }
            CommandAction::Increment => {
                // Each target is its own read-modify-write; a failed
                // target never blocks the rest (no cross-counter
                // atomicity).
                for target in &resolved.targets {
                    if let Err(e) = self
                        .counter_service
                        .increment(&ctx.channel_id, &target.counter, target.amount)
                        .await
                    {
                        error!(
                            "increment of '{}' failed on {}: {e}",
                            target.counter.as_str(),
                            ctx.channel_id
                        );
                    }
                }
            }
            CommandAction::Decrement => {
                for target in &resolved.targets {
                    if let Err(e) = self
                        .counter_service
                        .decrement(&ctx.channel_id, &target.counter, target.amount)
                        .await
                    {
                        error!(
                            "decrement of '{}' failed on {}: {e}",
                            target.counter.as_str(),
                            ctx.channel_id
                        );
                    }
                }
            }
            CommandAction::Reset => {
                if resolved.targets.is_empty() {
                    self.counter_service.reset_all(&ctx.channel_id).await?;
                } else {
                    for target in &resolved.targets {
                        if let Err(e) =
                            self.counter_service.reset(&ctx.channel_id, &target.counter).await
                        {
                            error!(
                                "reset of '{}' failed on {}: {e}",
                                target.counter.as_str(),
                                ctx.channel_id
                            );
                        }
                    }
                }
            }
            CommandAction::CustomResponse => {
                if let Some(response) = &resolved.response {
                    self.send_reply(&ctx.channel_id, response).await;
                }
            }
        }
        Ok(())
    }

    async fn build_query_reply(
        &self,
        ctx: &ChatCommandContext,
        config: &ChannelCommandConfig,
        resolved: &ResolvedCommand,
    ) -> Result<String, Error> {
        let mut parts = Vec::with_capacity(resolved.targets.len());
        for target in &resolved.targets {
            let value = self.counter_service.query(&ctx.channel_id, &target.counter).await?;
            parts.push(format!("{}: {value}", display_label(config, &target.counter)));
        }
        Ok(parts.join(", "))
    }

    async fn send_reply(&self, channel_id: &str, text: &str) {
        if text.is_empty() {
            return;
        }
        if let Err(e) = self.responder.send_message(channel_id, text).await {
            warn!("failed to send reply to {channel_id}: {e}");
        }
    }

    async fn channel_entry(&self, channel_id: &str) -> Result<Arc<ChannelEntry>, Error> {
        if let Some(entry) = self.channel_cache.get(channel_id) {
            return Ok(entry.clone());
        }
        let config = self.config_repo.get_command_config(channel_id).await?;
        let resolver = CommandResolver::compile(&config);
        let entry = Arc::new(ChannelEntry { config, resolver });
        self.channel_cache.insert(channel_id.to_string(), entry.clone());
        Ok(entry)
    }
}

fn display_label(config: &ChannelCommandConfig, counter: &CounterId) -> String {
    if let CounterId::Custom(id) = counter {
        if let Some(def) = config.custom_definition(id) {
            return def.display_name.clone();
        }
    }
    let canonical = counter.as_str();
    let mut chars = canonical.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}
