// File: tallybot-core/src/repositories/postgres/channel_config.rs
//! Streamer-authored configuration, validated at load time.

use std::collections::{HashMap, HashSet};
use std::str::FromStr;

use async_trait::async_trait;
use sqlx::{Pool, Postgres, Row};
use tracing::warn;

use tallybot_common::error::Error;
use tallybot_common::models::command::{
    ChannelCommandConfig, ChatCommandDefinition, CommandAction, CustomCounterDefinition,
    PermissionLevel,
};
use tallybot_common::models::milestone::{MilestoneThresholds, NotificationSettings};
use tallybot_common::traits::repository_traits::ChannelConfigRepository;

pub struct PostgresChannelConfigRepository {
    pub pool: Pool<Postgres>,
}

impl PostgresChannelConfigRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.to_lowercase())
        .collect()
}

#[async_trait]
impl ChannelConfigRepository for PostgresChannelConfigRepository {
    async fn get_command_config(&self, channel_id: &str) -> Result<ChannelCommandConfig, Error> {
        let command_rows = sqlx::query(
            r#"
            SELECT
                command,
                action,
                counter_ids,
                min_permission,
                cooldown_seconds,
                is_enabled,
                response_text
            FROM chat_commands
            WHERE LOWER(channel_id) = LOWER($1)
            ORDER BY command ASC
            "#,
        )
            .bind(channel_id)
            .fetch_all(&self.pool)
            .await?;

        // Free-text action/permission columns are parsed here, once;
        // rows that fail validation are dropped with a warning.
        let mut commands = Vec::new();
        for r in command_rows {
            let command: String = r.try_get("command")?;
            let action_raw: String = r.try_get("action")?;
            let permission_raw: String = r.try_get("min_permission")?;

            let action = match CommandAction::from_str(&action_raw) {
                Ok(a) => a,
                Err(e) => {
                    warn!("channel {channel_id}: dropping command '{command}': {e}");
                    continue;
                }
            };
            let required_permission = match PermissionLevel::from_str(&permission_raw) {
                Ok(p) => p,
                Err(e) => {
                    warn!("channel {channel_id}: dropping command '{command}': {e}");
                    continue;
                }
            };

            let counter_ids_raw: String = r.try_get("counter_ids")?;
            commands.push(ChatCommandDefinition {
                command,
                action,
                counter_ids: split_list(&counter_ids_raw),
                required_permission,
                cooldown_seconds: r.try_get("cooldown_seconds")?,
                is_enabled: r.try_get("is_enabled")?,
                response: r.try_get("response_text")?,
            });
        }

        let counter_rows = sqlx::query(
            r#"
            SELECT
                counter_id,
                display_name,
                alias_command,
                long_command,
                increment_by,
                decrement_by
            FROM custom_counters
            WHERE LOWER(channel_id) = LOWER($1)
            ORDER BY counter_id ASC
            "#,
        )
            .bind(channel_id)
            .fetch_all(&self.pool)
            .await?;

        let mut custom_counters = Vec::new();
        for r in counter_rows {
            custom_counters.push(CustomCounterDefinition {
                counter_id: r.try_get("counter_id")?,
                display_name: r.try_get("display_name")?,
                alias_command: r.try_get("alias_command")?,
                long_command: r.try_get("long_command")?,
                increment_by: r.try_get("increment_by")?,
                decrement_by: r.try_get("decrement_by")?,
            });
        }

        let settings_row = sqlx::query(
            "SELECT max_increment_amount FROM channel_settings WHERE LOWER(channel_id) = LOWER($1)",
        )
            .bind(channel_id)
            .fetch_optional(&self.pool)
            .await?;
        let max_increment_amount = match settings_row {
            Some(r) => r.try_get("max_increment_amount")?,
            None => 0,
        };

        Ok(ChannelCommandConfig {
            channel_id: channel_id.to_string(),
            commands,
            custom_counters,
            max_increment_amount,
        })
    }

    async fn get_milestone_thresholds(
        &self,
        channel_id: &str,
    ) -> Result<MilestoneThresholds, Error> {
        let rows = sqlx::query(
            r#"
            SELECT counter_id, threshold
            FROM milestones
            WHERE LOWER(channel_id) = LOWER($1)
            ORDER BY counter_id ASC, threshold ASC
            "#,
        )
            .bind(channel_id)
            .fetch_all(&self.pool)
            .await?;

        let mut grouped: HashMap<String, Vec<i64>> = HashMap::new();
        for r in rows {
            let counter_id: String = r.try_get("counter_id")?;
            let threshold: i64 = r.try_get("threshold")?;
            grouped.entry(counter_id).or_default().push(threshold);
        }

        let mut thresholds = MilestoneThresholds::new();
        for (counter_id, list) in grouped {
            thresholds.insert(&counter_id, list);
        }
        Ok(thresholds)
    }

    async fn get_notification_settings(
        &self,
        channel_id: &str,
    ) -> Result<NotificationSettings, Error> {
        let row_opt = sqlx::query(
            r#"
            SELECT notifications_enabled, webhook_url, enabled_events
            FROM channel_settings
            WHERE LOWER(channel_id) = LOWER($1)
            "#,
        )
            .bind(channel_id)
            .fetch_optional(&self.pool)
            .await?;

        let Some(r) = row_opt else {
            return Ok(NotificationSettings::default());
        };

        let enabled_events_raw: String = r.try_get("enabled_events")?;
        Ok(NotificationSettings {
            notifications_enabled: r.try_get("notifications_enabled")?,
            webhook_url: r.try_get("webhook_url")?,
            enabled_events: split_list(&enabled_events_raw)
                .into_iter()
                .collect::<HashSet<String>>(),
        })
    }
}
