// File: tallybot-core/src/repositories/postgres/command_usage.rs

use async_trait::async_trait;
use sqlx::{Pool, Postgres, Row};

use tallybot_common::error::Error;
use tallybot_common::models::command::CommandUsage;
use tallybot_common::traits::repository_traits::CommandUsageRepository;

pub struct PostgresCommandUsageRepository {
    pub pool: Pool<Postgres>,
}

impl PostgresCommandUsageRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CommandUsageRepository for PostgresCommandUsageRepository {
    async fn insert_usage(&self, usage: &CommandUsage) -> Result<(), Error> {
        sqlx::query(
            r#"
            INSERT INTO command_usage (
                usage_id,
                channel_id,
                command,
                used_at,
                usage_text
            ) VALUES ($1,$2,$3,$4,$5)
            "#,
        )
            .bind(usage.usage_id)
            .bind(&usage.channel_id)
            .bind(&usage.command)
            .bind(usage.used_at)
            .bind(&usage.usage_text)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn list_usage_for_channel(
        &self,
        channel_id: &str,
        limit: i64,
    ) -> Result<Vec<CommandUsage>, Error> {
        let rows = sqlx::query(
            r#"
            SELECT usage_id, channel_id, command, used_at, usage_text
            FROM command_usage
            WHERE LOWER(channel_id) = LOWER($1)
            ORDER BY used_at DESC
            LIMIT $2
            "#,
        )
            .bind(channel_id)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        let mut out = Vec::new();
        for r in rows {
            out.push(CommandUsage {
                usage_id: r.try_get("usage_id")?,
                channel_id: r.try_get("channel_id")?,
                command: r.try_get("command")?,
                used_at: r.try_get("used_at")?,
                usage_text: r.try_get("usage_text")?,
            });
        }
        Ok(out)
    }
}
