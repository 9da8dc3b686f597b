// File: tallybot-core/src/repositories/postgres/counters.rs

use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::{Pool, Postgres, Row};
use sqlx::postgres::PgRow;
use uuid::Uuid;

use tallybot_common::error::Error;
use tallybot_common::models::counter::{ChannelCounters, VersionedCounters};
use tallybot_common::traits::repository_traits::CounterRepository;

pub struct PostgresCounterRepository {
    pub pool: Pool<Postgres>,
}

impl PostgresCounterRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    fn row_to_versioned(r: &PgRow) -> Result<VersionedCounters, Error> {
        let custom_json: serde_json::Value = r.try_get("custom_counters")?;
        let custom: HashMap<String, i64> = serde_json::from_value(custom_json)?;
        Ok(VersionedCounters {
            counters: ChannelCounters {
                channel_id: r.try_get("channel_id")?,
                deaths: r.try_get("deaths")?,
                swears: r.try_get("swears")?,
                screams: r.try_get("screams")?,
                bits: r.try_get("bits")?,
                custom,
                stream_started: r.try_get("stream_started")?,
                last_updated: r.try_get("last_updated")?,
                last_notified_stream_id: r.try_get("last_notified_stream_id")?,
            },
            version: r.try_get("version")?,
        })
    }
}

#[async_trait]
impl CounterRepository for PostgresCounterRepository {
    async fn get(&self, channel_id: &str) -> Result<Option<VersionedCounters>, Error> {
        let row_opt = sqlx::query(
            r#"
            SELECT
                channel_id,
                deaths,
                swears,
                screams,
                bits,
                custom_counters,
                stream_started,
                last_updated,
                last_notified_stream_id,
                version
            FROM channel_counters
            WHERE channel_id = $1
            "#,
        )
            .bind(channel_id)
            .fetch_optional(&self.pool)
            .await?;

        if let Some(r) = row_opt {
            Ok(Some(Self::row_to_versioned(&r)?))
        } else {
            Ok(None)
        }
    }

    async fn upsert(&self, counters: &ChannelCounters) -> Result<(), Error> {
        let custom = serde_json::to_value(&counters.custom)?;
        sqlx::query(
            r#"
            INSERT INTO channel_counters (
                channel_id,
                deaths,
                swears,
                screams,
                bits,
                custom_counters,
                stream_started,
                last_updated,
                last_notified_stream_id,
                version
            )
            VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10)
            ON CONFLICT (channel_id) DO UPDATE SET
                deaths = EXCLUDED.deaths,
                swears = EXCLUDED.swears,
                screams = EXCLUDED.screams,
                bits = EXCLUDED.bits,
                custom_counters = EXCLUDED.custom_counters,
                stream_started = EXCLUDED.stream_started,
                last_updated = EXCLUDED.last_updated,
                last_notified_stream_id = EXCLUDED.last_notified_stream_id,
                version = EXCLUDED.version
            "#,
        )
            .bind(&counters.channel_id)
            .bind(counters.deaths)
            .bind(counters.swears)
            .bind(counters.screams)
            .bind(counters.bits)
            .bind(custom)
            .bind(counters.stream_started)
            .bind(counters.last_updated)
            .bind(&counters.last_notified_stream_id)
            .bind(Uuid::new_v4())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn try_insert(&self, counters: &ChannelCounters) -> Result<bool, Error> {
        let custom = serde_json::to_value(&counters.custom)?;
        let result = sqlx::query(
            r#"
            INSERT INTO channel_counters (
                channel_id,
                deaths,
                swears,
                screams,
                bits,
                custom_counters,
                stream_started,
                last_updated,
                last_notified_stream_id,
                version
            )
            VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10)
            ON CONFLICT (channel_id) DO NOTHING
            "#,
        )
            .bind(&counters.channel_id)
            .bind(counters.deaths)
            .bind(counters.swears)
            .bind(counters.screams)
            .bind(counters.bits)
            .bind(custom)
            .bind(counters.stream_started)
            .bind(counters.last_updated)
            .bind(&counters.last_notified_stream_id)
            .bind(Uuid::new_v4())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn update_if_version(
        &self,
        counters: &ChannelCounters,
        expected: Uuid,
    ) -> Result<bool, Error> {
        let custom = serde_json::to_value(&counters.custom)?;
        let result = sqlx::query(
            r#"
            UPDATE channel_counters
            SET
                deaths = $2,
                swears = $3,
                screams = $4,
                bits = $5,
                custom_counters = $6,
                stream_started = $7,
                last_updated = $8,
                last_notified_stream_id = $9,
                version = $10
            WHERE channel_id = $1
              AND version = $11
            "#,
        )
            .bind(&counters.channel_id)
            .bind(counters.deaths)
            .bind(counters.swears)
            .bind(counters.screams)
            .bind(counters.bits)
            .bind(custom)
            .bind(counters.stream_started)
            .bind(counters.last_updated)
            .bind(&counters.last_notified_stream_id)
            .bind(Uuid::new_v4())
            .bind(expected)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() == 1)
    }
}
