// File: tallybot-core/src/repositories/mod.rs

pub mod postgres;

pub use postgres::channel_config::PostgresChannelConfigRepository;
pub use postgres::command_usage::PostgresCommandUsageRepository;
pub use postgres::counters::PostgresCounterRepository;
