// File: src/services/mod.rs

pub mod command_parser;
pub mod command_service;
pub mod cooldown;
pub mod counter_service;
pub mod milestone_service;
pub mod stream_notifier;
pub mod webhook_notifier;

pub use command_service::CommandService;
pub use cooldown::CooldownTracker;
pub use counter_service::CounterService;
pub use milestone_service::MilestoneService;
pub use stream_notifier::StreamStartNotifier;
pub use webhook_notifier::WebhookNotifier;
