//! src/eventbus/mod.rs
//!
//! Provides an in-process event bus that supports guaranteed delivery
//! to multiple subscribers via bounded MPSC queues. The overlay consumes
//! counter updates from here; anything else (diagnostics, future
//! integrations) can subscribe too.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::{mpsc, watch, Mutex};

use tallybot_common::models::counter::ChannelCounters;
use tallybot_common::traits::collaborator_traits::OverlayPublisher;
use crate::Error;

/// Events various parts of the bot can publish or subscribe to.
#[derive(Debug, Clone)]
pub enum BotEvent {
    /// Full post-mutation counter state for a channel.
    CounterUpdate {
        channel: String,
        counters: ChannelCounters,
        timestamp: DateTime<Utc>,
    },

    /// Periodic heartbeat event.
    Tick,

    /// System-wide event for debugging or administration.
    SystemMessage(String),
}

impl BotEvent {
    /// Get the event type as a string
    pub fn event_type(&self) -> String {
        match self {
            BotEvent::CounterUpdate { .. } => "counter_update".to_string(),
            BotEvent::Tick => "tick".to_string(),
            BotEvent::SystemMessage(_) => "system_message".to_string(),
        }
    }
}

/// Each subscriber gets its own `mpsc::Sender<BotEvent>` for guaranteed
/// delivery.
///
/// - If the subscriber's channel buffer fills, `publish` will await
///   until there's space (backpressure).
/// - If the subscriber has dropped the `Receiver`, the channel is closed
///   and sending returns an error.
#[derive(Clone)]
pub struct EventBus {
    subscribers: Arc<Mutex<Vec<mpsc::Sender<BotEvent>>>>,
    shutdown_tx: watch::Sender<bool>,
    pub shutdown_rx: watch::Receiver<bool>,
}

/// Default size for each subscriber's buffer.
const DEFAULT_BUFFER_SIZE: usize = 10000;

impl EventBus {
    /// Create a new, empty event bus.
    pub fn new() -> Self {
        let (tx, rx) = watch::channel(false);
        Self {
            subscribers: Arc::new(Mutex::new(vec![])),
            shutdown_tx: tx,
            shutdown_rx: rx,
        }
    }

    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(true);
    }

    pub fn is_shutdown(&self) -> bool {
        *self.shutdown_rx.borrow()
    }

    /// Returns a receiver on which events will be delivered.
    pub async fn subscribe(&self, buffer_size: Option<usize>) -> mpsc::Receiver<BotEvent> {
        let size = buffer_size.unwrap_or(DEFAULT_BUFFER_SIZE);
        let (tx, rx) = mpsc::channel(size);
        let mut subs = self.subscribers.lock().await;
        subs.push(tx);
        rx
    }

    /// Publish an event to all subscribers.
    pub async fn publish(&self, event: BotEvent) {
        let senders = {
            let subs = self.subscribers.lock().await;
            subs.clone()
        };
        for s in senders {
            let _ = s.send(event.clone()).await;
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

/// The overlay path: committed counter state goes onto the bus, and the
/// overlay transport subscribes on the other side.
#[async_trait]
impl OverlayPublisher for EventBus {
    async fn publish_counters(&self, counters: &ChannelCounters) -> Result<(), Error> {
        self.publish(BotEvent::CounterUpdate {
            channel: counters.channel_id.clone(),
            counters: counters.clone(),
            timestamp: Utc::now(),
        })
        .await;
        Ok(())
    }
}
