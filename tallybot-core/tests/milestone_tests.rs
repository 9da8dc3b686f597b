// File: tallybot-core/tests/milestone_tests.rs

use std::collections::HashSet;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::time::{timeout, Duration};

use tallybot_common::models::counter::CounterId;
use tallybot_common::models::milestone::{MilestoneThresholds, NotificationSettings};
use tallybot_core::services::milestone_service::MilestoneService;
use tallybot_core::test_utils::memory::{
    InMemoryConfigRepository, NotifierCall, RecordingNotifier,
};

const CHANNEL: &str = "chan1";
const WEBHOOK: &str = "https://hooks.example.test/counters";

fn enabled_settings(event_types: &[&str]) -> NotificationSettings {
    NotificationSettings {
        notifications_enabled: true,
        webhook_url: Some(WEBHOOK.to_string()),
        enabled_events: event_types.iter().map(|s| s.to_string()).collect::<HashSet<_>>(),
    }
}

fn build_service(
    thresholds: MilestoneThresholds,
    settings: NotificationSettings,
) -> (MilestoneService, mpsc::UnboundedReceiver<NotifierCall>) {
    let config_repo = Arc::new(InMemoryConfigRepository::new());
    config_repo.set_thresholds(CHANNEL, thresholds);
    config_repo.set_settings(CHANNEL, settings);
    let (notifier, rx) = RecordingNotifier::new();
    (MilestoneService::new(config_repo, Arc::new(notifier)), rx)
}

async fn expect_no_dispatch(rx: &mut mpsc::UnboundedReceiver<NotifierCall>) {
    assert!(
        timeout(Duration::from_millis(200), rx.recv()).await.is_err(),
        "expected no notification"
    );
}

#[tokio::test]
async fn crossing_a_threshold_fires_exactly_once() {
    let mut thresholds = MilestoneThresholds::new();
    thresholds.insert("deaths", vec![10, 20]);
    let (service, mut rx) =
        build_service(thresholds, enabled_settings(&["death_milestone"]));

    service.handle_mutation(CHANNEL, &CounterId::Deaths, 9, 10).await;

    let call = timeout(Duration::from_secs(1), rx.recv())
        .await
        .expect("dispatch should happen")
        .expect("channel open");
    match call {
        NotifierCall::Milestone { target, channel_id, event } => {
            assert_eq!(target, WEBHOOK);
            assert_eq!(channel_id, CHANNEL);
            assert_eq!(event.event_type, "death_milestone");
            assert_eq!(event.count, 10);
            assert_eq!(event.previous_milestone, 0);
        }
        other => panic!("unexpected call: {other:?}"),
    }
    expect_no_dispatch(&mut rx).await;
}

#[tokio::test]
async fn stepping_past_a_threshold_fires_nothing() {
    let mut thresholds = MilestoneThresholds::new();
    thresholds.insert("deaths", vec![10]);
    let (service, mut rx) =
        build_service(thresholds, enabled_settings(&["death_milestone"]));

    service.handle_mutation(CHANNEL, &CounterId::Deaths, 10, 11).await;
    expect_no_dispatch(&mut rx).await;
}

#[tokio::test]
async fn multi_unit_jump_reports_only_the_highest_crossed_threshold() {
    let mut thresholds = MilestoneThresholds::new();
    thresholds.insert("pulls", vec![5, 10, 20]);
    let (service, mut rx) =
        build_service(thresholds, enabled_settings(&["pulls_milestone"]));

    let counter = CounterId::Custom("pulls".to_string());
    service.handle_mutation(CHANNEL, &counter, 4, 12).await;

    let call = timeout(Duration::from_secs(1), rx.recv())
        .await
        .expect("dispatch should happen")
        .expect("channel open");
    match call {
        NotifierCall::Milestone { event, .. } => {
            assert_eq!(event.event_type, "pulls_milestone");
            assert_eq!(event.count, 12);
            // Both 5 and 10 were crossed; only the highest is reported,
            // with the one below it as the previous milestone.
            assert_eq!(event.previous_milestone, 5);
        }
        other => panic!("unexpected call: {other:?}"),
    }
    expect_no_dispatch(&mut rx).await;
}

#[tokio::test]
async fn downward_mutations_never_fire() {
    let mut thresholds = MilestoneThresholds::new();
    thresholds.insert("deaths", vec![10]);
    let (service, mut rx) =
        build_service(thresholds, enabled_settings(&["death_milestone"]));

    service.handle_mutation(CHANNEL, &CounterId::Deaths, 15, 5).await;
    expect_no_dispatch(&mut rx).await;
}

#[tokio::test]
async fn disabled_notifications_suppress_dispatch() {
    let mut thresholds = MilestoneThresholds::new();
    thresholds.insert("deaths", vec![10]);
    let settings = NotificationSettings {
        notifications_enabled: false,
        webhook_url: Some(WEBHOOK.to_string()),
        enabled_events: ["death_milestone".to_string()].into_iter().collect(),
    };
    let (service, mut rx) = build_service(thresholds, settings);

    service.handle_mutation(CHANNEL, &CounterId::Deaths, 9, 10).await;
    expect_no_dispatch(&mut rx).await;
}

#[tokio::test]
async fn missing_delivery_target_suppresses_dispatch() {
    let mut thresholds = MilestoneThresholds::new();
    thresholds.insert("deaths", vec![10]);
    let settings = NotificationSettings {
        notifications_enabled: true,
        webhook_url: Some("   ".to_string()),
        enabled_events: ["death_milestone".to_string()].into_iter().collect(),
    };
    let (service, mut rx) = build_service(thresholds, settings);

    service.handle_mutation(CHANNEL, &CounterId::Deaths, 9, 10).await;
    expect_no_dispatch(&mut rx).await;
}

#[tokio::test]
async fn disabled_event_type_suppresses_dispatch() {
    let mut thresholds = MilestoneThresholds::new();
    thresholds.insert("deaths", vec![10]);
    let (service, mut rx) =
        build_service(thresholds, enabled_settings(&["swear_milestone"]));

    service.handle_mutation(CHANNEL, &CounterId::Deaths, 9, 10).await;
    expect_no_dispatch(&mut rx).await;
}
