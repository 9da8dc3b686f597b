// File: tallybot-core/tests/counter_service_tests.rs

use std::sync::Arc;

use tallybot_common::models::counter::{ChannelCounters, CounterId};
use tallybot_common::traits::repository_traits::CounterRepository;
use tallybot_core::services::counter_service::CounterService;
use tallybot_core::services::milestone_service::MilestoneService;
use tallybot_core::test_utils::memory::{
    InMemoryConfigRepository, InMemoryCounterRepository, RecordingNotifier, RecordingOverlay,
};

fn build_service(
    repo: Arc<InMemoryCounterRepository>,
    overlay: Arc<RecordingOverlay>,
) -> CounterService {
    let config_repo = Arc::new(InMemoryConfigRepository::new());
    let (notifier, _rx) = RecordingNotifier::new();
    let milestones = Arc::new(MilestoneService::new(config_repo, Arc::new(notifier)));
    CounterService::new(repo, overlay, milestones)
}

#[tokio::test]
async fn query_of_untouched_channel_is_zero() {
    let repo = Arc::new(InMemoryCounterRepository::new());
    let overlay = Arc::new(RecordingOverlay::new());
    let service = build_service(repo.clone(), overlay);

    let value = service.query("chan1", &CounterId::Deaths).await.unwrap();
    assert_eq!(value, 0);
    // A pure read never persists the lazily-built default row.
    assert_eq!(repo.save_count(), 0);
}

#[tokio::test]
async fn increment_creates_an_unknown_custom_counter() {
    let repo = Arc::new(InMemoryCounterRepository::new());
    let overlay = Arc::new(RecordingOverlay::new());
    let service = build_service(repo.clone(), overlay);

    let counter = CounterId::Custom("pulls".to_string());
    let counters = service.increment("chan1", &counter, 3).await.unwrap();
    assert_eq!(counters.value(&counter), 3);
    assert_eq!(repo.save_count(), 1);
}

#[tokio::test]
async fn decrement_never_goes_negative() {
    let mut seed = ChannelCounters::new("chan1");
    seed.deaths = 2;
    let repo = Arc::new(InMemoryCounterRepository::with_counters(seed));
    let overlay = Arc::new(RecordingOverlay::new());
    let service = build_service(repo.clone(), overlay);

    for _ in 0..5 {
        let counters = service.decrement("chan1", &CounterId::Deaths, 1).await.unwrap();
        assert!(counters.deaths >= 0);
    }
    let final_value = service.query("chan1", &CounterId::Deaths).await.unwrap();
    assert_eq!(final_value, 0);

    // A large delta floors at zero rather than underflowing.
    let mut seed = ChannelCounters::new("chan2");
    seed.swears = 4;
    repo.upsert(&seed).await.unwrap();
    let counters = service.decrement("chan2", &CounterId::Swears, 100).await.unwrap();
    assert_eq!(counters.swears, 0);
}

#[tokio::test]
async fn decrement_of_unknown_custom_counter_does_not_create_it() {
    let repo = Arc::new(InMemoryCounterRepository::new());
    let overlay = Arc::new(RecordingOverlay::new());
    let service = build_service(repo.clone(), overlay.clone());

    let counter = CounterId::Custom("pulls".to_string());
    let counters = service.decrement("chan1", &counter, 1).await.unwrap();
    assert!(!counters.custom.contains_key("pulls"));
    assert_eq!(repo.save_count(), 0);
    assert!(overlay.updates().is_empty());
}

#[tokio::test]
async fn reset_of_unknown_custom_counter_is_a_noop() {
    let repo = Arc::new(InMemoryCounterRepository::new());
    let overlay = Arc::new(RecordingOverlay::new());
    let service = build_service(repo.clone(), overlay);

    let counter = CounterId::Custom("ghost".to_string());
    service.reset("chan1", &counter).await.unwrap();
    assert_eq!(repo.save_count(), 0);
    assert!(repo.get("chan1").await.unwrap().is_none());
}

#[tokio::test]
async fn reset_all_preserves_bits_and_custom_counters() {
    let mut seed = ChannelCounters::new("chan1");
    seed.deaths = 12;
    seed.swears = 7;
    seed.screams = 3;
    seed.bits = 5000;
    seed.custom.insert("pulls".to_string(), 42);
    let repo = Arc::new(InMemoryCounterRepository::with_counters(seed));
    let overlay = Arc::new(RecordingOverlay::new());
    let service = build_service(repo, overlay);

    let counters = service.reset_all("chan1").await.unwrap();
    assert_eq!(counters.deaths, 0);
    assert_eq!(counters.swears, 0);
    assert_eq!(counters.screams, 0);
    assert_eq!(counters.bits, 5000);
    assert_eq!(counters.custom.get("pulls"), Some(&42));
}

#[tokio::test]
async fn committed_mutations_reach_the_overlay() {
    let repo = Arc::new(InMemoryCounterRepository::new());
    let overlay = Arc::new(RecordingOverlay::new());
    let service = build_service(repo.clone(), overlay.clone());

    service.increment("chan1", &CounterId::Deaths, 1).await.unwrap();
    service.increment("chan1", &CounterId::Deaths, 1).await.unwrap();

    let updates = overlay.updates();
    assert_eq!(updates.len(), 2);
    assert_eq!(updates[0].deaths, 1);
    assert_eq!(updates[1].deaths, 2);
    assert_eq!(repo.save_count(), 2);
}

#[tokio::test]
async fn mutations_on_different_channels_are_independent() {
    let repo = Arc::new(InMemoryCounterRepository::new());
    let overlay = Arc::new(RecordingOverlay::new());
    let service = build_service(repo, overlay);

    service.increment("chan1", &CounterId::Deaths, 2).await.unwrap();
    service.increment("chan2", &CounterId::Deaths, 5).await.unwrap();

    assert_eq!(service.query("chan1", &CounterId::Deaths).await.unwrap(), 2);
    assert_eq!(service.query("chan2", &CounterId::Deaths).await.unwrap(), 5);
}
