use std::sync::Arc;
use std::time::Duration;
use tasknest_core::{
    CoreConfig, KeyValueStore, ManualClock, MemoryStore, PollOutcome, Route, RouteHistory,
    SessionManager, SessionPoller, SessionRecord, SessionStatus, SESSION_KEY,
};

const START_MS: i64 = 1_760_000_000_000;

struct Harness {
    storage: Arc<MemoryStore>,
    clock: Arc<ManualClock>,
    session: Arc<SessionManager>,
}

fn harness(ttl: Duration) -> Harness {
    let storage = Arc::new(MemoryStore::new());
    let clock = Arc::new(ManualClock::new(START_MS));
    let config = CoreConfig::default().with_session_ttl(ttl);
    let session = Arc::new(SessionManager::new(storage.clone(), clock.clone(), &config));
    Harness {
        storage,
        clock,
        session,
    }
}

fn stored(storage: &MemoryStore) -> Option<String> {
    storage.get(SESSION_KEY).unwrap()
}

#[test]
fn validate_accepts_unexpired_record() {
    let h = harness(Duration::from_secs(3_600));
    let record = h.session.create("subject-1").unwrap();

    assert_eq!(record.expires_at, START_MS + 3_600_000);
    assert_eq!(h.session.validate(), SessionStatus::Valid(record));
}

#[test]
fn validate_rejects_and_purges_expired_records() {
    let h = harness(Duration::from_secs(60));

    for offset_ms in [0_i64, 1, 60_000] {
        let record = SessionRecord::new("subject-1", START_MS - offset_ms);
        h.storage
            .set(SESSION_KEY, &serde_json::to_string(&record).unwrap())
            .unwrap();

        assert_eq!(h.session.validate(), SessionStatus::Invalid);
        assert_eq!(stored(&h.storage), None);
    }
}

#[test]
fn validate_treats_wrong_shape_as_absent() {
    let h = harness(Duration::from_secs(60));
    h.storage
        .set(SESSION_KEY, r#"{"uuid":"s","expiresAt":"tomorrow"}"#)
        .unwrap();

    assert_eq!(h.session.validate(), SessionStatus::Invalid);
    assert_eq!(stored(&h.storage), None);
}

#[test]
fn create_replaces_prior_record() {
    let h = harness(Duration::from_secs(60));
    h.session.create("first").unwrap();
    h.clock.advance(Duration::from_secs(10));
    let second = h.session.create("second").unwrap();

    let status = h.session.validate();
    assert_eq!(status.record(), Some(&second));
    assert_eq!(second.expires_at, START_MS + 70_000);
}

#[tokio::test(start_paused = true)]
async fn scheduled_expiry_purges_at_deadline() {
    let h = harness(Duration::from_secs(10));
    let record = h.session.create("subject-1").unwrap();
    h.session.schedule_expiry(record.expires_at).unwrap();
    assert!(h.session.has_scheduled_expiry());

    tokio::time::sleep(Duration::from_secs(9)).await;
    assert!(stored(&h.storage).is_some());

    tokio::time::sleep(Duration::from_secs(2)).await;
    assert_eq!(stored(&h.storage), None);
    assert!(!h.session.has_scheduled_expiry());
}

#[tokio::test(start_paused = true)]
async fn rearming_cancels_previous_timer() {
    let h = harness(Duration::from_secs(10));
    let first = h.session.create("subject-1").unwrap();
    h.session.schedule_expiry(first.expires_at).unwrap();

    tokio::time::sleep(Duration::from_secs(5)).await;
    h.clock.advance(Duration::from_secs(5));
    let second = h.session.create("subject-1").unwrap();
    h.session.schedule_expiry(second.expires_at).unwrap();

    // The first deadline passes without purging the newer record.
    tokio::time::sleep(Duration::from_secs(6)).await;
    assert!(stored(&h.storage).is_some());
    assert!(h.session.has_scheduled_expiry());

    tokio::time::sleep(Duration::from_secs(5)).await;
    assert_eq!(stored(&h.storage), None);
}

#[tokio::test(start_paused = true)]
async fn stale_timer_never_purges_newer_session() {
    let h = harness(Duration::from_secs(10));
    let first = h.session.create("subject-1").unwrap();
    h.session.schedule_expiry(first.expires_at).unwrap();

    // A re-authentication writes a later record without re-arming.
    h.clock.advance(Duration::from_secs(5));
    h.session.create("subject-1").unwrap();

    tokio::time::sleep(Duration::from_secs(11)).await;
    assert!(stored(&h.storage).is_some());
}

#[tokio::test(start_paused = true)]
async fn cancel_and_destroy_disarm_the_timer() {
    let h = harness(Duration::from_secs(10));
    let record = h.session.create("subject-1").unwrap();

    assert!(!h.session.cancel_scheduled_expiry());
    h.session.schedule_expiry(record.expires_at).unwrap();
    assert!(h.session.cancel_scheduled_expiry());
    assert!(!h.session.cancel_scheduled_expiry());

    tokio::time::sleep(Duration::from_secs(20)).await;
    assert!(stored(&h.storage).is_some());

    h.session.schedule_expiry(record.expires_at).unwrap();
    h.session.destroy().unwrap();
    assert!(!h.session.has_scheduled_expiry());
    assert_eq!(stored(&h.storage), None);
    h.session.destroy().unwrap();
}

#[tokio::test(start_paused = true)]
async fn restore_schedules_remaining_lifetime() {
    let h = harness(Duration::from_secs(30));
    h.session.create("subject-1").unwrap();
    h.clock.advance(Duration::from_secs(20));

    let status = h.session.restore_and_schedule().unwrap();
    assert!(status.is_valid());
    assert!(h.session.has_scheduled_expiry());

    tokio::time::sleep(Duration::from_secs(11)).await;
    assert_eq!(stored(&h.storage), None);
}

#[test]
fn poll_drives_expiry_without_timer() {
    let h = harness(Duration::from_secs(3));
    h.session.create("subject-1").unwrap();

    assert_eq!(h.session.poll(), PollOutcome::Active { remaining_secs: 3 });
    h.clock.advance(Duration::from_millis(1_200));
    assert_eq!(h.session.poll(), PollOutcome::Active { remaining_secs: 2 });
    h.clock.advance(Duration::from_millis(1_800));
    assert_eq!(h.session.poll(), PollOutcome::Ended);
    assert_eq!(stored(&h.storage), None);
}

#[tokio::test(start_paused = true)]
async fn timer_and_poll_converge_in_either_order() {
    // Timer first, then poll.
    let h = harness(Duration::from_secs(5));
    let record = h.session.create("subject-1").unwrap();
    h.session.schedule_expiry(record.expires_at).unwrap();
    tokio::time::sleep(Duration::from_secs(6)).await;
    h.clock.advance(Duration::from_secs(6));
    assert_eq!(stored(&h.storage), None);
    assert_eq!(h.session.poll(), PollOutcome::Ended);

    // Poll first, then timer.
    let h = harness(Duration::from_secs(5));
    let record = h.session.create("subject-1").unwrap();
    h.session.schedule_expiry(record.expires_at).unwrap();
    h.clock.advance(Duration::from_secs(6));
    assert_eq!(h.session.poll(), PollOutcome::Ended);
    tokio::time::sleep(Duration::from_secs(6)).await;
    assert_eq!(stored(&h.storage), None);
    assert_eq!(h.session.validate(), SessionStatus::Invalid);
}

#[tokio::test(start_paused = true)]
async fn poller_publishes_countdown_and_redirects_once() {
    let h = harness(Duration::from_secs(3));
    h.session.create("subject-1").unwrap();
    let navigator = Arc::new(RouteHistory::new());

    let poller = SessionPoller::start(
        h.session.clone(),
        Duration::from_secs(1),
        navigator.clone(),
    )
    .unwrap();

    tokio::time::sleep(Duration::from_millis(10)).await;
    assert_eq!(
        poller.latest(),
        Some(PollOutcome::Active { remaining_secs: 3 })
    );

    h.clock.advance(Duration::from_secs(3));
    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(poller.latest(), Some(PollOutcome::Ended));
    assert_eq!(stored(&h.storage), None);

    tokio::time::sleep(Duration::from_secs(5)).await;
    assert_eq!(navigator.routes(), vec![Route::SignIn]);
    assert!(!poller.is_running());
}

#[tokio::test(start_paused = true)]
async fn dropping_poller_stops_it() {
    let h = harness(Duration::from_secs(3));
    h.session.create("subject-1").unwrap();
    let navigator = Arc::new(RouteHistory::new());

    let poller = SessionPoller::start(
        h.session.clone(),
        Duration::from_secs(1),
        navigator.clone(),
    )
    .unwrap();
    let mut updates = poller.subscribe();
    drop(poller);

    h.clock.advance(Duration::from_secs(10));
    tokio::time::sleep(Duration::from_secs(5)).await;
    assert!(navigator.routes().is_empty());
    assert!(stored(&h.storage).is_some());
    assert!(updates.changed().await.is_err());
}
