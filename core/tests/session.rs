//! Session controller tests: snapshots, notifications, event log.

use idle_core::{
    clock::{Clock, ManualClock},
    command::GameCommand,
    config::JobCatalog,
    event::GameEvent,
    money::Money,
    session::{Session, HISTORY_LIMIT},
    state::GameState,
    store::SaveStore,
    types::Timestamp,
    GameError,
};
use std::sync::Arc;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn store() -> SaveStore {
    let store = SaveStore::in_memory().expect("in-memory store");
    store.migrate().expect("migration");
    store
}

fn click_n(session: &mut Session, clock: &ManualClock, n: usize) {
    for _ in 0..n {
        session.click(clock.now()).unwrap();
    }
}

#[test]
fn snapshots_are_immutable_values() {
    init_logging();
    let clock = ManualClock::new(Timestamp::EPOCH);
    let mut session = Session::new("alice", JobCatalog::default());

    let before = session.snapshot();
    click_n(&mut session, &clock, 3);
    let after = session.snapshot();

    assert!(before.balance().is_zero());
    assert_eq!(after.balance(), &Money::from_units(3));
    assert!(!Arc::ptr_eq(&before, &after));
}

#[test]
fn subscribers_see_each_accepted_operation() {
    let clock = ManualClock::new(Timestamp::EPOCH);
    let mut session = Session::new("alice", JobCatalog::default());
    let rx = session.subscribe();

    click_n(&mut session, &clock, 5);
    session.hire(1, clock.now()).unwrap();

    let seen: Vec<Arc<GameState>> = rx.try_iter().collect();
    assert_eq!(seen.len(), 6);
    assert!(seen.last().unwrap().is_owned(1));
}

#[test]
fn rejected_operations_publish_nothing() {
    let clock = ManualClock::new(Timestamp::EPOCH);
    let mut session = Session::new("alice", JobCatalog::default());
    let rx = session.subscribe();
    let before = session.snapshot();

    let err = session.hire(1, clock.now()).unwrap_err();
    assert!(matches!(err, GameError::InsufficientFunds { .. }));
    let err = session.upgrade(404, clock.now()).unwrap_err();
    assert!(matches!(err, GameError::UnknownJob { .. }));

    assert!(Arc::ptr_eq(&before, &session.snapshot()));
    assert_eq!(rx.try_iter().count(), 0);
    assert!(session.history().is_empty());
}

#[test]
fn commands_drive_the_same_operations() {
    let clock = ManualClock::new(Timestamp::EPOCH);
    let mut session = Session::new("alice", JobCatalog::default());

    for _ in 0..5 {
        session.apply(&GameCommand::Click, clock.now()).unwrap();
    }
    session.apply(&GameCommand::Hire { job_id: 1 }, clock.now()).unwrap();
    clock.advance_secs(10);
    let state = session.apply(&GameCommand::Collect, clock.now()).unwrap();
    assert_eq!(state.balance(), &Money::from_units(10));

    let state = session.apply(&GameCommand::Upgrade { job_id: 1 }, clock.now()).unwrap();
    assert_eq!(state.balance(), &Money::from_units(5));
    assert_eq!(state.job(1).unwrap().level.tier, 2);

    let state = session.apply(&GameCommand::Reset, clock.now()).unwrap();
    assert_eq!(*state, GameState::new(session.catalog()));

    let names: Vec<&str> = session.history().iter().map(|e| e.type_name()).collect();
    assert_eq!(
        names,
        [
            "money_clicked", "money_clicked", "money_clicked", "money_clicked", "money_clicked",
            "worker_hired", "earnings_collected", "job_upgraded", "game_reset",
        ]
    );
}

#[test]
fn history_keeps_only_recent_events() {
    let clock = ManualClock::new(Timestamp::EPOCH);
    let mut session = Session::new("alice", JobCatalog::default());
    click_n(&mut session, &clock, HISTORY_LIMIT);
    clock.advance_secs(1);
    click_n(&mut session, &clock, 10);

    let history = session.history();
    assert_eq!(history.len(), HISTORY_LIMIT);
    assert_eq!(history[0].at(), Timestamp::EPOCH);
    assert_eq!(history[HISTORY_LIMIT - 11].at(), Timestamp::EPOCH);
    assert_eq!(history[HISTORY_LIMIT - 10].at(), Timestamp::from_secs(1));
    assert_eq!(session.snapshot().balance(), &Money::from_units(HISTORY_LIMIT as u64 + 10));
}

#[test]
fn command_wire_format_is_tagged() {
    let cmd: GameCommand = serde_json::from_str(r#"{"cmd": "hire", "job_id": 3}"#).unwrap();
    assert_eq!(cmd, GameCommand::Hire { job_id: 3 });
    let cmd: GameCommand = serde_json::from_str(r#"{"cmd": "collect"}"#).unwrap();
    assert_eq!(cmd, GameCommand::Collect);
}

#[test]
fn empty_collection_records_no_event() {
    let clock = ManualClock::new(Timestamp::EPOCH);
    let mut session = Session::new("alice", JobCatalog::default());
    session.collect_all(clock.now()).unwrap();
    assert!(session.history().is_empty());
}

#[test]
fn load_or_new_resumes_with_offline_progress() {
    init_logging();
    let clock = ManualClock::new(Timestamp::from_secs(1_000));

    let mut session = Session::load_or_new(store(), "alice", JobCatalog::default(), clock.now()).unwrap();
    click_n(&mut session, &clock, 5);
    session.hire(1, clock.now()).unwrap();
    session.save(clock.now()).unwrap();
    let saved = session.snapshot();

    // Resume from a copy of that save an hour later.
    let store = store();
    store.save("alice", clock.now(), &saved).unwrap();
    clock.advance_secs(3_600);

    let mut resumed = Session::load_or_new(store, "alice", JobCatalog::default(), clock.now()).unwrap();
    assert_eq!(*resumed.snapshot(), *saved);
    match &resumed.history()[0] {
        GameEvent::SessionLoaded { offline_earnings, .. } => {
            assert_eq!(offline_earnings, &Money::from_units(3_600));
        }
        other => panic!("expected SessionLoaded, got {other:?}"),
    }

    let state = resumed.collect_all(clock.now()).unwrap();
    assert_eq!(state.balance(), &Money::from_units(3_600));
}

#[test]
fn load_or_new_starts_fresh_without_save() {
    let session = Session::load_or_new(store(), "nobody", JobCatalog::default(), Timestamp::EPOCH).unwrap();
    assert_eq!(*session.snapshot(), GameState::new(session.catalog()));
}

#[test]
fn load_or_new_replaces_corrupt_save() {
    let path = std::env::temp_dir().join(format!("idle-session-{}.db", uuid::Uuid::new_v4()));
    let path = path.to_str().unwrap().to_string();
    {
        let store = SaveStore::open(&path).unwrap();
        store.migrate().unwrap();
        let conn = rusqlite::Connection::open(&path).unwrap();
        conn.execute(
            "INSERT INTO save_slot (player_id, version, saved_at, state_json) VALUES ('alice', 1, 0, '[]')",
            [],
        )
        .unwrap();
    }
    let session = Session::load_or_new(SaveStore::open(&path).unwrap(), "alice", JobCatalog::default(), Timestamp::EPOCH)
        .unwrap();
    assert_eq!(*session.snapshot(), GameState::new(session.catalog()));
    let _ = std::fs::remove_file(&path);
}

#[test]
fn events_are_appended_to_the_store() {
    let path = std::env::temp_dir().join(format!("idle-events-{}.db", uuid::Uuid::new_v4()));
    let path = path.to_str().unwrap().to_string();
    let store = SaveStore::open(&path).unwrap();
    store.migrate().unwrap();

    let clock = ManualClock::new(Timestamp::from_secs(10));
    let mut session = Session::load_or_new(store, "alice", JobCatalog::default(), clock.now()).unwrap();
    click_n(&mut session, &clock, 2);
    clock.advance_secs(1);
    session.reset(clock.now()).unwrap();

    let reader = SaveStore::open(&path).unwrap();
    let entries = reader.events(&session.session_id).unwrap();
    let types: Vec<&str> = entries.iter().map(|e| e.event_type.as_str()).collect();
    assert_eq!(types, ["session_loaded", "money_clicked", "money_clicked", "game_reset"]);
    assert_eq!(entries[3].at, Timestamp::from_secs(11));

    let last: GameEvent = serde_json::from_str(&entries[3].payload).unwrap();
    assert_eq!(last, session.history()[3]);
    let _ = std::fs::remove_file(&path);
}
