//! idle-runner: headless session host for the idle game core.
//!
//! Plays the platform role around the core: supplies the wall clock,
//! loads the save at start, writes it back at teardown, and bridges
//! line-delimited JSON commands from a presentation process.
//!
//! Usage:
//!   idle-runner --db save.db --player alice
//!   idle-runner --db save.db --player alice --catalog data/catalog.json --ipc-mode

use anyhow::Result;
use idle_core::{
    clock::{Clock, SystemClock},
    command::GameCommand,
    config::GameConfig,
    session::Session,
    state::GameState,
    store::SaveStore,
    types::Timestamp,
    GameError,
};
use std::env;
use std::io::{self, BufRead, Write};

#[derive(serde::Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum IpcCommand {
    GetState,
    Command { command: GameCommand },
    Save,
    Quit,
}

#[derive(serde::Serialize)]
struct UiState {
    now: Timestamp,
    balance: String,
    balance_display: String,
    pending_display: String,
    jobs: Vec<JobView>,
}

#[derive(serde::Serialize)]
struct JobView {
    id: u32,
    tier: u32,
    cost: String,
    cost_display: String,
    earnings_display: String,
    cycle_secs: u64,
    owned: bool,
    affordable: bool,
    /// Fraction of the running cycle, 0 when not owned.
    progress: f64,
}

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let ipc_mode = args.iter().any(|a| a == "--ipc-mode");
    let db = flag_value(&args, "--db").unwrap_or("idle.db");
    let player = flag_value(&args, "--player").unwrap_or("local");

    let config = match flag_value(&args, "--catalog") {
        Some(path) => GameConfig::load(path)?,
        None => GameConfig::default(),
    };
    let catalog = config.catalog()?;

    let clock = SystemClock;
    let store = SaveStore::open(db)?;
    store.migrate()?;
    let mut session = Session::load_or_new(store, player, catalog, clock.now())?;

    if ipc_mode {
        run_ipc_loop(&mut session, &clock, io::stdin().lock(), &mut io::stdout())?;
    } else {
        print_summary(&mut session, &clock, db)?;
    }

    session.save(clock.now())?;
    log::info!("Session {} ended", session.session_id);
    Ok(())
}

/// Serve JSON-lines requests from `input` until `quit` or EOF.
///
/// A command that fails with a non-recoverable error ends the loop, but the
/// session is saved first so progress made before the failure is kept.
fn run_ipc_loop(
    session: &mut Session,
    clock: &impl Clock,
    input: impl BufRead,
    out: &mut impl Write,
) -> Result<()> {
    for line in input.lines() {
        let line = line?;
        let cmd: IpcCommand = match serde_json::from_str(&line) {
            Ok(c) => c,
            Err(e) => {
                log::warn!("Bad IPC request: {e}");
                reply_error(out, "bad_request", &e.to_string())?;
                continue;
            }
        };

        let now = clock.now();
        match cmd {
            IpcCommand::Quit => break,
            IpcCommand::GetState => reply_state(out, &session.snapshot(), now)?,
            IpcCommand::Save => {
                session.save(now)?;
                reply_state(out, &session.snapshot(), now)?;
            }
            IpcCommand::Command { command } => match session.apply(&command, now) {
                Ok(state) => reply_state(out, &state, now)?,
                Err(e) if e.is_recoverable() => reply_error(out, error_kind(&e), &e.to_string())?,
                Err(e) => {
                    log::error!("Command {} failed: {e}", command.name());
                    if let Err(save_err) = session.save(now) {
                        log::error!("Save after failed command also failed: {save_err}");
                    }
                    return Err(e.into());
                }
            },
        }
    }
    Ok(())
}

fn reply_state(out: &mut impl Write, state: &GameState, now: Timestamp) -> Result<()> {
    writeln!(out, "{}", serde_json::to_string(&build_ui_state(state, now))?)?;
    out.flush()?;
    Ok(())
}

fn reply_error(out: &mut impl Write, kind: &str, message: &str) -> Result<()> {
    let err_json = serde_json::json!({ "error": message, "kind": kind });
    writeln!(out, "{err_json}")?;
    out.flush()?;
    Ok(())
}

fn error_kind(e: &GameError) -> &'static str {
    match e {
        GameError::UnknownJob { .. } => "unknown_job",
        GameError::AlreadyOwned { .. } => "already_owned",
        GameError::InsufficientFunds { .. } => "insufficient_funds",
        _ => "internal",
    }
}

fn build_ui_state(state: &GameState, now: Timestamp) -> UiState {
    let jobs = state
        .jobs()
        .map(|job| JobView {
            id: job.id,
            tier: job.level.tier,
            cost: job.level.cost.to_string(),
            cost_display: job.level.cost.format_short(),
            earnings_display: job.level.earnings_per_cycle.format_short(),
            cycle_secs: job.level.cycle_duration.as_secs(),
            owned: state.is_owned(job.id),
            affordable: state.can_afford(job.id),
            progress: state.progress(job.id, now).map_or(0.0, |p| p.fraction()),
        })
        .collect();
    UiState {
        now,
        balance: state.balance().to_string(),
        balance_display: state.balance().format_short(),
        pending_display: state.pending(now).format_short(),
        jobs,
    }
}

fn print_summary(session: &mut Session, clock: &impl Clock, db: &str) -> Result<()> {
    let now = clock.now();
    let before = session.snapshot();
    let offline = before.pending(now);
    let after = session.collect_all(now)?;

    println!("=== SESSION SUMMARY ===");
    println!("  player:      {}", session.player_id);
    println!("  session:     {}", session.session_id);
    println!("  db:          {db}");
    println!("  now:         {now}");
    println!("  offline:     +{}", offline.format_short());
    println!("  balance:     {}", after.balance().format_short());
    println!();
    println!("=== JOBS ===");
    for job in after.jobs() {
        println!(
            "  #{} | tier {} | cost {} | earns {} / {}s | {}",
            job.id,
            job.level.tier,
            job.level.cost.format_short(),
            job.level.earnings_per_cycle.format_short(),
            job.level.cycle_duration.as_secs(),
            if after.is_owned(job.id) { "owned" } else { "-" },
        );
    }
    Ok(())
}

fn flag_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2)
        .find(|w| w[0] == flag)
        .map(|w| w[1].as_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use idle_core::{clock::ManualClock, config::JobCatalog, money::Money};

    fn temp_db() -> String {
        std::env::temp_dir()
            .join(format!("idle-runner-{}.db", uuid::Uuid::new_v4()))
            .to_string_lossy()
            .into_owned()
    }

    fn replies(out: Vec<u8>) -> Vec<serde_json::Value> {
        String::from_utf8(out)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect()
    }

    #[test]
    fn ipc_answers_state_and_rejections() {
        let store = SaveStore::in_memory().unwrap();
        store.migrate().unwrap();
        let clock = ManualClock::new(Timestamp::EPOCH);
        let mut session = Session::load_or_new(store, "alice", JobCatalog::default(), clock.now()).unwrap();

        let input = concat!(
            r#"{"type": "command", "command": {"cmd": "click"}}"#, "\n",
            r#"{"type": "command", "command": {"cmd": "hire", "job_id": 1}}"#, "\n",
            "not json\n",
            r#"{"type": "quit"}"#, "\n",
            r#"{"type": "get_state"}"#, "\n",
        );
        let mut out = Vec::new();
        run_ipc_loop(&mut session, &clock, input.as_bytes(), &mut out).unwrap();

        let replies = replies(out);
        assert_eq!(replies.len(), 3);
        assert_eq!(replies[0]["balance"], "1");
        assert_eq!(replies[1]["kind"], "insufficient_funds");
        assert_eq!(replies[2]["kind"], "bad_request");
    }

    #[test]
    fn failed_command_still_saves_progress() {
        let path = temp_db();
        let store = SaveStore::open(&path).unwrap();
        store.migrate().unwrap();
        let clock = ManualClock::new(Timestamp::from_secs(5));
        let mut session = Session::load_or_new(store, "alice", JobCatalog::default(), clock.now()).unwrap();
        session.click(clock.now()).unwrap();
        session.click(clock.now()).unwrap();

        // Event log writes now fail with a database error.
        rusqlite::Connection::open(&path)
            .unwrap()
            .execute_batch("DROP TABLE event_log;")
            .unwrap();

        let input = r#"{"type": "command", "command": {"cmd": "click"}}"#;
        let mut out = Vec::new();
        assert!(run_ipc_loop(&mut session, &clock, input.as_bytes(), &mut out).is_err());
        assert!(out.is_empty());

        let (saved_at, state) = SaveStore::open(&path)
            .unwrap()
            .load("alice")
            .unwrap()
            .expect("saved before exiting");
        assert_eq!(saved_at, Timestamp::from_secs(5));
        assert_eq!(state.balance(), &Money::from_units(2));
        let _ = std::fs::remove_file(&path);
    }
}
