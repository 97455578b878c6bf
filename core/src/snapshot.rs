//! Save-file codec: full game state to/from JSON.
//!
//! Money is written as exact decimal strings, instants as epoch
//! milliseconds, cycle durations as milliseconds. Growth multipliers are
//! stored per job so a save is self-contained.
//!
//! Versioning: bump `SAVE_VERSION` whenever a field is added. Bump
//! `MIN_COMPATIBLE_VERSION` only when an existing field changes meaning
//! or is removed.

use crate::{
    error::{GameError, GameResult},
    money::Money,
    progression::{Growth, Job, Level, Multiplier, Worker},
    state::GameState,
    types::{JobId, Timestamp},
};
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, time::Duration};

pub const SAVE_VERSION: u32 = 1;
pub const MIN_COMPATIBLE_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct SaveFile {
    version: u32,
    balance: Money,
    workers: Vec<WorkerRecord>,
    jobs:    BTreeMap<JobId, JobRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct WorkerRecord {
    job_id:      JobId,
    acquired_at: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct JobRecord {
    tier:                  u32,
    cost:                  Money,
    earnings_per_cycle:    Money,
    cycle_duration_millis: u64,
    #[serde(default = "default_earnings_multiplier")]
    earnings_multiplier:   Multiplier,
    #[serde(default = "default_cost_multiplier")]
    cost_multiplier:       Multiplier,
}

fn default_earnings_multiplier() -> Multiplier {
    Growth::default().earnings_multiplier
}

fn default_cost_multiplier() -> Multiplier {
    Growth::default().cost_multiplier
}

impl From<&Job> for JobRecord {
    fn from(job: &Job) -> Self {
        Self {
            tier:                  job.level.tier,
            cost:                  job.level.cost.clone(),
            earnings_per_cycle:    job.level.earnings_per_cycle.clone(),
            cycle_duration_millis: job.level.cycle_millis(),
            earnings_multiplier:   job.growth.earnings_multiplier,
            cost_multiplier:       job.growth.cost_multiplier,
        }
    }
}

impl JobRecord {
    fn into_job(self, id: JobId) -> Job {
        Job {
            id,
            level: Level {
                tier:               self.tier,
                cost:               self.cost,
                earnings_per_cycle: self.earnings_per_cycle,
                cycle_duration:     Duration::from_millis(self.cycle_duration_millis),
            },
            growth: Growth {
                earnings_multiplier: self.earnings_multiplier,
                cost_multiplier:     self.cost_multiplier,
            },
        }
    }
}

pub fn encode(state: &GameState) -> GameResult<String> {
    let file = SaveFile {
        version: SAVE_VERSION,
        balance: state.balance().clone(),
        workers: state
            .workers()
            .map(|w| WorkerRecord { job_id: w.job_id, acquired_at: w.acquired_at.as_millis() })
            .collect(),
        jobs: state.jobs().map(|j| (j.id, JobRecord::from(j))).collect(),
    };
    Ok(serde_json::to_string(&file)?)
}

/// Parse and validate a save. Anything unreadable or inconsistent is
/// `PersistedStateInvalid`; falling back to a new game is the caller's call.
pub fn decode(json: &str) -> GameResult<GameState> {
    let file: SaveFile = serde_json::from_str(json)
        .map_err(|e| GameError::persisted(format!("unreadable save: {e}")))?;

    if !(MIN_COMPATIBLE_VERSION..=SAVE_VERSION).contains(&file.version) {
        return Err(GameError::persisted(format!(
            "save version {} not in supported range {MIN_COMPATIBLE_VERSION}..={SAVE_VERSION}",
            file.version
        )));
    }

    let workers = file.workers.into_iter().map(|w| Worker {
        job_id:      w.job_id,
        acquired_at: Timestamp::from_millis(w.acquired_at),
    });
    let jobs = file.jobs.into_iter().map(|(id, record)| record.into_job(id));
    GameState::from_parts(file.balance, workers, jobs)
}
