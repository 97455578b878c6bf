//! Passive earnings from elapsed wall time.
//!
//! Accrual is recomputed from the worker's anchor on demand; nothing here
//! depends on how often it is called, which is what makes offline progress
//! come out right.

use crate::{
    money::Money,
    progression::{Level, Worker},
    types::Timestamp,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Accrual {
    pub cycles_completed: u64,
    pub earned:           Money,
}

impl Accrual {
    pub fn none() -> Self {
        Self { cycles_completed: 0, earned: Money::zero() }
    }
}

/// Where a worker sits inside its current cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CycleProgress {
    pub completed:     u64,
    pub into_cycle_ms: u64,
    pub remaining_ms:  u64,
}

impl CycleProgress {
    /// Fraction of the current cycle done, in [0, 1).
    pub fn fraction(&self) -> f64 {
        let total = self.into_cycle_ms + self.remaining_ms;
        if total == 0 {
            0.0
        } else {
            self.into_cycle_ms as f64 / total as f64
        }
    }
}

/// Full cycles completed since the anchor and what they paid.
///
/// Elapsed time is clamped at zero: an anchor in the future (clock moved
/// backwards, skewed save) pays nothing until real time catches up.
pub fn accrue(worker: &Worker, level: &Level, now: Timestamp) -> Accrual {
    if now < worker.acquired_at {
        log::warn!(
            "Clock behind anchor for job {}: now={now}, anchor={}",
            worker.job_id,
            worker.acquired_at
        );
        return Accrual::none();
    }
    let elapsed = now.millis_since(worker.acquired_at);
    let cycles_completed = elapsed / level.cycle_millis();
    Accrual {
        cycles_completed,
        earned: level.earnings_per_cycle.scale(cycles_completed),
    }
}

/// Read-only view for progress bars.
pub fn cycle_progress(worker: &Worker, level: &Level, now: Timestamp) -> CycleProgress {
    let cycle = level.cycle_millis();
    let elapsed = now.millis_since(worker.acquired_at);
    let into_cycle_ms = elapsed % cycle;
    CycleProgress {
        completed: elapsed / cycle,
        into_cycle_ms,
        remaining_ms: cycle - into_cycle_ms,
    }
}

/// The anchor after paying out `cycles` full cycles.
///
/// Moves by whole cycles only; the partial cycle in progress is kept.
pub fn advance_anchor(worker: &Worker, level: &Level, cycles: u64) -> Timestamp {
    worker
        .acquired_at
        .plus_millis(cycles.saturating_mul(level.cycle_millis()))
}
