//! The game-state aggregate and its operations.
//!
//! RULE: every operation is a pure function of (state, args, now).
//! A new `GameState` is returned on success; on failure the caller still
//! holds the untouched original, so nothing is ever partially applied.

use crate::{
    accrual::{self, Accrual, CycleProgress},
    config::JobCatalog,
    error::{GameError, GameResult},
    money::Money,
    progression::{Job, Worker},
    types::{JobId, Timestamp},
};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameState {
    balance: Money,
    /// Keyed by job id: at most one worker per job.
    workers: BTreeMap<JobId, Worker>,
    jobs:    BTreeMap<JobId, Job>,
}

impl GameState {
    /// Fresh game: zero balance, no workers, every job at tier 1.
    pub fn new(catalog: &JobCatalog) -> Self {
        Self {
            balance: Money::zero(),
            workers: BTreeMap::new(),
            jobs:    catalog.base_jobs(),
        }
    }

    /// Discard everything and start over. Irreversible.
    pub fn reset(catalog: &JobCatalog) -> Self {
        log::info!("Game reset: {} jobs back at tier 1", catalog.len());
        Self::new(catalog)
    }

    /// Assemble a state from stored parts, checking the aggregate invariants.
    pub fn from_parts(
        balance: Money,
        workers: impl IntoIterator<Item = Worker>,
        jobs: impl IntoIterator<Item = Job>,
    ) -> GameResult<Self> {
        let mut job_map = BTreeMap::new();
        for job in jobs {
            if let Some(reason) = job.defect() {
                return Err(GameError::persisted(format!("job {}: {reason}", job.id)));
            }
            let id = job.id;
            if job_map.insert(id, job).is_some() {
                return Err(GameError::persisted(format!("duplicate job {id}")));
            }
        }
        let mut worker_map = BTreeMap::new();
        for worker in workers {
            let id = worker.job_id;
            if !job_map.contains_key(&id) {
                return Err(GameError::persisted(format!("worker for unknown job {id}")));
            }
            if worker_map.insert(id, worker).is_some() {
                return Err(GameError::persisted(format!("duplicate worker for job {id}")));
            }
        }
        Ok(Self { balance, workers: worker_map, jobs: job_map })
    }

    // ── Read access ─────────────────────────────────────────────

    pub fn balance(&self) -> &Money {
        &self.balance
    }

    pub fn workers(&self) -> impl Iterator<Item = &Worker> {
        self.workers.values()
    }

    pub fn worker(&self, job_id: JobId) -> Option<&Worker> {
        self.workers.get(&job_id)
    }

    pub fn jobs(&self) -> impl Iterator<Item = &Job> {
        self.jobs.values()
    }

    pub fn job(&self, job_id: JobId) -> Option<&Job> {
        self.jobs.get(&job_id)
    }

    pub fn is_owned(&self, job_id: JobId) -> bool {
        self.workers.contains_key(&job_id)
    }

    /// Whether the current balance covers this job's next purchase.
    pub fn can_afford(&self, job_id: JobId) -> bool {
        self.job(job_id).is_some_and(|job| self.balance >= job.level.cost)
    }

    /// Accrual for one job's worker at `now`; `None` when not owned.
    pub fn accrual(&self, job_id: JobId, now: Timestamp) -> Option<Accrual> {
        let worker = self.workers.get(&job_id)?;
        let job = self.jobs.get(&job_id)?;
        Some(accrual::accrue(worker, &job.level, now))
    }

    /// Total uncollected earnings at `now`. Read-only.
    pub fn pending(&self, now: Timestamp) -> Money {
        self.workers
            .keys()
            .filter_map(|id| self.accrual(*id, now))
            .map(|a| a.earned)
            .sum()
    }

    pub fn progress(&self, job_id: JobId, now: Timestamp) -> Option<CycleProgress> {
        let worker = self.workers.get(&job_id)?;
        let job = self.jobs.get(&job_id)?;
        Some(accrual::cycle_progress(worker, &job.level, now))
    }

    /// What `collect_all(now)` would produce, for display only.
    pub fn projected(&self, now: Timestamp) -> GameState {
        self.collected(now)
    }

    // ── Operations ──────────────────────────────────────────────

    /// Add the fixed manual-click reward. Always succeeds.
    pub fn click_money(&self, reward: &Money, now: Timestamp) -> GameState {
        log::debug!("Click at {now}: +{reward}");
        GameState { balance: &self.balance + reward, ..self.clone() }
    }

    /// Buy the worker for `job_id` at its current level cost.
    pub fn hire(&self, job_id: JobId, now: Timestamp) -> GameResult<GameState> {
        let job = self.job(job_id).ok_or(GameError::UnknownJob { job_id })?;
        if self.is_owned(job_id) {
            return Err(GameError::AlreadyOwned { job_id });
        }
        let balance = self.pay(&job.level.cost)?;

        let mut next = self.clone();
        next.balance = balance;
        next.workers.insert(job_id, Worker { job_id, acquired_at: now });
        log::info!("Hired worker for job {job_id} at {now} for {}", job.level.cost);
        Ok(next)
    }

    /// Raise `job_id` one tier.
    ///
    /// Pending earnings for the job's worker are collected first at the
    /// old rate, and count toward paying for the upgrade. Jobs without a
    /// worker may be upgraded too; the higher level takes effect once a
    /// worker is hired.
    pub fn upgrade(&self, job_id: JobId, now: Timestamp) -> GameResult<GameState> {
        let job = self.job(job_id).ok_or(GameError::UnknownJob { job_id })?;

        let mut next = self.clone();
        let cycles = next.collect_one(job_id, now);
        if cycles > 0 {
            log::debug!("Collected {cycles} cycles of job {job_id} before upgrade");
        }
        next.balance = next.pay(&job.level.cost)?;
        let upgraded = job.upgraded()?;
        log::info!(
            "Upgraded job {job_id} to tier {} (cost {}, earns {}/cycle)",
            upgraded.level.tier,
            upgraded.level.cost,
            upgraded.level.earnings_per_cycle
        );
        next.jobs.insert(job_id, upgraded);
        Ok(next)
    }

    /// Move every worker's completed cycles into the balance.
    ///
    /// Idempotent for a fixed `now`: a second call finds zero new cycles.
    pub fn collect_all(&self, now: Timestamp) -> GameState {
        let next = self.collected(now);
        log::debug!(
            "Collected at {now}: balance {} -> {}",
            self.balance,
            next.balance
        );
        next
    }

    fn collected(&self, now: Timestamp) -> GameState {
        let mut next = self.clone();
        let owned: Vec<JobId> = next.workers.keys().copied().collect();
        for job_id in owned {
            next.collect_one(job_id, now);
        }
        next
    }

    /// Collect one worker in place. Only called on a private copy.
    fn collect_one(&mut self, job_id: JobId, now: Timestamp) -> u64 {
        let (Some(worker), Some(job)) = (self.workers.get_mut(&job_id), self.jobs.get(&job_id))
        else {
            return 0;
        };
        let accrued = accrual::accrue(worker, &job.level, now);
        if accrued.cycles_completed > 0 {
            worker.acquired_at = accrual::advance_anchor(worker, &job.level, accrued.cycles_completed);
            self.balance = &self.balance + &accrued.earned;
        }
        accrued.cycles_completed
    }

    /// Balance after paying `cost`, or `InsufficientFunds`.
    fn pay(&self, cost: &Money) -> GameResult<Money> {
        self.balance.checked_sub(cost).ok_or_else(|| {
            log::warn!("Rejected purchase: cost {cost}, balance {}", self.balance);
            GameError::InsufficientFunds {
                required:  cost.clone(),
                available: self.balance.clone(),
            }
        })
    }
}
