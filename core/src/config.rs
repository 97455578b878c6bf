use crate::{
    error::{GameError, GameResult},
    money::Money,
    progression::{Growth, Job, Level, Multiplier},
    types::JobId,
};
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, time::Duration};

/// One entry of the job catalog file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobConfig {
    pub id: JobId,
    pub cost: Money,
    pub earnings_per_cycle: Money,
    pub cycle_duration_ms: u64,
    #[serde(default = "default_earnings_multiplier")]
    pub earnings_multiplier: Multiplier,
    #[serde(default = "default_cost_multiplier")]
    pub cost_multiplier: Multiplier,
}

fn default_earnings_multiplier() -> Multiplier {
    Growth::default().earnings_multiplier
}

fn default_cost_multiplier() -> Multiplier {
    Growth::default().cost_multiplier
}

impl JobConfig {
    fn new(id: JobId, cost: u64, earnings: u64, cycle_secs: u64) -> Self {
        Self {
            id,
            cost: Money::from_units(cost),
            earnings_per_cycle: Money::from_units(earnings),
            cycle_duration_ms: cycle_secs * 1000,
            earnings_multiplier: default_earnings_multiplier(),
            cost_multiplier: default_cost_multiplier(),
        }
    }

    fn base_job(&self) -> Job {
        Job {
            id: self.id,
            level: Level::base(
                self.cost.clone(),
                self.earnings_per_cycle.clone(),
                Duration::from_millis(self.cycle_duration_ms),
            ),
            growth: Growth {
                earnings_multiplier: self.earnings_multiplier,
                cost_multiplier: self.cost_multiplier,
            },
        }
    }
}

/// Catalog file format.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameConfig {
    /// Flat reward for one manual click.
    pub click_reward: Money,
    pub jobs: Vec<JobConfig>,
}

impl Default for GameConfig {
    /// The built-in catalog: six jobs, click worth 1.
    fn default() -> Self {
        Self {
            click_reward: Money::from_units(1),
            jobs: vec![
                JobConfig::new(1, 5, 1, 1),
                JobConfig::new(2, 500, 9, 5),
                JobConfig::new(3, 8_100, 1_800, 10),
                JobConfig::new(4, 900_000, 3_000, 15),
                JobConfig::new(5, 8_100, 1_800, 20),
                JobConfig::new(6, 8_100, 1_800, 30),
            ],
        }
    }
}

impl GameConfig {
    /// Load a catalog JSON file.
    /// In tests, use `GameConfig::default()` or `from_json`.
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Cannot read {path}: {e}"))?;
        let config = Self::from_json(&content)?;
        log::info!("Loaded catalog from {path}: {} jobs", config.jobs.len());
        Ok(config)
    }

    pub fn from_json(content: &str) -> GameResult<Self> {
        let config: GameConfig =
            serde_json::from_str(content).map_err(|e| GameError::config(e.to_string()))?;
        config.catalog()?;
        Ok(config)
    }

    /// Validate and build the immutable catalog.
    pub fn catalog(&self) -> GameResult<JobCatalog> {
        let mut jobs = BTreeMap::new();
        for job in &self.jobs {
            let base = job.base_job();
            if let Some(reason) = base.defect() {
                return Err(GameError::config(format!("job {}: {reason}", job.id)));
            }
            if jobs.insert(job.id, base).is_some() {
                return Err(GameError::config(format!("duplicate job id {}", job.id)));
            }
        }
        Ok(JobCatalog { jobs, click_reward: self.click_reward.clone() })
    }
}

/// Validated static catalog. Never mutated; player progress lives in
/// `GameState::jobs`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobCatalog {
    jobs: BTreeMap<JobId, Job>,
    click_reward: Money,
}

impl JobCatalog {
    /// Every job at its tier-1 level.
    pub fn base_jobs(&self) -> BTreeMap<JobId, Job> {
        self.jobs.clone()
    }

    pub fn job(&self, id: JobId) -> Option<&Job> {
        self.jobs.get(&id)
    }

    pub fn click_reward(&self) -> &Money {
        &self.click_reward
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }
}

impl Default for JobCatalog {
    fn default() -> Self {
        GameConfig::default()
            .catalog()
            .unwrap_or_else(|e| unreachable!("built-in catalog is valid: {e}"))
    }
}
