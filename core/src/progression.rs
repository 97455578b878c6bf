//! Jobs, their upgrade levels, and the workers that own them.

use crate::{
    error::{GameError, GameResult},
    money::Money,
    types::{JobId, Timestamp},
};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::{fmt, str::FromStr, time::Duration};

/// Exact rational growth factor applied on each upgrade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Multiplier {
    pub numerator:   u64,
    pub denominator: u64,
}

impl Multiplier {
    pub const fn integer(k: u64) -> Self {
        Self { numerator: k, denominator: 1 }
    }

    pub fn new(numerator: u64, denominator: u64) -> GameResult<Self> {
        if denominator == 0 {
            return Err(GameError::config(format!("multiplier {numerator}/0")));
        }
        Ok(Self { numerator, denominator })
    }

    /// True when applying this multiplier strictly increases a positive value.
    pub fn is_growth(&self) -> bool {
        self.denominator > 0 && self.numerator > self.denominator
    }

    pub fn apply(&self, amount: &Money) -> GameResult<Money> {
        amount.multiply_by_rational(self.numerator, self.denominator)
    }
}

impl fmt::Display for Multiplier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.denominator == 1 {
            write!(f, "{}", self.numerator)
        } else {
            write!(f, "{}/{}", self.numerator, self.denominator)
        }
    }
}

impl FromStr for Multiplier {
    type Err = GameError;

    fn from_str(raw: &str) -> GameResult<Self> {
        let parse = |s: &str| {
            s.trim()
                .parse::<u64>()
                .map_err(|_| GameError::config(format!("bad multiplier {raw:?}")))
        };
        match raw.split_once('/') {
            Some((n, d)) => Self::new(parse(n)?, parse(d)?),
            None => Ok(Self::integer(parse(raw)?)),
        }
    }
}

// Integers stay integers on the wire; fractions become "n/d".
impl Serialize for Multiplier {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if self.denominator == 1 {
            serializer.serialize_u64(self.numerator)
        } else {
            serializer.collect_str(self)
        }
    }
}

impl<'de> Deserialize<'de> for Multiplier {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Wire {
            Int(u64),
            Text(String),
        }
        match Wire::deserialize(deserializer)? {
            Wire::Int(k) => Ok(Self::integer(k)),
            Wire::Text(s) => s.parse().map_err(serde::de::Error::custom),
        }
    }
}

/// How a job's numbers grow per upgrade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Growth {
    pub earnings_multiplier: Multiplier,
    pub cost_multiplier:     Multiplier,
}

impl Default for Growth {
    fn default() -> Self {
        Self {
            earnings_multiplier: Multiplier::integer(2),
            cost_multiplier:     Multiplier::integer(3),
        }
    }
}

/// One upgrade rung of a job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Level {
    pub tier:               u32,
    pub cost:               Money,
    pub earnings_per_cycle: Money,
    pub cycle_duration:     Duration,
}

impl Level {
    /// Tier-1 level. The cycle is truncated to whole milliseconds, the unit
    /// accrual and saves work in.
    pub fn base(cost: Money, earnings_per_cycle: Money, cycle_duration: Duration) -> Self {
        let millis = u64::try_from(cycle_duration.as_millis()).unwrap_or(u64::MAX);
        Self { tier: 1, cost, earnings_per_cycle, cycle_duration: Duration::from_millis(millis) }
    }

    /// Cycle length in whole milliseconds, never zero.
    pub fn cycle_millis(&self) -> u64 {
        u64::try_from(self.cycle_duration.as_millis()).unwrap_or(u64::MAX).max(1)
    }

    /// The next rung: tier + 1, earnings and cost scaled by `growth`.
    /// Cycle duration is unchanged.
    pub fn upgrade(&self, growth: &Growth) -> GameResult<Level> {
        Ok(Level {
            tier:               self.tier + 1,
            cost:               growth.cost_multiplier.apply(&self.cost)?,
            earnings_per_cycle: growth.earnings_multiplier.apply(&self.earnings_per_cycle)?,
            cycle_duration:     self.cycle_duration,
        })
    }
}

/// A purchasable production line.
///
/// A job can be upgraded whether or not the player owns a worker for it.
/// Upgrades bought in advance only start paying once a worker is hired.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    pub id:     JobId,
    pub level:  Level,
    pub growth: Growth,
}

impl Job {
    /// Reason this job cannot progress correctly, if any: every upgrade must
    /// strictly raise cost and earnings, and the cycle must be a positive
    /// whole number of milliseconds.
    pub fn defect(&self) -> Option<String> {
        let level = &self.level;
        if level.tier == 0 {
            return Some("tier 0".into());
        }
        if level.cycle_duration.is_zero() {
            return Some("zero cycle duration".into());
        }
        if level.cycle_duration.subsec_nanos() % 1_000_000 != 0 {
            return Some(format!("cycle {:?} is not whole milliseconds", level.cycle_duration));
        }
        if level.cost.is_zero() {
            return Some("zero cost".into());
        }
        if level.earnings_per_cycle.is_zero() {
            return Some("zero earnings per cycle".into());
        }
        let growth = &self.growth;
        for (name, m) in [("earnings", growth.earnings_multiplier), ("cost", growth.cost_multiplier)] {
            if !m.is_growth() {
                return Some(format!("{name} multiplier {m} must be greater than 1"));
            }
        }
        None
    }

    pub fn upgraded(&self) -> GameResult<Job> {
        Ok(Job { level: self.level.upgrade(&self.growth)?, ..self.clone() })
    }
}

/// The player's single instance of a job.
///
/// `acquired_at` is the accrual anchor: hiring sets it, each collection
/// moves it forward past the cycles that were paid out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Worker {
    pub job_id:      JobId,
    pub acquired_at: Timestamp,
}
