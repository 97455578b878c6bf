//! Events emitted by the session for every accepted operation.
//!
//! Events are a record of what happened, appended to the store's event
//! log. They are never replayed to rebuild state; the save snapshot is
//! the source of truth.

use crate::{
    money::Money,
    types::{JobId, SessionId, Timestamp},
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GameEvent {
    SessionLoaded {
        session_id: SessionId,
        at: Timestamp,
        /// Earnings accrued while the game was not running.
        offline_earnings: Money,
    },
    MoneyClicked {
        at: Timestamp,
        reward: Money,
    },
    WorkerHired {
        at: Timestamp,
        job_id: JobId,
        cost: Money,
    },
    JobUpgraded {
        at: Timestamp,
        job_id: JobId,
        tier: u32,
        cost: Money,
    },
    EarningsCollected {
        at: Timestamp,
        amount: Money,
    },
    GameReset {
        at: Timestamp,
    },
}

impl GameEvent {
    /// Stable name for the event_type column.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::SessionLoaded { .. }     => "session_loaded",
            Self::MoneyClicked { .. }      => "money_clicked",
            Self::WorkerHired { .. }       => "worker_hired",
            Self::JobUpgraded { .. }       => "job_upgraded",
            Self::EarningsCollected { .. } => "earnings_collected",
            Self::GameReset { .. }         => "game_reset",
        }
    }

    pub fn at(&self) -> Timestamp {
        match self {
            Self::SessionLoaded { at, .. }
            | Self::MoneyClicked { at, .. }
            | Self::WorkerHired { at, .. }
            | Self::JobUpgraded { at, .. }
            | Self::EarningsCollected { at, .. }
            | Self::GameReset { at } => *at,
        }
    }
}

/// A persisted event row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventLogEntry {
    pub id:         Option<i64>,
    pub session_id: SessionId,
    pub at:         Timestamp,
    pub event_type: String,
    pub payload:    String,
}
