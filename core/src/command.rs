use serde::{Deserialize, Serialize};
use crate::types::JobId;

/// All player-issued commands.
/// Variants are never removed or reordered; the runner's wire format
/// depends on the tags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "cmd", rename_all = "snake_case")]
pub enum GameCommand {
    Click,
    Hire    { job_id: JobId },
    Upgrade { job_id: JobId },
    Collect,
    Reset,
}

impl GameCommand {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Click          => "click",
            Self::Hire { .. }    => "hire",
            Self::Upgrade { .. } => "upgrade",
            Self::Collect        => "collect",
            Self::Reset          => "reset",
        }
    }
}
