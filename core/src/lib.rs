//! Economic core of an idle game: exact currency, time-based accrual,
//! and the pure state operations (click, hire, upgrade, collect, reset).

pub mod accrual;
pub mod clock;
pub mod command;
pub mod config;
pub mod error;
pub mod event;
pub mod money;
pub mod progression;
pub mod session;
pub mod snapshot;
pub mod state;
pub mod store;
pub mod types;

pub use error::{GameError, GameResult};
pub use money::Money;
pub use state::GameState;
