//! The session controller: sole writer of the game state.
//!
//! RULES:
//!   - Exactly one `Session` holds the authoritative `GameState`.
//!   - Every operation computes a new state from the current snapshot and
//!     swaps it in only on success. Readers hold `Arc` snapshots and never
//!     see a half-applied operation.
//!   - `now` always comes from the caller. The session never reads a clock.
//!   - If several threads issue operations, wrap the session in a `Mutex`;
//!     snapshot readers do not need the lock once they hold an `Arc`.

use crate::{
    command::GameCommand,
    config::JobCatalog,
    error::{GameError, GameResult},
    event::GameEvent,
    money::Money,
    state::GameState,
    store::SaveStore,
    types::{JobId, PlayerId, SessionId, Timestamp},
};
use std::sync::{
    mpsc::{self, Receiver, Sender},
    Arc,
};

/// Most recent events kept in memory. The full log lives in the store.
pub const HISTORY_LIMIT: usize = 256;

pub struct Session {
    pub session_id: SessionId,
    pub player_id:  PlayerId,
    catalog:        JobCatalog,
    state:          Arc<GameState>,
    history:        Vec<GameEvent>,
    subscribers:    Vec<Sender<Arc<GameState>>>,
    store:          Option<SaveStore>,
}

impl Session {
    /// A brand-new game with no backing store.
    pub fn new(player_id: impl Into<PlayerId>, catalog: JobCatalog) -> Self {
        Self {
            session_id:  uuid::Uuid::new_v4().to_string(),
            player_id:   player_id.into(),
            state:       Arc::new(GameState::new(&catalog)),
            catalog,
            history:     Vec::new(),
            subscribers: Vec::new(),
            store:       None,
        }
    }

    /// Resume the player's save from `store`, or start fresh when there is
    /// none. A corrupt save is logged and replaced by a new game.
    ///
    /// Offline progress is not collected here; it is reported in the
    /// `SessionLoaded` event and paid out by the next collection.
    pub fn load_or_new(
        store: SaveStore,
        player_id: impl Into<PlayerId>,
        catalog: JobCatalog,
        now: Timestamp,
    ) -> GameResult<Self> {
        let mut session = Self::new(player_id, catalog);
        let loaded = match store.load(&session.player_id) {
            Ok(found) => found,
            Err(GameError::PersistedStateInvalid { reason }) => {
                log::warn!("Discarding unreadable save for {}: {reason}", session.player_id);
                None
            }
            Err(e) => return Err(e),
        };
        if let Some((saved_at, state)) = loaded {
            log::info!("Loaded save for {} written at {saved_at}", session.player_id);
            session.state = Arc::new(state);
        }
        session.store = Some(store);

        let offline_earnings = session.state.pending(now);
        session.record(GameEvent::SessionLoaded {
            session_id: session.session_id.clone(),
            at: now,
            offline_earnings,
        })?;
        Ok(session)
    }

    // ── Read side ───────────────────────────────────────────────

    /// Latest published state.
    pub fn snapshot(&self) -> Arc<GameState> {
        Arc::clone(&self.state)
    }

    /// Receive every snapshot published from now on.
    pub fn subscribe(&mut self) -> Receiver<Arc<GameState>> {
        let (tx, rx) = mpsc::channel();
        self.subscribers.push(tx);
        rx
    }

    pub fn catalog(&self) -> &JobCatalog {
        &self.catalog
    }

    /// The last `HISTORY_LIMIT` events accepted during this session,
    /// oldest first.
    pub fn history(&self) -> &[GameEvent] {
        &self.history
    }

    // ── Write side ──────────────────────────────────────────────

    pub fn click(&mut self, now: Timestamp) -> GameResult<Arc<GameState>> {
        let reward = self.catalog.click_reward().clone();
        let next = self.state.click_money(&reward, now);
        self.publish(next, Some(GameEvent::MoneyClicked { at: now, reward }))
    }

    pub fn hire(&mut self, job_id: JobId, now: Timestamp) -> GameResult<Arc<GameState>> {
        let next = self.state.hire(job_id, now)?;
        let cost = self.cost_of(job_id);
        self.publish(next, Some(GameEvent::WorkerHired { at: now, job_id, cost }))
    }

    pub fn upgrade(&mut self, job_id: JobId, now: Timestamp) -> GameResult<Arc<GameState>> {
        let cost = self.cost_of(job_id);
        let next = self.state.upgrade(job_id, now)?;
        let tier = next.job(job_id).map_or(0, |j| j.level.tier);
        self.publish(next, Some(GameEvent::JobUpgraded { at: now, job_id, tier, cost }))
    }

    pub fn collect_all(&mut self, now: Timestamp) -> GameResult<Arc<GameState>> {
        let next = self.state.collect_all(now);
        let amount = next
            .balance()
            .checked_sub(self.state.balance())
            .unwrap_or_else(Money::zero);
        let event = (!amount.is_zero()).then_some(GameEvent::EarningsCollected { at: now, amount });
        self.publish(next, event)
    }

    pub fn reset(&mut self, now: Timestamp) -> GameResult<Arc<GameState>> {
        let next = GameState::reset(&self.catalog);
        self.publish(next, Some(GameEvent::GameReset { at: now }))
    }

    pub fn apply(&mut self, command: &GameCommand, now: Timestamp) -> GameResult<Arc<GameState>> {
        log::debug!("Applying {} at {now}", command.name());
        match *command {
            GameCommand::Click              => self.click(now),
            GameCommand::Hire { job_id }    => self.hire(job_id, now),
            GameCommand::Upgrade { job_id } => self.upgrade(job_id, now),
            GameCommand::Collect            => self.collect_all(now),
            GameCommand::Reset              => self.reset(now),
        }
    }

    /// Persist the current snapshot. No-op without a store.
    pub fn save(&self, now: Timestamp) -> GameResult<()> {
        match &self.store {
            Some(store) => store.save(&self.player_id, now, &self.state),
            None => Ok(()),
        }
    }

    fn cost_of(&self, job_id: JobId) -> Money {
        self.state
            .job(job_id)
            .map(|j| j.level.cost.clone())
            .unwrap_or_else(Money::zero)
    }

    /// Record the event, then swap in `next` and notify subscribers.
    fn publish(&mut self, next: GameState, event: Option<GameEvent>) -> GameResult<Arc<GameState>> {
        if let Some(event) = event {
            self.record(event)?;
        }
        if *self.state != next {
            self.state = Arc::new(next);
            let snapshot = Arc::clone(&self.state);
            self.subscribers.retain(|tx| tx.send(Arc::clone(&snapshot)).is_ok());
        }
        Ok(self.snapshot())
    }

    fn record(&mut self, event: GameEvent) -> GameResult<()> {
        if let Some(store) = &self.store {
            store.append_event(&self.session_id, &self.player_id, &event)?;
        }
        if self.history.len() == HISTORY_LIMIT {
            self.history.remove(0);
        }
        self.history.push(event);
        Ok(())
    }
}
