use std::collections::VecDeque;
use std::time::{Duration, Instant};

use thiserror::Error;

use crate::config::{DEFAULT_OPPONENT_NAME, DEFAULT_TEAM_NAME, EngineConfig};
use crate::game_log::{EventKind, GameLogEntry, NewEntry, PitchPoint, PlayerRef};
use crate::persist::SnapshotStore;
use crate::record::{FinalizedMatchRecord, MatchData, RecordSink, VotingPayload};
use crate::roster::{self, CardKind, CardStatus, Player, SquadSelection};
use crate::score::{self, MatchResult};
use crate::state::{MatchState, Period};
use crate::stats::{StatKey, TeamAggregates};

/// How long the "clock is stopped" flag stays visible after a rejected stat.
pub const REJECT_FLASH: Duration = Duration::from_secs(2);
const MAX_LOGS: usize = 200;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("match is already finalized")]
    MatchFinalized,
    #[error("match was discarded")]
    MatchDiscarded,
    #[error("squad is already bound")]
    SquadAlreadyBound,
    #[error("no location capture is pending")]
    NoPendingCapture,
    #[error("another location capture is already pending")]
    CaptureInProgress,
    #[error("no end-of-period confirmation is outstanding")]
    NoPeriodConfirmation,
    #[error("post-match voting is not open")]
    VotingNotOpen,
    #[error("clock cannot run while post-match voting is open")]
    VotingOpen,
    #[error("red card removal is disabled")]
    RedCardLocked,
    #[error("cannot change card from {from:?} to {to:?}")]
    InvalidCardTransition { from: CardStatus, to: CardKind },
    #[error("unknown player {0}")]
    UnknownPlayer(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatOutcome {
    /// Committed; `value` is the new count, `None` when the player is not on the roster.
    Applied { value: Option<u32> },
    /// Held until a location/reason capture confirms it.
    PendingLocation,
    RejectedClockStopped,
}

/// A record accepted by the sink, with the id it was stored under.
#[derive(Debug, Clone)]
pub struct Finalized {
    pub id: String,
    pub record: FinalizedMatchRecord,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingCapture {
    pub player_id: String,
    pub key: StatKey,
    pub delta: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Origin {
    Live,
    System,
}

/// The live match: sole owner of the `MatchState` for its lifetime.
#[derive(Debug)]
pub struct MatchSession {
    state: MatchState,
    aggregates: TeamAggregates,
    pending_capture: Option<PendingCapture>,
    awaiting_period_confirmation: bool,
    voting_open: bool,
    reject_flash_until: Option<Instant>,
    logs: VecDeque<String>,
    dirty: bool,
    revision: u64,
    allow_red_card_removal: bool,
    sin_bin_secs: u64,
    discarded: bool,
}

impl MatchSession {
    pub fn new(config: &EngineConfig) -> Self {
        Self::from_state(MatchState::fresh(config), config)
    }

    pub fn restore(state: MatchState, config: &EngineConfig) -> Self {
        let mut session = Self::from_state(state, config);
        session.push_log(format!(
            "[INFO] Resumed match at {} ({})",
            session.state.clock.display(),
            session.state.period.label()
        ));
        session
    }

    fn from_state(mut state: MatchState, config: &EngineConfig) -> Self {
        // Ticks never resume on their own after a restart.
        state.clock.stop();
        let aggregates = TeamAggregates::compute(&state.players);
        MatchSession {
            state,
            aggregates,
            pending_capture: None,
            awaiting_period_confirmation: false,
            voting_open: false,
            reject_flash_until: None,
            logs: VecDeque::new(),
            dirty: false,
            revision: 0,
            allow_red_card_removal: config.allow_red_card_removal,
            sin_bin_secs: config.sin_bin_secs,
            discarded: false,
        }
    }

    pub fn state(&self) -> &MatchState {
        &self.state
    }

    pub fn aggregates(&self) -> &TeamAggregates {
        &self.aggregates
    }

    pub fn logs(&self) -> &VecDeque<String> {
        &self.logs
    }

    pub fn pending_capture(&self) -> Option<&PendingCapture> {
        self.pending_capture.as_ref()
    }

    pub fn awaiting_period_confirmation(&self) -> bool {
        self.awaiting_period_confirmation
    }

    pub fn voting_open(&self) -> bool {
        self.voting_open
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn mark_clean(&mut self) {
        self.dirty = false;
    }

    pub fn is_finalized(&self) -> bool {
        self.state.period == Period::Finalized
    }

    pub fn is_discarded(&self) -> bool {
        self.discarded
    }

    pub fn stat_rejected(&self, now: Instant) -> bool {
        self.reject_flash_until.is_some_and(|until| now < until)
    }

    pub fn push_log(&mut self, msg: impl Into<String>) {
        self.logs.push_back(msg.into());
        while self.logs.len() > MAX_LOGS {
            self.logs.pop_front();
        }
    }

    /// Keeps console lines from a session this one replaces, older lines first.
    pub fn carry_logs_from(&mut self, previous: &MatchSession) {
        let mut logs = previous.logs.clone();
        logs.extend(self.logs.drain(..));
        while logs.len() > MAX_LOGS {
            logs.pop_front();
        }
        self.logs = logs;
    }

    // Clock

    pub fn start_clock(&mut self) -> Result<(), EngineError> {
        self.ensure_live()?;
        if self.voting_open {
            return Err(EngineError::VotingOpen);
        }
        if self.state.clock.is_running {
            return Ok(());
        }
        self.awaiting_period_confirmation = false;
        self.state.clock.start();
        self.settle();
        Ok(())
    }

    pub fn stop_clock(&mut self) {
        if !self.state.clock.is_running {
            return;
        }
        self.state.clock.stop();
        self.settle();
    }

    /// One clock second. Time on field accrues for on-field players without a red card.
    pub fn tick(&mut self) -> bool {
        if !self.state.clock.tick() {
            return false;
        }
        for player in self.state.players.iter_mut().filter(|p| p.is_accruing()) {
            player.total_seconds_on_field = player.total_seconds_on_field.saturating_add(1);
        }
        self.settle();
        true
    }

    // Stats

    pub fn apply_stat_delta(
        &mut self,
        player_id: &str,
        key: StatKey,
        delta: i64,
    ) -> Result<StatOutcome, EngineError> {
        self.apply_delta(player_id, key, delta, Origin::Live)
    }

    fn apply_delta(
        &mut self,
        player_id: &str,
        key: StatKey,
        delta: i64,
        origin: Origin,
    ) -> Result<StatOutcome, EngineError> {
        self.ensure_live()?;
        if origin == Origin::Live && !self.state.clock.is_running {
            self.reject_flash_until = Some(Instant::now() + REJECT_FLASH);
            return Ok(StatOutcome::RejectedClockStopped);
        }
        if origin == Origin::Live && delta > 0 && key.needs_location() {
            if self.pending_capture.is_some() {
                return Err(EngineError::CaptureInProgress);
            }
            self.pending_capture = Some(PendingCapture {
                player_id: player_id.to_string(),
                key,
                delta,
            });
            return Ok(StatOutcome::PendingLocation);
        }

        let value = self
            .state
            .player_mut(player_id)
            .map(|p| p.apply_delta(key, delta));
        if value.is_none() {
            self.push_log(format!("[WARN] Stat for unknown player {player_id}"));
        }
        if origin == Origin::Live && delta > 0 {
            let who = self.player_ref(player_id);
            self.append_log(NewEntry::new(who, EventKind::for_stat(key)));
        }
        self.settle();
        Ok(StatOutcome::Applied { value })
    }

    /// Commits the held penalty/error with the captured reason and location.
    pub fn confirm_location(
        &mut self,
        reason: impl Into<String>,
        location: PitchPoint,
    ) -> Result<Option<u32>, EngineError> {
        self.ensure_live()?;
        let pending = self
            .pending_capture
            .take()
            .ok_or(EngineError::NoPendingCapture)?;
        let value = self
            .state
            .player_mut(&pending.player_id)
            .map(|p| p.apply_delta(pending.key, pending.delta));
        let who = self.player_ref(&pending.player_id);
        self.append_log(
            NewEntry::new(who, EventKind::for_stat(pending.key))
                .reason(reason)
                .location(location),
        );
        self.settle();
        Ok(value)
    }

    pub fn cancel_pending_capture(&mut self) -> bool {
        self.pending_capture.take().is_some()
    }

    /// Retroactive highlight: +1 to `key` outside the clock gate, logged as a big play.
    pub fn confirm_big_play(
        &mut self,
        player_id: &str,
        key: StatKey,
        description: impl Into<String>,
    ) -> Result<(), EngineError> {
        self.apply_delta(player_id, key, 1, Origin::System)?;
        let who = self.player_ref(player_id);
        self.append_log(
            NewEntry::new(who, EventKind::BigPlay)
                .reason(description)
                .impact(1),
        );
        self.settle();
        Ok(())
    }

    // Cards

    pub fn assign_card(
        &mut self,
        player_id: &str,
        kind: CardKind,
        reason: impl Into<String>,
    ) -> Result<(), EngineError> {
        self.ensure_live()?;
        let elapsed = self.state.clock.elapsed_seconds;
        if let Some(player) = self.state.player_mut(player_id) {
            match (player.card_status, kind) {
                (CardStatus::None, _) | (CardStatus::Yellow, CardKind::Red) => {}
                (from, to) => return Err(EngineError::InvalidCardTransition { from, to }),
            }
            player.is_on_field = false;
            match kind {
                CardKind::Yellow => {
                    player.card_status = CardStatus::Yellow;
                    player.sin_bin_start_time = Some(elapsed);
                }
                CardKind::Red => {
                    player.card_status = CardStatus::Red;
                    player.sin_bin_start_time = None;
                }
            }
        } else {
            self.push_log(format!("[WARN] Card for unknown player {player_id}"));
        }
        let event = match kind {
            CardKind::Yellow => EventKind::YellowCard,
            CardKind::Red => EventKind::RedCard,
        };
        let who = self.player_ref(player_id);
        self.append_log(NewEntry::new(who, event).reason(reason));
        self.settle();
        Ok(())
    }

    /// Clears the card. Field placement is left to `toggle_field`.
    pub fn remove_card(&mut self, player_id: &str) -> Result<(), EngineError> {
        self.ensure_live()?;
        let allow_red = self.allow_red_card_removal;
        let player = self
            .state
            .player_mut(player_id)
            .ok_or_else(|| EngineError::UnknownPlayer(player_id.to_string()))?;
        if player.card_status == CardStatus::Red && !allow_red {
            return Err(EngineError::RedCardLocked);
        }
        if player.card_status == CardStatus::None {
            return Ok(());
        }
        player.card_status = CardStatus::None;
        player.sin_bin_start_time = None;
        let msg = format!("[INFO] Card removed: #{} {}", player.number, player.name);
        self.push_log(msg);
        self.settle();
        Ok(())
    }

    pub fn sin_bin_remaining(&self, player_id: &str) -> Option<u64> {
        let player = self.state.player(player_id)?;
        let start = player.sin_bin_start_time?;
        let served = self.state.clock.elapsed_seconds.saturating_sub(start);
        Some(self.sin_bin_secs.saturating_sub(served))
    }

    /// Yellow-carded players whose customary sin-bin time has run out.
    pub fn expired_sin_bins(&self) -> Vec<&Player> {
        self.state
            .players
            .iter()
            .filter(|p| p.card_status == CardStatus::Yellow)
            .filter(|p| self.sin_bin_remaining(&p.id) == Some(0))
            .collect()
    }

    // Field

    /// Interchange on/off. Not gated by the clock. Returns the new field status.
    pub fn toggle_field(&mut self, player_id: &str) -> Result<bool, EngineError> {
        self.ensure_live()?;
        let elapsed = self.state.clock.elapsed_seconds;
        let player = self
            .state
            .player_mut(player_id)
            .ok_or_else(|| EngineError::UnknownPlayer(player_id.to_string()))?;
        player.is_on_field = !player.is_on_field;
        if player.is_on_field {
            player.last_sub_time = elapsed;
        }
        let on = player.is_on_field;
        let who = self.player_ref(player_id);
        let reason = if on { "Interchange ON" } else { "Interchange OFF" };
        self.append_log(NewEntry::new(who, EventKind::Substitution).reason(reason));
        self.settle();
        Ok(on)
    }

    // Roster identity

    /// Binds the pre-match squad selection. Only once per match.
    pub fn bind_squad(&mut self, selections: &[SquadSelection]) -> Result<usize, EngineError> {
        self.ensure_live()?;
        if !self.state.squad_pending {
            return Err(EngineError::SquadAlreadyBound);
        }
        let bound = roster::bind_squad(&mut self.state.players, selections);
        self.state.squad_pending = false;
        self.push_log(format!("[INFO] Squad bound: {bound} players"));
        self.settle();
        Ok(bound)
    }

    pub fn rename_player(&mut self, player_id: &str, name: &str) -> Result<(), EngineError> {
        self.ensure_live()?;
        let player = self
            .state
            .player_mut(player_id)
            .ok_or_else(|| EngineError::UnknownPlayer(player_id.to_string()))?;
        player.name = name.trim().to_string();
        self.settle();
        Ok(())
    }

    pub fn set_player_number(&mut self, player_id: &str, number: u32) -> Result<(), EngineError> {
        self.ensure_live()?;
        let player = self
            .state
            .player_mut(player_id)
            .ok_or_else(|| EngineError::UnknownPlayer(player_id.to_string()))?;
        player.number = number;
        self.settle();
        Ok(())
    }

    pub fn set_team_names(&mut self, team: &str, opponent: &str) -> Result<(), EngineError> {
        self.ensure_live()?;
        self.state.team_name = team.trim().to_string();
        self.state.opponent_name = opponent.trim().to_string();
        self.settle();
        Ok(())
    }

    // Score

    /// Manual override: stores the residual against the stat-derived score.
    pub fn set_team_score(&mut self, value: i64) -> Result<(), EngineError> {
        self.ensure_live()?;
        self.state.home_score_adjustment = score::adjustment_for(&self.state.players, value);
        self.settle();
        Ok(())
    }

    pub fn set_opponent_score(&mut self, value: i64) -> Result<(), EngineError> {
        self.ensure_live()?;
        self.state.opponent_score = value.clamp(0, i64::from(u32::MAX)) as u32;
        self.settle();
        Ok(())
    }

    pub fn adjust_opponent_score(&mut self, delta: i64) -> Result<(), EngineError> {
        let next = i64::from(self.state.opponent_score).saturating_add(delta);
        self.set_opponent_score(next)
    }

    // Sets

    pub fn record_set(&mut self, completed: bool) -> Result<(), EngineError> {
        self.ensure_live()?;
        self.state.sets.record(completed);
        self.settle();
        Ok(())
    }

    pub fn undo_last_set(&mut self, completed: bool) -> Result<(), EngineError> {
        self.ensure_live()?;
        self.state.sets.undo(completed);
        self.settle();
        Ok(())
    }

    // Periods

    /// Stops the clock and asks for confirmation.
    pub fn end_period(&mut self) -> Result<(), EngineError> {
        self.ensure_live()?;
        if self.voting_open {
            return Err(EngineError::VotingOpen);
        }
        self.stop_clock();
        self.awaiting_period_confirmation = true;
        Ok(())
    }

    pub fn cancel_end_period(&mut self) {
        self.awaiting_period_confirmation = false;
    }

    /// First half rolls into the second; the second half opens voting.
    pub fn confirm_end_period(&mut self) -> Result<Period, EngineError> {
        self.ensure_live()?;
        if !self.awaiting_period_confirmation {
            return Err(EngineError::NoPeriodConfirmation);
        }
        self.awaiting_period_confirmation = false;
        match self.state.period {
            Period::FirstHalf => {
                self.state.period = Period::SecondHalf;
                self.push_log("[INFO] Half time");
                self.settle();
            }
            Period::SecondHalf => {
                self.voting_open = true;
                self.push_log("[INFO] Full time: awaiting votes");
            }
            Period::Finalized => return Err(EngineError::MatchFinalized),
        }
        Ok(self.state.period)
    }

    /// Permanent record for the current state. Does not change the session.
    pub fn build_record(&self, voting: Option<VotingPayload>, date: String) -> FinalizedMatchRecord {
        let team_name = name_or(&self.state.team_name, DEFAULT_TEAM_NAME);
        let opponent_name = name_or(&self.state.opponent_name, DEFAULT_OPPONENT_NAME);
        let team_score = self.state.team_score();
        let opponent_score = self.state.opponent_score;
        FinalizedMatchRecord {
            date,
            team_name,
            opponent_name,
            final_score: score::final_score_string(team_score, opponent_score),
            result: MatchResult::from_scores(team_score, i64::from(opponent_score)),
            data: MatchData {
                players: self.state.players.clone(),
                game_log: self.state.game_log.entries().to_vec(),
                match_time: self.state.clock.elapsed_seconds,
                period: self.state.period,
                sets: self.state.sets,
                home_score_adjustment: self.state.home_score_adjustment,
            },
            voting,
        }
    }

    /// Submits the record once voting is resolved (`None` means skipped).
    /// On failure the session and its snapshot stay as they were so the call can be retried.
    pub fn finalize(
        &mut self,
        voting: Option<VotingPayload>,
        sink: &mut dyn RecordSink,
        store: &mut dyn SnapshotStore,
    ) -> anyhow::Result<Finalized> {
        self.ensure_live()?;
        if !self.voting_open {
            return Err(EngineError::VotingNotOpen.into());
        }
        let date = chrono::Local::now().format("%Y-%m-%dT%H:%M:%S").to_string();
        let record = self.build_record(voting, date);
        let id = match sink.submit(&record) {
            Ok(id) => id,
            Err(err) => {
                self.push_log(format!("[ERROR] Match save failed, retry later: {err:#}"));
                return Err(err);
            }
        };
        self.voting_open = false;
        self.state.period = Period::Finalized;
        self.push_log(format!(
            "[INFO] Match saved ({}): {} {}",
            id,
            record.final_score,
            record.result.label()
        ));
        if let Err(err) = store.clear() {
            self.push_log(format!("[WARN] Snapshot clear failed: {err:#}"));
        }
        self.dirty = false;
        Ok(Finalized { id, record })
    }

    /// Abandons the match without a record. The session stops accepting
    /// operations and the stored snapshot is removed.
    pub fn discard(&mut self, store: &mut dyn SnapshotStore) -> anyhow::Result<()> {
        self.state.clock.stop();
        self.pending_capture = None;
        self.awaiting_period_confirmation = false;
        self.voting_open = false;
        self.discarded = true;
        self.dirty = false;
        if let Err(err) = store.clear() {
            self.push_log(format!("[WARN] Snapshot clear failed: {err:#}"));
            return Err(err);
        }
        self.push_log("[INFO] Match discarded");
        Ok(())
    }

    fn ensure_live(&self) -> Result<(), EngineError> {
        if self.discarded {
            return Err(EngineError::MatchDiscarded);
        }
        if self.is_finalized() {
            return Err(EngineError::MatchFinalized);
        }
        Ok(())
    }

    fn player_ref(&self, player_id: &str) -> PlayerRef {
        PlayerRef::capture(self.state.player(player_id), player_id)
    }

    fn append_log(&mut self, entry: NewEntry) -> &GameLogEntry {
        let elapsed = self.state.clock.elapsed_seconds;
        let period = self.state.period;
        self.state.game_log.push(entry, elapsed, period)
    }

    /// Rebuilds derived figures and flags the state for the snapshot writer.
    fn settle(&mut self) {
        self.aggregates = TeamAggregates::compute(&self.state.players);
        if self.discarded {
            return;
        }
        self.dirty = true;
        self.revision = self.revision.wrapping_add(1);
    }
}

fn name_or(raw: &str, fallback: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        fallback.to_string()
    } else {
        trimmed.to_string()
    }
}
