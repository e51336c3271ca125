use crate::game_log::PitchPoint;
use crate::roster::CardKind;
use crate::session::{EngineError, MatchSession, StatOutcome};
use crate::stats::StatKey;

/// A discrete trigger. Each one runs to completion against the session.
#[derive(Debug, Clone)]
pub enum Command {
    Tick,
    StartClock,
    StopClock,
    StatDelta {
        player_id: String,
        key: StatKey,
        delta: i64,
    },
    ConfirmLocation {
        reason: String,
        location: PitchPoint,
    },
    CancelCapture,
    AssignCard {
        player_id: String,
        kind: CardKind,
        reason: String,
    },
    RemoveCard {
        player_id: String,
    },
    BigPlay {
        player_id: String,
        key: StatKey,
        description: String,
    },
    ToggleField {
        player_id: String,
    },
    SetTeamScore(i64),
    AdjustOpponentScore(i64),
    RecordSet {
        completed: bool,
    },
    EndPeriod,
    ConfirmEndPeriod,
    CancelEndPeriod,
    Log(String),
}

/// Applies a command; engine errors are reported to the console instead of propagating.
pub fn apply_command(session: &mut MatchSession, command: Command) -> Result<(), EngineError> {
    let result = dispatch(session, command);
    if let Err(err) = &result {
        session.push_log(format!("[WARN] {err}"));
    }
    result
}

fn dispatch(session: &mut MatchSession, command: Command) -> Result<(), EngineError> {
    match command {
        Command::Tick => {
            session.tick();
        }
        Command::StartClock => session.start_clock()?,
        Command::StopClock => session.stop_clock(),
        Command::StatDelta {
            player_id,
            key,
            delta,
        } => {
            if session.apply_stat_delta(&player_id, key, delta)?
                == StatOutcome::RejectedClockStopped
            {
                session.push_log("[INFO] Clock stopped: start the clock to record stats");
            }
        }
        Command::ConfirmLocation { reason, location } => {
            session.confirm_location(reason, location)?;
        }
        Command::CancelCapture => {
            session.cancel_pending_capture();
        }
        Command::AssignCard {
            player_id,
            kind,
            reason,
        } => session.assign_card(&player_id, kind, reason)?,
        Command::RemoveCard { player_id } => session.remove_card(&player_id)?,
        Command::BigPlay {
            player_id,
            key,
            description,
        } => session.confirm_big_play(&player_id, key, description)?,
        Command::ToggleField { player_id } => {
            session.toggle_field(&player_id)?;
        }
        Command::SetTeamScore(value) => session.set_team_score(value)?,
        Command::AdjustOpponentScore(delta) => session.adjust_opponent_score(delta)?,
        Command::RecordSet { completed } => session.record_set(completed)?,
        Command::EndPeriod => session.end_period()?,
        Command::ConfirmEndPeriod => {
            session.confirm_end_period()?;
        }
        Command::CancelEndPeriod => session.cancel_end_period(),
        Command::Log(msg) => session.push_log(msg),
    }
    Ok(())
}
