use serde::{Deserialize, Serialize};

use crate::clock::format_clock;
use crate::roster::Player;
use crate::state::Period;
use crate::stats::StatKey;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Try,
    Penalty,
    Error,
    YellowCard,
    RedCard,
    Substitution,
    BigPlay,
    Other,
}

impl EventKind {
    pub fn for_stat(key: StatKey) -> EventKind {
        match key {
            StatKey::Tries => EventKind::Try,
            StatKey::Penalties => EventKind::Penalty,
            StatKey::Errors => EventKind::Error,
            _ => EventKind::Other,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            EventKind::Try => "TRY",
            EventKind::Penalty => "PEN",
            EventKind::Error => "ERR",
            EventKind::YellowCard => "YC",
            EventKind::RedCard => "RC",
            EventKind::Substitution => "SUB",
            EventKind::BigPlay => "BIG",
            EventKind::Other => "STAT",
        }
    }
}

/// Position on the pitch in percent of length (`x`) and width (`y`).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PitchPoint {
    pub x: f32,
    pub y: f32,
}

impl PitchPoint {
    pub fn new(x: f32, y: f32) -> Self {
        PitchPoint {
            x: x.clamp(0.0, 100.0),
            y: y.clamp(0.0, 100.0),
        }
    }

    pub fn centre() -> Self {
        PitchPoint { x: 50.0, y: 50.0 }
    }
}

/// Player identity as it was when the event happened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerRef {
    pub player_id: String,
    pub player_name: String,
    pub player_number: Option<u32>,
}

impl PlayerRef {
    pub fn capture(player: Option<&Player>, id: &str) -> Self {
        match player {
            Some(p) => PlayerRef {
                player_id: p.id.clone(),
                player_name: p.name.clone(),
                player_number: Some(p.number),
            },
            None => PlayerRef {
                player_id: id.to_string(),
                player_name: "Unknown".to_string(),
                player_number: None,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameLogEntry {
    pub id: u64,
    pub timestamp: u64,
    pub clock: String,
    #[serde(flatten)]
    pub player: PlayerRef,
    pub kind: EventKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<PitchPoint>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub impact: Option<i32>,
    pub period: Period,
}

/// Fields for an entry not yet stamped with id and time.
#[derive(Debug, Clone)]
pub struct NewEntry {
    pub player: PlayerRef,
    pub kind: EventKind,
    pub reason: Option<String>,
    pub location: Option<PitchPoint>,
    pub impact: Option<i32>,
}

impl NewEntry {
    pub fn new(player: PlayerRef, kind: EventKind) -> Self {
        NewEntry {
            player,
            kind,
            reason: None,
            location: None,
            impact: None,
        }
    }

    pub fn reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    pub fn location(mut self, point: PitchPoint) -> Self {
        self.location = Some(point);
        self
    }

    pub fn impact(mut self, impact: i32) -> Self {
        self.impact = Some(impact);
        self
    }
}

/// Append-only journal, newest first.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GameLog {
    entries: Vec<GameLogEntry>,
}

impl GameLog {
    pub fn push(&mut self, entry: NewEntry, elapsed: u64, period: Period) -> &GameLogEntry {
        let id = self.next_id();
        self.entries.insert(
            0,
            GameLogEntry {
                id,
                timestamp: elapsed,
                clock: format_clock(elapsed),
                player: entry.player,
                kind: entry.kind,
                reason: entry.reason,
                location: entry.location,
                impact: entry.impact,
                period,
            },
        );
        &self.entries[0]
    }

    pub fn entries(&self) -> &[GameLogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn latest(&self) -> Option<&GameLogEntry> {
        self.entries.first()
    }

    pub fn count_kind(&self, kind: EventKind) -> usize {
        self.entries.iter().filter(|e| e.kind == kind).count()
    }

    /// Ids only grow, so the newest entry carries the highest.
    fn next_id(&self) -> u64 {
        self.entries.first().map_or(1, |e| e.id.saturating_add(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn newest_entry_is_first() {
        let mut log = GameLog::default();
        let who = PlayerRef::capture(None, "ghost");
        log.push(NewEntry::new(who.clone(), EventKind::Try), 10, Period::FirstHalf);
        log.push(NewEntry::new(who, EventKind::Error), 20, Period::FirstHalf);
        assert_eq!(log.entries()[0].kind, EventKind::Error);
        assert_eq!(log.entries()[0].id, 2);
        assert_eq!(log.entries()[1].clock, "00:10");
    }

    #[test]
    fn ids_continue_after_reload() {
        let mut log = GameLog::default();
        let who = PlayerRef::capture(None, "ghost");
        for secs in 0..3 {
            log.push(NewEntry::new(who.clone(), EventKind::Other), secs, Period::FirstHalf);
        }
        let raw = serde_json::to_string(&log).unwrap();
        let mut reloaded: GameLog = serde_json::from_str(&raw).unwrap();
        let next = reloaded.push(NewEntry::new(who, EventKind::Try), 9, Period::SecondHalf);
        assert_eq!(next.id, 4);
        let ids: Vec<u64> = reloaded.entries().iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![4, 3, 2, 1]);
    }

    #[test]
    fn missing_player_gets_placeholder_identity() {
        let who = PlayerRef::capture(None, "p-99");
        assert_eq!(who.player_id, "p-99");
        assert_eq!(who.player_name, "Unknown");
        assert_eq!(who.player_number, None);
    }

    #[test]
    fn pitch_point_is_clamped() {
        let p = PitchPoint::new(-4.0, 140.0);
        assert_eq!(p, PitchPoint { x: 0.0, y: 100.0 });
    }
}
