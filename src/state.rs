use serde::{Deserialize, Serialize};

use crate::clock::MatchClock;
use crate::config::EngineConfig;
use crate::game_log::GameLog;
use crate::roster::{Player, placeholder_roster};
use crate::score;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Period {
    #[default]
    FirstHalf,
    SecondHalf,
    Finalized,
}

impl Period {
    pub fn label(self) -> &'static str {
        match self {
            Period::FirstHalf => "1st Half",
            Period::SecondHalf => "2nd Half",
            Period::Finalized => "Full Time",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetCounts {
    pub completed: u32,
    pub total: u32,
}

impl SetCounts {
    pub fn record(&mut self, completed: bool) {
        self.total = self.total.saturating_add(1);
        if completed {
            self.completed = self.completed.saturating_add(1);
        }
    }

    pub fn undo(&mut self, completed: bool) {
        if self.total == 0 {
            return;
        }
        if completed && self.completed == 0 {
            return;
        }
        self.total -= 1;
        if completed {
            self.completed -= 1;
        }
        self.completed = self.completed.min(self.total);
    }

    pub fn completion_rate(&self) -> Option<f32> {
        if self.total == 0 {
            return None;
        }
        Some(self.completed as f32 / self.total as f32 * 100.0)
    }
}

/// Aggregate root: everything a snapshot carries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchState {
    pub players: Vec<Player>,
    pub game_log: GameLog,
    #[serde(flatten)]
    pub clock: MatchClock,
    pub period: Period,
    pub opponent_score: u32,
    pub home_score_adjustment: i64,
    pub team_name: String,
    pub opponent_name: String,
    pub sets: SetCounts,
    #[serde(default)]
    pub squad_pending: bool,
}

impl MatchState {
    pub fn fresh(config: &EngineConfig) -> Self {
        MatchState {
            players: placeholder_roster(config.squad_size, config.field_size),
            game_log: GameLog::default(),
            clock: MatchClock::default(),
            period: Period::FirstHalf,
            opponent_score: 0,
            home_score_adjustment: 0,
            team_name: config.team_name.clone(),
            opponent_name: config.opponent_name.clone(),
            sets: SetCounts::default(),
            squad_pending: true,
        }
    }

    pub fn player(&self, id: &str) -> Option<&Player> {
        self.players.iter().find(|p| p.id == id)
    }

    pub fn player_mut(&mut self, id: &str) -> Option<&mut Player> {
        self.players.iter_mut().find(|p| p.id == id)
    }

    pub fn derived_home_score(&self) -> i64 {
        score::derived_home_score(&self.players)
    }

    pub fn team_score(&self) -> i64 {
        score::team_score(&self.players, self.home_score_adjustment)
    }

    pub fn on_field_count(&self) -> usize {
        self.players.iter().filter(|p| p.is_on_field).count()
    }
}
