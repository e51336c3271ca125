use serde::{Deserialize, Serialize};

use crate::roster::Player;
use crate::stats::StatKey;

pub const TRY_POINTS: i64 = 4;
/// Every recorded kick counts as a converted goal.
pub const KICK_POINTS: i64 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchResult {
    Win,
    Loss,
    Draw,
}

impl MatchResult {
    pub fn from_scores(team: i64, opponent: i64) -> Self {
        match team.cmp(&opponent) {
            std::cmp::Ordering::Greater => MatchResult::Win,
            std::cmp::Ordering::Less => MatchResult::Loss,
            std::cmp::Ordering::Equal => MatchResult::Draw,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            MatchResult::Win => "WIN",
            MatchResult::Loss => "LOSS",
            MatchResult::Draw => "DRAW",
        }
    }
}

pub fn derived_home_score(players: &[Player]) -> i64 {
    players
        .iter()
        .map(|p| {
            i64::from(p.stat(StatKey::Tries)) * TRY_POINTS
                + i64::from(p.stat(StatKey::Kicks)) * KICK_POINTS
        })
        .sum()
}

pub fn team_score(players: &[Player], adjustment: i64) -> i64 {
    derived_home_score(players).saturating_add(adjustment)
}

/// Residual that makes the displayed team score equal `entered`.
pub fn adjustment_for(players: &[Player], entered: i64) -> i64 {
    entered.saturating_sub(derived_home_score(players))
}

pub fn final_score_string(team: i64, opponent: u32) -> String {
    format!("{team} - {opponent}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn result_from_scores() {
        assert_eq!(MatchResult::from_scores(10, 4), MatchResult::Win);
        assert_eq!(MatchResult::from_scores(4, 10), MatchResult::Loss);
        assert_eq!(MatchResult::from_scores(6, 6), MatchResult::Draw);
    }

    #[test]
    fn adjustment_reconciles_manual_score() {
        let mut p = Player::placeholder(7);
        p.stats.insert(StatKey::Tries, 2);
        p.stats.insert(StatKey::Kicks, 1);
        let players = vec![p];
        assert_eq!(derived_home_score(&players), 10);
        let adj = adjustment_for(&players, 3);
        assert_eq!(adj, -7);
        assert_eq!(team_score(&players, adj), 3);
    }

    #[test]
    fn extreme_scores_saturate() {
        let mut p = Player::placeholder(7);
        p.stats.insert(StatKey::Tries, 1);
        let players = vec![p];
        assert_eq!(team_score(&players, i64::MAX), i64::MAX);
        assert_eq!(team_score(&players, i64::MIN), i64::MIN + 4);
        assert_eq!(adjustment_for(&players, i64::MIN), i64::MIN);
    }
}
