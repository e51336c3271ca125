use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::roster::{CardStatus, Player};

/// Stat keys tracked per player. Serialized names are the snapshot/record keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StatKey {
    Tries,
    Tackles,
    Kicks,
    Errors,
    Penalties,
    LineBreaks,
    Offloads,
    TrySaves,
    FortyTwenties,
    MissedTackles,
}

pub const TRACKED_STATS: [StatKey; 10] = [
    StatKey::Tries,
    StatKey::Tackles,
    StatKey::Kicks,
    StatKey::Errors,
    StatKey::Penalties,
    StatKey::LineBreaks,
    StatKey::Offloads,
    StatKey::TrySaves,
    StatKey::FortyTwenties,
    StatKey::MissedTackles,
];

impl StatKey {
    pub fn label(self) -> &'static str {
        match self {
            StatKey::Tries => "Tries",
            StatKey::Tackles => "Tackles",
            StatKey::Kicks => "Kicks",
            StatKey::Errors => "Errors",
            StatKey::Penalties => "Penalties",
            StatKey::LineBreaks => "Line Breaks",
            StatKey::Offloads => "Offloads",
            StatKey::TrySaves => "Try Saves",
            StatKey::FortyTwenties => "40/20s",
            StatKey::MissedTackles => "Missed Tackles",
        }
    }

    pub fn short_label(self) -> &'static str {
        match self {
            StatKey::Tries => "TRY",
            StatKey::Tackles => "TKL",
            StatKey::Kicks => "KCK",
            StatKey::Errors => "ERR",
            StatKey::Penalties => "PEN",
            StatKey::LineBreaks => "LB",
            StatKey::Offloads => "OFF",
            StatKey::TrySaves => "TS",
            StatKey::FortyTwenties => "40/20",
            StatKey::MissedTackles => "MT",
        }
    }

    /// Positive deltas for these keys wait for a location/reason capture.
    pub fn needs_location(self) -> bool {
        matches!(self, StatKey::Penalties | StatKey::Errors)
    }

    pub fn next(self) -> StatKey {
        let idx = TRACKED_STATS.iter().position(|k| *k == self).unwrap_or(0);
        TRACKED_STATS[(idx + 1) % TRACKED_STATS.len()]
    }

    pub fn prev(self) -> StatKey {
        let idx = TRACKED_STATS.iter().position(|k| *k == self).unwrap_or(0);
        TRACKED_STATS[(idx + TRACKED_STATS.len() - 1) % TRACKED_STATS.len()]
    }
}

/// Team-level figures, rebuilt from the roster after every change.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TeamAggregates {
    pub totals: BTreeMap<StatKey, u32>,
    pub max_values: BTreeMap<StatKey, u32>,
    pub leader_counts: BTreeMap<StatKey, usize>,
}

impl TeamAggregates {
    pub fn compute(players: &[Player]) -> Self {
        let mut out = TeamAggregates::default();
        for key in TRACKED_STATS {
            let mut total = 0u32;
            let mut max = 0u32;
            for player in players {
                let value = player.stat(key);
                total = total.saturating_add(value);
                max = max.max(value);
            }
            // A team-wide zero has no leader.
            let leaders = if max > 0 {
                players.iter().filter(|p| p.stat(key) == max).count()
            } else {
                0
            };
            out.totals.insert(key, total);
            out.max_values.insert(key, max);
            out.leader_counts.insert(key, leaders);
        }
        out
    }

    pub fn total(&self, key: StatKey) -> u32 {
        self.totals.get(&key).copied().unwrap_or(0)
    }

    pub fn max_value(&self, key: StatKey) -> u32 {
        self.max_values.get(&key).copied().unwrap_or(0)
    }

    pub fn leader_count(&self, key: StatKey) -> usize {
        self.leader_counts.get(&key).copied().unwrap_or(0)
    }

    pub fn is_leader(&self, player: &Player, key: StatKey) -> bool {
        let max = self.max_value(key);
        max > 0 && player.stat(key) == max
    }
}

const IMPACT_WEIGHTS: [(StatKey, i64); 10] = [
    (StatKey::Tries, 8),
    (StatKey::LineBreaks, 4),
    (StatKey::TrySaves, 4),
    (StatKey::FortyTwenties, 4),
    (StatKey::Offloads, 2),
    (StatKey::Kicks, 2),
    (StatKey::Tackles, 1),
    (StatKey::MissedTackles, -1),
    (StatKey::Errors, -2),
    (StatKey::Penalties, -2),
];

const YELLOW_CARD_IMPACT: i64 = -5;
const RED_CARD_IMPACT: i64 = -10;

/// Weighted ranking score. Never feeds the match score.
pub fn impact_score(player: &Player) -> i64 {
    let stats: i64 = IMPACT_WEIGHTS
        .iter()
        .map(|(key, weight)| i64::from(player.stat(*key)) * weight)
        .sum();
    let card = match player.card_status {
        CardStatus::None => 0,
        CardStatus::Yellow => YELLOW_CARD_IMPACT,
        CardStatus::Red => RED_CARD_IMPACT,
    };
    stats + card
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stat_key_cycle_wraps() {
        assert_eq!(StatKey::MissedTackles.next(), StatKey::Tries);
        assert_eq!(StatKey::Tries.prev(), StatKey::MissedTackles);
    }

    #[test]
    fn impact_includes_card_penalty() {
        let mut p = Player::placeholder(4);
        p.stats.insert(StatKey::Tries, 1);
        p.stats.insert(StatKey::Errors, 1);
        p.card_status = CardStatus::Yellow;
        assert_eq!(impact_score(&p), 8 - 2 - 5);
    }
}
