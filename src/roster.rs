use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::stats::{StatKey, TRACKED_STATS};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CardStatus {
    #[default]
    None,
    Yellow,
    Red,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CardKind {
    Yellow,
    Red,
}

impl CardKind {
    pub fn label(self) -> &'static str {
        match self {
            CardKind::Yellow => "Yellow Card",
            CardKind::Red => "Red Card",
        }
    }
}

/// One roster slot for the match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    pub id: String,
    pub name: String,
    pub number: u32,
    pub stats: BTreeMap<StatKey, u32>,
    pub is_on_field: bool,
    #[serde(default)]
    pub card_status: CardStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sin_bin_start_time: Option<u64>,
    #[serde(default)]
    pub last_sub_time: u64,
    #[serde(default)]
    pub total_seconds_on_field: u64,
}

impl Player {
    pub fn placeholder(number: u32) -> Self {
        Player {
            id: slot_id(number),
            name: format!("Player {number}"),
            number,
            stats: empty_stats(),
            is_on_field: false,
            card_status: CardStatus::None,
            sin_bin_start_time: None,
            last_sub_time: 0,
            total_seconds_on_field: 0,
        }
    }

    pub fn stat(&self, key: StatKey) -> u32 {
        self.stats.get(&key).copied().unwrap_or(0)
    }

    /// Applies a signed delta, flooring at zero. Returns the new value.
    pub fn apply_delta(&mut self, key: StatKey, delta: i64) -> u32 {
        let current = i64::from(self.stat(key));
        let next = current.saturating_add(delta).clamp(0, i64::from(u32::MAX)) as u32;
        self.stats.insert(key, next);
        next
    }

    /// On field and eligible to accrue time.
    pub fn is_accruing(&self) -> bool {
        self.is_on_field && self.card_status != CardStatus::Red
    }
}

pub fn slot_id(number: u32) -> String {
    format!("slot-{number}")
}

pub fn empty_stats() -> BTreeMap<StatKey, u32> {
    TRACKED_STATS.iter().map(|k| (*k, 0)).collect()
}

/// Fresh roster of numbered placeholders; slots up to `field_size` start on field.
pub fn placeholder_roster(squad_size: u32, field_size: u32) -> Vec<Player> {
    (1..=squad_size)
        .map(|number| {
            let mut p = Player::placeholder(number);
            p.is_on_field = number <= field_size;
            p
        })
        .collect()
}

/// One entry of the squad selection made before kickoff.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SquadSelection {
    pub number: u32,
    pub squad_id: String,
    pub name: String,
}

/// Binds selected squad members to the slot carrying the same jersey number.
/// Returns how many slots were bound.
pub fn bind_squad(players: &mut [Player], selections: &[SquadSelection]) -> usize {
    let mut bound = 0;
    for idx in 0..players.len() {
        let number = players[idx].number;
        let Some(sel) = selections.iter().find(|s| s.number == number) else {
            continue;
        };
        let squad_id = sel.squad_id.trim();
        // Ids stay unique; a repeated squad id keeps the slot id.
        let taken = players
            .iter()
            .enumerate()
            .any(|(other, p)| other != idx && p.id == squad_id);
        if !squad_id.is_empty() && !taken {
            players[idx].id = squad_id.to_string();
        }
        if !sel.name.trim().is_empty() {
            players[idx].name = sel.name.trim().to_string();
        }
        bound += 1;
    }
    bound
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extreme_deltas_saturate() {
        let mut p = Player::placeholder(1);
        assert_eq!(p.apply_delta(StatKey::Tackles, i64::MAX), u32::MAX);
        assert_eq!(p.apply_delta(StatKey::Tackles, i64::MAX), u32::MAX);
        assert_eq!(p.apply_delta(StatKey::Tackles, i64::MIN), 0);
    }

    #[test]
    fn delta_floors_at_zero() {
        let mut p = Player::placeholder(1);
        p.apply_delta(StatKey::Tackles, 2);
        assert_eq!(p.apply_delta(StatKey::Tackles, -5), 0);
    }

    #[test]
    fn bind_keeps_unmatched_placeholders() {
        let mut roster = placeholder_roster(3, 2);
        let bound = bind_squad(
            &mut roster,
            &[SquadSelection {
                number: 2,
                squad_id: "sq-42".into(),
                name: "J. Smith".into(),
            }],
        );
        assert_eq!(bound, 1);
        assert_eq!(roster[1].id, "sq-42");
        assert_eq!(roster[1].name, "J. Smith");
        assert_eq!(roster[0].id, "slot-1");
        assert_eq!(roster[2].name, "Player 3");
        assert!(roster[1].is_on_field);
        assert!(!roster[2].is_on_field);
    }

    #[test]
    fn repeated_squad_id_keeps_slot_id() {
        let mut roster = placeholder_roster(3, 3);
        let sel = |number: u32| SquadSelection {
            number,
            squad_id: "sq-7".into(),
            name: format!("Name {number}"),
        };
        bind_squad(&mut roster, &[sel(1), sel(2)]);
        assert_eq!(roster[0].id, "sq-7");
        assert_eq!(roster[1].id, "slot-2");
        assert_eq!(roster[1].name, "Name 2");
    }
}
