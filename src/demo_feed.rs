use std::sync::mpsc::Sender;
use std::thread;
use std::time::Duration;

use rand::Rng;
use rand::seq::SliceRandom;

use crate::command::Command;
use crate::game_log::PitchPoint;
use crate::presets::{BIG_PLAY_DESCRIPTIONS, CARD_REASONS, reasons_for_stat};
use crate::roster::CardKind;
use crate::stats::StatKey;

const FEED_INTERVAL: Duration = Duration::from_millis(1100);

const LIVE_STATS: [(StatKey, u32); 8] = [
    (StatKey::Tackles, 40),
    (StatKey::MissedTackles, 8),
    (StatKey::Offloads, 8),
    (StatKey::LineBreaks, 4),
    (StatKey::Kicks, 5),
    (StatKey::Tries, 3),
    (StatKey::Errors, 6),
    (StatKey::Penalties, 6),
];

/// Feeds random match actions for the given roster until the receiver hangs up.
pub fn spawn_demo_feed(tx: Sender<Command>, player_ids: Vec<String>) {
    thread::spawn(move || {
        if player_ids.is_empty() {
            return;
        }
        let mut rng = rand::thread_rng();
        if tx.send(Command::StartClock).is_err() {
            return;
        }
        let _ = tx.send(Command::Log("[INFO] Demo feed running".to_string()));
        loop {
            thread::sleep(FEED_INTERVAL);
            let commands = next_commands(&mut rng, &player_ids);
            for cmd in commands {
                if tx.send(cmd).is_err() {
                    return;
                }
            }
        }
    });
}

fn next_commands<R: Rng>(rng: &mut R, player_ids: &[String]) -> Vec<Command> {
    let Some(player_id) = player_ids.choose(rng).cloned() else {
        return Vec::new();
    };
    let roll = rng.gen_range(0..100u32);
    match roll {
        0..=59 => stat_commands(rng, player_id),
        60..=69 => vec![Command::RecordSet {
            completed: rng.gen_bool(0.75),
        }],
        70..=74 => vec![Command::AdjustOpponentScore(if rng.gen_bool(0.7) {
            4
        } else {
            2
        })],
        75..=79 => vec![Command::ToggleField { player_id }],
        80..=81 => {
            let kind = if rng.gen_bool(0.9) {
                CardKind::Yellow
            } else {
                CardKind::Red
            };
            vec![Command::AssignCard {
                player_id,
                kind,
                reason: pick_str(rng, &CARD_REASONS),
            }]
        }
        82..=83 => vec![Command::BigPlay {
            player_id,
            key: StatKey::TrySaves,
            description: pick_str(rng, &BIG_PLAY_DESCRIPTIONS),
        }],
        _ => Vec::new(),
    }
}

fn stat_commands<R: Rng>(rng: &mut R, player_id: String) -> Vec<Command> {
    let total: u32 = LIVE_STATS.iter().map(|(_, w)| w).sum();
    let mut pick = rng.gen_range(0..total);
    let mut key = StatKey::Tackles;
    for (candidate, weight) in LIVE_STATS {
        if pick < weight {
            key = candidate;
            break;
        }
        pick -= weight;
    }
    let mut out = vec![Command::StatDelta {
        player_id,
        key,
        delta: 1,
    }];
    if key.needs_location() {
        out.push(Command::ConfirmLocation {
            reason: pick_str(rng, reasons_for_stat(key)),
            location: PitchPoint::new(rng.gen_range(0.0..100.0), rng.gen_range(0.0..100.0)),
        });
    }
    out
}

fn pick_str<R: Rng>(rng: &mut R, options: &[&str]) -> String {
    options.choose(rng).copied().unwrap_or("Other").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn located_stats_are_followed_by_confirmation() {
        let mut rng = StdRng::seed_from_u64(7);
        let ids = vec!["slot-1".to_string(), "slot-2".to_string()];
        for _ in 0..500 {
            let cmds = next_commands(&mut rng, &ids);
            if let Some(Command::StatDelta { key, .. }) = cmds.first() {
                let confirmed = matches!(cmds.get(1), Some(Command::ConfirmLocation { .. }));
                assert_eq!(confirmed, key.needs_location());
            }
        }
    }
}
