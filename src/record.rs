use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::game_log::GameLogEntry;
use crate::roster::Player;
use crate::score::MatchResult;
use crate::state::{Period, SetCounts};

/// Points handed out for a 3-2-1 best-player vote.
pub const VOTE_POINTS: [u32; 3] = [3, 2, 1];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerVote {
    pub player_id: String,
    pub player_name: String,
    pub points: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VotingPayload {
    pub votes: Vec<PlayerVote>,
}

impl VotingPayload {
    /// Best first; extra picks beyond the vote points are ignored.
    pub fn three_two_one(picks: &[&Player]) -> Self {
        let votes = picks
            .iter()
            .zip(VOTE_POINTS)
            .map(|(p, points)| PlayerVote {
                player_id: p.id.clone(),
                player_name: p.name.clone(),
                points,
            })
            .collect();
        VotingPayload { votes }
    }

    pub fn points_for(&self, player_id: &str) -> u32 {
        self.votes
            .iter()
            .filter(|v| v.player_id == player_id)
            .map(|v| v.points)
            .sum()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchData {
    pub players: Vec<Player>,
    pub game_log: Vec<GameLogEntry>,
    pub match_time: u64,
    pub period: Period,
    pub sets: SetCounts,
    pub home_score_adjustment: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinalizedMatchRecord {
    pub date: String,
    pub team_name: String,
    pub opponent_name: String,
    pub final_score: String,
    pub result: MatchResult,
    pub data: MatchData,
    pub voting: Option<VotingPayload>,
}

/// Durable destination for finished matches. Returns the stored record id.
pub trait RecordSink {
    fn submit(&mut self, record: &FinalizedMatchRecord) -> Result<String>;
}

/// Keeps submitted records in memory.
#[derive(Debug, Default)]
pub struct MemoryRecordSink {
    pub records: Vec<FinalizedMatchRecord>,
}

impl RecordSink for MemoryRecordSink {
    fn submit(&mut self, record: &FinalizedMatchRecord) -> Result<String> {
        self.records.push(record.clone());
        Ok(format!("mem-{}", self.records.len()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn three_two_one_assigns_descending_points() {
        let a = Player::placeholder(1);
        let b = Player::placeholder(2);
        let c = Player::placeholder(3);
        let d = Player::placeholder(4);
        let payload = VotingPayload::three_two_one(&[&a, &b, &c, &d]);
        assert_eq!(payload.votes.len(), 3);
        assert_eq!(payload.points_for("slot-1"), 3);
        assert_eq!(payload.points_for("slot-3"), 1);
        assert_eq!(payload.points_for("slot-4"), 0);
    }
}
