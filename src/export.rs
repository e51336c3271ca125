use std::path::Path;

use anyhow::{Context, Result};
use rust_xlsxwriter::{Workbook, Worksheet};

use crate::clock::format_clock;
use crate::record::FinalizedMatchRecord;
use crate::stats::{TRACKED_STATS, impact_score};

pub struct ExportReport {
    pub players: usize,
    pub events: usize,
    pub votes: usize,
}

/// Writes a finished match to an XLSX workbook.
pub fn export_record(path: &Path, record: &FinalizedMatchRecord) -> Result<ExportReport> {
    let summary_rows = summary_rows(record);
    let player_rows = player_rows(record);
    let log_rows = log_rows(record);
    let vote_rows = vote_rows(record);

    let mut workbook = Workbook::new();
    {
        let sheet = workbook.add_worksheet();
        sheet.set_name("Summary")?;
        write_rows(sheet, &summary_rows)?;
    }
    {
        let sheet = workbook.add_worksheet();
        sheet.set_name("Players")?;
        write_rows(sheet, &player_rows)?;
    }
    {
        let sheet = workbook.add_worksheet();
        sheet.set_name("GameLog")?;
        write_rows(sheet, &log_rows)?;
    }
    {
        let sheet = workbook.add_worksheet();
        sheet.set_name("Votes")?;
        write_rows(sheet, &vote_rows)?;
    }

    workbook
        .save(path)
        .with_context(|| format!("failed writing workbook to {}", path.display()))?;

    Ok(ExportReport {
        players: player_rows.len().saturating_sub(1),
        events: log_rows.len().saturating_sub(1),
        votes: vote_rows.len().saturating_sub(1),
    })
}

fn summary_rows(record: &FinalizedMatchRecord) -> Vec<Vec<String>> {
    let sets = record.data.sets;
    vec![
        vec!["Date".to_string(), record.date.clone()],
        vec!["Team".to_string(), record.team_name.clone()],
        vec!["Opponent".to_string(), record.opponent_name.clone()],
        vec!["Final Score".to_string(), record.final_score.clone()],
        vec!["Result".to_string(), record.result.label().to_string()],
        vec!["Match Time".to_string(), format_clock(record.data.match_time)],
        vec![
            "Sets".to_string(),
            format!("{}/{}", sets.completed, sets.total),
        ],
        vec![
            "Score Adjustment".to_string(),
            record.data.home_score_adjustment.to_string(),
        ],
    ]
}

fn player_rows(record: &FinalizedMatchRecord) -> Vec<Vec<String>> {
    let mut header = vec!["#".to_string(), "Name".to_string()];
    header.extend(TRACKED_STATS.iter().map(|k| k.label().to_string()));
    header.extend([
        "Card".to_string(),
        "Minutes".to_string(),
        "Impact".to_string(),
    ]);

    let mut rows = vec![header];
    for p in &record.data.players {
        let mut row = vec![p.number.to_string(), p.name.clone()];
        row.extend(TRACKED_STATS.iter().map(|k| p.stat(*k).to_string()));
        row.push(format!("{:?}", p.card_status));
        row.push(format!("{:.1}", p.total_seconds_on_field as f64 / 60.0));
        row.push(impact_score(p).to_string());
        rows.push(row);
    }
    rows
}

fn log_rows(record: &FinalizedMatchRecord) -> Vec<Vec<String>> {
    let mut rows = vec![vec![
        "Clock".to_string(),
        "Period".to_string(),
        "Event".to_string(),
        "#".to_string(),
        "Player".to_string(),
        "Reason".to_string(),
        "X".to_string(),
        "Y".to_string(),
    ]];
    // Oldest first reads better in a sheet.
    for e in record.data.game_log.iter().rev() {
        rows.push(vec![
            e.clock.clone(),
            e.period.label().to_string(),
            e.kind.label().to_string(),
            opt_to_string(e.player.player_number),
            e.player.player_name.clone(),
            e.reason.clone().unwrap_or_default(),
            opt_to_string(e.location.map(|l| l.x)),
            opt_to_string(e.location.map(|l| l.y)),
        ]);
    }
    rows
}

fn vote_rows(record: &FinalizedMatchRecord) -> Vec<Vec<String>> {
    let mut rows = vec![vec!["Player".to_string(), "Points".to_string()]];
    if let Some(voting) = &record.voting {
        for v in &voting.votes {
            rows.push(vec![v.player_name.clone(), v.points.to_string()]);
        }
    }
    rows
}

fn opt_to_string<T: std::fmt::Display>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn write_rows(worksheet: &mut Worksheet, rows: &[Vec<String>]) -> Result<()> {
    for (row_idx, row) in rows.iter().enumerate() {
        for (col_idx, value) in row.iter().enumerate() {
            worksheet
                .write_string(row_idx as u32, col_idx as u16, value)
                .with_context(|| format!("write cell ({row_idx},{col_idx})"))?;
        }
    }
    Ok(())
}
