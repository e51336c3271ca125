use std::path::Path;

use anyhow::{Context, Result};
use chrono::Utc;
use rusqlite::{Connection, params};

use crate::record::{FinalizedMatchRecord, RecordSink};

#[derive(Debug, Clone)]
pub struct StoredRecord {
    pub id: i64,
    pub owner: String,
    pub date: String,
    pub team_name: String,
    pub opponent_name: String,
    pub final_score: String,
    pub result: String,
}

/// Finished matches in a local SQLite database, one row per match.
pub struct SqliteRecordStore {
    conn: Connection,
    owner: String,
}

impl SqliteRecordStore {
    pub fn open(path: &Path, owner: &str) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).ok();
        }
        let conn =
            Connection::open(path).with_context(|| format!("open sqlite db {}", path.display()))?;
        init_schema(&conn)?;
        Ok(SqliteRecordStore {
            conn,
            owner: owner.to_string(),
        })
    }

    pub fn in_memory(owner: &str) -> Result<Self> {
        let conn = Connection::open_in_memory().context("open in-memory sqlite db")?;
        init_schema(&conn)?;
        Ok(SqliteRecordStore {
            conn,
            owner: owner.to_string(),
        })
    }

    pub fn list_records(&self) -> Result<Vec<StoredRecord>> {
        let mut stmt = self
            .conn
            .prepare(
                r#"
                SELECT id, owner, date, team_name, opponent_name, final_score, result
                FROM matches
                WHERE owner = ?1
                ORDER BY date DESC, id DESC
                "#,
            )
            .context("prepare list records query")?;

        let rows = stmt
            .query_map(params![self.owner], |row| {
                Ok(StoredRecord {
                    id: row.get(0)?,
                    owner: row.get(1)?,
                    date: row.get(2)?,
                    team_name: row.get(3)?,
                    opponent_name: row.get(4)?,
                    final_score: row.get(5)?,
                    result: row.get(6)?,
                })
            })
            .context("query list records")?;

        let mut out = Vec::new();
        for row in rows {
            out.push(row.context("decode record row")?);
        }
        Ok(out)
    }

    pub fn load_record(&self, id: i64) -> Result<Option<FinalizedMatchRecord>> {
        let payload: Option<String> = self
            .conn
            .query_row(
                "SELECT payload FROM matches WHERE id = ?1 AND owner = ?2",
                params![id, self.owner],
                |row| row.get(0),
            )
            .map(Some)
            .or_else(|err| match err {
                rusqlite::Error::QueryReturnedNoRows => Ok(None),
                other => Err(other),
            })
            .context("query record payload")?;
        let Some(payload) = payload else {
            return Ok(None);
        };
        let record = serde_json::from_str(&payload).context("decode record payload")?;
        Ok(Some(record))
    }
}

impl RecordSink for SqliteRecordStore {
    fn submit(&mut self, record: &FinalizedMatchRecord) -> Result<String> {
        let payload = serde_json::to_string(record).context("encode record payload")?;
        let result = serde_json::to_value(record.result)
            .ok()
            .and_then(|v| v.as_str().map(str::to_string))
            .unwrap_or_default();
        self.conn
            .execute(
                r#"
                INSERT INTO matches (
                    owner, date, team_name, opponent_name,
                    final_score, result, payload, created_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                "#,
                params![
                    self.owner,
                    record.date,
                    record.team_name,
                    record.opponent_name,
                    record.final_score,
                    result,
                    payload,
                    Utc::now().to_rfc3339(),
                ],
            )
            .context("insert match record")?;
        Ok(self.conn.last_insert_rowid().to_string())
    }
}

fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS matches (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            owner TEXT NOT NULL,
            date TEXT NOT NULL,
            team_name TEXT NOT NULL,
            opponent_name TEXT NOT NULL,
            final_score TEXT NOT NULL,
            result TEXT NOT NULL,
            payload TEXT NOT NULL,
            created_at TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_matches_owner ON matches(owner);
        CREATE INDEX IF NOT EXISTS idx_matches_date ON matches(date);
        "#,
    )
    .context("create sqlite schema")?;
    Ok(())
}
