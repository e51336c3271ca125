use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::session::MatchSession;
use crate::state::MatchState;

const SNAPSHOT_VERSION: u32 = 1;
const SNAPSHOT_PREFIX: &str = "live_match";

#[derive(Debug, Deserialize)]
struct SnapshotHeader {
    version: u32,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SnapshotFile {
    version: u32,
    saved_at: u64,
    state: MatchState,
}

/// Single-slot storage for the resumable match.
pub trait SnapshotStore {
    fn exists(&self) -> bool;
    fn load(&self) -> Result<Option<MatchState>>;
    /// Replaces whatever was stored before.
    fn save(&mut self, state: &MatchState) -> Result<()>;
    fn clear(&mut self) -> Result<()>;
}

/// JSON file per user under the data directory.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(dir: &Path, user_key: &str) -> Self {
        JsonFileStore {
            path: dir.join(snapshot_file_name(user_key)),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SnapshotStore for JsonFileStore {
    fn exists(&self) -> bool {
        self.path.is_file()
    }

    fn load(&self) -> Result<Option<MatchState>> {
        if !self.exists() {
            return Ok(None);
        }
        let raw = fs::read_to_string(&self.path)
            .with_context(|| format!("read snapshot {}", self.path.display()))?;
        decode_snapshot(&raw)
    }

    fn save(&mut self, state: &MatchState) -> Result<()> {
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir)
                .with_context(|| format!("create snapshot dir {}", dir.display()))?;
        }
        let json = encode_snapshot(state)?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json).with_context(|| format!("write snapshot {}", tmp.display()))?;
        fs::rename(&tmp, &self.path)
            .with_context(|| format!("replace snapshot {}", self.path.display()))?;
        Ok(())
    }

    fn clear(&mut self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => {
                Err(err).with_context(|| format!("remove snapshot {}", self.path.display()))
            }
        }
    }
}

/// Keeps the encoded snapshot in memory; used when no data directory is available.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    raw: Option<String>,
    pub saves: usize,
}

impl SnapshotStore for MemoryStore {
    fn exists(&self) -> bool {
        self.raw.is_some()
    }

    fn load(&self) -> Result<Option<MatchState>> {
        match &self.raw {
            Some(raw) => decode_snapshot(raw),
            None => Ok(None),
        }
    }

    fn save(&mut self, state: &MatchState) -> Result<()> {
        self.raw = Some(encode_snapshot(state)?);
        self.saves += 1;
        Ok(())
    }

    fn clear(&mut self) -> Result<()> {
        self.raw = None;
        Ok(())
    }
}

fn encode_snapshot(state: &MatchState) -> Result<String> {
    let saved_at = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    let file = SnapshotFile {
        version: SNAPSHOT_VERSION,
        saved_at,
        state: state.clone(),
    };
    serde_json::to_string(&file).context("encode snapshot")
}

/// Snapshots from another format version are not resumable.
fn decode_snapshot(raw: &str) -> Result<Option<MatchState>> {
    let header = serde_json::from_str::<SnapshotHeader>(raw).context("decode snapshot header")?;
    if header.version != SNAPSHOT_VERSION {
        return Ok(None);
    }
    let file = serde_json::from_str::<SnapshotFile>(raw).context("decode snapshot")?;
    Ok(Some(file.state))
}

fn snapshot_file_name(user_key: &str) -> String {
    let digest = Sha256::digest(user_key.trim().as_bytes());
    let hex = format!("{digest:x}");
    format!("{SNAPSHOT_PREFIX}_{}.json", &hex[..16])
}

/// Write-on-settle: saves once the session has been quiet for `settle`,
/// or after `max_delay` of continuous change (a running clock never settles).
pub struct SnapshotWriter {
    store: Box<dyn SnapshotStore>,
    settle: Duration,
    max_delay: Duration,
    seen_revision: Option<u64>,
    last_change: Option<Instant>,
    pending_since: Option<Instant>,
    writes: u64,
}

impl SnapshotWriter {
    pub fn new(store: Box<dyn SnapshotStore>, settle: Duration, max_delay: Duration) -> Self {
        SnapshotWriter {
            store,
            settle,
            max_delay,
            seen_revision: None,
            last_change: None,
            pending_since: None,
            writes: 0,
        }
    }

    pub fn store(&self) -> &dyn SnapshotStore {
        self.store.as_ref()
    }

    pub fn store_mut(&mut self) -> &mut dyn SnapshotStore {
        self.store.as_mut()
    }

    pub fn writes(&self) -> u64 {
        self.writes
    }

    pub fn has_pending(&self) -> bool {
        self.pending_since.is_some()
    }

    /// Returns true when a snapshot was written.
    pub fn poll(&mut self, session: &mut MatchSession, now: Instant) -> bool {
        if !session.is_dirty() {
            self.pending_since = None;
            return false;
        }
        if self.seen_revision != Some(session.revision()) {
            self.seen_revision = Some(session.revision());
            self.last_change = Some(now);
            self.pending_since.get_or_insert(now);
        }
        let Some(pending_since) = self.pending_since else {
            return false;
        };
        let quiet = self
            .last_change
            .is_some_and(|t| now.duration_since(t) >= self.settle);
        let overdue = now.duration_since(pending_since) >= self.max_delay;
        if !(quiet || overdue) {
            return false;
        }
        let wrote = self.flush(session);
        if !wrote {
            // Retry after another settle window.
            self.pending_since = Some(now);
            self.last_change = Some(now);
        }
        wrote
    }

    /// Writes now if the session has unsaved changes.
    pub fn flush(&mut self, session: &mut MatchSession) -> bool {
        if !session.is_dirty() {
            return false;
        }
        match self.store.save(session.state()) {
            Ok(()) => {
                session.mark_clean();
                self.pending_since = None;
                self.writes += 1;
                true
            }
            Err(err) => {
                session.push_log(format!("[WARN] Snapshot save failed: {err:#}"));
                false
            }
        }
    }

    /// Abandons the live match: the session is closed and its snapshot removed.
    pub fn discard(&mut self, session: &mut MatchSession) -> Result<()> {
        self.reset();
        session.discard(self.store.as_mut())
    }

    /// Removes a stored snapshot that was never resumed.
    pub fn clear_stored(&mut self) -> Result<()> {
        self.reset();
        self.store.clear()
    }

    fn reset(&mut self) {
        self.pending_since = None;
        self.last_change = None;
        self.seen_revision = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_file_name_is_stable_and_opaque() {
        let a = snapshot_file_name("coach@example.com");
        let b = snapshot_file_name(" coach@example.com ");
        assert_eq!(a, b);
        assert!(a.starts_with("live_match_"));
        assert!(!a.contains('@'));
        assert_ne!(a, snapshot_file_name("other"));
    }

    #[test]
    fn version_mismatch_is_not_resumable() {
        let raw = r#"{"version":999,"savedAt":0,"state":{}}"#;
        assert!(decode_snapshot(raw).unwrap().is_none());
        assert!(decode_snapshot("{").is_err());
    }
}
