use std::env;
use std::path::PathBuf;
use std::time::Duration;

const APP_DIR: &str = "touchline";

pub const DEFAULT_TEAM_NAME: &str = "My Team";
pub const DEFAULT_OPPONENT_NAME: &str = "Opponent";

#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub user_key: String,
    pub data_dir: Option<PathBuf>,
    pub squad_size: u32,
    pub field_size: u32,
    pub sin_bin_secs: u64,
    pub snapshot_settle: Duration,
    pub snapshot_max_delay: Duration,
    pub allow_red_card_removal: bool,
    pub team_name: String,
    pub opponent_name: String,
    pub squad_file: Option<PathBuf>,
    pub record_endpoint: Option<String>,
    pub demo_feed: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            user_key: "local".to_string(),
            data_dir: None,
            squad_size: 17,
            field_size: 13,
            sin_bin_secs: 600,
            snapshot_settle: Duration::from_millis(1500),
            snapshot_max_delay: Duration::from_secs(5),
            allow_red_card_removal: true,
            team_name: DEFAULT_TEAM_NAME.to_string(),
            opponent_name: DEFAULT_OPPONENT_NAME.to_string(),
            squad_file: None,
            record_endpoint: None,
            demo_feed: false,
        }
    }
}

impl EngineConfig {
    pub fn from_env() -> Self {
        let defaults = EngineConfig::default();
        let squad_size = env_parse::<u32>("SQUAD_SIZE")
            .unwrap_or(defaults.squad_size)
            .clamp(1, 30);
        let field_size = env_parse::<u32>("FIELD_SIZE")
            .unwrap_or(defaults.field_size)
            .clamp(1, squad_size);
        EngineConfig {
            user_key: env_string("TOUCHLINE_USER").unwrap_or(defaults.user_key),
            data_dir: env_string("TOUCHLINE_DATA_DIR")
                .map(PathBuf::from)
                .or_else(default_data_dir),
            squad_size,
            field_size,
            sin_bin_secs: env_parse::<u64>("SIN_BIN_SECS")
                .unwrap_or(defaults.sin_bin_secs)
                .max(1),
            snapshot_settle: Duration::from_millis(
                env_parse::<u64>("SNAPSHOT_SETTLE_MS")
                    .unwrap_or(1500)
                    .max(100),
            ),
            snapshot_max_delay: Duration::from_secs(
                env_parse::<u64>("SNAPSHOT_MAX_DELAY_SECS")
                    .unwrap_or(5)
                    .max(1),
            ),
            allow_red_card_removal: env_bool("ALLOW_RED_CARD_REMOVAL")
                .unwrap_or(defaults.allow_red_card_removal),
            team_name: env_string("TEAM_NAME").unwrap_or(defaults.team_name),
            opponent_name: env_string("OPPONENT_NAME").unwrap_or(defaults.opponent_name),
            squad_file: env_string("SQUAD_FILE").map(PathBuf::from),
            record_endpoint: env_string("RECORD_ENDPOINT"),
            demo_feed: env_bool("DEMO_FEED").unwrap_or(false),
        }
    }

    pub fn snapshot_dir(&self) -> Option<PathBuf> {
        self.data_dir.clone().or_else(default_data_dir)
    }

    pub fn records_db_path(&self) -> Option<PathBuf> {
        self.snapshot_dir().map(|dir| dir.join("matches.sqlite"))
    }
}

fn default_data_dir() -> Option<PathBuf> {
    if let Ok(base) = env::var("XDG_DATA_HOME") {
        if !base.trim().is_empty() {
            return Some(PathBuf::from(base).join(APP_DIR));
        }
    }
    let home = env::var("HOME").ok()?;
    if home.trim().is_empty() {
        return None;
    }
    Some(
        PathBuf::from(home)
            .join(".local")
            .join("share")
            .join(APP_DIR),
    )
}

fn env_string(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    env_string(name).and_then(|v| v.parse::<T>().ok())
}

fn env_bool(name: &str) -> Option<bool> {
    let raw = env_string(name)?.to_ascii_lowercase();
    match raw.as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
