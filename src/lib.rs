pub mod clock;
pub mod command;
pub mod config;
pub mod demo_feed;
pub mod export;
pub mod game_log;
pub mod persist;
pub mod presets;
pub mod record;
pub mod record_store;
pub mod remote;
pub mod roster;
pub mod score;
pub mod session;
pub mod state;
pub mod stats;
