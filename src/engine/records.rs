//! The local history list: finished games appended to a JSON file in
//! the platform data directory. Reading tolerates a missing or
//! damaged file; only writing reports a failure.

use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::model::game_state::LogEntry;
use crate::model::results::WinResult;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameRecord {
    pub script: String,
    pub result: Option<WinResult>,
    pub log: Vec<LogEntry>,
}

fn records_path() -> PathBuf {
    let mut path = dirs::data_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push("grimoire");
    fs::create_dir_all(&path).ok();
    path.push("records.json");
    path
}

pub fn load_records() -> Vec<GameRecord> {
    let path = records_path();
    fs::read_to_string(path)
        .ok()
        .and_then(|s| serde_json::from_str(&s).ok())
        .unwrap_or_default()
}

pub fn append_record(record: GameRecord) -> anyhow::Result<()> {
    let mut records = load_records();
    records.push(record);
    let json = serde_json::to_string_pretty(&records)?;
    fs::write(records_path(), json)?;
    Ok(())
}
