use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Entry of `backup_history.json`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BackupRecord {
    pub date: NaiveDateTime,
    pub filename: String,
    #[serde(alias = "size")]
    pub size_bytes: u64,
    pub path: String,
    pub created_by: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct BackupFile {
    pub filename: String,
    pub size_bytes: u64,
    pub modified: Option<NaiveDateTime>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ArchiveEntry {
    pub name: String,
    pub size: u64,
    pub modified: Option<NaiveDateTime>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RestoreFailure {
    pub file: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct RestoreReport {
    pub restored: Vec<String>,
    pub failed: Vec<RestoreFailure>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BackupStats {
    pub count: usize,
    pub average_size_kb: f64,
    pub last_backup: Option<NaiveDateTime>,
    pub days_since_last: Option<i64>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Delta {
    pub current: i64,
    pub backup: i64,
    pub difference: i64,
}

impl Delta {
    pub fn new(current: usize, backup: usize) -> Self {
        let (current, backup) = (current as i64, backup as i64);
        Self {
            current,
            backup,
            difference: current - backup,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Comparison {
    pub total_responses: Delta,
    pub unique_clients: Delta,
}
