//! Run history: one record per allocation run, keyed by a generated run id
//!
//! Records live in `runs.jsonl`, one per line, only ever appended to. Runs
//! against different ledgers share this file, so each append holds an OS
//! lock on it for the duration of the write.

use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use fs2::FileExt;
use haisha_domain::service::{AppendReport, RunSummary};
use haisha_types::{Error, Result};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

/// An input file used by a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputFileRef {
    /// "routes", "drivers", "inventory" or "details"
    pub role: String,
    pub path: String,
    /// SHA256 of the file contents at run time
    pub sha256: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunRecord {
    pub run_id: String,
    pub recorded_at: DateTime<Utc>,
    pub summary: RunSummary,
    #[serde(default)]
    pub inputs: Vec<InputFileRef>,
    /// `None` when the ledger was not written (dry run or blocked run)
    #[serde(default)]
    pub append: Option<AppendReport>,
}

/// Compute SHA256 for a file
pub fn fingerprint(path: &Path) -> Result<String> {
    let file = File::open(path)?;
    let mut reader = BufReader::new(file);
    let mut hasher = Sha256::new();
    std::io::copy(&mut reader, &mut hasher)?;
    Ok(format!("{:x}", hasher.finalize()))
}

pub const HISTORY_FILE: &str = "runs.jsonl";

/// Append-only log of run records, oldest first
pub struct RunHistoryStore {
    store_path: PathBuf,
    records: Vec<RunRecord>,
}

impl RunHistoryStore {
    /// Create or load a history store
    pub fn open(store_dir: PathBuf) -> Result<Self> {
        fs::create_dir_all(&store_dir)?;
        let store_path = store_dir.join(HISTORY_FILE);
        let records = read_records(&store_path)?;
        Ok(Self {
            store_path,
            records,
        })
    }

    fn append(&self, record: &RunRecord) -> Result<()> {
        let mut line = serde_json::to_vec(record)?;
        line.push(b'\n');

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.store_path)?;
        // Blocks while another run is appending; released when `file` closes
        file.lock_exclusive()?;
        file.write_all(&line)?;
        file.sync_data()?;
        Ok(())
    }

    /// Store a run and return its generated id
    pub fn record(
        &mut self,
        summary: RunSummary,
        inputs: Vec<InputFileRef>,
        append: Option<AppendReport>,
    ) -> Result<String> {
        let record = RunRecord {
            run_id: Uuid::new_v4().to_string(),
            recorded_at: Utc::now(),
            summary,
            inputs,
            append,
        };
        self.append(&record)?;
        let run_id = record.run_id.clone();
        self.records.push(record);
        Ok(run_id)
    }

    pub fn get(&self, run_id: &str) -> Option<&RunRecord> {
        self.records.iter().find(|r| r.run_id == run_id)
    }

    /// Newest first
    pub fn recent(&self, limit: usize) -> Vec<&RunRecord> {
        self.records.iter().rev().take(limit).collect()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

fn read_records(path: &Path) -> Result<Vec<RunRecord>> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let reader = BufReader::new(File::open(path)?);
    let mut records = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let record = serde_json::from_str(&line).map_err(|e| {
            Error::Ledger(format!("{} line {}: {}", path.display(), idx + 1, e))
        })?;
        records.push(record);
    }
    Ok(records)
}
