//! Batch sources. Each fetch returns a complete batch; callers replace
//! their state with it wholesale.

use std::fs::File;
use std::path::PathBuf;

use campaign_core::{CampaignResult, Record};
use tracing::info;

use crate::sheet::read_batch;

/// Supplies a full, ordered record batch.
pub trait BatchSource: Send + Sync {
    fn fetch_batch(&self) -> CampaignResult<Vec<Record>>;

    /// Human-readable origin, for logs.
    fn describe(&self) -> String;
}

/// Reads the performance sheet from a CSV file on every fetch.
#[derive(Debug, Clone)]
pub struct CsvFileSource {
    path: PathBuf,
}

impl CsvFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl BatchSource for CsvFileSource {
    fn fetch_batch(&self) -> CampaignResult<Vec<Record>> {
        let file = File::open(&self.path)?;
        let (records, report) = read_batch(file)?;
        info!(
            path = %self.path.display(),
            accepted = report.accepted,
            dropped = report.dropped_total(),
            "Fetched batch"
        );
        Ok(records)
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// Fixed in-memory batch.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    records: Vec<Record>,
}

impl MemorySource {
    pub fn new(records: Vec<Record>) -> Self {
        Self { records }
    }
}

impl BatchSource for MemorySource {
    fn fetch_batch(&self) -> CampaignResult<Vec<Record>> {
        Ok(self.records.clone())
    }

    fn describe(&self) -> String {
        format!("memory ({} records)", self.records.len())
    }
}
