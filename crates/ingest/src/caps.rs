//! Offer cap lookup keyed by `network-offer`.

use std::collections::HashMap;
use std::fs::File;
use std::io;
use std::path::Path;

use campaign_core::{CampaignResult, Cap};
use tracing::{debug, info};

use crate::sheet::parse_money;

/// Display-only caps, keyed by `network-offer`.
#[derive(Debug, Clone, Default)]
pub struct CapTable {
    caps: HashMap<String, Cap>,
}

impl CapTable {
    /// Read `key,cap` rows. A header row and rows with a non-numeric cap are
    /// skipped.
    pub fn from_reader<R: io::Read>(reader: R) -> CampaignResult<Self> {
        let mut csv = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(reader);

        let mut caps = HashMap::new();
        for result in csv.records() {
            let row = result?;
            let (Some(key), Some(raw)) = (row.get(0), row.get(1)) else {
                continue;
            };
            let key = key.trim();
            match parse_money(raw) {
                Some(value) if !key.is_empty() => {
                    caps.insert(key.to_string(), Cap::from_raw(value));
                }
                _ => debug!(key, raw, "Cap row skipped"),
            }
        }

        info!(caps = caps.len(), "Cap table loaded");
        Ok(Self { caps })
    }

    pub fn load(path: &Path) -> CampaignResult<Self> {
        Self::from_reader(File::open(path)?)
    }

    pub fn lookup(&self, key: &str) -> Option<Cap> {
        self.caps.get(key).copied()
    }

    pub fn len(&self) -> usize {
        self.caps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.caps.is_empty()
    }
}
