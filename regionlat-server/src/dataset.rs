use regionlat_common::{RegionLatError, Result, TelemetryRecord};
use std::collections::HashSet;
use std::io::ErrorKind;
use std::path::Path;

/// Read-only telemetry loaded once at startup.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TelemetryTable {
    records: Vec<TelemetryRecord>,
}

impl TelemetryTable {
    pub fn from_records(records: Vec<TelemetryRecord>) -> Self {
        Self { records }
    }

    /// Parse a JSON array of `{region, latency_ms, uptime_pct}` objects.
    /// Unknown keys on each object are ignored.
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str::<Vec<TelemetryRecord>>(json)
            .map(Self::from_records)
            .map_err(|e| RegionLatError::MalformedDataset(e.to_string()))
    }

    /// Load the dataset at `path`.
    ///
    /// An unreadable file is `DatasetNotFound`; non-UTF-8 or unparseable content is
    /// `MalformedDataset`. An empty array loads fine; see [`Self::require_non_empty`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| match e.kind() {
            ErrorKind::InvalidData => RegionLatError::MalformedDataset(e.to_string()),
            _ => RegionLatError::DatasetNotFound(path.display().to_string()),
        })?;
        Self::from_json_str(&raw)
    }

    pub fn records(&self) -> &[TelemetryRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Distinct regions in the order they first appear.
    pub fn regions(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        self.records
            .iter()
            .filter(|record| seen.insert(record.region.as_str()))
            .map(|record| record.region.clone())
            .collect()
    }

    pub fn require_non_empty(&self) -> Result<&Self> {
        if self.is_empty() {
            return Err(RegionLatError::EmptyDataset);
        }
        Ok(self)
    }
}
