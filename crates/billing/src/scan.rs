use std::time::Instant;

use serde::{Deserialize, Serialize};

/// Where a scan came from. Logic is identical for every source; the tag is
/// kept for logs and scan history.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanSource {
    Camera,
    Manual,
    Remote,
}

impl ScanSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScanSource::Camera => "camera",
            ScanSource::Manual => "manual",
            ScanSource::Remote => "remote",
        }
    }
}

impl core::fmt::Display for ScanSource {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One decoded barcode, stamped with a monotonic instant when it arrived.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanEvent {
    pub barcode: String,
    pub source: ScanSource,
    pub at: Instant,
}

impl ScanEvent {
    pub fn new(barcode: impl Into<String>, source: ScanSource, at: Instant) -> Self {
        Self {
            barcode: barcode.into(),
            source,
            at,
        }
    }
}
