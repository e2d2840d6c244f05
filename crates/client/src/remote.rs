//! Remote scanner messages (a phone camera relaying barcodes).

use serde::{Deserialize, Serialize};

use crate::error::{ClientError, ClientResult};

/// Channel name remote scanners publish on.
pub const BARCODE_SCANNED: &str = "barcode-scanned";

/// Payload of a `barcode-scanned` message: `{"barcode": "..."}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteScan {
    pub barcode: String,
}

impl RemoteScan {
    pub fn new(barcode: impl Into<String>) -> Self {
        Self {
            barcode: barcode.into(),
        }
    }

    pub fn decode(payload: &str) -> ClientResult<Self> {
        serde_json::from_str(payload).map_err(|e| ClientError::Parse(e.to_string()))
    }

    pub fn encode(&self) -> ClientResult<String> {
        serde_json::to_string(self).map_err(|e| ClientError::Parse(e.to_string()))
    }
}
