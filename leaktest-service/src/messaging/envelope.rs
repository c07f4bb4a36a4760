//! Reply envelope carried on every RPC response

use leaktest_core::{LeakTestError, LeakTestResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;

// Emitted when the real envelope itself cannot be encoded.
const ENCODE_FALLBACK: &[u8] =
    br#"{"StatusCode":500,"Data":null,"ErrorMessage":"Failed to encode response."}"#;

/// Response envelope: HTTP-style status code plus either data or an
/// error message. Absent members serialize as explicit nulls so every
/// reply carries all three.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ApiResponse {
    pub status_code: u16,
    pub data: Option<Value>,
    pub error_message: Option<String>,
}

impl ApiResponse {
    /// Successful reply carrying the operation result
    pub fn ok(data: Value) -> Self {
        Self {
            status_code: 200,
            data: Some(data),
            error_message: None,
        }
    }

    /// Failure reply mapped from a domain error
    pub fn from_error(error: &LeakTestError) -> Self {
        Self {
            status_code: error.status_code(),
            data: None,
            error_message: Some(error.to_string()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status_code == 200
    }

    /// Serialize for publishing; encoding failure degrades to a fixed
    /// 500 envelope rather than dropping the reply
    pub fn encode(&self) -> Vec<u8> {
        serde_json::to_vec(self).unwrap_or_else(|_| ENCODE_FALLBACK.to_vec())
    }

    pub fn decode(payload: &[u8]) -> LeakTestResult<Self> {
        Ok(serde_json::from_slice(payload)?)
    }
}
