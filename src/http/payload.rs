//! Synthetic frames sent to clients.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// Binary payload: ASCII "Hello".
pub const HELLO: [u8; 5] = [0x48, 0x65, 0x6C, 0x6C, 0x6F];

/// A binary frame follows every text frame whose count is a multiple of this.
pub const BINARY_EVERY: u64 = 5;

/// JSON body of each text frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestMessage {
    #[serde(rename = "type")]
    pub kind: String,
    pub count: u64,
    /// ISO-8601 UTC.
    pub timestamp: String,
    pub message: String,
}

impl TestMessage {
    /// Message number `count`, stamped now.
    pub fn new(count: u64) -> Self {
        Self::at(count, Utc::now())
    }

    pub fn at(count: u64, now: DateTime<Utc>) -> Self {
        Self {
            kind: "test".to_string(),
            count,
            timestamp: now.to_rfc3339_opts(SecondsFormat::Micros, true),
            message: format!("Test message #{}", count),
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Whether message `count` is followed by a binary frame.
pub fn binary_due(count: u64) -> bool {
    count % BINARY_EVERY == 0
}

/// Lowercase hex for log lines.
pub fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}
