use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::Result;

pub const IGNORE_PLACEHOLDER: &str = "randstring";

/// Which generation of the payload shape is published.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PayloadFormat {
    /// `{"error":E,"ignore":"randstring"}`
    Plain,
    /// `{"error":E,"ignore":"randstring","count":N}`
    Counted,
}

impl PayloadFormat {
    pub fn default_interval(self) -> Duration {
        match self {
            PayloadFormat::Plain => Duration::from_secs(1),
            PayloadFormat::Counted => Duration::from_millis(500),
        }
    }
}

/// The record published every tick. Field order is the wire key order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayloadRecord {
    pub error: u8,
    pub ignore: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<u64>,
}

impl PayloadRecord {
    pub fn new(format: PayloadFormat) -> Self {
        Self {
            error: 0,
            ignore: IGNORE_PLACEHOLDER.to_string(),
            count: match format {
                PayloadFormat::Plain => None,
                PayloadFormat::Counted => Some(0),
            },
        }
    }

    /// Compact JSON, no whitespace between tokens.
    pub fn to_wire(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn advance_count(&mut self) {
        if let Some(count) = self.count.as_mut() {
            *count = count.wrapping_add(1);
        }
    }
}
