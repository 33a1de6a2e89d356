//! Case metadata: who collected the evidence, and when.

use evibundle_common::Timestamp;
use serde::{Deserialize, Serialize};

/// Operator-supplied case fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaseInfo {
    pub case_id: String,
    pub analyst: String,
    pub source: String,
    #[serde(default)]
    pub notes: String,
}

impl Default for CaseInfo {
    fn default() -> Self {
        Self {
            case_id: "IR-0000".to_string(),
            analyst: "Unknown".to_string(),
            source: "SOC".to_string(),
            notes: String::new(),
        }
    }
}

/// The metadata.json record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    pub case_id: String,
    pub analyst: String,
    pub source: String,
    pub notes: String,
    pub created_at: Timestamp,
    pub tool_version: String,
}

impl Metadata {
    pub fn new(case: &CaseInfo, created_at: Timestamp, tool_version: impl Into<String>) -> Self {
        Self {
            case_id: case.case_id.clone(),
            analyst: case.analyst.clone(),
            source: case.source.clone(),
            notes: case.notes.clone(),
            created_at,
            tool_version: tool_version.into(),
        }
    }

    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self).map(|mut s| {
            s.push('\n');
            s
        })
    }
}
