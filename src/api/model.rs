use serde::{Deserialize, Serialize};

use crate::system::kill::TerminationResult;
use crate::system::process::ProcessRecord;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProcessView {
    pub name: String,
    pub pid: u32,
    pub memory: String,
}

impl From<&ProcessRecord> for ProcessView {
    fn from(record: &ProcessRecord) -> Self {
        ProcessView {
            name: record.name.clone(),
            pid: record.pid,
            memory: format!("{} KB", record.resident_set_kb()),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ProcessQuery {
    pub sort: Option<String>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct KillRequest {
    /// Signed so out-of-range values reach the controller and get a
    /// structured refusal instead of a body rejection.
    pub pid: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum KillResponse {
    Message { message: String },
    Error { error: String },
}

impl From<TerminationResult> for KillResponse {
    fn from(result: TerminationResult) -> Self {
        if result.is_success() {
            KillResponse::Message {
                message: result.message(),
            }
        } else {
            KillResponse::Error {
                error: result.message(),
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Health {
    pub status: &'static str,
}
