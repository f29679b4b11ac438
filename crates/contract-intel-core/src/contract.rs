//! Contract records as reported by the remote contract service.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Extracted payload of a completed contract: category name to an arbitrary
/// JSON value, in the order the service sent them.
///
/// Categories are usually objects of field name to value, but nothing here
/// relies on that.
pub type ExtractedData = serde_json::Map<String, serde_json::Value>;

/// A contract record.
///
/// The service owns every field; this side only observes them. `id` arrives
/// as `_id` from the service and is written back out as `id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ContractRecord")]
pub struct Contract {
    pub id: String,
    pub status: ContractStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    /// Server timestamp, kept as the server formatted it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upload_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extracted_data: Option<ExtractedData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence_score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gap_analysis: Option<GapAnalysis>,
    /// Failure reason recorded by the processing worker.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Contract {
    /// A bare record with only an id and a status, as a fresh upload looks.
    pub fn new(id: impl Into<String>, status: ContractStatus) -> Self {
        Self {
            id: id.into(),
            status,
            filename: None,
            upload_time: None,
            extracted_data: None,
            confidence_score: None,
            gap_analysis: None,
            error: None,
        }
    }
}

/// Wire shape of a record. Any of `_id`, `id` or `contract_id` may carry the
/// identifier, and records holding several of them are accepted. `_id` wins.
#[derive(Deserialize)]
struct ContractRecord {
    #[serde(rename = "_id")]
    underscore_id: Option<String>,
    id: Option<String>,
    contract_id: Option<String>,
    status: ContractStatus,
    #[serde(default)]
    filename: Option<String>,
    #[serde(default)]
    upload_time: Option<String>,
    #[serde(default)]
    extracted_data: Option<ExtractedData>,
    #[serde(default)]
    confidence_score: Option<f64>,
    #[serde(default)]
    gap_analysis: Option<GapAnalysis>,
    #[serde(default)]
    error: Option<String>,
}

impl TryFrom<ContractRecord> for Contract {
    type Error = String;

    fn try_from(record: ContractRecord) -> Result<Self, Self::Error> {
        let id = record
            .underscore_id
            .or(record.id)
            .or(record.contract_id)
            .ok_or_else(|| "contract record has no `_id`".to_string())?;
        Ok(Self {
            id,
            status: record.status,
            filename: record.filename,
            upload_time: record.upload_time,
            extracted_data: record.extracted_data,
            confidence_score: record.confidence_score,
            gap_analysis: record.gap_analysis,
            error: record.error,
        })
    }
}

/// Processing state of a contract.
///
/// The service's vocabulary is not closed: anything unrecognised is kept
/// verbatim in [`ContractStatus::Other`] and counts as not ready.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ContractStatus {
    Pending,
    Processing,
    Completed,
    Failed,
    Other(String),
}

impl ContractStatus {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Other(s) => s,
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed)
    }
}

impl From<String> for ContractStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            "pending" => Self::Pending,
            "processing" => Self::Processing,
            "completed" => Self::Completed,
            "failed" => Self::Failed,
            _ => Self::Other(s),
        }
    }
}

impl From<&str> for ContractStatus {
    fn from(s: &str) -> Self {
        Self::from(s.to_string())
    }
}

impl From<ContractStatus> for String {
    fn from(status: ContractStatus) -> Self {
        match status {
            ContractStatus::Other(s) => s,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for ContractStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Gap analysis attached to a completed contract.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GapAnalysis {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub missing_fields: Option<Vec<String>>,
}

/// Body of `GET /contracts/{id}/status`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusResponse {
    pub status: ContractStatus,
}

/// Body of a successful `POST /contracts/upload`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadReceipt {
    pub contract_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// JSON body the service attaches to non-2xx responses.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub detail: Option<String>,
}
