//! Wire types for the analysis job service.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Lifecycle state reported by `GET /jobs/{id}`.
///
/// Unknown states are kept verbatim so newer servers do not break polling.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum JobStatus {
    Queued,
    Started,
    Deferred,
    Finished,
    Failed,
    Other(String),
}

impl JobStatus {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Queued => "queued",
            Self::Started => "started",
            Self::Deferred => "deferred",
            Self::Finished => "finished",
            Self::Failed => "failed",
            Self::Other(status) => status,
        }
    }

    /// Finished and failed jobs never change state again.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Finished | Self::Failed)
    }
}

impl From<String> for JobStatus {
    fn from(value: String) -> Self {
        match value.as_str() {
            "queued" => Self::Queued,
            "started" => Self::Started,
            "deferred" => Self::Deferred,
            "finished" => Self::Finished,
            "failed" => Self::Failed,
            _ => Self::Other(value),
        }
    }
}

impl From<JobStatus> for String {
    fn from(value: JobStatus) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Job {
    pub id: String,
    pub status: JobStatus,
}

/// Body of `POST /jobs`, discriminated by the `op` field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op")]
pub enum CreateJobPayload {
    /// Price comparison of a budget against the SINAPI and SUDECAP banks.
    #[serde(rename = "precos_auto")]
    PriceCheck(PriceCheckPayload),
    /// Structural comparison of a budget against the same banks.
    #[serde(rename = "estrutura_auto")]
    StructureCheck(StructureCheckPayload),
}

impl CreateJobPayload {
    pub fn op(&self) -> &'static str {
        match self {
            Self::PriceCheck(_) => "precos_auto",
            Self::StructureCheck(_) => "estrutura_auto",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceCheckPayload {
    /// Server-side path of the budget spreadsheet.
    #[serde(rename = "orc")]
    pub budget: String,
    pub sudecap: String,
    pub sinapi: String,
    /// Relative tolerance, e.g. `0.05`.
    #[serde(rename = "tol_rel", default, skip_serializing_if = "Option::is_none")]
    pub tolerance: Option<f64>,
    /// Server default is `true`.
    #[serde(rename = "comparar_desc", default, skip_serializing_if = "Option::is_none")]
    pub compare_descriptions: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub out_dir: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructureCheckPayload {
    #[serde(rename = "orc")]
    pub budget: String,
    pub sudecap: String,
    pub sinapi: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub out_dir: Option<String>,
}

/// One artifact in the service's output directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileEntry {
    pub name: String,
    pub path: String,
    pub size: u64,
    /// Modification time as a Unix timestamp in seconds.
    pub mtime: f64,
    #[serde(default)]
    pub size_human: Option<String>,
    #[serde(default)]
    pub mtime_iso: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilesResponse {
    pub output_dir: String,
    #[serde(default)]
    pub files: Vec<FileEntry>,
    #[serde(default)]
    pub count: Option<usize>,
}
