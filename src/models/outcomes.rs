use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::LocationMatch;

/// Canonical render status values
pub mod render_status {
    pub const RENDERED: &str = "rendered";
    pub const SKIPPED: &str = "skipped";
    pub const FAILED: &str = "failed";
}

/// Result of a file transfer attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum UploadStatus {
    NotRequested,
    Succeeded { remote_path: String },
    Failed { error: String },
}

impl UploadStatus {
    pub fn succeeded(&self) -> bool {
        matches!(self, UploadStatus::Succeeded { .. })
    }
}

/// SubmitOutcome is what the form shows after a submission
#[derive(Debug, Clone, Serialize)]
pub struct SubmitOutcome {
    pub hostname: String,
    pub filename: String,
    pub acl_prefix: String,
    pub status: String, // rendered, skipped, failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<LocationMatch>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_path: Option<String>,
    pub csv_upload: UploadStatus,
    pub upload: UploadStatus,
    pub message: String,
    pub completed_at: DateTime<Utc>,
}

/// RenderBatchRequest re-renders every row of the record CSV
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RenderBatchRequest {
    /// Pull data.csv from the file server before rendering
    #[serde(default)]
    pub fetch_remote: bool,
    #[serde(default)]
    pub upload: bool,
}

/// One successfully rendered row
#[derive(Debug, Clone, Serialize)]
pub struct RenderedEntry {
    pub hostname: String,
    pub filename: String,
    pub output_path: String,
    pub location: String,
    pub upload: UploadStatus,
}

/// A row that was skipped or failed, with the reason
#[derive(Debug, Clone, Serialize)]
pub struct BatchIssue {
    pub row: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hostname: Option<String>,
    pub reason: String,
}

/// BatchReport summarizes a render-batch run
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchReport {
    pub rendered: Vec<RenderedEntry>,
    pub skipped: Vec<BatchIssue>,
    pub failed: Vec<BatchIssue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fetch_error: Option<String>,
}
