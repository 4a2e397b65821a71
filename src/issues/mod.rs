//! Issue intake endpoints.
//!
//! Straight-line validate-then-persist handlers. Rate limiting is applied
//! upstream by the admission middleware; nothing here is aware of it.

pub mod repository;

pub use repository::{IssueRepository, MemoryIssueRepository};

use crate::error::{IntakeError, Result};
use crate::AppState;
use axum::{extract::State, Json};
use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::OnceLock;
use tracing::info;

/// Maximum length of the issue text, in characters
pub const MAX_ISSUE_CHARS: usize = 1000;

/// Maximum length of the submitter name, in characters
pub const MAX_NAME_CHARS: usize = 20;

/// Maximum number of issues returned by the list endpoint
pub const LIST_LIMIT: usize = 100;

/// An inbound issue submission
#[derive(Debug, Clone, Deserialize)]
pub struct IssueSubmission {
    /// The reported issue text
    #[serde(default)]
    pub issue: String,
    /// Submitter name
    #[serde(default)]
    pub name: String,
    /// Submitter student id (4, 5 or 13 digits)
    #[serde(default)]
    pub student_id: String,
    /// Whether the submitter consents to publishing their information
    #[serde(default, rename = "isInformationPublic")]
    pub is_information_public: Option<String>,
    /// Whether the submission is a formal report
    #[serde(default, rename = "isReport")]
    pub is_report: Option<String>,
}

impl IssueSubmission {
    /// Validate the submission, returning the first failure
    pub fn validate(&self) -> Result<()> {
        if self.issue.is_empty() {
            return Err(IntakeError::Validation(
                "issue must not be empty".to_string(),
            ));
        }

        if self.name.is_empty() {
            return Err(IntakeError::Validation(
                "name must not be empty".to_string(),
            ));
        }

        if self.name.chars().count() > MAX_NAME_CHARS {
            return Err(IntakeError::Validation(format!(
                "name must not exceed {} characters",
                MAX_NAME_CHARS
            )));
        }

        if self.student_id.is_empty() {
            return Err(IntakeError::Validation(
                "student_id must not be empty".to_string(),
            ));
        }

        if !student_id_pattern().is_match(&self.student_id) {
            return Err(IntakeError::Validation(
                "student_id must be 4, 5 or 13 digits".to_string(),
            ));
        }

        if self.issue.chars().count() > MAX_ISSUE_CHARS {
            return Err(IntakeError::Validation(format!(
                "issue must not exceed {} characters",
                MAX_ISSUE_CHARS
            )));
        }

        Ok(())
    }
}

fn student_id_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^(\d{4}|\d{5}|\d{13})$").expect("student id pattern is valid")
    })
}

/// A persisted issue record
#[derive(Debug, Clone, Serialize)]
pub struct Issue {
    /// Record id, assigned by the repository
    pub id: u64,
    /// The reported issue text
    pub issue: String,
    /// Submitter name
    pub name: String,
    /// Submitter student id
    pub student_id: String,
    /// Publishing consent flag ("yes"/"no")
    #[serde(rename = "isInformationPublic")]
    pub is_information_public: String,
    /// Formal report flag ("yes"/"no")
    #[serde(rename = "isReport")]
    pub is_report: String,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

/// Listing view of an issue; submitter details are not exposed
#[derive(Debug, Clone, Serialize)]
pub struct IssueSummary {
    pub id: u64,
    pub issue: String,
    pub created_at: DateTime<Utc>,
}

/// POST /api/issues
pub async fn submit_issue(
    State(state): State<AppState>,
    Json(submission): Json<IssueSubmission>,
) -> Result<Json<Value>> {
    submission.validate()?;

    let record = state.repository.append(submission).await?;
    info!(id = record.id, "issue recorded");

    Ok(Json(json!({
        "success": true,
        "message": "Issue submitted",
    })))
}

/// GET /api/issues
pub async fn list_issues(State(state): State<AppState>) -> Result<Json<Value>> {
    let messages = state.repository.list_recent(LIST_LIMIT).await?;

    Ok(Json(json!({ "messages": messages })))
}
