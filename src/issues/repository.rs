use super::{Issue, IssueSubmission, IssueSummary};
use crate::error::{IntakeError, Result};
use async_trait::async_trait;
use chrono::Utc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;

/// Persistence boundary for issue records.
///
/// The service only needs two operations: append a record and list recent
/// records. Durable backends live behind this trait; the in-memory
/// implementation below serves single-process deployments and tests.
#[async_trait]
pub trait IssueRepository: Send + Sync {
    /// Persist a validated submission and return the stored record
    async fn append(&self, submission: IssueSubmission) -> Result<Issue>;

    /// List up to `limit` issues in ascending creation order
    async fn list_recent(&self, limit: usize) -> Result<Vec<IssueSummary>>;
}

/// In-memory issue repository
pub struct MemoryIssueRepository {
    issues: RwLock<Vec<Issue>>,
    next_id: AtomicU64,
}

impl MemoryIssueRepository {
    /// Create an empty repository
    pub fn new() -> Self {
        Self {
            issues: RwLock::new(Vec::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Number of stored issues
    pub fn len(&self) -> usize {
        self.issues.read().map(|issues| issues.len()).unwrap_or(0)
    }

    /// Whether the repository holds no issues
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for MemoryIssueRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl IssueRepository for MemoryIssueRepository {
    async fn append(&self, submission: IssueSubmission) -> Result<Issue> {
        let record = Issue {
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            issue: submission.issue,
            name: submission.name,
            student_id: submission.student_id,
            is_information_public: submission
                .is_information_public
                .unwrap_or_else(|| "no".to_string()),
            is_report: submission.is_report.unwrap_or_else(|| "no".to_string()),
            created_at: Utc::now(),
        };

        let mut issues = self
            .issues
            .write()
            .map_err(|_| IntakeError::Storage("issue index lock poisoned".to_string()))?;
        issues.push(record.clone());

        Ok(record)
    }

    async fn list_recent(&self, limit: usize) -> Result<Vec<IssueSummary>> {
        let issues = self
            .issues
            .read()
            .map_err(|_| IntakeError::Storage("issue index lock poisoned".to_string()))?;

        // Records are appended in creation order, so ascending order is the
        // storage order.
        Ok(issues
            .iter()
            .take(limit)
            .map(|issue| IssueSummary {
                id: issue.id,
                issue: issue.issue.clone(),
                created_at: issue.created_at,
            })
            .collect())
    }
}
