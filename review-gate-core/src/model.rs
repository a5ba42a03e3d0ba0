use serde::{Deserialize, Serialize};
use std::fmt;

/// The pull request under evaluation, as supplied by the triggering event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequestRef {
    pub number: u64,
    /// Head commit of the PR branch at the time of evaluation.
    pub latest_commit_sha: String,
}

impl PullRequestRef {
    pub fn new(number: u64, latest_commit_sha: impl Into<String>) -> Self {
        Self {
            number,
            latest_commit_sha: latest_commit_sha.into(),
        }
    }
}

/// State of a single review submission.
///
/// Only `Approved` carries meaning for the gate. The remaining known states are
/// kept so that diagnostics stay readable; anything GitHub adds later lands in
/// `Other` rather than failing to parse.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReviewState {
    Approved,
    ChangesRequested,
    Commented,
    Dismissed,
    Pending,
    Other(String),
}

impl ReviewState {
    /// Map the upper-case state string used by the REST API.
    pub fn from_api(state: &str) -> Self {
        match state {
            "APPROVED" => ReviewState::Approved,
            "CHANGES_REQUESTED" => ReviewState::ChangesRequested,
            "COMMENTED" => ReviewState::Commented,
            "DISMISSED" => ReviewState::Dismissed,
            "PENDING" => ReviewState::Pending,
            other => ReviewState::Other(other.to_string()),
        }
    }

    pub fn as_api_str(&self) -> &str {
        match self {
            ReviewState::Approved => "APPROVED",
            ReviewState::ChangesRequested => "CHANGES_REQUESTED",
            ReviewState::Commented => "COMMENTED",
            ReviewState::Dismissed => "DISMISSED",
            ReviewState::Pending => "PENDING",
            ReviewState::Other(s) => s,
        }
    }

    pub fn is_approved(&self) -> bool {
        matches!(self, ReviewState::Approved)
    }
}

impl fmt::Display for ReviewState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_api_str())
    }
}

/// One review submission recorded against a pull request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Review {
    /// Absent when the author's account no longer exists.
    pub author_login: Option<String>,
    pub state: ReviewState,
    /// The commit the review was submitted against.
    pub commit_sha: String,
}

impl Review {
    pub fn new(
        author_login: Option<String>,
        state: ReviewState,
        commit_sha: impl Into<String>,
    ) -> Self {
        Self {
            author_login,
            state,
            commit_sha: commit_sha.into(),
        }
    }

    pub fn author_display(&self) -> &str {
        self.author_login.as_deref().unwrap_or("<unknown>")
    }
}
