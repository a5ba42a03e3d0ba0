use anyhow::{anyhow, Context, Result};
use review_gate_core::PullRequestRef;
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// The parts of a GitHub webhook payload the gate reads. Everything else in
/// the payload is ignored.
#[derive(Debug, Deserialize)]
pub struct EventPayload {
    pub pull_request: Option<PullRequestPayload>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PullRequestPayload {
    pub number: u64,
    pub head: PullRequestHead,
    pub merge_commit_sha: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PullRequestHead {
    pub sha: String,
}

/// A pull request found in the triggering event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRequestEvent {
    pub pull_request: PullRequestRef,
    /// Test-merge commit GitHub computed for the PR. Logged only.
    pub merge_commit_sha: Option<String>,
}

/// Parse a webhook payload. `Ok(None)` means the event carries no pull request
/// (e.g. a push), which makes the run not applicable.
pub fn parse_event(json: &str) -> Result<Option<PullRequestEvent>> {
    let payload: EventPayload =
        serde_json::from_str(json).context("Failed to parse event payload")?;

    let Some(pr) = payload.pull_request else {
        return Ok(None);
    };

    if pr.head.sha.trim().is_empty() {
        return Err(anyhow!(
            "Pull request #{} in event payload has an empty head sha",
            pr.number
        ));
    }

    Ok(Some(PullRequestEvent {
        pull_request: PullRequestRef::new(pr.number, pr.head.sha),
        merge_commit_sha: pr.merge_commit_sha,
    }))
}

pub fn read_event(path: &Path) -> Result<Option<PullRequestEvent>> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read event payload {}", path.display()))?;
    parse_event(&contents).with_context(|| format!("Invalid event payload {}", path.display()))
}
