use review_gate_core::{evaluate, Decision, PullRequestRef};
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::RunError;
use crate::event::read_event;
use crate::github::GitHubClient;
use crate::recording::RecordingLogger;

/// Result of a run that did not hit a fatal error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// The triggering event carries no pull request.
    NotApplicable,
    /// The gate ran against `pull_request`.
    Evaluated {
        pull_request: PullRequestRef,
        decision: Decision,
    },
}

/// Read the event, fetch the PR's reviews and evaluate the gate.
///
/// The reviewer source is loaded only once a pull request is known to exist,
/// and before any request is made. The HTTP client is dropped before this
/// returns, so a recording logger can be finished right after.
pub async fn run(
    config: &Config,
    recording_logger: Option<&RecordingLogger>,
) -> Result<RunOutcome, RunError> {
    match std::env::current_dir() {
        Ok(dir) => info!("Current dir: {}", dir.display()),
        Err(e) => warn!("Failed to determine current dir: {}", e),
    }

    let Some(event) = read_event(&config.event_path).map_err(RunError::Config)? else {
        return Ok(RunOutcome::NotApplicable);
    };
    let pull_request = event.pull_request;

    info!(
        "Found pull request #{}, head sha: {}, merge sha: {}",
        pull_request.number,
        pull_request.latest_commit_sha,
        event.merge_commit_sha.as_deref().unwrap_or("none")
    );

    let authorized = config
        .authorized_reviewers_source
        .load()
        .map_err(RunError::Config)?;
    info!(
        "Authorized reviewers from {}: {:?}",
        config.authorized_reviewers_source.describe(),
        authorized.sorted_logins()
    );
    if authorized.is_empty() {
        warn!("Authorized reviewer list is empty; no review can satisfy the gate");
    }

    let client = GitHubClient::new(
        config.api_url.as_str(),
        config.credential.as_str(),
        recording_logger.map(RecordingLogger::clone_for_middleware),
    )
    .map_err(RunError::Upstream)?;

    let reviews = client
        .list_reviews(
            &config.repository.owner,
            &config.repository.name,
            pull_request.number,
        )
        .await
        .map_err(RunError::Upstream)?;
    drop(client);

    info!("Number of reviews: {}", reviews.len());
    match serde_json::to_string(&reviews) {
        Ok(json) => debug!("Reviews: {}", json),
        Err(e) => debug!("Failed to serialize reviews for logging: {}", e),
    }

    let decision = evaluate(&pull_request, &reviews, &authorized);
    match &decision {
        Decision::Pass(review) => info!(
            "Match found: {} {} at {}",
            review.author_display(),
            review.state,
            review.commit_sha
        ),
        Decision::Fail => info!(
            "No approval from an authorized reviewer on {}",
            pull_request.latest_commit_sha
        ),
    }

    Ok(RunOutcome::Evaluated {
        pull_request,
        decision,
    })
}
