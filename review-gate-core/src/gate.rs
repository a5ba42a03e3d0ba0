use crate::model::{PullRequestRef, Review};
use crate::reviewers::AuthorizedReviewers;

/// Outcome of evaluating the mandatory-review gate.
///
/// Using a discriminated union instead of a boolean so that a pass always
/// carries the review that satisfied it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// An authorized reviewer approved the latest commit.
    Pass(Review),
    /// No review satisfies the gate.
    Fail,
}

impl Decision {
    pub fn is_pass(&self) -> bool {
        matches!(self, Decision::Pass(_))
    }

    pub fn matching_review(&self) -> Option<&Review> {
        match self {
            Decision::Pass(review) => Some(review),
            Decision::Fail => None,
        }
    }
}

/// Whether a single review can satisfy the gate for `pull_request`.
///
/// All three must hold: the review approves, it was made against the PR's
/// latest commit, and its author is in the authorized set. A review without an
/// author is never a candidate.
pub fn is_candidate(
    review: &Review,
    pull_request: &PullRequestRef,
    authorized: &AuthorizedReviewers,
) -> bool {
    review.state.is_approved()
        && review.commit_sha == pull_request.latest_commit_sha
        && review
            .author_login
            .as_deref()
            .is_some_and(|login| authorized.contains(login))
}

/// Decide whether `pull_request` has a mandatory approval.
///
/// Reviews are scanned in the order given and the first candidate wins. No
/// grouping by author or ordering by submission time takes place, so an
/// approval followed by a change request from the same author on the same
/// commit still passes.
pub fn evaluate(
    pull_request: &PullRequestRef,
    reviews: &[Review],
    authorized: &AuthorizedReviewers,
) -> Decision {
    reviews
        .iter()
        .find(|review| is_candidate(review, pull_request, authorized))
        .cloned()
        .map_or(Decision::Fail, Decision::Pass)
}
