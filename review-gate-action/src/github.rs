use anyhow::{anyhow, Context, Result};
use reqwest::Client;
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use review_gate_core::{Review, ReviewState};
use serde::Deserialize;
use tracing::{debug, error, info};

use crate::recording::{RecordingLogger, RecordingMiddleware};

const USER_AGENT: &str = concat!("review-gate/", env!("CARGO_PKG_VERSION"));
const API_VERSION: &str = "2022-11-28";
const PER_PAGE: usize = 100; // Max page size the reviews endpoint allows

/// Read-only GitHub REST client authenticated with a single bearer token.
pub struct GitHubClient {
    client: ClientWithMiddleware,
    api_url: String,
    token: String,
}

#[derive(Debug, Deserialize)]
pub struct ReviewResponse {
    /// `null` for reviews by deleted accounts.
    pub user: Option<ReviewUser>,
    pub state: String,
    /// `null` for some reviews made before commit tracking existed.
    pub commit_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ReviewUser {
    pub login: String,
}

impl From<ReviewResponse> for Review {
    fn from(response: ReviewResponse) -> Self {
        Review::new(
            response.user.map(|u| u.login),
            ReviewState::from_api(&response.state),
            response.commit_id.unwrap_or_default(),
        )
    }
}

impl GitHubClient {
    pub fn new(
        api_url: impl Into<String>,
        token: impl Into<String>,
        recording_logger: Option<RecordingLogger>,
    ) -> Result<Self> {
        Ok(Self {
            client: create_github_client(recording_logger)?,
            api_url: api_url.into(),
            token: token.into(),
        })
    }

    /// List every review on a pull request, in the order GitHub returns them.
    ///
    /// Pages are requested until one comes back short.
    pub async fn list_reviews(
        &self,
        repo_owner: &str,
        repo_name: &str,
        pr_number: u64,
    ) -> Result<Vec<Review>> {
        let mut all_reviews = Vec::new();
        let mut page = 1;

        info!(
            "Fetching reviews for PR #{} in {}/{}",
            pr_number, repo_owner, repo_name
        );

        loop {
            let url = format!(
                "{}/repos/{}/{}/pulls/{}/reviews?per_page={}&page={}",
                self.api_url, repo_owner, repo_name, pr_number, PER_PAGE, page
            );

            let response = self
                .client
                .get(&url)
                .header("Authorization", format!("Bearer {}", self.token))
                .header("Accept", "application/vnd.github+json")
                .header("X-GitHub-Api-Version", API_VERSION)
                .send()
                .await
                .context("Failed to send list reviews request")?;

            if !response.status().is_success() {
                let status = response.status();
                let error_text = response
                    .text()
                    .await
                    .context("Failed to read error response body")?;
                error!(
                    "GitHub API error listing reviews: {} - {}",
                    status, error_text
                );
                return Err(anyhow!(
                    "GitHub API error listing reviews: {} - {}",
                    status,
                    error_text
                ));
            }

            let reviews: Vec<ReviewResponse> = response
                .json()
                .await
                .context("Failed to parse reviews response")?;
            let reviews_count = reviews.len();
            debug!("Page {} returned {} reviews", page, reviews_count);

            all_reviews.extend(reviews.into_iter().map(Review::from));

            if reviews_count < PER_PAGE {
                break;
            }
            page += 1;
        }

        info!(
            "Found {} total reviews on PR #{}",
            all_reviews.len(),
            pr_number
        );
        Ok(all_reviews)
    }
}

pub fn create_github_client(
    recording_logger: Option<RecordingLogger>,
) -> Result<ClientWithMiddleware> {
    let client = Client::builder()
        .user_agent(USER_AGENT)
        .build()
        .context("Failed to create HTTP client")?;

    let mut builder = ClientBuilder::new(client);

    if let Some(logger) = recording_logger {
        builder = builder.with(RecordingMiddleware::new(logger));
    }

    Ok(builder.build())
}
