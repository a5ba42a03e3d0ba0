use clap::builder::FalseyValueParser;
use clap::Parser;
use review_gate_core::AuthorizedReviewersSource;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use tracing::Level;

use crate::error::RunError;

pub const DEFAULT_API_URL: &str = "https://api.github.com";

/// Fail a pull request check unless a mandatory reviewer approved its head commit.
///
/// Every option can also be supplied through the environment GitHub Actions
/// provides, so the binary runs unchanged as an action step.
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "review-gate")]
#[command(version)]
#[command(about = "Mandatory-review gate for pull requests", long_about = None)]
pub struct ActionArgs {
    /// GitHub token used to list reviews (falls back to GITHUB_TOKEN)
    #[arg(long, env = "INPUT_GITHUB_TOKEN", hide_env_values = true)]
    pub github_token: Option<String>,

    #[arg(long, env = "GITHUB_TOKEN", hide = true, hide_env_values = true)]
    pub fallback_token: Option<String>,

    /// Path to a JSON file containing an array of authorized reviewer logins
    #[arg(long, env = "INPUT_REVIEWERS_JSON_FILE_PATH")]
    pub reviewers_json_file_path: Option<PathBuf>,

    /// Comma- or newline-separated authorized reviewer logins, used when no file is given
    #[arg(long, env = "INPUT_REVIEWERS")]
    pub reviewers: Option<String>,

    /// Repository in owner/name form
    #[arg(long, env = "GITHUB_REPOSITORY")]
    pub repository: Option<String>,

    /// Path to the webhook payload of the triggering event
    #[arg(long, env = "GITHUB_EVENT_PATH")]
    pub event_path: Option<PathBuf>,

    /// Base URL of the GitHub REST API
    #[arg(long, env = "GITHUB_API_URL")]
    pub api_url: Option<String>,

    /// Append a sanitized JSONL trace of GitHub API traffic to this file
    #[arg(long, env = "RECORDING_LOG_PATH")]
    pub recording_log_path: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, env = "RUNNER_DEBUG", value_parser = FalseyValueParser::new())]
    pub debug: bool,
}

impl ActionArgs {
    /// Logging verbosity. Decided before configuration is validated so that
    /// validation failures are logged too.
    pub fn log_level(&self) -> Level {
        if self.debug {
            Level::DEBUG
        } else {
            Level::INFO
        }
    }
}

/// `owner/name` of the repository the pull request belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositorySlug {
    pub owner: String,
    pub name: String,
}

impl FromStr for RepositorySlug {
    type Err = RunError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().split_once('/') {
            Some((owner, name))
                if !owner.is_empty() && !name.is_empty() && !name.contains('/') =>
            {
                Ok(RepositorySlug {
                    owner: owner.to_string(),
                    name: name.to_string(),
                })
            }
            _ => Err(RunError::config(format!(
                "Repository must be in owner/name form, got '{}'",
                s
            ))),
        }
    }
}

impl fmt::Display for RepositorySlug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// Validated configuration for one run.
#[derive(Clone)]
pub struct Config {
    /// Bearer credential for the GitHub API.
    pub credential: String,
    pub authorized_reviewers_source: AuthorizedReviewersSource,
    pub repository: RepositorySlug,
    pub event_path: PathBuf,
    /// Base URL without a trailing slash.
    pub api_url: String,
    pub recording_log_path: Option<PathBuf>,
}

// Keeps the credential out of debug logs.
impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("credential", &"[REDACTED]")
            .field(
                "authorized_reviewers_source",
                &self.authorized_reviewers_source,
            )
            .field("repository", &self.repository)
            .field("event_path", &self.event_path)
            .field("api_url", &self.api_url)
            .field("recording_log_path", &self.recording_log_path)
            .finish()
    }
}

/// Unset action inputs arrive as empty strings.
pub fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

impl Config {
    /// Validate raw arguments. The credential is checked first, then the
    /// reviewer source, so the first missing piece is the one reported.
    pub fn resolve(args: ActionArgs) -> Result<Self, RunError> {
        let credential = non_empty(args.github_token)
            .or_else(|| non_empty(args.fallback_token))
            .ok_or_else(|| RunError::config("Missing Github token"))?;

        let reviewers_file = args
            .reviewers_json_file_path
            .filter(|p| !p.as_os_str().is_empty());
        let authorized_reviewers_source = match (reviewers_file, non_empty(args.reviewers)) {
            (Some(path), _) => AuthorizedReviewersSource::File(path),
            (None, Some(list)) => AuthorizedReviewersSource::parse_inline(&list),
            (None, None) => return Err(RunError::config("Missing reviewers JSON")),
        };

        let repository = non_empty(args.repository)
            .ok_or_else(|| RunError::config("Missing repository (GITHUB_REPOSITORY)"))?
            .parse::<RepositorySlug>()?;

        let event_path = args
            .event_path
            .filter(|p| !p.as_os_str().is_empty())
            .ok_or_else(|| RunError::config("Missing event payload path (GITHUB_EVENT_PATH)"))?;

        let api_url = non_empty(args.api_url)
            .unwrap_or_else(|| DEFAULT_API_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        let recording_log_path = args
            .recording_log_path
            .filter(|p| !p.as_os_str().is_empty());

        Ok(Config {
            credential,
            authorized_reviewers_source,
            repository,
            event_path,
            api_url,
            recording_log_path,
        })
    }
}
