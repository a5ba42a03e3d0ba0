use anyhow::{anyhow, Context, Result};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

/// Logins whose approval counts toward the gate.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthorizedReviewers {
    logins: HashSet<String>,
}

impl AuthorizedReviewers {
    pub fn contains(&self, login: &str) -> bool {
        self.logins.contains(login)
    }

    pub fn len(&self) -> usize {
        self.logins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.logins.is_empty()
    }

    /// Logins in sorted order, for stable diagnostics.
    pub fn sorted_logins(&self) -> Vec<&str> {
        let mut logins: Vec<&str> = self.logins.iter().map(String::as_str).collect();
        logins.sort_unstable();
        logins
    }

    /// Parse a JSON array of login strings, e.g. `["alice", "bob"]`.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let logins: Vec<String> = serde_json::from_str(json)
            .context("Reviewers JSON must be an array of login strings")?;
        Ok(logins.into_iter().collect())
    }
}

impl FromIterator<String> for AuthorizedReviewers {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        Self {
            logins: iter.into_iter().collect(),
        }
    }
}

impl<'a> FromIterator<&'a str> for AuthorizedReviewers {
    fn from_iter<I: IntoIterator<Item = &'a str>>(iter: I) -> Self {
        iter.into_iter().map(str::to_string).collect()
    }
}

/// Where the authorized reviewer set comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthorizedReviewersSource {
    /// Path to a JSON file holding an array of logins.
    File(PathBuf),
    /// A fixed list supplied directly in configuration.
    Inline(Vec<String>),
}

impl AuthorizedReviewersSource {
    /// Build an inline source from a comma- or newline-separated list.
    ///
    /// Entries are trimmed and blank entries dropped.
    pub fn parse_inline(list: &str) -> Self {
        let logins = list
            .split([',', '\n'])
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();
        AuthorizedReviewersSource::Inline(logins)
    }

    pub fn load(&self) -> Result<AuthorizedReviewers> {
        match self {
            AuthorizedReviewersSource::File(path) => load_reviewers_file(path),
            AuthorizedReviewersSource::Inline(logins) => {
                Ok(logins.iter().map(String::as_str).collect())
            }
        }
    }

    pub fn describe(&self) -> String {
        match self {
            AuthorizedReviewersSource::File(path) => format!("file {}", path.display()),
            AuthorizedReviewersSource::Inline(logins) => {
                format!("inline list of {} login(s)", logins.len())
            }
        }
    }
}

fn load_reviewers_file(path: &Path) -> Result<AuthorizedReviewers> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read reviewers file {}", path.display()))?;

    AuthorizedReviewers::from_json_str(&contents).map_err(|e| {
        anyhow!(
            "Failed to parse reviewers file {}: {:#}",
            path.display(),
            e
        )
    })
}
