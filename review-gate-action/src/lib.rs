pub mod config;
pub mod error;
pub mod event;
pub mod github;
pub mod outcome;
pub mod recording;
pub mod run;

pub use config::{ActionArgs, Config, RepositorySlug};
pub use error::RunError;
pub use github::GitHubClient;
pub use recording::RecordingLogger;
pub use run::{run, RunOutcome};

mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

fn short_hash(hash: &str) -> &str {
    hash.get(..8).unwrap_or(hash)
}

/// Package version plus the short git hash the binary was built from, if known.
pub fn get_version() -> String {
    let git_hash = option_env!("REVIEW_GATE_GIT_HASH").or(built_info::GIT_COMMIT_HASH);
    match git_hash {
        Some(hash) => format!("{} ({})", built_info::PKG_VERSION, short_hash(hash)),
        None => built_info::PKG_VERSION.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_hash_truncates_long_hashes() {
        assert_eq!(short_hash("0123456789abcdef"), "01234567");
        assert_eq!(short_hash("abc"), "abc");
    }

    #[test]
    fn test_short_hash_does_not_split_multibyte_chars() {
        // Byte 8 falls inside 'é'
        assert_eq!(short_hash("abcdefgé123"), "abcdefgé123");
        assert_eq!(short_hash("ééééé"), "éééé");
    }

    #[test]
    fn test_get_version_starts_with_package_version() {
        assert!(get_version().starts_with(env!("CARGO_PKG_VERSION")));
    }
}
