use review_gate_core::Decision;
use std::env;
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::RunError;
use crate::run::RunOutcome;

pub const CHECK_FAILED_MESSAGE: &str = "Mandatory review check failed";

/// Escape message data the way the Actions toolkit does before emitting a
/// workflow command.
pub fn escape_data(value: &str) -> String {
    value
        .replace('%', "%25")
        .replace('\r', "%0D")
        .replace('\n', "%0A")
}

/// Run-outcome sink speaking the GitHub Actions workflow-command protocol.
///
/// Commands go to `out` (stdout in production). Step outputs and the job
/// summary are appended to the files named by `GITHUB_OUTPUT` and
/// `GITHUB_STEP_SUMMARY` when those are set. None of this can change the
/// outcome: write failures are only logged.
pub struct WorkflowCommands<W: Write> {
    out: W,
    github_output: Option<PathBuf>,
    step_summary: Option<PathBuf>,
}

impl WorkflowCommands<io::Stdout> {
    pub fn from_env() -> Self {
        let path_var = |name: &str| {
            env::var_os(name)
                .filter(|v| !v.is_empty())
                .map(PathBuf::from)
        };
        Self::new(
            io::stdout(),
            path_var("GITHUB_OUTPUT"),
            path_var("GITHUB_STEP_SUMMARY"),
        )
    }
}

impl<W: Write> WorkflowCommands<W> {
    pub fn new(out: W, github_output: Option<PathBuf>, step_summary: Option<PathBuf>) -> Self {
        Self {
            out,
            github_output,
            step_summary,
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn command(&mut self, name: &str, message: &str) {
        if let Err(e) = writeln!(self.out, "::{}::{}", name, escape_data(message)) {
            warn!("Failed to write ::{}:: workflow command: {}", name, e);
        }
    }

    pub fn set_failed(&mut self, message: &str) {
        self.command("error", message);
    }

    pub fn notice(&mut self, message: &str) {
        self.command("notice", message);
    }

    pub fn set_output(&mut self, name: &str, value: &str) {
        let Some(path) = self.github_output.clone() else {
            return;
        };
        let entry = if value.contains('\n') || value.contains('\r') {
            let delimiter = format!("ghadelimiter_{}", Uuid::new_v4());
            format!("{}<<{}\n{}\n{}\n", name, delimiter, value, delimiter)
        } else {
            format!("{}={}\n", name, value)
        };
        append_to(&path, &entry, "step output");
    }

    pub fn append_summary(&mut self, markdown: &str) {
        if let Some(path) = self.step_summary.clone() {
            append_to(&path, &format!("{}\n", markdown), "job summary");
        }
    }
}

fn append_to(path: &Path, contents: &str, what: &str) {
    let result = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .and_then(|mut file| file.write_all(contents.as_bytes()));
    if let Err(e) = result {
        warn!("Failed to write {} to {}: {}", what, path.display(), e);
    }
}

/// Convert the result of a run into the single external signal. Returns
/// `true` when the step should succeed.
pub fn report<W: Write>(
    sink: &mut WorkflowCommands<W>,
    result: &Result<RunOutcome, RunError>,
) -> bool {
    match result {
        Ok(RunOutcome::NotApplicable) => {
            info!("No pull request in the triggering event; nothing to check");
            true
        }
        Ok(RunOutcome::Evaluated {
            pull_request,
            decision: Decision::Pass(review),
        }) => {
            let login = review.author_display();
            sink.notice(&format!(
                "Mandatory review satisfied: approved by {} at {}",
                login, pull_request.latest_commit_sha
            ));
            sink.set_output("approved-by", login);
            sink.append_summary(&format!(
                "✅ Mandatory review satisfied for #{}: approved by @{} at `{}`",
                pull_request.number, login, pull_request.latest_commit_sha
            ));
            true
        }
        Ok(RunOutcome::Evaluated {
            pull_request,
            decision: Decision::Fail,
        }) => {
            sink.set_failed(CHECK_FAILED_MESSAGE);
            sink.append_summary(&format!(
                "❌ {} for #{}: no authorized approval on `{}`",
                CHECK_FAILED_MESSAGE, pull_request.number, pull_request.latest_commit_sha
            ));
            false
        }
        Err(e) => {
            let message = e.failure_message();
            sink.set_failed(&message);
            sink.append_summary(&format!("❌ {}", message));
            false
        }
    }
}
