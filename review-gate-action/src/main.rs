use clap::Parser;
use std::process::ExitCode;
use tracing::{error, info};

use review_gate_action::outcome::{report, WorkflowCommands};
use review_gate_action::{get_version, run, ActionArgs, Config, RecordingLogger};

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let args = ActionArgs::parse();

    tracing_subscriber::fmt()
        .with_max_level(args.log_level())
        .with_writer(std::io::stderr)
        .init();

    info!("Starting review-gate {}", get_version());

    let mut sink = WorkflowCommands::from_env();

    let result = match Config::resolve(args) {
        Ok(config) => {
            let recording_logger = match &config.recording_log_path {
                Some(path) => match RecordingLogger::new(path.clone()).await {
                    Ok(logger) => Some(logger),
                    Err(e) => {
                        error!("Failed to initialize recording logger: {:#}", e);
                        None
                    }
                },
                None => None,
            };

            let result = run(&config, recording_logger.as_ref()).await;

            if let Some(logger) = recording_logger {
                logger.finish().await;
            }
            result
        }
        Err(e) => Err(e),
    };

    if report(&mut sink, &result) {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
