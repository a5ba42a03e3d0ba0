use super::RecordedEvent;
use anyhow::{Context, Result};
use std::path::PathBuf;
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

/// Appends recorded events to a JSONL file from a background task.
///
/// Clones handed to middleware share the channel but not the writer handle;
/// only the original can [`finish`](Self::finish).
pub struct RecordingLogger {
    sender: mpsc::UnboundedSender<RecordedEvent>,
    writer: Option<JoinHandle<()>>,
}

impl RecordingLogger {
    /// Open (or create) the log file and start the writer task.
    pub async fn new(log_file_path: PathBuf) -> Result<Self> {
        if let Some(parent) = log_file_path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await.with_context(|| {
                    format!("Failed to create recording directory {}", parent.display())
                })?;
            }
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_file_path)
            .await
            .with_context(|| {
                format!("Failed to open recording log {}", log_file_path.display())
            })?;

        info!("Recording GitHub API traffic to: {}", log_file_path.display());

        let (sender, receiver) = mpsc::unbounded_channel();
        let writer = tokio::spawn(Self::writer_task(file, receiver));

        Ok(Self {
            sender,
            writer: Some(writer),
        })
    }

    pub fn record(&self, event: RecordedEvent) {
        if self.sender.send(event).is_err() {
            error!("Failed to send event to recording logger: receiver dropped");
        }
    }

    pub fn clone_for_middleware(&self) -> Self {
        Self {
            sender: self.sender.clone(),
            writer: None,
        }
    }

    /// Wait until every recorded event is on disk.
    ///
    /// Resolves only once all middleware clones have been dropped, so the HTTP
    /// client must be gone before this is awaited.
    pub async fn finish(self) {
        let RecordingLogger { sender, writer } = self;
        drop(sender);
        if let Some(writer) = writer {
            if let Err(e) = writer.await {
                warn!("Recording writer task did not shut down cleanly: {}", e);
            }
        }
    }

    async fn writer_task(mut file: File, mut receiver: mpsc::UnboundedReceiver<RecordedEvent>) {
        while let Some(event) = receiver.recv().await {
            match serde_json::to_string(&event) {
                Ok(json_line) => {
                    if let Err(e) = file.write_all(format!("{}\n", json_line).as_bytes()).await {
                        error!("Failed to write event to log: {}", e);
                        continue;
                    }
                    if let Err(e) = file.flush().await {
                        error!("Failed to flush log file: {}", e);
                    }
                }
                Err(e) => {
                    error!("Failed to serialize event: {}", e);
                }
            }
        }
    }
}
