//! Persistence of outcomes to a results file.
//!
//! The listener writes through the `OutcomeSink` seam so tests can capture
//! outcomes without touching the filesystem. The shipped implementation
//! appends one JSON object per line.

use std::path::Path;

use async_trait::async_trait;
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;

use crate::error::{FlakrError, Result};
use crate::outcome::Outcome;

/// Destination for serialized outcomes.
#[async_trait]
pub trait OutcomeSink: Send {
    /// Append one outcome. Errors are non-fatal to the pipeline; the caller
    /// logs and moves on.
    async fn append(&mut self, outcome: &Outcome) -> Result<()>;
}

/// JSON-lines file sink. The file is created (truncated) up front so an
/// unwritable path fails the run before any worker starts.
#[derive(Debug)]
pub struct JsonLinesSink {
    file: File,
}

impl JsonLinesSink {
    pub async fn create(path: &Path) -> Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .truncate(true)
            .write(true)
            .open(path)
            .await
            .map_err(|source| FlakrError::OutputFile {
                path: path.to_path_buf(),
                source,
            })?;
        Ok(Self { file })
    }
}

#[async_trait]
impl OutcomeSink for JsonLinesSink {
    async fn append(&mut self, outcome: &Outcome) -> Result<()> {
        let mut line = serde_json::to_vec(outcome)?;
        line.push(b'\n');
        self.file.write_all(&line).await?;
        Ok(())
    }
}
