//! Session trajectory recorder
//!
//! One recorder spans a CLI session, so a trajectory may hold several runs.

use crate::error::{Result, TrajectoryError};
use crate::trajectory::{EntryType, TrajectoryEntry};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;

/// Format version written into saved trajectories
const TRAJECTORY_VERSION: &str = "adpilot-trajectory/1";

/// Collects trajectory entries and writes them out as JSON
pub struct TrajectoryRecorder {
    entries: RwLock<Vec<TrajectoryEntry>>,
    file_path: Option<PathBuf>,
}

/// Saved trajectory file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trajectory {
    pub version: String,
    pub summary: TrajectorySummary,
    pub entries: Vec<TrajectoryEntry>,
}

/// Totals derived from the entries of a session
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrajectorySummary {
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    /// `provider/model` of the first model request
    pub model: Option<String>,
    /// User messages, one per run
    pub questions: Vec<String>,
    pub answered_runs: usize,
    pub aborted_runs: usize,
    pub failed_runs: usize,
    pub tool_calls: usize,
    pub tool_failures: usize,
}

impl TrajectorySummary {
    fn from_entries(entries: &[TrajectoryEntry]) -> Self {
        let mut summary = TrajectorySummary {
            started_at: entries.first().map(|e| e.timestamp),
            finished_at: entries.last().map(|e| e.timestamp),
            ..Default::default()
        };

        for entry in entries {
            match &entry.entry_type {
                EntryType::TaskStart { task, .. } => summary.questions.push(task.clone()),
                EntryType::LlmRequest {
                    model, provider, ..
                } if summary.model.is_none() => {
                    summary.model = Some(format!("{}/{}", provider, model));
                }
                EntryType::ToolCall { .. } => summary.tool_calls += 1,
                EntryType::ToolResult { result } if !result.is_success() => {
                    summary.tool_failures += 1
                }
                EntryType::TaskComplete { success: true, .. } => summary.answered_runs += 1,
                EntryType::TaskComplete { success: false, .. } => summary.aborted_runs += 1,
                EntryType::Error { .. } => summary.failed_runs += 1,
                _ => {}
            }
        }

        summary
    }
}

impl TrajectoryRecorder {
    /// Recorder that keeps entries in memory only
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(Vec::new()),
            file_path: None,
        }
    }

    /// Recorder whose [`save`](Self::save) writes to `path`
    pub fn with_file<P: AsRef<Path>>(path: P) -> Self {
        Self {
            entries: RwLock::new(Vec::new()),
            file_path: Some(path.as_ref().to_path_buf()),
        }
    }

    pub async fn record(&self, entry: TrajectoryEntry) -> Result<()> {
        self.entries.write().await.push(entry);
        Ok(())
    }

    /// Record an entry, logging instead of failing the run when it cannot be stored
    pub async fn record_quietly(&self, entry: TrajectoryEntry) {
        if let Err(e) = self.record(entry).await {
            tracing::warn!("Failed to record trajectory entry: {}", e);
        }
    }

    pub async fn entry_count(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Totals for everything recorded so far
    pub async fn summary(&self) -> TrajectorySummary {
        TrajectorySummary::from_entries(&self.entries.read().await)
    }

    /// Write the trajectory as pretty JSON; a no-op without a file path
    pub async fn save(&self) -> Result<()> {
        let Some(path) = &self.file_path else {
            return Ok(());
        };

        let trajectory = {
            let entries = self.entries.read().await;
            Trajectory {
                version: TRAJECTORY_VERSION.to_string(),
                summary: TrajectorySummary::from_entries(&entries),
                entries: entries.clone(),
            }
        };
        let json = serde_json::to_string_pretty(&trajectory).map_err(|e| {
            TrajectoryError::RecordingFailed {
                message: format!("Failed to serialize trajectory: {}", e),
            }
        })?;

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(path, json).await?;
        tracing::debug!("Saved {} trajectory entries to {}", trajectory.entries.len(), path.display());
        Ok(())
    }

    /// Read a saved trajectory back
    pub async fn load<P: AsRef<Path>>(path: P) -> Result<Trajectory> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await.map_err(|_| {
            TrajectoryError::LoadFailed {
                path: path.display().to_string(),
            }
        })?;
        serde_json::from_str(&content).map_err(|_| TrajectoryError::InvalidFormat.into())
    }

    pub fn file_path(&self) -> Option<&Path> {
        self.file_path.as_deref()
    }
}

impl Default for TrajectoryRecorder {
    fn default() -> Self {
        Self::new()
    }
}
