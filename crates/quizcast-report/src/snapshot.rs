//! Serializable stats snapshot with JSON persistence.
//!
//! The core keeps all state in memory for the process lifetime; a
//! snapshot is the operator's way to export the numbers at a point in
//! time.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use quizcast_core::model::AssignmentId;
use quizcast_core::stats::{Accuracy, LeaderboardRow, StatsAggregator};
use quizcast_core::store::AssignmentStore;

/// A point-in-time export of aggregate statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatsSnapshot {
    /// Unique snapshot identifier.
    pub id: Uuid,
    /// When the snapshot was taken.
    pub created_at: DateTime<Utc>,
    /// Overall accuracy across all assignments.
    pub overall: Accuracy,
    /// Per-assignment accuracy in creation order.
    pub assignments: Vec<AssignmentSummary>,
    /// The leaderboard at snapshot time.
    pub leaderboard: Vec<LeaderboardRow>,
}

/// One assignment's accuracy with enough context to read the export
/// standalone.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssignmentSummary {
    pub assignment_id: AssignmentId,
    pub question: String,
    pub sent: bool,
    pub accuracy: Accuracy,
}

impl StatsSnapshot {
    /// Capture the current state.
    pub fn capture(store: &AssignmentStore, stats: &StatsAggregator) -> Self {
        let assignments = store
            .list()
            .into_iter()
            .map(|a| AssignmentSummary {
                assignment_id: a.id,
                question: a.question,
                sent: a.sent,
                accuracy: stats.per_assignment_accuracy(a.id),
            })
            .collect();

        Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            overall: stats.overall_accuracy(),
            assignments,
            leaderboard: stats.leaderboard(),
        }
    }

    /// Save the snapshot as JSON to a file.
    pub fn save_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("failed to serialize snapshot")?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, json)
            .with_context(|| format!("failed to write snapshot to {}", path.display()))?;
        Ok(())
    }

    /// Load a snapshot from a JSON file.
    pub fn load_json(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read snapshot from {}", path.display()))?;
        let snapshot: StatsSnapshot =
            serde_json::from_str(&content).context("failed to parse snapshot JSON")?;
        Ok(snapshot)
    }
}
