//! Aggregate status reporting for a project.

use super::{ProjectId, ProjectPhase, TaskGraph, TaskStatus};
use serde::{Deserialize, Serialize};

/// Number of tasks in each status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCounts {
    /// Tasks waiting to run.
    pub pending: usize,
    /// Tasks handed to a worker.
    pub in_progress: usize,
    /// Tasks that can never run.
    pub blocked: usize,
    /// Tasks awaiting a human gate.
    pub in_review: usize,
    /// Tasks that finished successfully.
    pub completed: usize,
    /// Tasks that finished unsuccessfully.
    pub failed: usize,
}

impl StatusCounts {
    /// Tallies the statuses of every task in the graph.
    #[must_use]
    pub fn tally(tasks: &TaskGraph) -> Self {
        tasks.iter().fold(Self::default(), |mut counts, task| {
            *counts.slot(task.status()) += 1;
            counts
        })
    }

    /// Returns the count for one status.
    #[must_use]
    pub const fn get(&self, status: TaskStatus) -> usize {
        match status {
            TaskStatus::Pending => self.pending,
            TaskStatus::InProgress => self.in_progress,
            TaskStatus::Blocked => self.blocked,
            TaskStatus::InReview => self.in_review,
            TaskStatus::Completed => self.completed,
            TaskStatus::Failed => self.failed,
        }
    }

    /// Returns the total number of tasks counted.
    #[must_use]
    pub const fn total(&self) -> usize {
        self.pending + self.in_progress + self.blocked + self.in_review + self.completed + self.failed
    }

    const fn slot(&mut self, status: TaskStatus) -> &mut usize {
        match status {
            TaskStatus::Pending => &mut self.pending,
            TaskStatus::InProgress => &mut self.in_progress,
            TaskStatus::Blocked => &mut self.blocked,
            TaskStatus::InReview => &mut self.in_review,
            TaskStatus::Completed => &mut self.completed,
            TaskStatus::Failed => &mut self.failed,
        }
    }
}

/// Point-in-time summary of a project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectStatus {
    /// Project identifier.
    pub project_id: ProjectId,
    /// Human-readable project name.
    pub project_name: String,
    /// Current phase.
    pub phase: ProjectPhase,
    /// Per-status task counts.
    pub task_summary: StatusCounts,
    /// Number of tasks in the project.
    pub total_tasks: usize,
    /// Share of completed tasks, from 0 to 100.
    pub progress_percentage: f64,
}

/// Returns `completed / total * 100`, or `0` when there are no tasks.
#[expect(
    clippy::cast_precision_loss,
    clippy::float_arithmetic,
    reason = "task counts are small; the percentage is a display value"
)]
#[must_use]
pub fn progress_percentage(counts: &StatusCounts) -> f64 {
    let total = counts.total();
    if total == 0 {
        return 0.0;
    }
    if counts.completed == total {
        return 100.0;
    }
    (counts.completed as f64 / total as f64) * 100.0
}
