use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::error::{Error, Result};

/// Discrete lifecycle state shared by projects, phases, and tasks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LifecycleStatus {
    Pending,
    Ongoing,
    Delayed,
    Completed,
    Cancelled,
}

impl LifecycleStatus {
    /// Decode the stored string form. An unrecognized value signals a
    /// schema/version mismatch and is fatal.
    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "pending" => Ok(LifecycleStatus::Pending),
            "ongoing" => Ok(LifecycleStatus::Ongoing),
            "delayed" => Ok(LifecycleStatus::Delayed),
            "completed" => Ok(LifecycleStatus::Completed),
            "cancelled" => Ok(LifecycleStatus::Cancelled),
            other => Err(Error::Decode(format!("unknown lifecycle status: {other}"))),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LifecycleStatus::Pending => "pending",
            LifecycleStatus::Ongoing => "ongoing",
            LifecycleStatus::Delayed => "delayed",
            LifecycleStatus::Completed => "completed",
            LifecycleStatus::Cancelled => "cancelled",
        }
    }
}

/// Task importance level, used as the base weight in worker scoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskPriority {
    Low,
    Medium,
    High,
}

impl TaskPriority {
    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "low" => Ok(TaskPriority::Low),
            "medium" => Ok(TaskPriority::Medium),
            "high" => Ok(TaskPriority::High),
            other => Err(Error::Decode(format!("unknown task priority: {other}"))),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskPriority::Low => "low",
            TaskPriority::Medium => "medium",
            TaskPriority::High => "high",
        }
    }
}

/// Planned window plus the optional actual completion time. `actual_end`
/// stays `None` until the item is completed; absence never maps to a
/// default date.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Schedule {
    pub planned_start: Option<DateTime<Utc>>,
    pub planned_end: Option<DateTime<Utc>>,
    pub actual_end: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Task {
    pub id: i64,
    pub token: Uuid,
    pub name: String,
    pub priority: TaskPriority,
    pub status: LifecycleStatus,
    pub schedule: Schedule,
    /// Non-owning references to assigned workers; workers themselves live
    /// outside the containment tree.
    pub assignees: Vec<i64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Phase {
    pub id: i64,
    pub token: Uuid,
    pub name: String,
    pub status: LifecycleStatus,
    pub schedule: Schedule,
    /// Ordered by planned start, as delivered by the source query.
    pub tasks: Vec<Task>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Project {
    pub id: i64,
    pub token: Uuid,
    pub name: String,
    pub status: LifecycleStatus,
    pub schedule: Schedule,
    /// Ordered by planned start; an empty collection is valid.
    pub phases: Vec<Phase>,
}

/// One worker-assignment status bucket: raw count plus its share of the
/// caller-supplied total.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct StatusSlice {
    pub count: u64,
    pub percentage: f64,
}

/// Status → count/percentage, ordered by status name for deterministic
/// serialization.
pub type WorkerStatusBreakdown = BTreeMap<String, StatusSlice>;

/// Year → month (1–12) → completed-task count. Missing buckets are absent,
/// never zero-filled.
pub type PeriodicTaskCount = BTreeMap<i32, BTreeMap<u32, u64>>;

#[derive(Debug, Clone, Serialize)]
pub struct WorkerScore {
    pub worker_id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    /// Distinct tasks ever assigned, qualifying for scoring or not.
    pub total_tasks: u64,
    pub completed_tasks: u64,
    /// Normalized 0–100, rounded to 2 decimals.
    pub overall_score: f64,
}

/// The assembled analytical snapshot for one project. Constructed once per
/// request from four independent fetches, immutable afterwards.
///
/// `project` is `None` only when the tree fetch came back empty while
/// worker stats did not; when both are empty no report is produced at all.
#[derive(Debug, Clone, Serialize)]
pub struct ProjectReport {
    pub project: Option<Project>,
    pub worker_status: WorkerStatusBreakdown,
    pub monthly_completions: PeriodicTaskCount,
    /// Descending by score, stable on ties, at most 10 entries.
    pub top_workers: Vec<WorkerScore>,
}
