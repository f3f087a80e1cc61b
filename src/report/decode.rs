//! Decoding of the denormalized project-tree aggregate row.
//!
//! The query layer avoids N+1 fetches by returning one row per project with
//! the phase/task collections serialized as JSON text. Decoding is a pure
//! parse step independent of the SQL that produced the row, so it can be
//! tested with literal payloads.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::{Error, Result};

use super::types::{LifecycleStatus, Phase, Project, Schedule, Task, TaskPriority};

/// One row from the project-tree aggregate query. `phases` carries the
/// serialized nested collections; all other columns are scalars.
#[derive(Debug, Clone)]
pub struct ProjectTreeRow {
    pub project_id: i64,
    pub public_token: String,
    pub name: String,
    pub status: String,
    pub planned_start: Option<String>,
    pub planned_end: Option<String>,
    pub actual_end: Option<String>,
    pub phases: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PhaseRecord {
    pub phase_id: i64,
    pub public_token: String,
    pub name: String,
    pub status: String,
    pub planned_start: Option<String>,
    pub planned_end: Option<String>,
    pub actual_end: Option<String>,
    /// Ordered task records; `null` and a missing key both mean "no tasks".
    #[serde(default)]
    pub tasks: Option<Vec<TaskRecord>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TaskRecord {
    pub task_id: i64,
    pub public_token: String,
    pub name: String,
    pub priority: String,
    pub status: String,
    pub planned_start: Option<String>,
    pub planned_end: Option<String>,
    pub actual_end: Option<String>,
    /// Comma-separated worker ids. Workers are stored separately; this is
    /// the only trace of them inside the tree row.
    pub assignee_ids: Option<String>,
}

/// Parse the serialized phase collection. Absent or empty payloads yield an
/// empty sequence; malformed JSON is a fatal decode error.
pub fn parse_phase_records(payload: Option<&str>) -> Result<Vec<PhaseRecord>> {
    let Some(payload) = payload else {
        return Ok(Vec::new());
    };
    if payload.trim().is_empty() {
        return Ok(Vec::new());
    }
    serde_json::from_str(payload).map_err(|e| Error::Decode(format!("phase payload: {e}")))
}

/// Hydrate the owned Project → Phase → Task tree from one aggregate row.
/// Phase and task order is preserved exactly as delivered; the upstream
/// query is responsible for chronological ordering.
pub fn build_project(row: &ProjectTreeRow) -> Result<Project> {
    let records = parse_phase_records(row.phases.as_deref())?;
    let mut phases = Vec::with_capacity(records.len());
    for record in &records {
        phases.push(build_phase(record)?);
    }

    Ok(Project {
        id: row.project_id,
        token: parse_token(&row.public_token)?,
        name: row.name.clone(),
        status: LifecycleStatus::parse(&row.status)?,
        schedule: build_schedule(
            row.planned_start.as_deref(),
            row.planned_end.as_deref(),
            row.actual_end.as_deref(),
        )?,
        phases,
    })
}

fn build_phase(record: &PhaseRecord) -> Result<Phase> {
    let task_records = record.tasks.as_deref().unwrap_or_default();
    let mut tasks = Vec::with_capacity(task_records.len());
    for task in task_records {
        tasks.push(build_task(task)?);
    }

    Ok(Phase {
        id: record.phase_id,
        token: parse_token(&record.public_token)?,
        name: record.name.clone(),
        status: LifecycleStatus::parse(&record.status)?,
        schedule: build_schedule(
            record.planned_start.as_deref(),
            record.planned_end.as_deref(),
            record.actual_end.as_deref(),
        )?,
        tasks,
    })
}

fn build_task(record: &TaskRecord) -> Result<Task> {
    Ok(Task {
        id: record.task_id,
        token: parse_token(&record.public_token)?,
        name: record.name.clone(),
        priority: TaskPriority::parse(&record.priority)?,
        status: LifecycleStatus::parse(&record.status)?,
        schedule: build_schedule(
            record.planned_start.as_deref(),
            record.planned_end.as_deref(),
            record.actual_end.as_deref(),
        )?,
        assignees: parse_assignee_ids(record.assignee_ids.as_deref())?,
    })
}

fn build_schedule(
    planned_start: Option<&str>,
    planned_end: Option<&str>,
    actual_end: Option<&str>,
) -> Result<Schedule> {
    Ok(Schedule {
        planned_start: parse_opt_timestamp(planned_start)?,
        planned_end: parse_opt_timestamp(planned_end)?,
        actual_end: parse_opt_timestamp(actual_end)?,
    })
}

/// Decode a stored public token (hex, with or without hyphens).
pub fn parse_token(s: &str) -> Result<Uuid> {
    Uuid::parse_str(s.trim()).map_err(|_| Error::Decode(format!("invalid public token: {s}")))
}

/// Parse an RFC 3339 timestamp into UTC.
pub fn parse_timestamp(s: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s.trim())
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| Error::Decode(format!("invalid timestamp: {s}")))
}

fn parse_opt_timestamp(s: Option<&str>) -> Result<Option<DateTime<Utc>>> {
    s.map(parse_timestamp).transpose()
}

fn parse_assignee_ids(s: Option<&str>) -> Result<Vec<i64>> {
    let Some(s) = s else {
        return Ok(Vec::new());
    };
    let s = s.trim();
    if s.is_empty() {
        return Ok(Vec::new());
    }
    s.split(',')
        .map(|part| {
            part.trim()
                .parse::<i64>()
                .map_err(|_| Error::Decode(format!("invalid assignee id: {part}")))
        })
        .collect()
}
