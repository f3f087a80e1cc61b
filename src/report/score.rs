//! Weighted worker-performance scoring.
//!
//! Each assigned task contributes its priority weight scaled by a
//! timeliness/state multiplier. The denominator applies the best-case
//! multiplier to the same tasks, so the theoretical maximum is 100.

use std::cmp::Ordering;
use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};

use super::decode;
use super::types::WorkerScore;

/// One raw per-assignment row: a single task assigned to a single worker,
/// delivered in stable source order (ties in the ranking keep this order).
#[derive(Debug, Clone)]
pub struct WorkerTaskRow {
    pub worker_id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub priority: String,
    pub status: String,
    pub planned_end: Option<String>,
    pub actual_end: Option<String>,
}

/// Ranking is truncated to this many entries.
pub const TOP_WORKERS: usize = 10;

const BEST_CASE_MULTIPLIER: f64 = 1.2;

fn priority_weight(priority: &str) -> f64 {
    match priority {
        "high" => 5.0,
        "medium" => 3.0,
        // "low" and unrecognized legacy values both weigh 1.0.
        _ => 1.0,
    }
}

/// Timeliness/state multiplier for one task. `None` means the task does not
/// qualify (cancelled, pending, unknown) and contributes to neither sum.
fn state_multiplier(
    status: &str,
    planned_end: Option<DateTime<Utc>>,
    actual_end: Option<DateTime<Utc>>,
) -> Option<f64> {
    match status {
        "completed" => Some(completion_multiplier(planned_end, actual_end)),
        "ongoing" => Some(0.5),
        "delayed" => Some(0.3),
        _ => None,
    }
}

fn completion_multiplier(
    planned_end: Option<DateTime<Utc>>,
    actual_end: Option<DateTime<Utc>>,
) -> f64 {
    let (Some(planned), Some(actual)) = (planned_end, actual_end) else {
        // No dates to judge against; scored as on-time.
        return 1.0;
    };
    if actual < planned {
        1.2
    } else if actual <= planned + Duration::days(1) {
        1.0
    } else {
        0.8
    }
}

/// Score and rank workers from raw assignment rows: stable descending sort
/// by score, truncated to the top 10. Workers with no qualifying tasks are
/// excluded entirely rather than scored 0.
pub fn rank_workers(rows: &[WorkerTaskRow]) -> Vec<WorkerScore> {
    struct Acc {
        first_name: String,
        last_name: String,
        email: Option<String>,
        total_tasks: u64,
        completed_tasks: u64,
        earned: f64,
        best_case: f64,
    }

    let mut order: Vec<i64> = Vec::new();
    let mut by_worker: HashMap<i64, Acc> = HashMap::new();

    for row in rows {
        let acc = by_worker.entry(row.worker_id).or_insert_with(|| {
            order.push(row.worker_id);
            Acc {
                first_name: row.first_name.clone(),
                last_name: row.last_name.clone(),
                email: row.email.clone(),
                total_tasks: 0,
                completed_tasks: 0,
                earned: 0.0,
                best_case: 0.0,
            }
        });

        acc.total_tasks += 1;
        if row.status == "completed" {
            acc.completed_tasks += 1;
        }

        let planned = row
            .planned_end
            .as_deref()
            .and_then(|s| decode::parse_timestamp(s).ok());
        let actual = row
            .actual_end
            .as_deref()
            .and_then(|s| decode::parse_timestamp(s).ok());

        if let Some(multiplier) = state_multiplier(&row.status, planned, actual) {
            let weight = priority_weight(&row.priority);
            acc.earned += weight * multiplier;
            acc.best_case += weight * BEST_CASE_MULTIPLIER;
        }
    }

    let mut ranked: Vec<WorkerScore> = Vec::new();
    for worker_id in order {
        let acc = &by_worker[&worker_id];
        if acc.best_case <= 0.0 {
            continue;
        }
        ranked.push(WorkerScore {
            worker_id,
            first_name: acc.first_name.clone(),
            last_name: acc.last_name.clone(),
            email: acc.email.clone(),
            total_tasks: acc.total_tasks,
            completed_tasks: acc.completed_tasks,
            overall_score: round2(acc.earned / acc.best_case * 100.0),
        });
    }

    // Stable sort: equal scores keep source order.
    ranked.sort_by(|a, b| {
        b.overall_score
            .partial_cmp(&a.overall_score)
            .unwrap_or(Ordering::Equal)
    });
    ranked.truncate(TOP_WORKERS);
    ranked
}

fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}
