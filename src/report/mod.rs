pub mod decode;
pub mod score;
pub mod status;
pub mod throughput;
pub mod types;

pub use types::*;

use crate::error::{Error, Result};
use crate::ident::ProjectKey;
use crate::storage::Database;

use decode::ProjectTreeRow;
use score::WorkerTaskRow;
use status::StatusCounts;
use throughput::MonthlyCountRow;

/// The query-executor seam: the four independent read-only fetches a report
/// is assembled from. Implemented over SQLite in `storage::repository`;
/// tests substitute literal in-memory results.
pub trait ReportQueries {
    fn project_tree(&self, key: &ProjectKey) -> Result<Option<ProjectTreeRow>>;
    fn worker_status_counts(&self, key: &ProjectKey) -> Result<StatusCounts>;
    fn monthly_task_counts(&self, key: &ProjectKey) -> Result<Vec<MonthlyCountRow>>;
    fn worker_task_stats(&self, key: &ProjectKey) -> Result<Vec<WorkerTaskRow>>;
}

/// Assemble a `ProjectReport` from the four fetches, issued sequentially.
///
/// The fetches are not snapshot-isolated; a write landing between them can
/// leave sub-parts at slightly different points in time. That window is an
/// accepted trade-off of the four-query design.
///
/// Returns `Ok(None)` when neither the tree fetch nor the worker stats
/// matched anything: a well-formed identifier for a project that does not
/// exist is not an error. When only one of the two is empty, the report is
/// still produced with the structural empty in its place.
pub fn build_report(
    queries: &impl ReportQueries,
    key: &ProjectKey,
) -> Result<Option<ProjectReport>> {
    let tree = queries.project_tree(key)?;
    let counts = queries.worker_status_counts(key)?;
    let monthly = queries.monthly_task_counts(key)?;
    let worker_rows = queries.worker_task_stats(key)?;

    if tree.is_none() && worker_rows.is_empty() {
        log::debug!("no report data for project {key}");
        return Ok(None);
    }

    let project = tree.as_ref().map(decode::build_project).transpose()?;

    Ok(Some(ProjectReport {
        project,
        worker_status: status::status_breakdown(&counts),
        monthly_completions: throughput::fold_monthly_counts(&monthly),
        top_workers: score::rank_workers(&worker_rows),
    }))
}

/// Generate a report for one project against the warehouse. All four
/// fetches run inside a single reader call.
pub async fn generate_project_report(
    db: &Database,
    key: &ProjectKey,
) -> Result<Option<ProjectReport>> {
    let key = key.clone();
    db.reader()
        .call(move |conn| {
            let queries = crate::storage::repository::SqliteQueries::new(conn);
            Ok::<_, rusqlite::Error>(build_report(&queries, &key))
        })
        .await
        .map_err(|e| Error::Database(e.to_string()))?
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Literal fixture standing in for the query layer.
    #[derive(Default)]
    struct FixtureQueries {
        tree: Option<ProjectTreeRow>,
        counts: StatusCounts,
        monthly: Vec<MonthlyCountRow>,
        worker_rows: Vec<WorkerTaskRow>,
    }

    impl ReportQueries for FixtureQueries {
        fn project_tree(&self, _key: &ProjectKey) -> Result<Option<ProjectTreeRow>> {
            Ok(self.tree.clone())
        }
        fn worker_status_counts(&self, _key: &ProjectKey) -> Result<StatusCounts> {
            Ok(self.counts.clone())
        }
        fn monthly_task_counts(&self, _key: &ProjectKey) -> Result<Vec<MonthlyCountRow>> {
            Ok(self.monthly.clone())
        }
        fn worker_task_stats(&self, _key: &ProjectKey) -> Result<Vec<WorkerTaskRow>> {
            Ok(self.worker_rows.clone())
        }
    }

    struct FailingQueries;

    impl ReportQueries for FailingQueries {
        fn project_tree(&self, _key: &ProjectKey) -> Result<Option<ProjectTreeRow>> {
            Err(Error::Database("connection lost".into()))
        }
        fn worker_status_counts(&self, _key: &ProjectKey) -> Result<StatusCounts> {
            unreachable!("fetches are sequential; the first failure propagates")
        }
        fn monthly_task_counts(&self, _key: &ProjectKey) -> Result<Vec<MonthlyCountRow>> {
            unreachable!()
        }
        fn worker_task_stats(&self, _key: &ProjectKey) -> Result<Vec<WorkerTaskRow>> {
            unreachable!()
        }
    }

    fn worker_row(worker_id: i64, priority: &str, status: &str) -> WorkerTaskRow {
        WorkerTaskRow {
            worker_id,
            first_name: "Ada".into(),
            last_name: "Stone".into(),
            email: Some("ada@example.com".into()),
            priority: priority.into(),
            status: status.into(),
            planned_end: Some("2024-01-20T00:00:00Z".into()),
            actual_end: if status == "completed" {
                Some("2024-01-18T00:00:00Z".into())
            } else {
                None
            },
        }
    }

    #[test]
    fn test_no_data_is_no_report() {
        let key = ProjectKey::Internal(1);
        let report = build_report(&FixtureQueries::default(), &key).unwrap();
        assert!(report.is_none());
    }

    #[test]
    fn test_workers_only_still_reports() {
        let key = ProjectKey::Internal(1);
        let fixture = FixtureQueries {
            worker_rows: vec![worker_row(7, "high", "completed")],
            ..Default::default()
        };
        let report = build_report(&fixture, &key).unwrap().unwrap();
        assert!(report.project.is_none());
        assert_eq!(report.top_workers.len(), 1);
        assert!(report.worker_status.is_empty());
    }

    #[test]
    fn test_tree_only_still_reports() {
        let key = ProjectKey::Internal(1);
        let fixture = FixtureQueries {
            tree: Some(ProjectTreeRow {
                project_id: 1,
                public_token: "00000000000000000000000000000001".into(),
                name: "Depot".into(),
                status: "pending".into(),
                planned_start: None,
                planned_end: None,
                actual_end: None,
                phases: None,
            }),
            ..Default::default()
        };
        let report = build_report(&fixture, &key).unwrap().unwrap();
        let project = report.project.unwrap();
        assert!(project.phases.is_empty());
        assert!(report.top_workers.is_empty());
    }

    #[test]
    fn test_store_failure_propagates() {
        let key = ProjectKey::Internal(1);
        assert!(matches!(
            build_report(&FailingQueries, &key),
            Err(Error::Database(_))
        ));
    }

    #[test]
    fn test_decode_failure_propagates() {
        let key = ProjectKey::Internal(1);
        let fixture = FixtureQueries {
            tree: Some(ProjectTreeRow {
                project_id: 1,
                public_token: "00000000000000000000000000000001".into(),
                name: "Depot".into(),
                status: "pending".into(),
                planned_start: None,
                planned_end: None,
                actual_end: None,
                phases: Some("{broken".into()),
            }),
            ..Default::default()
        };
        assert!(matches!(
            build_report(&fixture, &key),
            Err(Error::Decode(_))
        ));
    }

    #[test]
    fn test_end_to_end_scenario() {
        // Two phases: phase A with a completed-early high task and a delayed
        // medium task, phase B empty. Known status counts and periodic rows.
        let phases = r#"[
            {"phase_id": 1, "public_token": "0000000000000000000000000000000a",
             "name": "Phase A", "status": "ongoing",
             "planned_start": "2024-01-01T00:00:00Z",
             "planned_end": "2024-03-01T00:00:00Z", "actual_end": null,
             "tasks": [
                {"task_id": 10, "public_token": "00000000000000000000000000000010",
                 "name": "Pour slab", "priority": "high", "status": "completed",
                 "planned_start": "2024-01-02T00:00:00Z",
                 "planned_end": "2024-01-20T00:00:00Z",
                 "actual_end": "2024-01-18T00:00:00Z",
                 "assignee_ids": "7"},
                {"task_id": 11, "public_token": "00000000000000000000000000000011",
                 "name": "Inspect", "priority": "medium", "status": "delayed",
                 "planned_start": "2024-01-10T00:00:00Z",
                 "planned_end": "2024-02-01T00:00:00Z", "actual_end": null,
                 "assignee_ids": "7"}
             ]},
            {"phase_id": 2, "public_token": "0000000000000000000000000000000b",
             "name": "Phase B", "status": "pending",
             "planned_start": "2024-03-01T00:00:00Z",
             "planned_end": null, "actual_end": null, "tasks": []}
        ]"#;

        let fixture = FixtureQueries {
            tree: Some(ProjectTreeRow {
                project_id: 1,
                public_token: "00000000000000000000000000000001".into(),
                name: "Harbor Upgrade".into(),
                status: "ongoing".into(),
                planned_start: Some("2024-01-01T00:00:00Z".into()),
                planned_end: Some("2024-06-01T00:00:00Z".into()),
                actual_end: None,
                phases: Some(phases.into()),
            }),
            counts: StatusCounts {
                total: 6,
                by_status: vec![
                    ("assigned".into(), 3),
                    ("terminated".into(), 1),
                    ("unassigned".into(), 2),
                ],
            },
            monthly: vec![
                MonthlyCountRow { year: 2024, month: 1, count: 4 },
                MonthlyCountRow { year: 2024, month: 1, count: 2 },
                MonthlyCountRow { year: 2024, month: 2, count: 1 },
            ],
            worker_rows: vec![
                worker_row(7, "high", "completed"),
                worker_row(7, "medium", "delayed"),
            ],
        };

        let key = ProjectKey::Internal(1);
        let report = build_report(&fixture, &key).unwrap().unwrap();

        let project = report.project.as_ref().unwrap();
        assert_eq!(project.phases.len(), 2);
        assert_eq!(project.phases[0].tasks.len(), 2);
        assert!(project.phases[1].tasks.is_empty());

        assert_eq!(report.worker_status["assigned"].count, 3);
        assert!((report.worker_status["assigned"].percentage - 50.0).abs() < 1e-9);
        assert!((report.worker_status["terminated"].percentage - 100.0 / 6.0).abs() < 1e-9);
        assert!((report.worker_status["unassigned"].percentage - 100.0 / 3.0).abs() < 1e-9);

        assert_eq!(report.monthly_completions[&2024][&1], 6);
        assert_eq!(report.monthly_completions[&2024][&2], 1);

        // (5·1.2 + 3·0.3) / (8·1.2) · 100 = 71.88 (rounded)
        assert_eq!(report.top_workers.len(), 1);
        assert_eq!(report.top_workers[0].overall_score, 71.88);
        assert_eq!(report.top_workers[0].total_tasks, 2);
        assert_eq!(report.top_workers[0].completed_tasks, 1);
    }
}
