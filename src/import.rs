//! JSON fixture import: the write path of the warehouse.
//!
//! A fixture file carries projects with their nested phases/tasks, the
//! worker roster, and both kinds of assignment. Everything loads in one
//! write call under a single transaction, so a half-imported file never
//! becomes visible to readers.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::storage::repository::{
    assign_project_worker, assign_task_worker, upsert_phase, upsert_project, upsert_task,
    upsert_worker, PhaseRow, ProjectRow, TaskRow, WorkerRow,
};
use crate::storage::Database;

#[derive(Debug, Default, Deserialize)]
pub struct Fixture {
    #[serde(default)]
    pub workers: Vec<WorkerFixture>,
    #[serde(default)]
    pub projects: Vec<ProjectFixture>,
}

#[derive(Debug, Deserialize)]
pub struct WorkerFixture {
    pub worker_id: i64,
    pub public_token: String,
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ProjectFixture {
    pub project_id: i64,
    pub public_token: String,
    pub name: String,
    #[serde(default = "default_status")]
    pub status: String,
    pub planned_start: Option<String>,
    pub planned_end: Option<String>,
    pub actual_end: Option<String>,
    #[serde(default)]
    pub phases: Vec<PhaseFixture>,
    /// Project-level worker memberships: `{worker_id, status}`.
    #[serde(default)]
    pub workers: Vec<MembershipFixture>,
}

#[derive(Debug, Deserialize)]
pub struct PhaseFixture {
    pub phase_id: i64,
    pub public_token: String,
    pub name: String,
    #[serde(default = "default_status")]
    pub status: String,
    pub planned_start: Option<String>,
    pub planned_end: Option<String>,
    pub actual_end: Option<String>,
    #[serde(default)]
    pub tasks: Vec<TaskFixture>,
}

#[derive(Debug, Deserialize)]
pub struct TaskFixture {
    pub task_id: i64,
    pub public_token: String,
    pub name: String,
    #[serde(default = "default_priority")]
    pub priority: String,
    #[serde(default = "default_status")]
    pub status: String,
    pub planned_start: Option<String>,
    pub planned_end: Option<String>,
    pub actual_end: Option<String>,
    #[serde(default)]
    pub assignees: Vec<i64>,
}

#[derive(Debug, Deserialize)]
pub struct MembershipFixture {
    pub worker_id: i64,
    #[serde(default = "default_membership")]
    pub status: String,
}

fn default_status() -> String {
    "pending".into()
}

fn default_priority() -> String {
    "low".into()
}

fn default_membership() -> String {
    "assigned".into()
}

#[derive(Debug, Default, Clone, Copy, Serialize)]
pub struct ImportSummary {
    pub workers: u64,
    pub projects: u64,
    pub phases: u64,
    pub tasks: u64,
}

/// Read and import a fixture file.
pub async fn load_file(db: &Database, path: impl AsRef<Path>) -> Result<ImportSummary> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path)
        .map_err(|e| Error::Import(format!("{}: {e}", path.display())))?;
    let fixture: Fixture = serde_json::from_str(&text)
        .map_err(|e| Error::Import(format!("{}: {e}", path.display())))?;
    load_fixture(db, fixture).await
}

/// Import a parsed fixture in one transaction.
pub async fn load_fixture(db: &Database, fixture: Fixture) -> Result<ImportSummary> {
    let summary = db
        .writer()
        .call(move |conn| {
            let tx = conn.transaction()?;
            let mut summary = ImportSummary::default();

            for worker in &fixture.workers {
                upsert_worker(
                    &tx,
                    &WorkerRow {
                        worker_id: worker.worker_id,
                        public_token: worker.public_token.clone(),
                        first_name: worker.first_name.clone(),
                        last_name: worker.last_name.clone(),
                        email: worker.email.clone(),
                    },
                )?;
                summary.workers += 1;
            }

            for project in &fixture.projects {
                upsert_project(
                    &tx,
                    &ProjectRow {
                        project_id: project.project_id,
                        public_token: project.public_token.clone(),
                        name: project.name.clone(),
                        status: project.status.clone(),
                        planned_start: project.planned_start.clone(),
                        planned_end: project.planned_end.clone(),
                        actual_end: project.actual_end.clone(),
                    },
                )?;
                summary.projects += 1;

                for phase in &project.phases {
                    upsert_phase(
                        &tx,
                        &PhaseRow {
                            phase_id: phase.phase_id,
                            project_id: project.project_id,
                            public_token: phase.public_token.clone(),
                            name: phase.name.clone(),
                            status: phase.status.clone(),
                            planned_start: phase.planned_start.clone(),
                            planned_end: phase.planned_end.clone(),
                            actual_end: phase.actual_end.clone(),
                        },
                    )?;
                    summary.phases += 1;

                    for task in &phase.tasks {
                        upsert_task(
                            &tx,
                            &TaskRow {
                                task_id: task.task_id,
                                phase_id: phase.phase_id,
                                public_token: task.public_token.clone(),
                                name: task.name.clone(),
                                priority: task.priority.clone(),
                                status: task.status.clone(),
                                planned_start: task.planned_start.clone(),
                                planned_end: task.planned_end.clone(),
                                actual_end: task.actual_end.clone(),
                            },
                        )?;
                        summary.tasks += 1;

                        for worker_id in &task.assignees {
                            assign_task_worker(&tx, task.task_id, *worker_id)?;
                        }
                    }
                }

                for membership in &project.workers {
                    assign_project_worker(
                        &tx,
                        project.project_id,
                        membership.worker_id,
                        &membership.status,
                    )?;
                }
            }

            tx.commit()?;
            Ok::<ImportSummary, rusqlite::Error>(summary)
        })
        .await
        .map_err(|e| Error::Database(e.to_string()))?;

    log::info!(
        "imported {} projects, {} phases, {} tasks, {} workers",
        summary.projects,
        summary.phases,
        summary.tasks,
        summary.workers
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ident::ProjectKey;
    use crate::report::generate_project_report;
    use std::io::Write;

    const FIXTURE: &str = r#"{
        "workers": [
            {"worker_id": 7, "public_token": "00000000000000000000000000000ab7",
             "first_name": "Ada", "last_name": "Stone", "email": "ada@example.com"},
            {"worker_id": 8, "public_token": "00000000000000000000000000000ab8",
             "first_name": "Bo", "last_name": "Reed", "email": null}
        ],
        "projects": [
            {"project_id": 1, "public_token": "00000000000000000000000000000aa1",
             "name": "Harbor Upgrade", "status": "ongoing",
             "planned_start": "2024-01-01T00:00:00Z",
             "planned_end": "2024-06-01T00:00:00Z", "actual_end": null,
             "phases": [
                {"phase_id": 10, "public_token": "00000000000000000000000000000aaa",
                 "name": "Foundations", "status": "ongoing",
                 "planned_start": "2024-01-01T00:00:00Z",
                 "planned_end": "2024-03-01T00:00:00Z", "actual_end": null,
                 "tasks": [
                    {"task_id": 100, "public_token": "00000000000000000000000000000aab",
                     "name": "Pour slab", "priority": "high", "status": "completed",
                     "planned_start": "2024-01-02T00:00:00Z",
                     "planned_end": "2024-01-20T00:00:00Z",
                     "actual_end": "2024-01-18T00:00:00Z",
                     "assignees": [7]}
                 ]}
             ],
             "workers": [
                {"worker_id": 7, "status": "assigned"},
                {"worker_id": 8, "status": "terminated"}
             ]}
        ]
    }"#;

    #[tokio::test]
    async fn test_load_fixture_then_report() {
        let db = Database::open_memory().await.unwrap();
        let fixture: Fixture = serde_json::from_str(FIXTURE).unwrap();
        let summary = load_fixture(&db, fixture).await.unwrap();
        assert_eq!(summary.projects, 1);
        assert_eq!(summary.phases, 1);
        assert_eq!(summary.tasks, 1);
        assert_eq!(summary.workers, 2);

        let report = generate_project_report(&db, &ProjectKey::Internal(1))
            .await
            .unwrap()
            .unwrap();
        let project = report.project.unwrap();
        assert_eq!(project.name, "Harbor Upgrade");
        assert_eq!(project.phases.len(), 1);
        assert_eq!(report.worker_status["assigned"].count, 1);
        assert!((report.worker_status["assigned"].percentage - 50.0).abs() < 1e-9);
        assert_eq!(report.monthly_completions[&2024][&1], 1);
        // One completed-early high task: a perfect score.
        assert_eq!(report.top_workers.len(), 1);
        assert_eq!(report.top_workers[0].overall_score, 100.0);
    }

    #[tokio::test]
    async fn test_load_file() {
        let db = Database::open_memory().await.unwrap();
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(FIXTURE.as_bytes()).unwrap();

        let summary = load_file(&db, file.path()).await.unwrap();
        assert_eq!(summary.tasks, 1);
    }

    #[tokio::test]
    async fn test_load_file_bad_json() {
        let db = Database::open_memory().await.unwrap();
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"{oops").unwrap();

        assert!(matches!(
            load_file(&db, file.path()).await,
            Err(Error::Import(_))
        ));
    }

    #[tokio::test]
    async fn test_load_file_missing() {
        let db = Database::open_memory().await.unwrap();
        assert!(matches!(
            load_file(&db, "/nonexistent/fixture.json").await,
            Err(Error::Import(_))
        ));
    }
}
