pub mod error;
pub mod ident;
pub mod import;
pub mod report;
pub mod storage;

pub use error::{Error, Result};
pub use ident::ProjectKey;
pub use report::{
    LifecycleStatus, PeriodicTaskCount, Phase, Project, ProjectReport, StatusSlice, Task,
    TaskPriority, WorkerScore, WorkerStatusBreakdown,
};
pub use storage::Database;

/// Main entry point for the project reporting warehouse.
pub struct ProjReport {
    db: Database,
}

impl ProjReport {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Access the database (for direct queries in the CLI).
    pub fn db(&self) -> &Database {
        &self.db
    }

    /// Generate the analytical report for one project.
    ///
    /// The identifier is either the internal numeric key or the public hex
    /// token; it is validated before any query runs. `Ok(None)` means the
    /// identifier was well-formed but no project data matched.
    pub async fn generate_report(&self, identifier: &str) -> Result<Option<ProjectReport>> {
        let key = ProjectKey::parse(identifier)?;
        report::generate_project_report(&self.db, &key).await
    }

    /// Import a JSON fixture file into the warehouse.
    pub async fn load_fixture_file(
        &self,
        path: impl AsRef<std::path::Path>,
    ) -> Result<import::ImportSummary> {
        import::load_file(&self.db, path).await
    }
}
