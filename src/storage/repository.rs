use rusqlite::{params, Connection, OptionalExtension};

use crate::error::Result;
use crate::ident::ProjectKey;
use crate::report::decode::ProjectTreeRow;
use crate::report::score::WorkerTaskRow;
use crate::report::status::StatusCounts;
use crate::report::throughput::MonthlyCountRow;
use crate::report::ReportQueries;

// ── Write-side records ─────────────────────────────────────────────

/// Timestamps in these records are RFC 3339 text, stored verbatim.
#[derive(Debug, Clone)]
pub struct ProjectRow {
    pub project_id: i64,
    pub public_token: String,
    pub name: String,
    pub status: String,
    pub planned_start: Option<String>,
    pub planned_end: Option<String>,
    pub actual_end: Option<String>,
}

#[derive(Debug, Clone)]
pub struct PhaseRow {
    pub phase_id: i64,
    pub project_id: i64,
    pub public_token: String,
    pub name: String,
    pub status: String,
    pub planned_start: Option<String>,
    pub planned_end: Option<String>,
    pub actual_end: Option<String>,
}

#[derive(Debug, Clone)]
pub struct TaskRow {
    pub task_id: i64,
    pub phase_id: i64,
    pub public_token: String,
    pub name: String,
    pub priority: String,
    pub status: String,
    pub planned_start: Option<String>,
    pub planned_end: Option<String>,
    pub actual_end: Option<String>,
}

#[derive(Debug, Clone)]
pub struct WorkerRow {
    pub worker_id: i64,
    pub public_token: String,
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
}

// ── Upserts ────────────────────────────────────────────────────────

pub fn upsert_project(conn: &Connection, p: &ProjectRow) -> std::result::Result<(), rusqlite::Error> {
    conn.execute(
        "INSERT INTO projects (
            project_id, public_token, name, status,
            planned_start, planned_end, actual_end, cached_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, datetime('now'))
        ON CONFLICT(project_id) DO UPDATE SET
            public_token=excluded.public_token, name=excluded.name,
            status=excluded.status, planned_start=excluded.planned_start,
            planned_end=excluded.planned_end, actual_end=excluded.actual_end,
            cached_at=excluded.cached_at",
        params![
            p.project_id,
            p.public_token,
            p.name,
            p.status,
            p.planned_start,
            p.planned_end,
            p.actual_end,
        ],
    )?;
    Ok(())
}

pub fn upsert_phase(conn: &Connection, ph: &PhaseRow) -> std::result::Result<(), rusqlite::Error> {
    conn.execute(
        "INSERT INTO phases (
            phase_id, project_id, public_token, name, status,
            planned_start, planned_end, actual_end, cached_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, datetime('now'))
        ON CONFLICT(phase_id) DO UPDATE SET
            project_id=excluded.project_id, public_token=excluded.public_token,
            name=excluded.name, status=excluded.status,
            planned_start=excluded.planned_start, planned_end=excluded.planned_end,
            actual_end=excluded.actual_end, cached_at=excluded.cached_at",
        params![
            ph.phase_id,
            ph.project_id,
            ph.public_token,
            ph.name,
            ph.status,
            ph.planned_start,
            ph.planned_end,
            ph.actual_end,
        ],
    )?;
    Ok(())
}

pub fn upsert_task(conn: &Connection, t: &TaskRow) -> std::result::Result<(), rusqlite::Error> {
    conn.execute(
        "INSERT INTO tasks (
            task_id, phase_id, public_token, name, priority, status,
            planned_start, planned_end, actual_end, cached_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, datetime('now'))
        ON CONFLICT(task_id) DO UPDATE SET
            phase_id=excluded.phase_id, public_token=excluded.public_token,
            name=excluded.name, priority=excluded.priority,
            status=excluded.status, planned_start=excluded.planned_start,
            planned_end=excluded.planned_end, actual_end=excluded.actual_end,
            cached_at=excluded.cached_at",
        params![
            t.task_id,
            t.phase_id,
            t.public_token,
            t.name,
            t.priority,
            t.status,
            t.planned_start,
            t.planned_end,
            t.actual_end,
        ],
    )?;
    Ok(())
}

pub fn upsert_worker(conn: &Connection, w: &WorkerRow) -> std::result::Result<(), rusqlite::Error> {
    conn.execute(
        "INSERT INTO workers (worker_id, public_token, first_name, last_name, email, cached_at)
         VALUES (?1, ?2, ?3, ?4, ?5, datetime('now'))
         ON CONFLICT(worker_id) DO UPDATE SET
            public_token=excluded.public_token, first_name=excluded.first_name,
            last_name=excluded.last_name,
            email=COALESCE(excluded.email, workers.email),
            cached_at=excluded.cached_at",
        params![w.worker_id, w.public_token, w.first_name, w.last_name, w.email],
    )?;
    Ok(())
}

pub fn assign_task_worker(
    conn: &Connection,
    task_id: i64,
    worker_id: i64,
) -> std::result::Result<(), rusqlite::Error> {
    conn.execute(
        "INSERT OR IGNORE INTO task_workers (task_id, worker_id) VALUES (?1, ?2)",
        params![task_id, worker_id],
    )?;
    Ok(())
}

pub fn assign_project_worker(
    conn: &Connection,
    project_id: i64,
    worker_id: i64,
    status: &str,
) -> std::result::Result<(), rusqlite::Error> {
    conn.execute(
        "INSERT INTO project_workers (project_id, worker_id, status)
         VALUES (?1, ?2, ?3)
         ON CONFLICT(project_id, worker_id) DO UPDATE SET status=excluded.status",
        params![project_id, worker_id, status],
    )?;
    Ok(())
}

// ── Report fetches ─────────────────────────────────────────────────

/// SQLite implementation of the four report fetches. Each query carries its
/// own key predicate; nothing here resolves the key to one identifier form.
pub struct SqliteQueries<'a> {
    conn: &'a Connection,
}

impl<'a> SqliteQueries<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }
}

impl ReportQueries for SqliteQueries<'_> {
    /// One row per project with the phase/task collections serialized as
    /// JSON text, ordered by planned start at each level. The denormalized
    /// shape avoids N+1 fetches for deep trees.
    fn project_tree(&self, key: &ProjectKey) -> Result<Option<ProjectTreeRow>> {
        let (predicate, value) = key.predicate();
        let sql = format!(
            "SELECT p.project_id, p.public_token, p.name, p.status,
                    p.planned_start, p.planned_end, p.actual_end,
                    (SELECT json_group_array(json_object(
                         'phase_id', ph.phase_id,
                         'public_token', ph.public_token,
                         'name', ph.name,
                         'status', ph.status,
                         'planned_start', ph.planned_start,
                         'planned_end', ph.planned_end,
                         'actual_end', ph.actual_end,
                         'tasks', json((
                             SELECT json_group_array(json_object(
                                 'task_id', t.task_id,
                                 'public_token', t.public_token,
                                 'name', t.name,
                                 'priority', t.priority,
                                 'status', t.status,
                                 'planned_start', t.planned_start,
                                 'planned_end', t.planned_end,
                                 'actual_end', t.actual_end,
                                 'assignee_ids', (SELECT group_concat(tw.worker_id)
                                                  FROM task_workers tw
                                                  WHERE tw.task_id = t.task_id)
                             ) ORDER BY t.planned_start)
                             FROM tasks t WHERE t.phase_id = ph.phase_id
                         ))
                     ) ORDER BY ph.planned_start)
                     FROM phases ph WHERE ph.project_id = p.project_id) AS phases
             FROM projects p
             WHERE {predicate}"
        );

        let row = self
            .conn
            .query_row(&sql, [value], |row| {
                Ok(ProjectTreeRow {
                    project_id: row.get(0)?,
                    public_token: row.get(1)?,
                    name: row.get(2)?,
                    status: row.get(3)?,
                    planned_start: row.get(4)?,
                    planned_end: row.get(5)?,
                    actual_end: row.get(6)?,
                    phases: row.get(7)?,
                })
            })
            .optional()?;
        Ok(row)
    }

    fn worker_status_counts(&self, key: &ProjectKey) -> Result<StatusCounts> {
        let (predicate, value) = key.predicate();

        let total_sql = format!(
            "SELECT COUNT(*) FROM project_workers pw
             JOIN projects p ON p.project_id = pw.project_id
             WHERE {predicate}"
        );
        let total: i64 = self
            .conn
            .query_row(&total_sql, [value.clone()], |row| row.get(0))?;

        let by_status_sql = format!(
            "SELECT pw.status, COUNT(*) FROM project_workers pw
             JOIN projects p ON p.project_id = pw.project_id
             WHERE {predicate}
             GROUP BY pw.status
             ORDER BY pw.status"
        );
        let mut stmt = self.conn.prepare(&by_status_sql)?;
        let rows = stmt.query_map([value], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)? as u64))
        })?;

        let mut by_status = Vec::new();
        for row in rows {
            by_status.push(row?);
        }

        Ok(StatusCounts {
            total: total as u64,
            by_status,
        })
    }

    /// Completed tasks bucketed by completion month. Grouped by phase as
    /// well, so one (year, month) can span several rows; the aggregator
    /// merges them additively.
    fn monthly_task_counts(&self, key: &ProjectKey) -> Result<Vec<MonthlyCountRow>> {
        let (predicate, value) = key.predicate();
        let sql = format!(
            "SELECT CAST(strftime('%Y', t.actual_end) AS INTEGER),
                    CAST(strftime('%m', t.actual_end) AS INTEGER),
                    COUNT(*)
             FROM tasks t
             JOIN phases ph ON ph.phase_id = t.phase_id
             JOIN projects p ON p.project_id = ph.project_id
             WHERE {predicate}
               AND t.status = 'completed'
               AND t.actual_end IS NOT NULL
             GROUP BY ph.phase_id, strftime('%Y-%m', t.actual_end)
             ORDER BY 1, 2"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([value], |row| {
            Ok(MonthlyCountRow {
                year: row.get(0)?,
                month: row.get::<_, i64>(1)? as u32,
                count: row.get::<_, i64>(2)? as u64,
            })
        })?;

        let mut counts = Vec::new();
        for row in rows {
            counts.push(row?);
        }
        Ok(counts)
    }

    /// Raw per-assignment rows for the scorer, one per (task, worker), in
    /// assignment insertion order so the ranking's tie-break is stable.
    fn worker_task_stats(&self, key: &ProjectKey) -> Result<Vec<WorkerTaskRow>> {
        let (predicate, value) = key.predicate();
        let sql = format!(
            "SELECT w.worker_id, w.first_name, w.last_name, w.email,
                    t.priority, t.status, t.planned_end, t.actual_end
             FROM task_workers tw
             JOIN workers w ON w.worker_id = tw.worker_id
             JOIN tasks t ON t.task_id = tw.task_id
             JOIN phases ph ON ph.phase_id = t.phase_id
             JOIN projects p ON p.project_id = ph.project_id
             WHERE {predicate}
             ORDER BY tw.rowid"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([value], |row| {
            Ok(WorkerTaskRow {
                worker_id: row.get(0)?,
                first_name: row.get(1)?,
                last_name: row.get(2)?,
                email: row.get(3)?,
                priority: row.get(4)?,
                status: row.get(5)?,
                planned_end: row.get(6)?,
                actual_end: row.get(7)?,
            })
        })?;

        let mut stats = Vec::new();
        for row in rows {
            stats.push(row?);
        }
        Ok(stats)
    }
}
