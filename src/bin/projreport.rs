use clap::{Parser, Subcommand};

use projreport::{Database, ProjReport, ProjectReport};

#[derive(Parser)]
#[command(name = "projreport", about = "Project reporting warehouse CLI")]
struct Cli {
    /// Database path (default: ~/.projreport/projreport.db)
    #[arg(long)]
    db: Option<String>,

    /// Increase logging verbosity
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load a JSON fixture into the warehouse
    Load {
        /// Path to the fixture file
        file: String,
    },
    /// Generate the analytical report for a project
    Report {
        /// Project id or public token
        #[arg(value_name = "PROJECT_ID_OR_TOKEN")]
        project: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show warehouse status
    Status,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let db = match &cli.db {
        Some(path) => Database::open_at(path).await?,
        None => Database::open().await?,
    };
    let dw = ProjReport::new(db);

    match cli.command {
        Commands::Load { file } => {
            let summary = dw.load_fixture_file(&file).await?;
            println!(
                "Loaded {} projects, {} phases, {} tasks, {} workers",
                summary.projects, summary.phases, summary.tasks, summary.workers
            );
        }
        Commands::Report { project, json } => match dw.generate_report(&project).await? {
            Some(report) => {
                if json {
                    println!("{}", serde_json::to_string_pretty(&report)?);
                } else {
                    print_report(&report);
                }
            }
            None => println!("No report: project '{project}' not found."),
        },
        Commands::Status => {
            print_status(dw.db()).await?;
        }
    }

    Ok(())
}

fn fmt_date(ts: Option<chrono::DateTime<chrono::Utc>>) -> String {
    ts.map(|t| t.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "-".to_string())
}

fn print_report(report: &ProjectReport) {
    match &report.project {
        Some(project) => {
            println!("Project: {} (#{})", project.name, project.id);
            println!("  Token:   {}", project.token.simple());
            println!("  Status:  {}", project.status.as_str());
            println!(
                "  Planned: {} to {}",
                fmt_date(project.schedule.planned_start),
                fmt_date(project.schedule.planned_end)
            );
            if let Some(done) = project.schedule.actual_end {
                println!("  Completed: {}", fmt_date(Some(done)));
            }
            println!("  Phases:");
            if project.phases.is_empty() {
                println!("    (none)");
            }
            for phase in &project.phases {
                println!(
                    "    {} [{}] {} to {}, {} tasks",
                    phase.name,
                    phase.status.as_str(),
                    fmt_date(phase.schedule.planned_start),
                    fmt_date(phase.schedule.planned_end),
                    phase.tasks.len()
                );
                for task in &phase.tasks {
                    println!(
                        "      - {} [{}/{}] due {}",
                        task.name,
                        task.priority.as_str(),
                        task.status.as_str(),
                        fmt_date(task.schedule.planned_end)
                    );
                }
            }
        }
        None => println!("Project details unavailable (worker data only)."),
    }

    println!("Worker status:");
    if report.worker_status.is_empty() {
        println!("  (none)");
    }
    for (status, slice) in &report.worker_status {
        println!(
            "  {:<12} {:>4}  {:>6.2}%",
            status, slice.count, slice.percentage
        );
    }

    println!("Completed tasks per month:");
    if report.monthly_completions.is_empty() {
        println!("  (none)");
    }
    for (year, months) in &report.monthly_completions {
        for (month, count) in months {
            println!("  {year}-{month:02}  {count}");
        }
    }

    println!("Top workers:");
    if report.top_workers.is_empty() {
        println!("  (none)");
    }
    for (rank, worker) in report.top_workers.iter().enumerate() {
        println!(
            "  {:>2}. {} {}  score {:>6.2}  ({}/{} completed)",
            rank + 1,
            worker.first_name,
            worker.last_name,
            worker.overall_score,
            worker.completed_tasks,
            worker.total_tasks
        );
    }
}

async fn print_status(db: &Database) -> anyhow::Result<()> {
    let stats = db
        .reader()
        .call(|conn| {
            let projects: i64 =
                conn.query_row("SELECT COUNT(*) FROM projects", [], |row| row.get(0))?;
            let phases: i64 =
                conn.query_row("SELECT COUNT(*) FROM phases", [], |row| row.get(0))?;
            let tasks: i64 = conn.query_row("SELECT COUNT(*) FROM tasks", [], |row| row.get(0))?;
            let workers: i64 =
                conn.query_row("SELECT COUNT(*) FROM workers", [], |row| row.get(0))?;
            let assignments: i64 =
                conn.query_row("SELECT COUNT(*) FROM task_workers", [], |row| row.get(0))?;
            Ok::<_, rusqlite::Error>((projects, phases, tasks, workers, assignments))
        })
        .await?;

    let (projects, phases, tasks, workers, assignments) = stats;
    println!("Warehouse Status");
    println!("  Projects:    {projects}");
    println!("  Phases:      {phases}");
    println!("  Tasks:       {tasks}");
    println!("  Workers:     {workers}");
    println!("  Assignments: {assignments}");
    Ok(())
}
