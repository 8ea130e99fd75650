use std::sync::{Mutex, PoisonError};

use chrono::{NaiveDate, NaiveTime, Utc};
use clap::{Parser, Subcommand};

use taskdash::config::{self, Overrides};
use taskdash::query::output;
use taskdash::stats::{self, DailyActivity, DashboardStats};
use taskdash::{
    session, BackendClient, Database, DueWindow, NewProject, NewTask, Priority, ProjectFilters,
    ProjectSortKey, ProjectStatus, ProjectUpdate, SignUpOutcome, SortOrder, TaskDash,
    TaskFilters, TaskSortKey, TaskStatus, TaskUpdate,
};

#[derive(Parser)]
#[command(name = "taskdash", about = "Task and project dashboard for a hosted backend")]
struct Cli {
    /// Database path (default: ~/.taskdash/taskdash.db)
    #[arg(long)]
    db: Option<String>,

    /// Backend base URL (overrides TASKDASH_URL and the stored backend_url)
    #[arg(long)]
    url: Option<String>,

    /// Backend anon key (overrides TASKDASH_ANON_KEY and the stored anon_key)
    #[arg(long)]
    anon_key: Option<String>,

    /// Increase logging verbosity
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in, sign up, or inspect the current session
    Auth {
        #[command(subcommand)]
        action: AuthAction,
    },
    /// Show task and project statistics
    Dashboard {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List and edit tasks
    Tasks {
        #[command(subcommand)]
        action: TaskAction,
    },
    /// List and edit projects
    Projects {
        #[command(subcommand)]
        action: ProjectAction,
    },
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
    /// Show backend and session status
    Status,
}

#[derive(Subcommand)]
enum AuthAction {
    /// Sign in with email and password
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    /// Create an account
    Signup {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        /// Full name shown on the account
        #[arg(long)]
        name: Option<String>,
    },
    /// Sign out and forget the stored session
    Logout,
    /// Show the signed-in user
    Whoami,
}

#[derive(Subcommand)]
enum TaskAction {
    /// List tasks with filters
    List {
        #[arg(long)]
        status: Option<TaskStatus>,
        #[arg(long)]
        priority: Option<Priority>,
        /// Filter by project id
        #[arg(long)]
        project: Option<String>,
        /// Case-insensitive match on title or description
        #[arg(long)]
        search: Option<String>,
        /// Due window: overdue, today, this_week, this_month
        #[arg(long)]
        due: Option<DueWindow>,
        /// Sort key: created_at, updated_at, due_date, priority, title
        #[arg(long)]
        sort: Option<TaskSortKey>,
        /// Sort order: asc, desc
        #[arg(long)]
        order: Option<SortOrder>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
        /// Output as CSV
        #[arg(long)]
        csv: bool,
        /// Count only (no output rows)
        #[arg(long)]
        count: bool,
    },
    /// Create a task
    Create {
        #[arg(long)]
        title: String,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        priority: Option<Priority>,
        #[arg(long)]
        status: Option<TaskStatus>,
        /// Due date (YYYY-MM-DD)
        #[arg(long)]
        due: Option<NaiveDate>,
        /// Project id
        #[arg(long)]
        project: Option<String>,
    },
    /// Update fields of a task
    Update {
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        priority: Option<Priority>,
        #[arg(long)]
        status: Option<TaskStatus>,
        /// Due date (YYYY-MM-DD)
        #[arg(long, conflicts_with = "clear_due")]
        due: Option<NaiveDate>,
        /// Remove the due date
        #[arg(long)]
        clear_due: bool,
        /// Project id
        #[arg(long)]
        project: Option<String>,
    },
    /// Move a task to its next status (todo, in progress, completed, todo)
    Advance { id: String },
    /// Delete a task
    Delete { id: String },
}

#[derive(Subcommand)]
enum ProjectAction {
    /// List projects with filters
    List {
        #[arg(long)]
        status: Option<ProjectStatus>,
        /// Case-insensitive match on name or description
        #[arg(long)]
        search: Option<String>,
        /// Sort key: created_at, updated_at, name
        #[arg(long)]
        sort: Option<ProjectSortKey>,
        /// Sort order: asc, desc
        #[arg(long)]
        order: Option<SortOrder>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Create a project
    Create {
        #[arg(long)]
        name: String,
        #[arg(long)]
        description: Option<String>,
        /// Color as #RRGGBB
        #[arg(long)]
        color: Option<String>,
    },
    /// Update fields of a project
    Update {
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        color: Option<String>,
        #[arg(long)]
        status: Option<ProjectStatus>,
    },
    /// Toggle a project between active and completed
    Complete { id: String },
    /// Toggle a project between active and archived
    Archive { id: String },
    /// Delete a project (its tasks are kept)
    Delete { id: String },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Get a config value
    Get { key: String },
    /// Set a config value
    Set { key: String, value: String },
    /// Remove a config value
    Unset { key: String },
    /// List all config values
    List,
}

fn start_of_day(date: NaiveDate) -> chrono::DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
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
    let overrides = Overrides {
        url: cli.url,
        anon_key: cli.anon_key,
    };

    match cli.command {
        Commands::Config { action } => handle_config(&db, action).await?,
        Commands::Status => print_status(&db, &overrides).await?,
        Commands::Auth { action } => handle_auth(&db, &overrides, action).await?,
        Commands::Dashboard { json } => {
            let dash = connect(db, &overrides).await?;
            handle_dashboard(&dash, json).await?;
        }
        Commands::Tasks { action } => {
            let dash = connect(db, &overrides).await?;
            handle_tasks(&dash, action).await?;
        }
        Commands::Projects { action } => {
            let dash = connect(db, &overrides).await?;
            handle_projects(&dash, action).await?;
        }
    }

    Ok(())
}

async fn connect(db: Database, overrides: &Overrides) -> anyhow::Result<TaskDash> {
    let client = BackendClient::new(config::resolve(&db, overrides).await?)?;
    let client = session::authorize(&db, client, Utc::now()).await?;
    if client.access_token().is_none() {
        anyhow::bail!("Not signed in; run `taskdash auth login` first");
    }
    Ok(TaskDash::new(db, client))
}

async fn handle_auth(db: &Database, overrides: &Overrides, action: AuthAction) -> anyhow::Result<()> {
    let client = BackendClient::new(config::resolve(db, overrides).await?)?;
    match action {
        AuthAction::Login { email, password } => {
            let session = client.sign_in(&email, &password).await?;
            session::save(db, &session).await?;
            println!("Signed in as {}", session.user.display_name());
        }
        AuthAction::Signup {
            email,
            password,
            name,
        } => match client.sign_up(&email, &password, name.as_deref()).await? {
            SignUpOutcome::SignedIn(session) => {
                session::save(db, &session).await?;
                println!("Account created. Signed in as {}", session.user.display_name());
            }
            SignUpOutcome::ConfirmationRequired(user) => {
                println!(
                    "Account created for {}. Confirm your email, then run `taskdash auth login`.",
                    user.display_name()
                );
            }
        },
        AuthAction::Logout => {
            match session::authorize(db, client, Utc::now()).await {
                Ok(client) if client.access_token().is_some() => {
                    if let Err(e) = client.sign_out().await {
                        log::warn!("Backend sign-out failed: {e}");
                    }
                }
                Ok(_) => {}
                Err(e) => log::warn!("Skipping backend sign-out: {e}"),
            }
            if session::clear(db).await? {
                println!("Signed out.");
            } else {
                println!("Not signed in.");
            }
        }
        AuthAction::Whoami => {
            let client = session::authorize(db, client, Utc::now()).await?;
            if client.access_token().is_none() {
                println!("Not signed in.");
                return Ok(());
            }
            let user = client.current_user().await?;
            println!("{}", user.display_name());
            if let Some(ref email) = user.email {
                println!("  Email: {email}");
            }
            println!("  Id:    {}", user.id);
        }
    }
    Ok(())
}

async fn print_status(db: &Database, overrides: &Overrides) -> anyhow::Result<()> {
    println!("Status");
    match config::resolve(db, overrides).await {
        Ok(cfg) => println!("  Backend: {}", cfg.url()),
        Err(e) => println!("  Backend: not configured ({e})"),
    }
    match session::load(db).await? {
        Some(s) => {
            let expiry = match s.expires_at {
                Some(t) if s.is_expired(Utc::now()) => format!("expired {}", t.format("%Y-%m-%d %H:%M UTC")),
                Some(t) => format!("until {}", t.format("%Y-%m-%d %H:%M UTC")),
                None => "no expiry".to_string(),
            };
            println!("  Session: {} ({expiry})", s.user.display_name());
        }
        None => println!("  Session: not signed in"),
    }
    let settings = taskdash::config_list(db).await?;
    println!("  Config:  {} values", settings.len());
    Ok(())
}

async fn handle_config(db: &Database, action: ConfigAction) -> anyhow::Result<()> {
    match action {
        ConfigAction::Get { key } => match taskdash::config_get(db, &key).await? {
            Some(v) => println!("{key} = {v}"),
            None => println!("{key} is not set"),
        },
        ConfigAction::Set { key, value } => {
            taskdash::config_set(db, &key, &value).await?;
            println!("Config updated.");
        }
        ConfigAction::Unset { key } => {
            if taskdash::config_unset(db, &key).await? {
                println!("Removed {key}.");
            } else {
                println!("{key} is not set");
            }
        }
        ConfigAction::List => {
            let items = taskdash::config_list(db).await?;
            if items.is_empty() {
                println!("No configuration set.");
            } else {
                for (k, v) in items {
                    println!("{k} = {v}");
                }
            }
        }
    }
    Ok(())
}

async fn handle_dashboard(dash: &TaskDash, json: bool) -> anyhow::Result<()> {
    let state = Mutex::new(taskdash::DashboardState::new());
    if !dash.refresh(&state, Utc::now()).await {
        log::debug!("Dashboard load was superseded");
    }
    let state = state.into_inner().unwrap_or_else(PoisonError::into_inner);

    if json {
        println!("{}", serde_json::to_string_pretty(state.state())?);
        return Ok(());
    }
    match state.state() {
        taskdash::LoadState::Ready(stats) => {
            print_dashboard(stats);
            Ok(())
        }
        taskdash::LoadState::Error(message) => anyhow::bail!("Could not load dashboard: {message}"),
        taskdash::LoadState::Loading => anyhow::bail!("Dashboard load did not complete"),
    }
}

const BAR_WIDTH: u64 = 20;

fn bar(value: u64, max: u64) -> String {
    let filled = if max == 0 { 0 } else { value * BAR_WIDTH / max };
    "█".repeat(filled as usize)
}

const ACTIVITY_DAYS: usize = 14;

/// The days shown in the activity chart and the bar scale, which spans the
/// whole trend.
fn activity_window(trend: &[DailyActivity]) -> (&[DailyActivity], u64) {
    let recent = &trend[trend.len().saturating_sub(ACTIVITY_DAYS)..];
    (recent, stats::trend_peak(trend))
}

fn percent_label(share: f64) -> String {
    format!("{share:.0}%")
}

fn signed(n: i64) -> String {
    format!("{n:+}")
}

fn print_dashboard(stats: &DashboardStats) {
    println!("Dashboard");
    println!("  Tasks:       {}", stats.total_tasks);
    println!("  Completed:   {}", stats.completed_tasks);
    println!("  In progress: {}", stats.in_progress_tasks);
    println!("  Pending:     {}", stats.pending_tasks);
    println!("  Overdue:     {}", stats.overdue_tasks);
    println!("  Completion:  {}%", stats.completion_rate);
    println!(
        "  Projects:    {} ({} active, {} completed)",
        stats.total_projects, stats.active_projects, stats.completed_projects
    );

    let dod = stats::day_over_day(&stats.productivity_trend);
    println!(
        "  Today:       {} created, {} completed vs yesterday",
        signed(dod.created),
        signed(dod.completed)
    );

    let week = stats::weekly_change(&stats.productivity_trend);
    println!(
        "  This week:   {} completed ({} vs previous week)",
        week.last_week,
        week.label()
    );

    println!();
    println!("Activity (last 14 days, created | completed)");
    let (recent, peak) = activity_window(&stats.productivity_trend);
    for day in recent {
        println!(
            "  {}  {:<20} {:>3} | {:<20} {:>3}",
            day.date.format("%m-%d"),
            bar(day.created, peak),
            day.created,
            bar(day.completed, peak),
            day.completed
        );
    }

    println!();
    println!("Open tasks by priority");
    let breakdown = &stats.priority_breakdown;
    for priority in [Priority::High, Priority::Medium, Priority::Low] {
        println!(
            "  {:<7} {:>4}  ({})",
            priority.as_str(),
            breakdown.get(priority),
            percent_label(breakdown.share(priority))
        );
    }

    println!();
    let top = stats::top_active_projects(&stats.project_progress, 5);
    if top.is_empty() {
        println!("No active projects.");
    } else {
        println!("Active projects");
        for p in top {
            println!(
                "  {:<24} {:<20} {:>3}% ({}/{})",
                p.project.name,
                bar(p.completion_percentage as u64, 100),
                p.completion_percentage,
                p.completed_tasks,
                p.task_count
            );
        }
    }
}

async fn handle_tasks(dash: &TaskDash, action: TaskAction) -> anyhow::Result<()> {
    let now = Utc::now();
    match action {
        TaskAction::List {
            status,
            priority,
            project,
            search,
            due,
            sort,
            order,
            json,
            csv,
            count,
        } => {
            let filters = TaskFilters {
                status,
                priority,
                project_id: project,
                search,
                due,
                sort_by: sort,
                sort_order: order,
            };
            let tasks = dash.list_tasks(&filters, now).await?;
            if count {
                println!("{}", tasks.len());
            } else if json {
                println!("{}", output::tasks_to_json(&tasks)?);
            } else if csv {
                print!("{}", output::tasks_to_csv(&tasks, now));
            } else if tasks.is_empty() {
                println!("No tasks found.");
            } else {
                for t in &tasks {
                    let project = t.project.as_ref().map_or("", |p| p.name.as_str());
                    let due = t
                        .due_date
                        .map(|d| d.format("%Y-%m-%d").to_string())
                        .unwrap_or_else(|| "no due date".to_string());
                    let flag = if t.is_overdue(now) { " (overdue)" } else { "" };
                    println!(
                        "[{}] {} ({}) - {} | {project} | due: {due}{flag}",
                        t.status, t.title, t.id, t.priority
                    );
                }
                println!("\n{} tasks", tasks.len());
            }
        }
        TaskAction::Create {
            title,
            description,
            priority,
            status,
            due,
            project,
        } => {
            let mut task = NewTask::new(&title);
            task.description = description.unwrap_or_default();
            task.priority = priority.unwrap_or(Priority::Medium);
            task.status = status.unwrap_or(TaskStatus::Todo);
            task.due_date = due.map(start_of_day);
            task.project_id = project;
            let created = dash.create_task(task, now).await?;
            println!("Created task {} ({})", created.title, created.id);
        }
        TaskAction::Update {
            id,
            title,
            description,
            priority,
            status,
            due,
            clear_due,
            project,
        } => {
            let mut update = match status {
                Some(s) => TaskUpdate::new().status(s, now),
                None => TaskUpdate::new(),
            };
            update.title = title;
            update.description = description;
            update.priority = priority;
            if clear_due {
                update.due_date = Some(None);
            } else if let Some(d) = due {
                update.due_date = Some(Some(start_of_day(d)));
            }
            update.project_id = project.map(Some);
            let updated = dash.update_task(&id, &update).await?;
            println!("Updated task {} ({})", updated.title, updated.id);
        }
        TaskAction::Advance { id } => {
            let task = dash.advance_task(&id, now).await?;
            println!("{} is now {}", task.title, task.status);
        }
        TaskAction::Delete { id } => {
            dash.delete_task(&id).await?;
            println!("Deleted task {id}");
        }
    }
    Ok(())
}

async fn handle_projects(dash: &TaskDash, action: ProjectAction) -> anyhow::Result<()> {
    match action {
        ProjectAction::List {
            status,
            search,
            sort,
            order,
            json,
        } => {
            let filters = ProjectFilters {
                status,
                search,
                sort_by: sort,
                sort_order: order,
            };
            let projects = dash.list_projects(&filters).await?;
            if json {
                println!("{}", output::projects_to_json(&projects)?);
            } else if projects.is_empty() {
                println!("No projects found.");
            } else {
                for p in &projects {
                    println!("[{}] {} ({}) {}", p.status, p.name, p.id, p.color);
                    if let Some(ref d) = p.description {
                        if !d.is_empty() {
                            println!("    {d}");
                        }
                    }
                }
                println!("\n{} projects", projects.len());
            }
        }
        ProjectAction::Create {
            name,
            description,
            color,
        } => {
            let mut project = NewProject::new(&name);
            project.description = description.unwrap_or_default();
            if let Some(c) = color {
                project.color = c;
            }
            let created = dash.create_project(project).await?;
            println!("Created project {} ({})", created.name, created.id);
        }
        ProjectAction::Update {
            id,
            name,
            description,
            color,
            status,
        } => {
            let update = ProjectUpdate {
                name,
                description,
                color,
                status,
            };
            let updated = dash.update_project(&id, &update).await?;
            println!("Updated project {} ({})", updated.name, updated.id);
        }
        ProjectAction::Complete { id } => {
            let p = dash.toggle_project_completed(&id).await?;
            println!("{} is now {}", p.name, p.status);
        }
        ProjectAction::Archive { id } => {
            let p = dash.toggle_project_archived(&id).await?;
            println!("{} is now {}", p.name, p.status);
        }
        ProjectAction::Delete { id } => {
            dash.delete_project(&id).await?;
            println!("Deleted project {id}");
        }
    }
    Ok(())
}
