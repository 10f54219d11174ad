use aico_common::{CompanyConfig, short_id};
use aico_core::{
    CommunicationHub, CompanyBuilder, Priority, StandupManager, StandupReport,
    TaskAcceptance, TaskCoordinator, TaskPatternTable, create_execution_plan,
};
use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use clap::{Parser, Subcommand};
use colored::*;
use std::collections::HashSet;
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Command-line arguments for the AICO CLI
#[derive(Parser)]
#[command(name = "aico", about = "AICO - a simulated company of role agents")]
pub struct Args {
    /// Path to the JSON configuration file
    #[clap(short, long, global = true, default_value = "aico.json")]
    config: PathBuf,

    /// Enable debug mode
    #[clap(short, long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Hand a task to the company
    Assign {
        description: String,

        /// low, medium, high or urgent
        #[clap(short, long, default_value = "medium")]
        priority: Priority,

        /// YYYY-MM-DD or RFC 3339
        #[clap(long, value_parser = parse_deadline)]
        deadline: Option<DateTime<Utc>>,

        /// Execute every phase right away
        #[clap(long)]
        run: bool,
    },
    /// Show how a task would be routed and planned
    Analyze { description: String },
    /// List every role in the company
    Roles,
    /// Hold a daily standup
    Standup,
    /// Run three sample tasks end to end
    Demo,
    /// Line-by-line session with the company
    Interactive,
}

fn parse_deadline(input: &str) -> std::result::Result<DateTime<Utc>, String> {
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(input) {
        return Ok(timestamp.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(input, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(23, 59, 59))
        .map(|dt| dt.and_utc())
        .ok_or_else(|| format!("'{}' is not a date (YYYY-MM-DD) or RFC 3339 timestamp", input))
}

/// Staff a full company and wire a coordinator to it
async fn open_company(config: &CompanyConfig) -> Result<TaskCoordinator> {
    let hub = Arc::new(CommunicationHub::new());
    let staffed = CompanyBuilder::staff(&hub).await?;
    info!("{} opened with {} agents", config.company_name, staffed);
    Ok(TaskCoordinator::from_config(hub, config)?)
}

fn print_acceptance(acceptance: &TaskAcceptance) {
    println!(
        "{} {} ({})",
        "✅ Task accepted:".bright_green().bold(),
        acceptance.task_id.bright_blue(),
        acceptance.message
    );
    let roles: Vec<String> = acceptance.agents_assigned.iter().map(|r| r.to_string()).collect();
    println!("{} {}", "Roles:".bright_yellow(), roles.join(", ").bright_magenta());
    println!(
        "{} {}",
        "Estimated completion:".bright_yellow(),
        acceptance.estimated_completion.format("%Y-%m-%d")
    );
    println!("{}", "Phases:".bright_yellow());
    for (i, phase) in acceptance.execution_plan.iter().enumerate() {
        let assignees: Vec<String> = phase.assignees.iter().map(|a| a.to_string()).collect();
        println!(
            "  {}. {} ({}) - {}",
            i + 1,
            phase.name.bright_green(),
            phase.duration,
            assignees.join(", ")
        );
    }
    println!(
        "{} {:?}",
        "Hand-off workflow:".bright_yellow(),
        acceptance.workflow_status
    );
}

async fn print_status(coordinator: &TaskCoordinator, task_id: &str) -> Result<()> {
    let status = coordinator.get_task_status(task_id).await?;
    println!(
        "{} {} [{:?}]",
        "📋".bright_cyan(),
        status.description.bright_white().bold(),
        status.status
    );
    for progress in &status.progress {
        println!(
            "  • {} on {}: {:?} ({} active tasks)",
            progress.agent.bright_green(),
            progress.phase,
            progress.status,
            progress.active_tasks
        );
    }
    Ok(())
}

async fn run_task(coordinator: &TaskCoordinator, task_id: &str) -> Result<()> {
    println!("{}", format!("🚀 Running task {}...", short_id(task_id)).bright_yellow());
    let reports = coordinator.run_task(task_id).await?;
    for report in &reports {
        println!(
            "  {} {} by {} ({:?}, {}h)",
            "✔".bright_green(),
            report.task_title.bright_white(),
            report.assigned_agent.bright_blue(),
            report.category,
            report.actual_hours
        );
    }
    print_status(coordinator, task_id).await
}

fn print_standup(report: &StandupReport) {
    println!(
        "{} {} ({} participants)",
        "🗓  Standup".bright_cyan().bold(),
        report.date,
        report.participants.len()
    );
    for (agent, entry) in &report.summary {
        if entry.today.is_empty() && entry.blockers.is_empty() {
            continue;
        }
        println!("  {} today: {}", agent.bright_green(), entry.today.join("; "));
    }
    if report.blockers.is_empty() {
        println!("  {}", "No blockers".bright_green());
    }
    for item in &report.action_items {
        println!(
            "  {} {} -> {}",
            "⚠".bright_red(),
            item.description,
            item.assigned_to.to_string().bright_magenta()
        );
    }
}

async fn assign(
    config: &CompanyConfig,
    description: &str,
    priority: Priority,
    deadline: Option<DateTime<Utc>>,
    run: bool,
) -> Result<()> {
    let coordinator = open_company(config).await?;
    let acceptance = coordinator
        .process_user_task(description, priority, deadline)
        .await?;
    print_acceptance(&acceptance);
    if run {
        println!();
        run_task(&coordinator, &acceptance.task_id).await?;
    }
    Ok(())
}

fn analyze(config: &CompanyConfig, description: &str) -> Result<()> {
    let table = TaskPatternTable::from_config(&config.routing.rules)?;
    let analysis = table.analyze(description);
    let plan = create_execution_plan(&analysis, Priority::Medium, None);

    println!("{} {}", "Type:".bright_yellow(), analysis.task_type.to_string().bright_green());
    println!("{} {}", "Complexity:".bright_yellow(), analysis.complexity);
    let roles: Vec<String> = analysis.required_roles.iter().map(|r| r.to_string()).collect();
    println!("{} {}", "Roles:".bright_yellow(), roles.join(", ").bright_magenta());
    println!("{} {}", "Keywords:".bright_yellow(), analysis.keywords.join(", "));
    println!("{} {}", "Resources:".bright_yellow(), plan.resource_requirements);
    for (i, phase) in plan.phases.iter().enumerate() {
        println!("  {}. {} ({})", i + 1, phase.name.bright_green(), phase.duration);
    }
    Ok(())
}

fn list_roles() {
    println!("{}", "🏢 Company roles:".bright_cyan().bold());
    println!();
    for (role, name, department) in CompanyBuilder::list_roles() {
        println!(
            "• {} ({}) - {:?}",
            name.bright_green().bold(),
            role.default_agent_id().bright_blue(),
            department
        );
    }
}

async fn standup(config: &CompanyConfig) -> Result<()> {
    let coordinator = open_company(config).await?;
    let report = StandupManager::new(coordinator.hub().clone())
        .conduct_daily_standup()
        .await?;
    print_standup(&report);
    Ok(())
}

async fn demo(config: &CompanyConfig) -> Result<()> {
    let coordinator = open_company(config).await?;
    let samples = [
        ("Develop a mobile app for a coffee shop", Priority::High),
        ("Launch a social media campaign for the new product", Priority::Medium),
        ("Define the five year strategy for expansion", Priority::Urgent),
    ];

    for (description, priority) in samples {
        println!("{}", format!("📨 {}", description).bright_cyan().bold());
        let acceptance = coordinator
            .process_user_task(description, priority, None)
            .await?;
        print_acceptance(&acceptance);
        run_task(&coordinator, &acceptance.task_id).await?;
        println!();
    }

    let report = StandupManager::new(coordinator.hub().clone())
        .conduct_daily_standup()
        .await?;
    print_standup(&report);

    let status = coordinator.hub().company_status().await;
    println!();
    println!(
        "{} {} agents, {} active, {} messages routed",
        "📊".bright_cyan(),
        status.total_agents,
        status.active_agents,
        status.messages_routed
    );
    if let Some(stats) = coordinator.cache_stats().await {
        println!(
            "{} {} entries, hit rate {:.0}%",
            "🗄 ".bright_cyan(),
            stats.size,
            stats.hit_rate * 100.0
        );
    }
    Ok(())
}

/// One line of an interactive session
#[derive(Debug, PartialEq, Eq)]
enum SessionCommand<'a> {
    Quit,
    List,
    Workflows,
    Company,
    Standup,
    Status(&'a str),
    Run(&'a str),
    Assign(&'a str),
}

/// Bare keywords are commands; `status`/`run` only when followed by a known
/// task id. Anything else is a task description, optionally after `task`.
fn parse_session_line<'a>(line: &'a str, is_task: impl Fn(&str) -> bool) -> SessionCommand<'a> {
    match line.to_lowercase().as_str() {
        "quit" | "exit" => return SessionCommand::Quit,
        "list" => return SessionCommand::List,
        "workflows" => return SessionCommand::Workflows,
        "company" => return SessionCommand::Company,
        "standup" => return SessionCommand::Standup,
        _ => {}
    }

    let Some((command, rest)) = line.split_once(char::is_whitespace) else {
        return SessionCommand::Assign(line);
    };
    let rest = rest.trim();
    match command.to_lowercase().as_str() {
        "task" if !rest.is_empty() => SessionCommand::Assign(rest),
        "status" if is_task(rest) => SessionCommand::Status(rest),
        "run" if is_task(rest) => SessionCommand::Run(rest),
        _ => SessionCommand::Assign(line),
    }
}

async fn known_task_ids(coordinator: &TaskCoordinator) -> HashSet<String> {
    let mut ids: HashSet<String> = coordinator
        .list_active_tasks()
        .await
        .into_iter()
        .map(|t| t.task_id)
        .collect();
    ids.extend(coordinator.history().await.into_iter().map(|t| t.id));
    ids
}

async fn print_active_tasks(coordinator: &TaskCoordinator) {
    let active = coordinator.list_active_tasks().await;
    if active.is_empty() {
        println!("{}", "No active tasks".bright_yellow());
    }
    for task in active {
        println!(
            "• {} {} ({} agents)",
            task.task_id.bright_blue(),
            task.description,
            task.agents_count
        );
    }
}

async fn print_workflows(coordinator: &TaskCoordinator) {
    let workflows = coordinator.workflows().list_workflows().await;
    if workflows.is_empty() {
        println!("{}", "No workflows registered".bright_yellow());
    }
    for workflow in workflows {
        println!(
            "• {} {} ({} steps{})",
            workflow.id.bright_blue(),
            workflow.name,
            workflow.steps.len(),
            if workflow.is_active { "" } else { ", inactive" }
        );
    }
}

async fn print_company(coordinator: &TaskCoordinator) {
    let status = coordinator.hub().company_status().await;
    println!(
        "{} {} agents, {} active, {} pending messages, {} routed",
        "📊".bright_cyan(),
        status.total_agents,
        status.active_agents,
        status.pending_messages,
        status.messages_routed
    );
    for agent in status.agents.iter().filter(|a| a.active_tasks + a.completed_tasks > 0) {
        println!(
            "  • {} {} active, {} completed",
            agent.name.bright_green(),
            agent.active_tasks,
            agent.completed_tasks
        );
    }
}

async fn interactive(config: &CompanyConfig) -> Result<()> {
    let coordinator = open_company(config).await?;
    let standups = StandupManager::new(coordinator.hub().clone());

    println!(
        "{}",
        "💬 Describe a task to assign it. Commands: task <description>, status <id>, run <id>, \
         list, workflows, company, standup, quit"
            .bright_green()
    );
    println!();

    loop {
        print!("{}", "aico> ".bright_cyan().bold());
        io::stdout().flush()?;

        let mut input = String::new();
        if io::stdin().read_line(&mut input)? == 0 {
            break;
        }
        let input = input.trim();
        if input.is_empty() {
            continue;
        }

        let known = known_task_ids(&coordinator).await;
        let outcome = match parse_session_line(input, |id| known.contains(id)) {
            SessionCommand::Quit => {
                println!("{}", "👋 Goodbye!".bright_green());
                break;
            }
            SessionCommand::List => {
                print_active_tasks(&coordinator).await;
                Ok(())
            }
            SessionCommand::Workflows => {
                print_workflows(&coordinator).await;
                Ok(())
            }
            SessionCommand::Company => {
                print_company(&coordinator).await;
                Ok(())
            }
            SessionCommand::Standup => standups
                .conduct_daily_standup()
                .await
                .map(|report| print_standup(&report))
                .map_err(Into::into),
            SessionCommand::Status(task_id) => print_status(&coordinator, task_id).await,
            SessionCommand::Run(task_id) => run_task(&coordinator, task_id).await,
            SessionCommand::Assign(description) => coordinator
                .process_user_task(description, Priority::Medium, None)
                .await
                .map(|acceptance| print_acceptance(&acceptance))
                .map_err(Into::into),
        };

        if let Err(e) = outcome {
            error!("Command failed: {}", e);
            println!("{}", format!("❌ {}", e).red());
        }
        println!();
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = CompanyConfig::load(&args.config)
        .with_context(|| format!("loading {}", args.config.display()))?;

    let level = if args.debug {
        "debug".to_string()
    } else {
        config.log_level.to_lowercase()
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let subscriber = FmtSubscriber::builder().with_env_filter(filter).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    config.ensure_valid()?;

    match args.command {
        Command::Assign {
            description,
            priority,
            deadline,
            run,
        } => assign(&config, &description, priority, deadline, run).await,
        Command::Analyze { description } => analyze(&config, &description),
        Command::Roles => {
            list_roles();
            Ok(())
        }
        Command::Standup => standup(&config).await,
        Command::Demo => demo(&config).await,
        Command::Interactive => interactive(&config).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aico_core::AgentRole;
    use chrono::{Datelike, Timelike};

    #[test]
    fn test_parse_deadline() {
        let day = parse_deadline("2030-01-15").unwrap();
        assert_eq!((day.year(), day.month(), day.day()), (2030, 1, 15));
        assert_eq!(day.hour(), 23);

        let exact = parse_deadline("2030-01-15T08:00:00+02:00").unwrap();
        assert_eq!(exact.hour(), 6);

        assert!(parse_deadline("next tuesday").is_err());
    }

    #[test]
    fn test_args_parse() {
        let args = Args::try_parse_from([
            "aico", "assign", "Build a site", "--priority", "high", "--run",
        ])
        .unwrap();
        match args.command {
            Command::Assign { priority, run, .. } => {
                assert_eq!(priority, Priority::High);
                assert!(run);
            }
            _ => panic!("expected assign"),
        }
        assert!(Args::try_parse_from(["aico", "assign", "x", "--priority", "critical"]).is_err());
    }

    #[test]
    fn test_roles_cover_leadership() {
        let roles: Vec<AgentRole> = CompanyBuilder::list_roles().into_iter().map(|r| r.0).collect();
        assert!(AgentRole::leadership().iter().all(|r| roles.contains(r)));
    }

    #[test]
    fn test_session_keywords() {
        let none = |_: &str| false;
        assert_eq!(parse_session_line("quit", none), SessionCommand::Quit);
        assert_eq!(parse_session_line("LIST", none), SessionCommand::List);
        assert_eq!(parse_session_line("workflows", none), SessionCommand::Workflows);
        assert_eq!(parse_session_line("company", none), SessionCommand::Company);
        assert_eq!(parse_session_line("standup", none), SessionCommand::Standup);
        assert_eq!(
            parse_session_line("task Run the numbers", none),
            SessionCommand::Assign("Run the numbers")
        );
    }

    #[test]
    fn test_descriptions_starting_with_command_words_are_assigned() {
        let known = |id: &str| id == "abc-123";
        assert_eq!(
            parse_session_line("Run a social media campaign", known),
            SessionCommand::Assign("Run a social media campaign")
        );
        assert_eq!(
            parse_session_line("List vendors for the audit", known),
            SessionCommand::Assign("List vendors for the audit")
        );
        assert_eq!(
            parse_session_line("Status report for investors", known),
            SessionCommand::Assign("Status report for investors")
        );
        assert_eq!(parse_session_line("run abc-123", known), SessionCommand::Run("abc-123"));
        assert_eq!(
            parse_session_line("status  abc-123", known),
            SessionCommand::Status("abc-123")
        );
    }
}
