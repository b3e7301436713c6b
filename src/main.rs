mod commands;

use anyhow::{bail, Context, Result};
use chrono::{NaiveDate, Utc};
use clap::{Args, Parser, Subcommand};
use std::env;
use std::io;
use std::path::PathBuf;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use rfcdesk::command::{NewRfc, PicAssignment, Review, RfcPatch};
use rfcdesk::config::Config;
use rfcdesk::db::Database;
use rfcdesk::engine::Engine;
use rfcdesk::models::{Actor, Level, Priority, Role};
use rfcdesk::view::{SortKey, StatusFilter};

use commands::init::{DB_FILE, WORKSPACE_DIR};
use commands::Desk;

#[derive(Parser)]
#[command(name = "rfcdesk")]
#[command(about = "Track requests for change from submission to completion")]
#[command(version)]
struct Cli {
    /// Name of the person acting
    #[arg(long, global = true, env = "RFCDESK_ACTOR")]
    actor: Option<String>,

    /// Role of the person acting (client, kapokja, pic, developer, director)
    #[arg(long, global = true, env = "RFCDESK_ROLE")]
    role: Option<Role>,

    /// Write logs to stderr as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct FormArgs {
    /// RFC title
    title: String,
    /// What should change
    #[arg(short, long, default_value = "")]
    description: String,
    /// Category, e.g. fitur_baru, perbaikan_bug, integrasi, security
    #[arg(short, long, default_value = "")]
    category: String,
    #[arg(long, default_value = "")]
    department: String,
    #[arg(long, default_value = "")]
    application: String,
    /// Why the change is needed
    #[arg(short, long, default_value = "")]
    reason: String,
    /// Impact level (low, medium, high)
    #[arg(long)]
    impact: Option<Level>,
    #[arg(long, default_value = "")]
    impact_description: String,
    /// Priority (high, medium, low)
    #[arg(short, long, default_value = "medium")]
    priority: Priority,
    /// Attachment name (repeatable)
    #[arg(long = "attach")]
    attachments: Vec<String>,
    /// Stakeholder (repeatable)
    #[arg(long = "stakeholder")]
    stakeholders: Vec<String>,
}

impl From<FormArgs> for NewRfc {
    fn from(args: FormArgs) -> Self {
        NewRfc {
            title: args.title,
            description: args.description,
            category: args.category,
            department: args.department,
            application: args.application,
            reason: args.reason,
            impact_level: args.impact,
            impact_description: args.impact_description,
            priority: args.priority,
            attachments: args.attachments,
            stakeholders: args.stakeholders,
        }
    }
}

#[derive(Args)]
struct PatchArgs {
    #[arg(short, long)]
    title: Option<String>,
    #[arg(short, long)]
    description: Option<String>,
    #[arg(short, long)]
    category: Option<String>,
    #[arg(long)]
    department: Option<String>,
    #[arg(long)]
    application: Option<String>,
    #[arg(short, long)]
    reason: Option<String>,
    #[arg(long)]
    impact: Option<Level>,
    #[arg(long)]
    impact_description: Option<String>,
    #[arg(short, long)]
    priority: Option<Priority>,
    /// Attachment to add (repeatable)
    #[arg(long = "attach")]
    attachments: Vec<String>,
    /// Stakeholder to add (repeatable)
    #[arg(long = "stakeholder")]
    stakeholders: Vec<String>,
}

impl From<PatchArgs> for RfcPatch {
    fn from(args: PatchArgs) -> Self {
        RfcPatch {
            title: args.title,
            description: args.description,
            category: args.category,
            department: args.department,
            application: args.application,
            reason: args.reason,
            impact_level: args.impact,
            impact_description: args.impact_description,
            priority: args.priority,
            attachments: args.attachments,
            stakeholders: args.stakeholders,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize rfcdesk in the current directory
    Init {
        /// Reset config.json to the defaults
        #[arg(short, long)]
        force: bool,
    },

    /// Create an RFC and submit it for review
    Submit(FormArgs),

    /// Create an RFC as a draft
    Draft(FormArgs),

    /// Submit a saved draft
    Send {
        /// RFC ID
        id: String,
    },

    /// Edit an RFC that is still in review
    Update {
        /// RFC ID
        id: String,
        #[command(flatten)]
        patch: PatchArgs,
    },

    /// Approve a submitted RFC
    Approve {
        /// RFC ID
        id: String,
        /// Technical complexity (low, medium, high)
        #[arg(long)]
        complexity: Option<Level>,
        /// Risk level (low, medium, high)
        #[arg(long)]
        risk: Option<Level>,
        #[arg(short, long)]
        notes: Option<String>,
    },

    /// Reject a submitted RFC
    Reject {
        /// RFC ID
        id: String,
        /// Why it was rejected
        reason: String,
    },

    /// Send a submitted RFC back to its requestor for changes
    RequestChanges {
        /// RFC ID
        id: String,
        /// What needs to change
        reason: String,
    },

    /// Resubmit an RFC after requested changes
    Resubmit {
        /// RFC ID
        id: String,
        #[command(flatten)]
        patch: PatchArgs,
    },

    /// Assign an approved RFC to a PIC
    Assign {
        /// RFC ID
        id: String,
        /// PIC name
        pic: String,
        /// Override the priority
        #[arg(short, long)]
        priority: Option<Priority>,
        /// Target timeline, e.g. "2 weeks"
        #[arg(long)]
        timeline: Option<String>,
        #[arg(short, long)]
        notes: Option<String>,
    },

    /// Plan a sprint and start implementation
    Sprint {
        /// RFC ID
        id: String,
        #[arg(long)]
        name: String,
        #[arg(long)]
        goal: String,
        /// Start date (YYYY-MM-DD), defaults to today
        #[arg(long)]
        start: Option<NaiveDate>,
        #[arg(long, default_value = "2 weeks")]
        duration: String,
        /// Team members, comma separated
        #[arg(long, value_delimiter = ',')]
        team: Vec<String>,
        /// Task as description:estimate[:priority[:assignee]] (repeatable)
        #[arg(long = "task")]
        tasks: Vec<String>,
    },

    /// Complete the next open timeline step
    Progress {
        /// RFC ID
        id: String,
        #[arg(short, long)]
        notes: Option<String>,
    },

    /// Digitally sign (TTE) an RFC
    Sign {
        /// RFC ID
        id: String,
        /// Passkey; prompted for when omitted
        #[arg(long, env = "RFCDESK_PASSKEY", hide_env_values = true)]
        passkey: Option<String>,
    },

    /// Add a comment to an RFC
    Comment {
        /// RFC ID
        id: String,
        /// Comment text
        message: String,
    },

    /// Show RFC details
    Show {
        /// RFC ID
        id: String,
    },

    /// List RFCs
    List {
        /// Filter (all, pending, completed, not-started, needs-signature)
        #[arg(short, long, default_value = "all")]
        status: StatusFilter,
        /// Filter by priority
        #[arg(short, long)]
        priority: Option<Priority>,
        /// Sort by (date, priority, status)
        #[arg(long, default_value = "date")]
        sort: SortKey,
    },

    /// Show dashboard counters
    Stats,

    /// Export all RFCs
    Export {
        /// Output format (json, markdown)
        #[arg(short, long, default_value = "json")]
        format: String,
        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<String>,
    },
}

fn find_rfcdesk_dir() -> Result<PathBuf> {
    let mut current = env::current_dir()?;

    loop {
        let candidate = current.join(WORKSPACE_DIR);
        if candidate.exists() && candidate.is_dir() {
            return Ok(candidate);
        }

        if !current.pop() {
            bail!("Not an rfcdesk workspace (or any parent). Run 'rfcdesk init' first.");
        }
    }
}

fn open_desk() -> Result<(Desk, Config)> {
    let dir = find_rfcdesk_dir()?;
    let config = Config::load(&dir)?;
    let db = Database::open(&dir.join(DB_FILE)).context("Failed to open database")?;
    Ok((Engine::new(db).with_policy(config.policy()), config))
}

fn acting(name: Option<&str>, role: Option<Role>) -> Result<Actor> {
    let Some(role) = role else {
        bail!("This command needs a role. Pass --role or set RFCDESK_ROLE");
    };
    let name = match name {
        Some(n) if !n.trim().is_empty() => n.trim().to_string(),
        _ => role.to_string(),
    };
    Ok(Actor::new(name, role))
}

fn init_logging(json: bool) {
    let filter = EnvFilter::try_from_env("RFCDESK_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(fmt::layer().json().with_writer(io::stderr))
            .init();
    } else {
        registry
            .with(fmt::layer().with_target(false).with_writer(io::stderr))
            .init();
    }
}

fn main() -> Result<()> {
    let Cli {
        actor,
        role,
        log_json,
        command,
    } = Cli::parse();
    init_logging(log_json);
    let who = || acting(actor.as_deref(), role);

    match command {
        Commands::Init { force } => {
            let cwd = env::current_dir()?;
            commands::init::run(&cwd, force)
        }

        Commands::Submit(form) => {
            let (mut desk, _) = open_desk()?;
            commands::submit::run(&mut desk, &who()?, form.into()).map(|_| ())
        }

        Commands::Draft(form) => {
            let (mut desk, _) = open_desk()?;
            commands::submit::run_draft(&mut desk, &who()?, form.into()).map(|_| ())
        }

        Commands::Send { id } => {
            let (mut desk, _) = open_desk()?;
            commands::submit::run_send(&mut desk, &id, &who()?)
        }

        Commands::Update { id, patch } => {
            let (mut desk, _) = open_desk()?;
            commands::update::run(&mut desk, &id, &who()?, patch.into())
        }

        Commands::Approve {
            id,
            complexity,
            risk,
            notes,
        } => {
            let (mut desk, _) = open_desk()?;
            let review = Review {
                technical_complexity: complexity,
                risk_level: risk,
                notes,
            };
            commands::review::run_approve(&mut desk, &id, &who()?, review)
        }

        Commands::Reject { id, reason } => {
            let (mut desk, _) = open_desk()?;
            commands::review::run_reject(&mut desk, &id, &who()?, &reason)
        }

        Commands::RequestChanges { id, reason } => {
            let (mut desk, _) = open_desk()?;
            commands::review::run_request_changes(&mut desk, &id, &who()?, &reason)
        }

        Commands::Resubmit { id, patch } => {
            let (mut desk, _) = open_desk()?;
            commands::review::run_resubmit(&mut desk, &id, &who()?, patch.into())
        }

        Commands::Assign {
            id,
            pic,
            priority,
            timeline,
            notes,
        } => {
            let (mut desk, _) = open_desk()?;
            let assignment = PicAssignment {
                pic,
                priority,
                target_timeline: timeline,
                notes,
            };
            commands::assign::run(&mut desk, &id, &who()?, assignment)
        }

        Commands::Sprint {
            id,
            name,
            goal,
            start,
            duration,
            team,
            tasks,
        } => {
            let (mut desk, _) = open_desk()?;
            let today = desk.policy().local_date(Utc::now());
            let args = commands::sprint::SprintArgs {
                name: &name,
                goal: &goal,
                start: start.unwrap_or(today),
                duration: &duration,
                team: &team,
                tasks: &tasks,
            };
            commands::sprint::run(&mut desk, &id, &who()?, args)
        }

        Commands::Progress { id, notes } => {
            let (mut desk, _) = open_desk()?;
            commands::progress::run(&mut desk, &id, &who()?, notes.as_deref())
        }

        Commands::Sign { id, passkey } => {
            let (mut desk, config) = open_desk()?;
            let actor = who()?;
            let passkey = match passkey {
                Some(p) => p,
                None => commands::sign::read_passkey()?,
            };

            let interrupted = Arc::new(AtomicBool::new(false));
            signal_hook::flag::register(signal_hook::consts::SIGINT, Arc::clone(&interrupted))?;
            signal_hook::flag::register(signal_hook::consts::SIGTERM, Arc::clone(&interrupted))?;

            let delays = commands::sign::Delays {
                verification: config.verification_delay(),
                confirmation: config.confirmation_delay(),
            };
            commands::sign::run(&mut desk, &id, &actor, &passkey, &delays, &interrupted)
        }

        Commands::Comment { id, message } => {
            let (mut desk, _) = open_desk()?;
            commands::comment::run(&mut desk, &id, &who()?, &message)
        }

        Commands::Show { id } => {
            let (desk, _) = open_desk()?;
            commands::show::run(&desk, &id)
        }

        Commands::List {
            status,
            priority,
            sort,
        } => {
            let (desk, _) = open_desk()?;
            commands::list::run(&desk, status, priority, sort)
        }

        Commands::Stats => {
            let (desk, _) = open_desk()?;
            commands::stats::run(&desk)
        }

        Commands::Export { format, output } => {
            let (desk, _) = open_desk()?;
            match format.as_str() {
                "json" => commands::export::run_json(&desk, output.as_deref()),
                "markdown" | "md" => commands::export::run_markdown(&desk, output.as_deref()),
                _ => bail!("Unknown format '{}'. Use 'json' or 'markdown'", format),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_acting_defaults_name_to_role() {
        let actor = acting(None, Some(Role::Kapokja)).unwrap();
        assert_eq!(actor.name, "Kapokja");
        let actor = acting(Some("  Ika "), Some(Role::Kapokja)).unwrap();
        assert_eq!(actor.name, "Ika");
    }

    #[test]
    fn test_acting_requires_role() {
        let err = acting(Some("Ika"), None).unwrap_err();
        assert!(err.to_string().contains("--role"));
    }

    #[test]
    fn test_parse_submit() {
        let cli = Cli::try_parse_from([
            "rfcdesk",
            "--role",
            "client",
            "submit",
            "Export to Excel",
            "-c",
            "fitur_baru",
            "--impact",
            "tinggi",
            "-p",
            "High - Business Critical",
            "--attach",
            "a.pdf",
            "--attach",
            "b.png",
        ])
        .unwrap();
        assert_eq!(cli.role, Some(Role::Client));
        match cli.command {
            Commands::Submit(form) => {
                let form: NewRfc = form.into();
                assert_eq!(form.title, "Export to Excel");
                assert_eq!(form.impact_level, Some(Level::High));
                assert_eq!(form.priority, Priority::High);
                assert_eq!(form.attachments, vec!["a.pdf", "b.png"]);
            }
            _ => panic!("expected submit"),
        }
    }

    #[test]
    fn test_parse_sprint_team_list() {
        let cli = Cli::try_parse_from([
            "rfcdesk",
            "sprint",
            "RFC-2025-001",
            "--name",
            "Sprint 1",
            "--goal",
            "Ship",
            "--team",
            "Rina,Andika",
            "--task",
            "Endpoint:3d",
            "--start",
            "2025-03-10",
        ])
        .unwrap();
        match cli.command {
            Commands::Sprint {
                team, tasks, start, ..
            } => {
                assert_eq!(team, vec!["Rina", "Andika"]);
                assert_eq!(tasks.len(), 1);
                assert_eq!(start, NaiveDate::from_ymd_opt(2025, 3, 10));
            }
            _ => panic!("expected sprint"),
        }
    }

    #[test]
    fn test_parse_list_filters() {
        let cli = Cli::try_parse_from([
            "rfcdesk",
            "list",
            "--status",
            "needs-signature",
            "--sort",
            "priority",
        ])
        .unwrap();
        match cli.command {
            Commands::List { status, sort, .. } => {
                assert_eq!(status, StatusFilter::NeedsSignature);
                assert_eq!(sort, SortKey::Priority);
            }
            _ => panic!("expected list"),
        }
    }

    #[test]
    fn test_parse_rejects_bad_role() {
        assert!(Cli::try_parse_from(["rfcdesk", "--role", "admin", "stats"]).is_err());
    }
}
