//! titanhelp - Minimal helpdesk ticket tracker
//!
//! Tickets live in a single SQLite table (titanhelp.db by default).

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;

#[derive(Parser)]
#[command(name = "titanhelp")]
#[command(about = "Minimal helpdesk ticket tracker")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Database file (overrides config and TITANHELP_DB)
    #[arg(long, global = true, env = "TITANHELP_DB")]
    db: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the database and a default titanhelp.toml
    Init,

    /// Create a new ticket
    Create {
        /// Short summary of the problem
        name: String,

        /// Problem description
        #[arg(short, long)]
        description: String,

        /// Priority (Low, Medium, High)
        #[arg(short, long)]
        priority: Option<String>,
    },

    /// List tickets
    List {
        /// Filter by status (Open, "In Progress", Closed)
        #[arg(short, long)]
        status: Option<String>,

        /// Filter by priority (Low, Medium, High)
        #[arg(short, long)]
        priority: Option<String>,

        /// Text to look for in name or description
        #[arg(short = 'q', long)]
        search: Option<String>,

        /// Maximum number of tickets
        #[arg(long)]
        limit: Option<u32>,

        /// Number of tickets to skip
        #[arg(long)]
        offset: Option<u32>,

        /// Sort order, e.g. "created_at desc", "priority", "name asc"
        #[arg(long)]
        sort: Option<String>,
    },

    /// Show ticket details
    Show {
        /// Ticket ID
        id: i64,
    },

    /// Update a ticket
    Update {
        /// Ticket ID
        id: i64,

        /// New name
        #[arg(long)]
        name: Option<String>,

        /// New description
        #[arg(short, long)]
        description: Option<String>,

        /// New status
        #[arg(short, long)]
        status: Option<String>,

        /// New priority
        #[arg(short, long)]
        priority: Option<String>,
    },

    /// Close a ticket
    Close {
        /// Ticket ID
        id: i64,
    },

    /// Delete a ticket permanently
    Delete {
        /// Ticket ID
        id: i64,
    },

    /// Output JSON schema for config file
    Schema,

    /// Show or reset configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Show current configuration
    Show,
    /// Print the path of the active config file
    Path,
    /// Write a default titanhelp.toml in the current directory
    Reset,
}

fn init_tracing() {
    let filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "warn".to_string());
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let ctx = commands::Context::load(cli.db, cli.json)?;

    match cli.command {
        Commands::Init => commands::init(&ctx),
        Commands::Create {
            name,
            description,
            priority,
        } => commands::create(&ctx, &name, &description, priority.as_deref()),
        Commands::List {
            status,
            priority,
            search,
            limit,
            offset,
            sort,
        } => commands::list(
            &ctx,
            titanhelp_core::ListFilter {
                status,
                priority,
                search,
                limit,
                offset,
                sort,
            },
        ),
        Commands::Show { id } => commands::show(&ctx, id),
        Commands::Update {
            id,
            name,
            description,
            status,
            priority,
        } => commands::update(
            &ctx,
            id,
            titanhelp_core::TicketUpdate {
                name,
                description,
                status,
                priority,
            },
        ),
        Commands::Close { id } => commands::close(&ctx, id),
        Commands::Delete { id } => commands::delete(&ctx, id),
        Commands::Schema => commands::schema(),
        Commands::Config { command } => match command {
            Some(ConfigCommands::Show) | None => commands::config_show(&ctx),
            Some(ConfigCommands::Path) => commands::config_path(),
            Some(ConfigCommands::Reset) => commands::config_reset(),
        },
    }
}
