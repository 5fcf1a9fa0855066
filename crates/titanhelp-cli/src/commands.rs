//! CLI command implementations

use anyhow::{Context as _, Result, anyhow};
use colored::{ColoredString, Colorize};
use std::path::PathBuf;
use tabled::settings::Style;
use tabled::{Table, Tabled};
use titanhelp_core::config::CONFIG_FILE;
use titanhelp_core::{Config, ListFilter, Priority, Status, Ticket, TicketStore, TicketUpdate};

/// Resolved configuration plus global flags
pub struct Context {
    config: Config,
    json: bool,
}

impl Context {
    pub fn load(db: Option<PathBuf>, json: bool) -> Result<Self> {
        let mut config = Config::discover()?;
        if let Some(db) = db {
            config.database.path = db;
        }
        if !config.display.colors {
            colored::control::set_override(false);
        }
        tracing::debug!(db = %config.database.path.display(), "resolved configuration");
        Ok(Self { config, json })
    }

    fn open_store(&self) -> Result<TicketStore> {
        TicketStore::from_config(&self.config.database).with_context(|| {
            format!(
                "Failed to open ticket store at {}",
                self.config.database.path.display()
            )
        })
    }
}

/// Row of the `list` table
#[derive(Tabled)]
struct TicketRow {
    #[tabled(rename = "ID")]
    id: i64,
    #[tabled(rename = "Priority")]
    priority: Priority,
    #[tabled(rename = "Status")]
    status: Status,
    #[tabled(rename = "Created")]
    created_at: String,
    #[tabled(rename = "Name")]
    name: String,
}

impl From<Ticket> for TicketRow {
    fn from(t: Ticket) -> Self {
        Self {
            id: t.id,
            priority: t.priority,
            status: t.status,
            created_at: t.created_at,
            name: t.name,
        }
    }
}

fn status_colored(status: Status) -> ColoredString {
    match status {
        Status::Open => status.as_str().white(),
        Status::InProgress => status.as_str().yellow(),
        Status::Closed => status.as_str().green(),
    }
}

fn priority_colored(priority: Priority) -> ColoredString {
    match priority {
        Priority::Low => priority.as_str().dimmed(),
        Priority::Medium => priority.as_str().yellow(),
        Priority::High => priority.as_str().red().bold(),
    }
}

fn not_found(id: i64) -> anyhow::Error {
    anyhow!("Ticket not found: {}", id)
}

pub fn init(ctx: &Context) -> Result<()> {
    let config_path = PathBuf::from(CONFIG_FILE);
    let wrote_config = if Config::find_path().is_none() {
        std::fs::write(&config_path, Config::default_with_comments())?;
        true
    } else {
        false
    };

    ctx.open_store()?;
    println!(
        "{} Initialized titanhelp database {}",
        "✓".green(),
        ctx.config.database.path.display()
    );
    if wrote_config {
        println!("  Config: {}", config_path.display());
    }
    Ok(())
}

pub fn create(ctx: &Context, name: &str, description: &str, priority: Option<&str>) -> Result<()> {
    let store = ctx.open_store()?;
    let ticket = store.create(name, description, priority)?;

    if ctx.json {
        println!("{}", serde_json::to_string(&ticket)?);
    } else {
        println!("{} Created ticket #{}", "✓".green(), ticket.id);
        println!("  Name:     {}", ticket.name);
        println!("  Priority: {}", priority_colored(ticket.priority));
    }

    Ok(())
}

pub fn list(ctx: &Context, mut filter: ListFilter) -> Result<()> {
    let store = ctx.open_store()?;
    filter.limit.get_or_insert(ctx.config.display.default_limit);
    let tickets = store.list(&filter)?;

    if ctx.json {
        println!("{}", serde_json::to_string(&tickets)?);
        return Ok(());
    }
    if tickets.is_empty() {
        println!("No tickets found");
        return Ok(());
    }

    let total = store.count(&filter)?;
    println!(
        "{}",
        format!("Showing {} of {} tickets", tickets.len(), total).bold()
    );
    let rows: Vec<TicketRow> = tickets.into_iter().map(TicketRow::from).collect();
    println!("{}", Table::new(rows).with(Style::rounded()));

    Ok(())
}

pub fn show(ctx: &Context, id: i64) -> Result<()> {
    let store = ctx.open_store()?;
    let ticket = store.get(id)?.ok_or_else(|| not_found(id))?;

    if ctx.json {
        println!("{}", serde_json::to_string_pretty(&ticket)?);
    } else {
        println!(
            "{} {}",
            format!("#{}", ticket.id).cyan().bold(),
            ticket.name.bold()
        );
        println!();
        println!("Status:   {}", status_colored(ticket.status));
        println!("Priority: {}", priority_colored(ticket.priority));
        println!("Created:  {}", ticket.created_at);
        println!();
        println!("{}", "Description:".bold());
        println!("{}", ticket.description);
    }

    Ok(())
}

pub fn update(ctx: &Context, id: i64, update: TicketUpdate) -> Result<()> {
    let store = ctx.open_store()?;
    let ticket = store.update(id, &update)?.ok_or_else(|| not_found(id))?;

    if ctx.json {
        println!("{}", serde_json::to_string(&ticket)?);
    } else if update.is_empty() {
        println!("Nothing to update for #{}", id);
    } else {
        println!("{} Updated #{}", "✓".green(), id);
    }

    Ok(())
}

pub fn close(ctx: &Context, id: i64) -> Result<()> {
    let store = ctx.open_store()?;
    let ticket = store.close(id)?.ok_or_else(|| not_found(id))?;

    if ctx.json {
        println!("{}", serde_json::to_string(&ticket)?);
    } else {
        println!("{} Closed #{}", "✓".green(), id);
    }

    Ok(())
}

pub fn delete(ctx: &Context, id: i64) -> Result<()> {
    let store = ctx.open_store()?;
    if !store.delete(id)? {
        return Err(not_found(id));
    }

    if ctx.json {
        println!("{}", serde_json::json!({ "deleted": id }));
    } else {
        println!("{} Deleted #{}", "✓".green(), id);
    }

    Ok(())
}

/// Output JSON schema for config file
pub fn schema() -> Result<()> {
    let schema = serde_json::json!({
        "$schema": "http://json-schema.org/draft-07/schema#",
        "title": "titanhelp Configuration",
        "description": "Configuration file for the titanhelp ticket tracker",
        "type": "object",
        "properties": {
            "database": {
                "type": "object",
                "properties": {
                    "path": {
                        "type": "string",
                        "description": "SQLite database file",
                        "default": "titanhelp.db"
                    },
                    "journal_mode": {
                        "type": "string",
                        "enum": ["wal", "delete"],
                        "default": "wal"
                    },
                    "synchronous": {
                        "type": "string",
                        "enum": ["full", "normal", "off"],
                        "default": "normal"
                    }
                }
            },
            "api": {
                "type": "object",
                "properties": {
                    "host": {
                        "type": "string",
                        "description": "Interface the REST server binds",
                        "default": "127.0.0.1"
                    },
                    "port": {
                        "type": "integer",
                        "minimum": 1,
                        "maximum": 65535,
                        "default": 5000
                    }
                }
            },
            "display": {
                "type": "object",
                "properties": {
                    "colors": {
                        "type": "boolean",
                        "description": "Use colors in output",
                        "default": true
                    },
                    "default_limit": {
                        "type": "integer",
                        "description": "Rows shown by `titanhelp list` when no limit is given",
                        "minimum": 1,
                        "default": 50
                    }
                }
            }
        }
    });
    println!("{}", serde_json::to_string_pretty(&schema)?);
    Ok(())
}

/// Show current configuration
pub fn config_show(ctx: &Context) -> Result<()> {
    let config = &ctx.config;

    if ctx.json {
        println!("{}", serde_json::to_string_pretty(config)?);
    } else {
        println!("{}", "Current configuration:".bold());
        println!();
        println!("[database]");
        println!("path = \"{}\"", config.database.path.display());
        println!(
            "journal_mode = \"{}\"",
            config.database.journal_mode.pragma_value().to_lowercase()
        );
        println!(
            "synchronous = \"{}\"",
            config.database.synchronous.pragma_value().to_lowercase()
        );
        println!();
        println!("[api]");
        println!("host = \"{}\"", config.api.host);
        println!("port = {}", config.api.port);
        println!();
        println!("[display]");
        println!("colors = {}", config.display.colors);
        println!("default_limit = {}", config.display.default_limit);
    }

    Ok(())
}

/// Print the active config file path
pub fn config_path() -> Result<()> {
    match Config::find_path() {
        Some(path) => println!("{}", path.display()),
        None => println!("(defaults, no config file found)"),
    }
    Ok(())
}

/// Reset configuration to defaults
pub fn config_reset() -> Result<()> {
    std::fs::write(CONFIG_FILE, Config::default_with_comments())?;
    println!("{} Wrote default configuration to {}", "✓".green(), CONFIG_FILE);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ticket_row_table() {
        let ticket = Ticket {
            id: 7,
            name: "VPN".into(),
            description: "Cannot connect".into(),
            status: Status::InProgress,
            priority: Priority::High,
            created_at: "03-14-2025 09:26:53".into(),
        };
        let table = Table::new(vec![TicketRow::from(ticket)]).to_string();
        assert!(table.contains("In Progress"));
        assert!(table.contains("High"));
        assert!(table.contains("03-14-2025 09:26:53"));
        assert!(!table.contains("Cannot connect"));
    }
}
