//! SQLite ticket store
//!
//! The single place where validation and persistence meet. Every
//! operation validates its input first and then runs exactly one
//! statement, so a call either commits fully or writes nothing.

use crate::config::DatabaseConfig;
use crate::query::{like_pattern, ListFilter, ValidatedFilter};
use crate::schema;
use crate::ticket::{validate_description, validate_name, Priority, Status, Ticket, TicketUpdate};
use crate::Result;
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, Value, ValueRef};
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use std::path::Path;

const COLUMNS: &str = "id, name, description, status, priority, created_at";

impl ToSql for Status {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for Status {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|e| FromSqlError::Other(Box::new(e)))
    }
}

impl ToSql for Priority {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for Priority {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|e| FromSqlError::Other(Box::new(e)))
    }
}

/// Guarded CRUD over the `tickets` table
pub struct TicketStore {
    conn: Connection,
}

impl TicketStore {
    /// Open (or create) the database at `path` and ensure the schema
    ///
    /// Safe to call repeatedly against the same file.
    pub fn open(path: impl AsRef<Path>, options: &DatabaseConfig) -> Result<Self> {
        let path = path.as_ref();
        let conn = Connection::open(path)?;
        let store = Self::init(conn, options)?;
        tracing::info!(path = %path.display(), "ticket store ready");
        Ok(store)
    }

    /// Open the database named by the configuration
    pub fn from_config(options: &DatabaseConfig) -> Result<Self> {
        Self::open(&options.path, options)
    }

    /// Private in-memory database, mostly for tests
    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?, &DatabaseConfig::default())
    }

    fn init(conn: Connection, options: &DatabaseConfig) -> Result<Self> {
        schema::configure(&conn, options)?;
        schema::apply_schema(&conn)?;
        Ok(Self { conn })
    }

    /// Create a ticket
    ///
    /// Trims `name` and `description`; a missing `priority` becomes `Low`.
    /// The new ticket is always `Open`.
    pub fn create(&self, name: &str, description: &str, priority: Option<&str>) -> Result<Ticket> {
        let name = validate_name(name)?;
        let description = validate_description(description)?;
        let priority = priority
            .map(str::parse::<Priority>)
            .transpose()?
            .unwrap_or_default();

        let ticket = self.conn.query_row(
            &format!(
                "INSERT INTO tickets (name, description, status, priority) \
                 VALUES (?1, ?2, ?3, ?4) RETURNING {COLUMNS}"
            ),
            params![name, description, Status::Open, priority],
            row_to_ticket,
        )?;
        tracing::debug!(id = ticket.id, priority = %ticket.priority, "ticket created");
        Ok(ticket)
    }

    /// Get a ticket by id, `None` if it does not exist
    pub fn get(&self, id: i64) -> Result<Option<Ticket>> {
        let ticket = self
            .conn
            .query_row(
                &format!("SELECT {COLUMNS} FROM tickets WHERE id = ?1"),
                [id],
                row_to_ticket,
            )
            .optional()?;
        Ok(ticket)
    }

    /// List tickets matching `filter`, newest first unless a sort is given
    pub fn list(&self, filter: &ListFilter) -> Result<Vec<Ticket>> {
        let filter = filter.validate()?;
        let (where_clause, mut values) = where_clause(&filter);
        values.push(Value::Integer(i64::from(filter.limit)));
        values.push(Value::Integer(i64::from(filter.offset)));

        let sql = format!(
            "SELECT {COLUMNS} FROM tickets {where_clause} {} LIMIT ? OFFSET ?",
            filter.sort.order_by()
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let tickets = stmt
            .query_map(params_from_iter(values.iter()), row_to_ticket)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(tickets)
    }

    /// Number of tickets matching `filter`, ignoring limit and offset
    pub fn count(&self, filter: &ListFilter) -> Result<u64> {
        let filter = filter.validate()?;
        let (where_clause, values) = where_clause(&filter);
        let count: i64 = self.conn.query_row(
            &format!("SELECT COUNT(*) FROM tickets {where_clause}"),
            params_from_iter(values.iter()),
            |row| row.get(0),
        )?;
        Ok(u64::try_from(count).unwrap_or(0))
    }

    /// Apply a partial update
    ///
    /// All supplied fields are validated before anything is written.
    /// Returns `None` if the ticket does not exist, and the ticket
    /// unchanged if no fields were supplied.
    pub fn update(&self, id: i64, update: &TicketUpdate) -> Result<Option<Ticket>> {
        let update = update.validate()?;

        let mut sets: Vec<&str> = Vec::new();
        let mut values: Vec<Value> = Vec::new();
        if let Some(name) = update.name {
            sets.push("name = ?");
            values.push(Value::Text(name));
        }
        if let Some(description) = update.description {
            sets.push("description = ?");
            values.push(Value::Text(description));
        }
        if let Some(status) = update.status {
            sets.push("status = ?");
            values.push(Value::Text(status.as_str().to_string()));
        }
        if let Some(priority) = update.priority {
            sets.push("priority = ?");
            values.push(Value::Text(priority.as_str().to_string()));
        }

        if sets.is_empty() {
            return self.get(id);
        }
        values.push(Value::Integer(id));

        let sql = format!(
            "UPDATE tickets SET {} WHERE id = ? RETURNING {COLUMNS}",
            sets.join(", ")
        );
        let ticket = self
            .conn
            .query_row(&sql, params_from_iter(values.iter()), row_to_ticket)
            .optional()?;
        match &ticket {
            Some(t) => tracing::debug!(id, fields = sets.len(), status = %t.status, "ticket updated"),
            None => tracing::debug!(id, "update of missing ticket"),
        }
        Ok(ticket)
    }

    /// Set the status of a ticket
    pub fn set_status(&self, id: i64, status: &str) -> Result<Option<Ticket>> {
        self.update(
            id,
            &TicketUpdate {
                status: Some(status.to_string()),
                ..TicketUpdate::default()
            },
        )
    }

    /// Set the priority of a ticket
    pub fn set_priority(&self, id: i64, priority: &str) -> Result<Option<Ticket>> {
        self.update(
            id,
            &TicketUpdate {
                priority: Some(priority.to_string()),
                ..TicketUpdate::default()
            },
        )
    }

    /// Mark a ticket `Closed`
    ///
    /// Closing an already closed ticket is allowed and leaves it as is.
    pub fn close(&self, id: i64) -> Result<Option<Ticket>> {
        self.update(id, &TicketUpdate::status(Status::Closed))
    }

    /// Delete a ticket permanently
    ///
    /// Returns whether a row was removed.
    pub fn delete(&self, id: i64) -> Result<bool> {
        let removed = self.conn.execute("DELETE FROM tickets WHERE id = ?1", [id])?;
        tracing::debug!(id, removed, "ticket delete");
        Ok(removed > 0)
    }
}

fn where_clause(filter: &ValidatedFilter) -> (String, Vec<Value>) {
    let mut clauses: Vec<&str> = Vec::new();
    let mut values: Vec<Value> = Vec::new();

    if let Some(status) = filter.status {
        clauses.push("status = ?");
        values.push(Value::Text(status.as_str().to_string()));
    }
    if let Some(priority) = filter.priority {
        clauses.push("priority = ?");
        values.push(Value::Text(priority.as_str().to_string()));
    }
    if let Some(search) = &filter.search {
        clauses.push(r"(name LIKE ? ESCAPE '\' OR description LIKE ? ESCAPE '\')");
        let pattern = like_pattern(search);
        values.push(Value::Text(pattern.clone()));
        values.push(Value::Text(pattern));
    }

    if clauses.is_empty() {
        (String::new(), values)
    } else {
        (format!("WHERE {}", clauses.join(" AND ")), values)
    }
}

fn row_to_ticket(row: &Row<'_>) -> rusqlite::Result<Ticket> {
    Ok(Ticket {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        status: row.get(3)?,
        priority: row.get(4)?,
        created_at: row.get(5)?,
    })
}
