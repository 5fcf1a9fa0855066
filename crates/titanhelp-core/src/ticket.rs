//! Ticket data model for titanhelp
//!
//! One entity, two closed domains (status and priority) and the field
//! rules every write goes through.

use crate::error::ValidationError;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Maximum ticket name length, in characters, after trimming
pub const MAX_NAME_LEN: usize = 100;

/// Maximum problem description length, in characters, after trimming
pub const MAX_DESCRIPTION_LEN: usize = 1000;

/// strftime pattern of `created_at`, shared with the table default
pub const TIMESTAMP_FORMAT: &str = "%m-%d-%Y %H:%M:%S";

/// Ticket status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default, Hash)]
pub enum Status {
    #[default]
    Open,
    #[serde(rename = "In Progress")]
    InProgress,
    Closed,
}

impl Status {
    pub const ALL: [Status; 3] = [Status::Open, Status::InProgress, Status::Closed];

    /// Label stored in the `status` column
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Open => "Open",
            Status::InProgress => "In Progress",
            Status::Closed => "Closed",
        }
    }
}

impl std::str::FromStr for Status {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Status::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| ValidationError::InvalidStatus(s.to_string()))
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ticket priority
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default, Hash)]
pub enum Priority {
    #[default]
    Low,
    Medium,
    High,
}

impl Priority {
    pub const ALL: [Priority; 3] = [Priority::Low, Priority::Medium, Priority::High];

    /// Label stored in the `priority` column
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "Low",
            Priority::Medium => "Medium",
            Priority::High => "High",
        }
    }
}

impl std::str::FromStr for Priority {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Priority::ALL
            .into_iter()
            .find(|priority| priority.as_str() == s)
            .ok_or_else(|| ValidationError::InvalidPriority(s.to_string()))
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A support request as stored in the `tickets` table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ticket {
    /// Assigned by the store, never reused
    pub id: i64,

    /// Short summary (1-100 chars)
    pub name: String,

    /// Problem description (1-1000 chars)
    pub description: String,

    pub status: Status,

    pub priority: Priority,

    /// Creation time as stored, `MM-DD-YYYY HH:MM:SS` UTC
    pub created_at: String,
}

impl Ticket {
    /// Parse `created_at` into a timestamp
    pub fn created_at_time(&self) -> Option<NaiveDateTime> {
        NaiveDateTime::parse_from_str(&self.created_at, TIMESTAMP_FORMAT).ok()
    }
}

impl std::fmt::Display for Ticket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "#{} [{}] [{}] {}",
            self.id, self.priority, self.status, self.name
        )
    }
}

/// Partial update of a ticket
///
/// Fields hold raw caller input; `None` leaves the column untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct TicketUpdate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub priority: Option<String>,
}

impl TicketUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.status.is_none()
            && self.priority.is_none()
    }

    pub fn status(status: Status) -> Self {
        Self {
            status: Some(status.as_str().to_string()),
            ..Self::default()
        }
    }

    /// Validate every supplied field
    ///
    /// Fails on the first broken rule, so nothing is written unless the
    /// whole update is valid.
    pub fn validate(&self) -> Result<ValidatedUpdate, ValidationError> {
        Ok(ValidatedUpdate {
            name: self.name.as_deref().map(validate_name).transpose()?,
            description: self
                .description
                .as_deref()
                .map(validate_description)
                .transpose()?,
            status: self.status.as_deref().map(str::parse::<Status>).transpose()?,
            priority: self
                .priority
                .as_deref()
                .map(str::parse::<Priority>)
                .transpose()?,
        })
    }
}

/// A [`TicketUpdate`] whose fields all passed validation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidatedUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub status: Option<Status>,
    pub priority: Option<Priority>,
}

/// Check a ticket name, returning it trimmed
pub fn validate_name(name: &str) -> Result<String, ValidationError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ValidationError::NameRequired);
    }
    let len = name.chars().count();
    if len > MAX_NAME_LEN {
        return Err(ValidationError::NameTooLong {
            max: MAX_NAME_LEN,
            len,
        });
    }
    Ok(name.to_string())
}

/// Check a problem description, returning it trimmed
pub fn validate_description(description: &str) -> Result<String, ValidationError> {
    let description = description.trim();
    if description.is_empty() {
        return Err(ValidationError::DescriptionRequired);
    }
    let len = description.chars().count();
    if len > MAX_DESCRIPTION_LEN {
        return Err(ValidationError::DescriptionTooLong {
            max: MAX_DESCRIPTION_LEN,
            len,
        });
    }
    Ok(description.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_labels() {
        assert_eq!("In Progress".parse::<Status>().unwrap(), Status::InProgress);
        assert_eq!(Status::InProgress.to_string(), "In Progress");
        assert_eq!(
            "Reopened".parse::<Status>(),
            Err(ValidationError::InvalidStatus("Reopened".into()))
        );
        // labels are exact, the table CHECK constraint is case sensitive
        assert!("open".parse::<Status>().is_err());
    }

    #[test]
    fn test_priority_error_names_domain() {
        let err = "Important".parse::<Priority>().unwrap_err();
        let msg = err.to_string();
        assert!(msg.starts_with("Priority must be one of"));
        for p in Priority::ALL {
            assert!(msg.contains(p.as_str()));
        }
    }

    #[test]
    fn test_serde_uses_labels() {
        let json = serde_json::to_string(&Status::InProgress).unwrap();
        assert_eq!(json, "\"In Progress\"");
        let p: Priority = serde_json::from_str("\"High\"").unwrap();
        assert_eq!(p, Priority::High);
    }

    #[test]
    fn test_validate_name() {
        assert_eq!(validate_name("  Printer  ").unwrap(), "Printer");
        assert_eq!(validate_name(""), Err(ValidationError::NameRequired));
        assert_eq!(validate_name("   "), Err(ValidationError::NameRequired));
        assert!(validate_name(&"x".repeat(100)).is_ok());
        assert!(matches!(
            validate_name(&"x".repeat(101)),
            Err(ValidationError::NameTooLong { len: 101, .. })
        ));
        // counted in characters, not bytes
        assert!(validate_name(&"é".repeat(100)).is_ok());
    }

    #[test]
    fn test_validate_description() {
        assert_eq!(
            validate_description("\tno signal\n").unwrap(),
            "no signal"
        );
        assert_eq!(
            validate_description(" "),
            Err(ValidationError::DescriptionRequired)
        );
        assert!(validate_description(&"x".repeat(1000)).is_ok());
        assert!(validate_description(&"x".repeat(1001)).is_err());
    }

    #[test]
    fn test_update_validation_is_all_or_nothing() {
        let update = TicketUpdate {
            name: Some("fine".into()),
            status: Some("Reopened".into()),
            ..TicketUpdate::default()
        };
        assert_eq!(
            update.validate(),
            Err(ValidationError::InvalidStatus("Reopened".into()))
        );

        let update = TicketUpdate {
            name: Some(" Keyboard ".into()),
            priority: Some("Medium".into()),
            ..TicketUpdate::default()
        };
        let valid = update.validate().unwrap();
        assert_eq!(valid.name.as_deref(), Some("Keyboard"));
        assert_eq!(valid.priority, Some(Priority::Medium));
        assert_eq!(valid.status, None);
    }

    #[test]
    fn test_created_at_time() {
        let ticket = Ticket {
            id: 1,
            name: "VPN".into(),
            description: "Cannot connect".into(),
            status: Status::Open,
            priority: Priority::Low,
            created_at: "03-14-2025 09:26:53".into(),
        };
        let ts = ticket.created_at_time().unwrap();
        assert_eq!(ts.format("%Y-%m-%d").to_string(), "2025-03-14");
    }
}
