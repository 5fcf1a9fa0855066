//! Listing filters and sort orders

use crate::error::ValidationError;
use crate::ticket::{Priority, Status};
use serde::Deserialize;

/// Default page size for [`crate::TicketStore::list`]
pub const DEFAULT_LIMIT: u32 = 100;

/// Column a listing is ordered by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortField {
    #[default]
    CreatedAt,
    Id,
    Name,
    Status,
    Priority,
}

impl SortField {
    /// SQL ordering expression for this field
    ///
    /// `created_at` is stored as `MM-DD-YYYY HH:MM:SS`, which does not sort
    /// chronologically as text, so it is reordered to year-month-day first.
    pub(crate) fn order_expr(&self) -> &'static str {
        match self {
            SortField::CreatedAt => {
                "substr(created_at, 7, 4) || substr(created_at, 1, 2) || \
                 substr(created_at, 4, 2) || substr(created_at, 12)"
            }
            SortField::Id => "id",
            SortField::Name => "name COLLATE NOCASE",
            SortField::Status => {
                "CASE status WHEN 'Open' THEN 0 WHEN 'In Progress' THEN 1 ELSE 2 END"
            }
            SortField::Priority => {
                "CASE priority WHEN 'Low' THEN 0 WHEN 'Medium' THEN 1 ELSE 2 END"
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

impl SortDirection {
    fn keyword(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

/// Sort specification, newest first by default
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SortSpec {
    pub field: SortField,
    pub direction: SortDirection,
}

impl SortSpec {
    /// `ORDER BY` clause; ties fall back to id in the same direction
    pub(crate) fn order_by(&self) -> String {
        let dir = self.direction.keyword();
        match self.field {
            SortField::Id => format!("ORDER BY id {dir}"),
            field => format!("ORDER BY {} {dir}, id {dir}", field.order_expr()),
        }
    }
}

impl std::str::FromStr for SortSpec {
    type Err = ValidationError;

    /// Accepts `field`, `field asc` or `field desc` (case-insensitive)
    ///
    /// A bare field sorts ascending, as a plain SQL `ORDER BY` would.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ValidationError::InvalidSort(s.to_string());
        let mut parts = s.split_whitespace();

        let field = match parts.next().map(str::to_lowercase).as_deref() {
            Some("created_at") | Some("date") => SortField::CreatedAt,
            Some("id") => SortField::Id,
            Some("name") => SortField::Name,
            Some("status") => SortField::Status,
            Some("priority") => SortField::Priority,
            _ => return Err(invalid()),
        };

        let direction = match parts.next().map(str::to_lowercase).as_deref() {
            None | Some("asc") => SortDirection::Asc,
            Some("desc") => SortDirection::Desc,
            Some(_) => return Err(invalid()),
        };

        if parts.next().is_some() {
            return Err(invalid());
        }

        Ok(SortSpec { field, direction })
    }
}

/// Filters for listing tickets
///
/// String fields hold raw caller input and are validated by the store
/// before any query runs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ListFilter {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub priority: Option<String>,
    /// Substring matched against name or description
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub limit: Option<u32>,
    #[serde(default)]
    pub offset: Option<u32>,
    /// e.g. `created_at desc`, `priority`, `name asc`
    #[serde(default)]
    pub sort: Option<String>,
}

impl ListFilter {
    pub fn with_status(mut self, status: Status) -> Self {
        self.status = Some(status.as_str().to_string());
        self
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = Some(priority.as_str().to_string());
        self
    }

    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = Some(search.into());
        self
    }

    pub fn with_sort(mut self, sort: impl Into<String>) -> Self {
        self.sort = Some(sort.into());
        self
    }

    pub fn with_page(mut self, limit: u32, offset: u32) -> Self {
        self.limit = Some(limit);
        self.offset = Some(offset);
        self
    }

    /// Check every filter value against its domain
    pub(crate) fn validate(&self) -> Result<ValidatedFilter, ValidationError> {
        Ok(ValidatedFilter {
            status: non_empty(&self.status).map(str::parse::<Status>).transpose()?,
            priority: non_empty(&self.priority)
                .map(str::parse::<Priority>)
                .transpose()?,
            search: non_empty(&self.search).map(str::to_string),
            limit: self.limit.unwrap_or(DEFAULT_LIMIT),
            offset: self.offset.unwrap_or(0),
            sort: non_empty(&self.sort)
                .map(str::parse::<SortSpec>)
                .transpose()?
                .unwrap_or_default(),
        })
    }
}

/// Empty strings mean "no filter", as in an unset form field
///
/// Whitespace is a value: a blank status is rejected, a blank search
/// matches literally.
fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.is_empty())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ValidatedFilter {
    pub status: Option<Status>,
    pub priority: Option<Priority>,
    pub search: Option<String>,
    pub limit: u32,
    pub offset: u32,
    pub sort: SortSpec,
}

/// Build a `LIKE` pattern matching `needle` literally, escaped with `\`
pub(crate) fn like_pattern(needle: &str) -> String {
    let mut pattern = String::with_capacity(needle.len() + 2);
    pattern.push('%');
    for c in needle.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_sort() {
        assert_eq!("created_at DESC".parse::<SortSpec>().unwrap(), SortSpec::default());
        assert_eq!(
            "priority asc".parse::<SortSpec>().unwrap(),
            SortSpec {
                field: SortField::Priority,
                direction: SortDirection::Asc
            }
        );
        assert_eq!(
            "name".parse::<SortSpec>().unwrap().direction,
            SortDirection::Asc
        );
        assert_eq!(SortSpec::default().direction, SortDirection::Desc);
        assert!("name; DROP TABLE tickets".parse::<SortSpec>().is_err());
        assert!("updated_at".parse::<SortSpec>().is_err());
        assert!("id sideways".parse::<SortSpec>().is_err());
    }

    #[test]
    fn test_validate_filter() {
        let filter = ListFilter::default();
        let valid = filter.validate().unwrap();
        assert_eq!(valid.limit, DEFAULT_LIMIT);
        assert_eq!(valid.offset, 0);
        assert_eq!(valid.sort, SortSpec::default());

        let filter = ListFilter {
            status: Some("".into()),
            priority: Some("High".into()),
            ..ListFilter::default()
        };
        let valid = filter.validate().unwrap();
        assert_eq!(valid.status, None);
        assert_eq!(valid.priority, Some(Priority::High));

        let filter = ListFilter::default().with_sort("bogus");
        assert!(matches!(
            filter.validate(),
            Err(ValidationError::InvalidSort(_))
        ));

        let filter = ListFilter {
            status: Some("Pending".into()),
            ..ListFilter::default()
        };
        assert!(matches!(
            filter.validate(),
            Err(ValidationError::InvalidStatus(_))
        ));

        let filter = ListFilter {
            status: Some("  ".into()),
            ..ListFilter::default()
        };
        assert_eq!(
            filter.validate(),
            Err(ValidationError::InvalidStatus("  ".into()))
        );

        let filter = ListFilter {
            priority: Some(" ".into()),
            ..ListFilter::default()
        };
        assert!(matches!(
            filter.validate(),
            Err(ValidationError::InvalidPriority(_))
        ));

        let valid = ListFilter::default().with_search(" ").validate().unwrap();
        assert_eq!(valid.search.as_deref(), Some(" "));
    }

    #[test]
    fn test_like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("vpn"), "%vpn%");
        assert_eq!(like_pattern("50%_off"), "%50\\%\\_off%");
    }
}
