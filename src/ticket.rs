use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

pub const MAX_TITLE_LEN: usize = 200;
pub const MAX_DESCRIPTION_LEN: usize = 10_000;

/// Closed enumerations stored as lowercase text and exchanged as JSON strings.
macro_rules! ticket_enum {
    ($(#[$meta:meta])* $name:ident, $kind:literal, { $($variant:ident => $text:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.pad(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = Error;

            fn from_str(s: &str) -> Result<Self> {
                match s.trim().to_ascii_lowercase().as_str() {
                    $($text => Ok($name::$variant),)+
                    _ => Err(Error::InvalidValue {
                        kind: $kind,
                        value: s.to_string(),
                    }),
                }
            }
        }

        impl ToSql for $name {
            fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
                Ok(ToSqlOutput::from(self.as_str()))
            }
        }

        impl FromSql for $name {
            fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
                value
                    .as_str()?
                    .parse()
                    .map_err(|e: Error| FromSqlError::Other(Box::new(e)))
            }
        }
    };
}

ticket_enum!(
    /// Subject area of a ticket.
    Category, "category", {
        Billing => "billing",
        Technical => "technical",
        Account => "account",
        General => "general",
    }
);

ticket_enum!(
    /// Urgency of a ticket.
    Priority, "priority", {
        Low => "low",
        Medium => "medium",
        High => "high",
        Critical => "critical",
    }
);

ticket_enum!(
    /// Workflow state. Any status may move to any other.
    Status, "status", {
        Open => "open",
        InProgress => "in_progress",
        Resolved => "resolved",
        Closed => "closed",
    }
);

/// A support ticket as stored and returned by the desk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ticket {
    pub id: String,
    pub title: String,
    pub description: String,
    pub category: Category,
    pub priority: Priority,
    pub status: Status,
    pub created_at: DateTime<Utc>,
}

impl Ticket {
    /// Build an open ticket with a fresh id, stamped now.
    pub fn open(
        title: String,
        description: String,
        category: Category,
        priority: Priority,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            title,
            description,
            category,
            priority,
            status: Status::Open,
            created_at: Utc::now(),
        }
    }
}

/// Intake request. Missing category/priority are filled from the classifier.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewTicket {
    pub title: String,
    pub description: String,
    pub category: Option<Category>,
    pub priority: Option<Priority>,
}

impl NewTicket {
    pub fn new(title: &str, description: &str) -> Self {
        Self {
            title: title.to_string(),
            description: description.to_string(),
            ..Default::default()
        }
    }

    pub fn category(mut self, category: Category) -> Self {
        self.category = Some(category);
        self
    }

    pub fn priority(mut self, priority: Priority) -> Self {
        self.priority = Some(priority);
        self
    }

    /// Trim title and description and check their bounds.
    pub fn validate(&self) -> Result<(String, String)> {
        let title = self.title.trim();
        let description = self.description.trim();
        if title.is_empty() {
            return Err(Error::Validation("title must not be empty".into()));
        }
        if title.chars().count() > MAX_TITLE_LEN {
            return Err(Error::Validation(format!(
                "title exceeds {MAX_TITLE_LEN} characters"
            )));
        }
        if description.is_empty() {
            return Err(Error::Validation("description must not be empty".into()));
        }
        if description.chars().count() > MAX_DESCRIPTION_LEN {
            return Err(Error::Validation(format!(
                "description exceeds {MAX_DESCRIPTION_LEN} characters"
            )));
        }
        Ok((title.to_string(), description.to_string()))
    }
}
