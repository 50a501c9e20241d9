use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::storage::repository::{ticket_from_row, TICKET_COLUMNS};
use crate::storage::Database;
use crate::ticket::{Category, Priority, Status, Ticket};

/// Optional criteria for selecting tickets. Absent fields match everything;
/// present fields are combined with AND.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketFilter {
    pub category: Option<Category>,
    pub priority: Option<Priority>,
    pub status: Option<Status>,
    pub search: Option<String>,
    #[serde(skip)]
    limit: Option<u32>,
}

impl TicketFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn category(mut self, category: Category) -> Self {
        self.category = Some(category);
        self
    }

    pub fn priority(mut self, priority: Priority) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn status(mut self, status: Status) -> Self {
        self.status = Some(status);
        self
    }

    /// Case-insensitive substring match against title or description.
    pub fn search(mut self, text: &str) -> Self {
        self.search = Some(text.to_string());
        self
    }

    pub fn limit(mut self, n: u32) -> Self {
        self.limit = Some(n);
        self
    }

    /// Whether `ticket` satisfies every present criterion.
    pub fn matches(&self, ticket: &Ticket) -> bool {
        if self.category.is_some_and(|c| c != ticket.category) {
            return false;
        }
        if self.priority.is_some_and(|p| p != ticket.priority) {
            return false;
        }
        if self.status.is_some_and(|s| s != ticket.status) {
            return false;
        }
        match &self.search {
            Some(text) => {
                let needle = text.to_lowercase();
                ticket.title.to_lowercase().contains(&needle)
                    || ticket.description.to_lowercase().contains(&needle)
            }
            None => true,
        }
    }

    /// Apply the filter to an in-memory ticket list, keeping order.
    pub fn apply<'a>(&self, tickets: &'a [Ticket]) -> Vec<&'a Ticket> {
        let matching = tickets.iter().filter(|t| self.matches(t));
        match self.limit {
            Some(n) => matching.take(n as usize).collect(),
            None => matching.collect(),
        }
    }

    /// Load matching tickets from the store, newest first.
    ///
    /// Enum criteria are pushed into SQL; the text search and the limit are
    /// applied through [`TicketFilter::matches`] so both paths agree.
    pub async fn tickets(self, db: &Database) -> Result<Vec<Ticket>> {
        let filter = self;
        db.reader()
            .call(move |conn| {
                let (sql, params) = filter.build_sql();
                let param_refs: Vec<&dyn rusqlite::types::ToSql> =
                    params.iter().map(|p| p.as_ref()).collect();
                let mut stmt = conn.prepare(&sql)?;
                let rows = stmt.query_map(param_refs.as_slice(), ticket_from_row)?;

                let mut out = Vec::new();
                for row in rows {
                    let ticket = row?;
                    if filter.limit.is_some_and(|n| out.len() >= n as usize) {
                        break;
                    }
                    if filter.matches(&ticket) {
                        out.push(ticket);
                    }
                }
                Ok::<Vec<Ticket>, rusqlite::Error>(out)
            })
            .await
            .map_err(|e| Error::Database(e.to_string()))
    }

    /// Count matching tickets.
    pub async fn count(self, db: &Database) -> Result<u64> {
        let mut filter = self;
        filter.limit = None;
        Ok(filter.tickets(db).await?.len() as u64)
    }

    /// Load matching tickets and render them as JSON.
    pub async fn to_json(self, db: &Database) -> Result<String> {
        let rows = self.tickets(db).await?;
        serde_json::to_string_pretty(&rows).map_err(|e| Error::Other(e.to_string()))
    }

    /// Load matching tickets and render them as CSV.
    pub async fn to_csv(self, db: &Database) -> Result<String> {
        let rows = self.tickets(db).await?;
        let mut out = String::new();
        out.push_str("id,title,description,category,priority,status,created_at\n");
        for t in &rows {
            out.push_str(&format!(
                "{},{},{},{},{},{},{}\n",
                csv_escape(&t.id),
                csv_escape(&t.title),
                csv_escape(&t.description),
                t.category,
                t.priority,
                t.status,
                t.created_at.to_rfc3339(),
            ));
        }
        Ok(out)
    }

    fn build_sql(&self) -> (String, Vec<Box<dyn rusqlite::types::ToSql>>) {
        let mut params: Vec<Box<dyn rusqlite::types::ToSql>> = Vec::new();
        let mut wheres = Vec::new();

        if let Some(category) = self.category {
            params.push(Box::new(category));
            wheres.push(format!("category = ?{}", params.len()));
        }
        if let Some(priority) = self.priority {
            params.push(Box::new(priority));
            wheres.push(format!("priority = ?{}", params.len()));
        }
        if let Some(status) = self.status {
            params.push(Box::new(status));
            wheres.push(format!("status = ?{}", params.len()));
        }

        let mut sql = format!("SELECT {TICKET_COLUMNS} FROM tickets");
        if !wheres.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&wheres.join(" AND "));
        }
        sql.push_str(" ORDER BY created_at DESC, id DESC");

        (sql, params)
    }
}

fn csv_escape(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}
