pub mod classify;
pub mod error;
pub mod llm;
pub mod query;
pub mod stats;
pub mod storage;
pub mod text_util;
pub mod ticket;

pub use classify::{ClassificationSuggestion, Classifier, KeywordSuggester, Suggester};
pub use error::{Error, Result};
pub use query::filter::TicketFilter;
pub use stats::{compute_stats, Stats};
pub use storage::Database;
pub use ticket::{Category, NewTicket, Priority, Status, Ticket};

use storage::repository;

/// Main entry point: a ticket store plus the classifier used at intake.
pub struct TicketDesk {
    db: Database,
    classifier: Classifier,
}

impl TicketDesk {
    pub fn new(db: Database, classifier: Classifier) -> Self {
        Self { db, classifier }
    }

    /// Access the database (for direct queries in the CLI).
    pub fn db(&self) -> &Database {
        &self.db
    }

    pub fn classifier(&self) -> &Classifier {
        &self.classifier
    }

    // ── Classification ─────────────────────────────────────────────

    /// Suggest a category and priority for a description. Never fails.
    pub async fn classify(&self, description: &str) -> ClassificationSuggestion {
        self.classifier.classify(description).await
    }

    // ── Tickets ────────────────────────────────────────────────────

    /// Validate and store a new ticket.
    ///
    /// Explicit category/priority on `new` are kept as-is. Whatever is
    /// missing comes from the classifier, or `general`/`medium` when it has
    /// no suggestion.
    pub async fn create_ticket(&self, new: NewTicket) -> Result<Ticket> {
        let (title, description) = new.validate()?;

        let (category, priority) = match (new.category, new.priority) {
            (Some(c), Some(p)) => (c, p),
            (category, priority) => {
                let suggestion = self.classifier.classify(&description).await;
                (
                    category
                        .or(suggestion.category())
                        .unwrap_or(Category::General),
                    priority
                        .or(suggestion.priority())
                        .unwrap_or(Priority::Medium),
                )
            }
        };

        let ticket = Ticket::open(title, description, category, priority);
        self.db
            .writer()
            .call({
                let ticket = ticket.clone();
                move |conn| repository::insert_ticket(conn, &ticket)
            })
            .await?;

        log::info!(
            "Created ticket {} [{}/{}]",
            ticket.id,
            ticket.category,
            ticket.priority
        );
        Ok(ticket)
    }

    pub async fn get_ticket(&self, ticket_id: &str) -> Result<Ticket> {
        let id = ticket_id.to_string();
        self.db
            .reader()
            .call(move |conn| repository::get_ticket(conn, &id))
            .await?
            .ok_or_else(|| Error::NotFound(ticket_id.to_string()))
    }

    /// Move a ticket to any status and return the updated record.
    pub async fn update_status(&self, ticket_id: &str, status: Status) -> Result<Ticket> {
        let id = ticket_id.to_string();
        let updated = self
            .db
            .writer()
            .call(move |conn| {
                if !repository::update_ticket_status(conn, &id, status)? {
                    return Ok(None);
                }
                repository::get_ticket(conn, &id)
            })
            .await?;

        let ticket = updated.ok_or_else(|| Error::NotFound(ticket_id.to_string()))?;
        log::info!("Ticket {} is now {}", ticket.id, ticket.status);
        Ok(ticket)
    }

    pub async fn list_tickets(&self, filter: TicketFilter) -> Result<Vec<Ticket>> {
        filter.tickets(&self.db).await
    }

    /// Every ticket currently in the store, newest first.
    pub async fn all_tickets(&self) -> Result<Vec<Ticket>> {
        self.db
            .reader()
            .call(|conn| repository::all_tickets(conn))
            .await
            .map_err(|e| Error::Database(e.to_string()))
    }

    // ── Stats ──────────────────────────────────────────────────────

    pub async fn stats(&self) -> Result<Stats> {
        stats::compute_stats_db(&self.db).await
    }

    // ── Config ─────────────────────────────────────────────────────

    pub async fn config_get(&self, key: &str) -> Result<Option<String>> {
        self.db
            .reader()
            .call({
                let key = key.to_string();
                move |conn| repository::get_config(conn, &key)
            })
            .await
            .map_err(|e| Error::Database(e.to_string()))
    }

    pub async fn config_set(&self, key: &str, value: &str) -> Result<()> {
        self.db
            .writer()
            .call({
                let key = key.to_string();
                let value = value.to_string();
                move |conn| repository::set_config(conn, &key, &value)
            })
            .await
            .map_err(|e| Error::Database(e.to_string()))
    }

    pub async fn config_list(&self) -> Result<Vec<(String, String)>> {
        self.db
            .reader()
            .call(|conn| repository::list_config(conn))
            .await
            .map_err(|e| Error::Database(e.to_string()))
    }
}
