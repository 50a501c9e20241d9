use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::ticket::{Status, Ticket};

/// Columns selected by every ticket query, in the order `ticket_from_row` reads them.
pub const TICKET_COLUMNS: &str =
    "ticket_id, title, description, category, priority, status, created_at";

// ── Tickets ────────────────────────────────────────────────────────

pub fn insert_ticket(conn: &Connection, ticket: &Ticket) -> Result<(), rusqlite::Error> {
    let created_at = format_timestamp(&ticket.created_at);
    conn.execute(
        "INSERT INTO tickets (
            ticket_id, title, description, category, priority, status, created_at, updated_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)",
        params![
            ticket.id,
            ticket.title,
            ticket.description,
            ticket.category,
            ticket.priority,
            ticket.status,
            created_at,
        ],
    )?;
    Ok(())
}

pub fn get_ticket(conn: &Connection, ticket_id: &str) -> Result<Option<Ticket>, rusqlite::Error> {
    conn.query_row(
        &format!("SELECT {TICKET_COLUMNS} FROM tickets WHERE ticket_id = ?1"),
        params![ticket_id],
        ticket_from_row,
    )
    .optional()
}

/// Set a ticket's status. Returns false if no ticket has that id.
pub fn update_ticket_status(
    conn: &Connection,
    ticket_id: &str,
    status: Status,
) -> Result<bool, rusqlite::Error> {
    let changed = conn.execute(
        "UPDATE tickets SET status = ?2, updated_at = ?3 WHERE ticket_id = ?1",
        params![ticket_id, status, format_timestamp(&Utc::now())],
    )?;
    Ok(changed > 0)
}

/// Every ticket, newest first.
pub fn all_tickets(conn: &Connection) -> Result<Vec<Ticket>, rusqlite::Error> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {TICKET_COLUMNS} FROM tickets ORDER BY created_at DESC, id DESC"
    ))?;
    let rows = stmt.query_map([], ticket_from_row)?;
    let result: Result<Vec<Ticket>, _> = rows.collect();
    result
}

pub fn ticket_from_row(row: &Row<'_>) -> Result<Ticket, rusqlite::Error> {
    let created_at: String = row.get(6)?;
    Ok(Ticket {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        category: row.get(3)?,
        priority: row.get(4)?,
        status: row.get(5)?,
        created_at: parse_timestamp(&created_at)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(6, Type::Text, Box::new(e)))?,
    })
}

// Fixed-width RFC 3339 so text ordering matches time ordering.
fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(s: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    Ok(DateTime::parse_from_rfc3339(s)?.with_timezone(&Utc))
}

// ── Config ─────────────────────────────────────────────────────────

pub fn get_config(conn: &Connection, key: &str) -> Result<Option<String>, rusqlite::Error> {
    conn.query_row(
        "SELECT value FROM app_config WHERE key = ?1",
        params![key],
        |row| row.get(0),
    )
    .optional()
}

pub fn set_config(conn: &Connection, key: &str, value: &str) -> Result<(), rusqlite::Error> {
    conn.execute(
        "INSERT INTO app_config (key, value, updated_at) VALUES (?1, ?2, datetime('now'))
         ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
        params![key, value],
    )?;
    Ok(())
}

pub fn list_config(conn: &Connection) -> Result<Vec<(String, String)>, rusqlite::Error> {
    let mut stmt = conn.prepare("SELECT key, value FROM app_config ORDER BY key")?;
    let rows = stmt.query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?;
    let result: Result<Vec<(String, String)>, _> = rows.collect();
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::Database;
    use crate::ticket::{Category, Priority};

    fn sample(title: &str) -> Ticket {
        Ticket::open(
            title.to_string(),
            "Card was charged twice this month".to_string(),
            Category::Billing,
            Priority::High,
        )
    }

    #[tokio::test]
    async fn test_config_round_trip() {
        let db = Database::open_memory().await.unwrap();
        let items = db
            .writer()
            .call(|conn| {
                assert_eq!(get_config(conn, "llm_model")?, None);
                set_config(conn, "llm_model", "claude-haiku-4-5")?;
                set_config(conn, "llm_model", "claude-sonnet-4-5")?;
                set_config(conn, "llm_provider", "anthropic")?;
                assert_eq!(
                    get_config(conn, "llm_model")?.as_deref(),
                    Some("claude-sonnet-4-5")
                );
                list_config(conn)
            })
            .await
            .unwrap();
        assert_eq!(
            items,
            vec![
                ("llm_model".to_string(), "claude-sonnet-4-5".to_string()),
                ("llm_provider".to_string(), "anthropic".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_ticket_round_trip() {
        let db = Database::open_memory().await.unwrap();
        let ticket = sample("Double charge");
        let expected = ticket.clone();
        let loaded = db
            .writer()
            .call(move |conn| {
                insert_ticket(conn, &ticket)?;
                get_ticket(conn, &ticket.id)
            })
            .await
            .unwrap()
            .unwrap();

        assert_eq!(loaded.id, expected.id);
        assert_eq!(loaded.title, expected.title);
        assert_eq!(loaded.category, Category::Billing);
        assert_eq!(loaded.priority, Priority::High);
        assert_eq!(loaded.status, Status::Open);
        // Stored at microsecond precision.
        assert_eq!(
            loaded.created_at.timestamp_micros(),
            expected.created_at.timestamp_micros()
        );
    }

    #[tokio::test]
    async fn test_get_missing_ticket() {
        let db = Database::open_memory().await.unwrap();
        let found = db
            .reader()
            .call(|conn| get_ticket(conn, "no-such-id"))
            .await
            .unwrap();
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn test_update_status() {
        let db = Database::open_memory().await.unwrap();
        let ticket = sample("Refund");
        let id = ticket.id.clone();
        let (changed, missing, reloaded) = db
            .writer()
            .call(move |conn| {
                insert_ticket(conn, &ticket)?;
                let changed = update_ticket_status(conn, &id, Status::Resolved)?;
                let missing = update_ticket_status(conn, "nope", Status::Closed)?;
                Ok::<_, rusqlite::Error>((changed, missing, get_ticket(conn, &id)?))
            })
            .await
            .unwrap();
        assert!(changed);
        assert!(!missing);
        assert_eq!(reloaded.unwrap().status, Status::Resolved);
    }

    #[tokio::test]
    async fn test_all_tickets_newest_first() {
        let db = Database::open_memory().await.unwrap();
        let mut older = sample("older");
        older.created_at = Utc::now() - chrono::Duration::days(2);
        let newer = sample("newer");
        let tickets = db
            .writer()
            .call(move |conn| {
                insert_ticket(conn, &newer)?;
                insert_ticket(conn, &older)?;
                all_tickets(conn)
            })
            .await
            .unwrap();
        let titles: Vec<&str> = tickets.iter().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, vec!["newer", "older"]);
    }
}
