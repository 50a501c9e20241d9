pub mod repository;

use rusqlite_migration::{Migrations, M};

use crate::error::{Error, Result};

// Both connections wait on each other's locks instead of failing with SQLITE_BUSY.
const CONNECTION_PRAGMAS: &str = "PRAGMA journal_mode=WAL; PRAGMA busy_timeout=5000;";

fn schema_migrations() -> Migrations<'static> {
    Migrations::new(vec![M::up(include_str!("migrations/001_initial.sql"))])
}

/// The ticket store. Intake and status changes go through `writer`; listing,
/// stats and config reads use `reader`, so a slow export never holds up a new
/// ticket. Both connections run in WAL mode.
#[derive(Clone)]
pub struct Database {
    writer: tokio_rusqlite::Connection,
    reader: tokio_rusqlite::Connection,
}

impl Database {
    /// Open `~/.ticketdesk/ticketdesk.db`, creating the directory if needed.
    pub async fn open() -> Result<Self> {
        let dir = dirs::home_dir()
            .ok_or_else(|| Error::Config("cannot determine home directory".into()))?
            .join(".ticketdesk");
        std::fs::create_dir_all(&dir).map_err(|e| Error::Config(e.to_string()))?;
        Self::open_at(dir.join("ticketdesk.db")).await
    }

    /// Open (or create) a ticket store at `path` and bring its schema up to date.
    pub async fn open_at(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        let writer = tokio_rusqlite::Connection::open(&path).await?;
        Self::init_writer(&writer).await?;

        let reader = tokio_rusqlite::Connection::open(&path).await?;
        Self::init_reader(&reader).await?;

        Ok(Self { writer, reader })
    }

    /// Empty throwaway store, used by tests.
    pub async fn open_memory() -> Result<Self> {
        let writer = tokio_rusqlite::Connection::open_in_memory().await?;
        Self::init_writer(&writer).await?;

        // A second in-memory connection would see an empty database.
        Ok(Self {
            reader: writer.clone(),
            writer,
        })
    }

    async fn init_writer(conn: &tokio_rusqlite::Connection) -> Result<()> {
        conn.call(|conn| {
            conn.execute_batch(CONNECTION_PRAGMAS)
                .map_err(|e| e.to_string())?;
            schema_migrations()
                .to_latest(conn)
                .map_err(|e| e.to_string())
        })
        .await
        .map_err(|e| Error::Migration(e.to_string()))
    }

    async fn init_reader(conn: &tokio_rusqlite::Connection) -> Result<()> {
        conn.call(|conn| conn.execute_batch(CONNECTION_PRAGMAS))
            .await?;
        Ok(())
    }

    pub fn writer(&self) -> &tokio_rusqlite::Connection {
        &self.writer
    }

    pub fn reader(&self) -> &tokio_rusqlite::Connection {
        &self.reader
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_migrations_valid() {
        assert!(schema_migrations().validate().is_ok());
    }

    #[tokio::test]
    async fn test_open_memory() {
        let db = Database::open_memory().await.unwrap();

        let tables: Vec<String> = db
            .reader()
            .call(|conn| {
                let mut stmt = conn.prepare(
                    "SELECT name FROM sqlite_master WHERE type='table' ORDER BY name",
                )?;
                let rows = stmt.query_map([], |row| row.get(0))?;
                Ok::<Vec<String>, rusqlite::Error>(rows.filter_map(|r| r.ok()).collect())
            })
            .await
            .unwrap();

        assert!(tables.contains(&"tickets".to_string()));
        assert!(tables.contains(&"app_config".to_string()));
    }

    #[tokio::test]
    async fn test_open_at_reopens_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("desk.db");

        let db = Database::open_at(&path).await.unwrap();
        db.writer()
            .call(|conn| repository::set_config(conn, "llm_provider", "none"))
            .await
            .unwrap();
        drop(db);

        // Migrations must be a no-op the second time around.
        let db = Database::open_at(&path).await.unwrap();
        let value = db
            .reader()
            .call(|conn| repository::get_config(conn, "llm_provider"))
            .await
            .unwrap();
        assert_eq!(value.as_deref(), Some("none"));
    }

    #[tokio::test]
    async fn test_check_constraints_reject_unknown_values() {
        let db = Database::open_memory().await.unwrap();
        let result = db
            .writer()
            .call(|conn| {
                conn.execute(
                    "INSERT INTO tickets (ticket_id, title, description, category, priority, status, created_at, updated_at)
                     VALUES ('x', 't', 'd', 'shipping', 'low', 'open', '2025-01-01T00:00:00Z', '2025-01-01T00:00:00Z')",
                    [],
                )
            })
            .await;
        assert!(result.is_err());
    }
}
