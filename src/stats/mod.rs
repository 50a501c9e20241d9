pub mod types;

pub use types::*;

use crate::error::Result;
use crate::storage::Database;
use crate::ticket::{Category, Priority, Status, Ticket};

/// Divisor for `avg_tickets_per_day`. Fixed, not derived from `created_at`.
pub const OBSERVATION_WINDOW_DAYS: u32 = 7;

/// Compute stats over an in-memory ticket collection in a single pass.
pub fn compute_stats<'a, I>(tickets: I) -> Stats
where
    I: IntoIterator<Item = &'a Ticket>,
{
    let mut stats = Stats::default();
    for ticket in tickets {
        record(&mut stats, ticket.category, ticket.priority, ticket.status, 1);
    }
    finish(stats)
}

/// Compute stats from the store with one grouped query.
pub async fn compute_stats_db(db: &Database) -> Result<Stats> {
    let groups = db
        .reader()
        .call(|conn| {
            let mut stmt = conn.prepare(
                "SELECT category, priority, status, COUNT(*)
                 FROM tickets
                 GROUP BY category, priority, status",
            )?;
            let rows = stmt.query_map([], |row| {
                Ok((
                    row.get::<_, Category>(0)?,
                    row.get::<_, Priority>(1)?,
                    row.get::<_, Status>(2)?,
                    row.get::<_, i64>(3)? as u64,
                ))
            })?;
            let result: std::result::Result<Vec<_>, _> = rows.collect();
            result
        })
        .await?;

    let mut stats = Stats::default();
    for (category, priority, status, count) in groups {
        record(&mut stats, category, priority, status, count);
    }
    Ok(finish(stats))
}

fn record(stats: &mut Stats, category: Category, priority: Priority, status: Status, count: u64) {
    stats.total_tickets += count;
    if status == Status::Open {
        stats.open_tickets += count;
    }
    *stats.category_breakdown.entry(category).or_insert(0) += count;
    *stats.priority_breakdown.entry(priority).or_insert(0) += count;
}

fn finish(mut stats: Stats) -> Stats {
    stats.avg_tickets_per_day = round1(stats.total_tickets as f64 / OBSERVATION_WINDOW_DAYS as f64);
    stats
}

fn round1(x: f64) -> f64 {
    (x * 10.0).round() / 10.0
}
