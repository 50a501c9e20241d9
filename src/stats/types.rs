use std::collections::BTreeMap;

use serde::Serialize;

use crate::ticket::{Category, Priority};

/// Snapshot of the ticket collection. Always a pure function of the tickets
/// it was computed from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Stats {
    pub total_tickets: u64,
    pub open_tickets: u64,
    /// `total_tickets` over a fixed seven-day window, one decimal place.
    pub avg_tickets_per_day: f64,
    /// Every category is present, zero when no tickets fall in it.
    pub category_breakdown: BTreeMap<Category, u64>,
    /// Every priority is present, zero when no tickets fall in it.
    pub priority_breakdown: BTreeMap<Priority, u64>,
}

impl Default for Stats {
    fn default() -> Self {
        Self {
            total_tickets: 0,
            open_tickets: 0,
            avg_tickets_per_day: 0.0,
            category_breakdown: Category::ALL.iter().map(|c| (*c, 0)).collect(),
            priority_breakdown: Priority::ALL.iter().map(|p| (*p, 0)).collect(),
        }
    }
}
