// src/calendar.rs
//! # Week-Ahead Grid
//! Buckets economic-calendar events by weekday for display. Pure logic, no
//! I/O; the provider lives in `sources::calendar`.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Display columns of the grid, in order.
pub const WEEKDAYS: [&str; 5] = ["Mon", "Tue", "Wed", "Thu", "Fri"];

/// One upcoming scheduled event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarEvent {
    pub date: NaiveDate,
    /// Short weekday name ("Mon".."Sun"), derived from `date` at ingest.
    pub weekday: String,
    pub region: String,
    pub event: String,
}

/// Fixed 5-bucket Mon–Fri structure. All buckets are always present,
/// possibly empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WeekGrid {
    days: [Vec<String>; 5],
}

impl WeekGrid {
    /// Bucket for a weekday abbreviation; `None` for weekends/unknown names.
    pub fn day(&self, weekday: &str) -> Option<&[String]> {
        WEEKDAYS
            .iter()
            .position(|d| *d == weekday)
            .map(|i| self.days[i].as_slice())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &[String])> {
        WEEKDAYS
            .iter()
            .zip(self.days.iter())
            .map(|(d, items)| (*d, items.as_slice()))
    }

    pub fn is_empty(&self) -> bool {
        self.days.iter().all(|d| d.is_empty())
    }
}

/// Group events into the Mon–Fri grid as `"{region}: {event}"` lines.
/// Weekend events are silently dropped; input order within a day is kept.
pub fn group_by_weekday(events: &[CalendarEvent]) -> WeekGrid {
    let mut grid = WeekGrid::default();
    for ev in events {
        if let Some(i) = WEEKDAYS.iter().position(|d| *d == ev.weekday) {
            grid.days[i].push(format!("{}: {}", ev.region, ev.event));
        }
    }
    grid
}
