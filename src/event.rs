//! Calendar event types.
//!
//! `Event` is the compact persisted record: category is a key into the
//! owning calendar's category map and timestamps serialize as millisecond
//! numbers. `PopulatedEvent` is the editing-layer twin produced by
//! `populate`: the category is resolved to the actual object and the
//! occurrence fields used for grid rendering are filled in.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::calendar::Category;

/// A scheduled calendar item (compact persisted form).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Globally unique identifier; primary key within a calendar.
    pub uid: String,

    /// Inclusive start instant.
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub start: DateTime<Utc>,

    /// End instant. All-day events decode to the last millisecond of
    /// their final day, so `start <= end` always holds.
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub end: DateTime<Utc>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,

    /// Recurrence rule text, carried verbatim and never interpreted here.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rrule: Option<String>,

    /// Key into the calendar's category map.
    pub category: String,
}

/// An event enriched for interactive editing.
///
/// Holds the same persisted fields as [`Event`] plus derived data:
/// `category` is the resolved object rather than a key, `dates` lists the
/// start instant of every rendered occurrence, and `last` is the end
/// instant of the final occurrence. The derived fields are reconstructable
/// from `start`/`end`/`rrule` and are dropped again by `unpopulate`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PopulatedEvent {
    pub uid: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub rrule: Option<String>,

    /// Resolved category object; its `uid` survives `unpopulate`.
    pub category: Category,

    /// Start instants of each occurrence, ordered; `[start]` when the
    /// event does not recur.
    pub dates: Vec<DateTime<Utc>>,

    /// End instant of the final occurrence; equals `end` when the event
    /// does not recur.
    pub last: DateTime<Utc>,
}

impl PopulatedEvent {
    /// Create a blank event for the given slot, as the editing layer does
    /// when an empty grid cell is clicked. The uid is freshly generated.
    pub fn draft(start: DateTime<Utc>, end: DateTime<Utc>, category: Category) -> Self {
        PopulatedEvent {
            uid: Uuid::new_v4().to_string(),
            start,
            end,
            title: None,
            description: None,
            location: None,
            rrule: None,
            category,
            dates: vec![start],
            last: end,
        }
    }
}
