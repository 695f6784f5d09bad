//! Populate / unpopulate: the round trip between the compact persisted
//! calendar and the editing-layer view.
//!
//! `populate` resolves each event's category key into the category object
//! and derives the occurrence-rendering fields (`dates`, `last`) from
//! `start`/`end`/`rrule`. `unpopulate` is its exact inverse on the
//! persisted fields and drops everything derived, so
//! `unpopulate(&populate(&c)) == c` for any well-formed calendar.
//!
//! Both transforms are pure and total. A category key that does not
//! resolve is a broken data-model invariant and panics.

use crate::calendar::{Calendar, PopulatedCalendar};
use crate::event::{Event, PopulatedEvent};
use crate::recurrence::{OccurrenceExpander, RruleExpander};

/// Build the editing-layer view of a calendar using the default
/// rrule-backed expander.
pub fn populate(calendar: &Calendar) -> PopulatedCalendar {
    populate_with(calendar, &RruleExpander::default())
}

/// Build the editing-layer view with a caller-supplied occurrence
/// expander.
pub fn populate_with(
    calendar: &Calendar,
    expander: &impl OccurrenceExpander,
) -> PopulatedCalendar {
    let events = calendar
        .events
        .iter()
        .map(|(uid, event)| {
            let category = calendar
                .categories
                .get(&event.category)
                .unwrap_or_else(|| {
                    panic!(
                        "event '{}' references unknown category '{}'",
                        event.uid, event.category
                    )
                })
                .clone();

            let dates = match &event.rrule {
                Some(rrule) => expander.expand(event.start, event.end, rrule),
                None => vec![event.start],
            };
            let duration = event.end - event.start;
            let last = dates.last().copied().unwrap_or(event.start) + duration;

            let populated = PopulatedEvent {
                uid: event.uid.clone(),
                start: event.start,
                end: event.end,
                title: event.title.clone(),
                description: event.description.clone(),
                location: event.location.clone(),
                rrule: event.rrule.clone(),
                category,
                dates,
                last,
            };
            (uid.clone(), populated)
        })
        .collect();

    PopulatedCalendar {
        events,
        categories: calendar.categories.clone(),
    }
}

/// Collapse an editing-layer calendar back to its compact persisted form,
/// dropping all derived fields.
pub fn unpopulate(populated: &PopulatedCalendar) -> Calendar {
    let events = populated
        .events
        .iter()
        .map(|(uid, event)| {
            let compact = Event {
                uid: event.uid.clone(),
                start: event.start,
                end: event.end,
                title: event.title.clone(),
                description: event.description.clone(),
                location: event.location.clone(),
                rrule: event.rrule.clone(),
                category: event.category.uid.clone(),
            };
            (uid.clone(), compact)
        })
        .collect();

    Calendar {
        events,
        categories: populated.categories.clone(),
    }
}
