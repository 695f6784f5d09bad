//! Calendar core: streaming ICS ingestion and populated calendar views.
//!
//! This crate does three things:
//! - [`parse`] consumes an RFC-5545-style calendar document from an async
//!   line stream and produces a [`Calendar`] (uid-keyed events plus
//!   categories), one logical line at a time;
//! - [`populate`] / [`unpopulate`] convert between that compact persisted
//!   form and the [`PopulatedCalendar`] the editing layer works with
//!   (resolved categories, derived occurrence fields);
//! - [`recurrence`] defines the pluggable occurrence-expansion seam used
//!   to derive those fields, with an rrule-backed default.
//!
//! The UI, transport, and persistence layers live elsewhere and touch this
//! crate only through those entry points and the plain data model.

pub mod calendar;
pub mod error;
pub mod event;
pub mod ics;
pub mod populate;
pub mod recurrence;

pub use calendar::{Calendar, Category, DEFAULT_CATEGORY_UID, PopulatedCalendar};
pub use error::{AcalResult, ParseError};
pub use event::{Event, PopulatedEvent};
pub use ics::{Parser, parse};
pub use populate::{populate, populate_with, unpopulate};
pub use recurrence::{OccurrenceExpander, RruleExpander};
