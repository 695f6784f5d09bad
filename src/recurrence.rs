//! Occurrence expansion for recurring events.
//!
//! The populated view needs the concrete start instant of every rendered
//! occurrence, but rule evaluation itself is a pluggable concern: the
//! calendar core only defines the contract and ships a default expander
//! backed by the `rrule` crate.

use chrono::{DateTime, Duration, Utc};
use rrule::RRuleSet;
use tracing::warn;

/// Expands a recurrence rule into ordered occurrence start instants.
///
/// The first element is always `start`; implementations bound their own
/// output (rules can be unbounded).
pub trait OccurrenceExpander {
    fn expand(&self, start: DateTime<Utc>, end: DateTime<Utc>, rrule: &str) -> Vec<DateTime<Utc>>;
}

/// Default expander built on the `rrule` crate.
///
/// Expansion stops at `horizon` past the event start or after `limit`
/// occurrences, whichever comes first; the populated view feeds grid
/// rendering, not archival expansion. Rules that fail to parse degrade to a
/// single occurrence rather than failing the transform.
#[derive(Debug, Clone)]
pub struct RruleExpander {
    pub horizon: Duration,
    pub limit: u16,
}

impl Default for RruleExpander {
    fn default() -> Self {
        RruleExpander {
            horizon: Duration::days(2 * 365),
            limit: 730,
        }
    }
}

impl OccurrenceExpander for RruleExpander {
    fn expand(&self, start: DateTime<Utc>, _end: DateTime<Utc>, rrule: &str) -> Vec<DateTime<Utc>> {
        // The rrule crate wants DTSTART context alongside the rule.
        let doc = format!("DTSTART:{}\nRRULE:{}", start.format("%Y%m%dT%H%M%SZ"), rrule);

        let rule_set: RRuleSet = match doc.parse() {
            Ok(set) => set,
            Err(err) => {
                warn!(%rrule, %err, "unparseable recurrence rule, treating as single occurrence");
                return vec![start];
            }
        };

        // after/before are exclusive; widen by a second to keep the range
        // inclusive of its endpoints.
        let tz: rrule::Tz = Utc.into();
        let after = (start - Duration::seconds(1)).with_timezone(&tz);
        let before = (start + self.horizon + Duration::seconds(1)).with_timezone(&tz);

        let result = rule_set.after(after).before(before).all(self.limit);

        let mut dates: Vec<DateTime<Utc>> = result
            .dates
            .iter()
            .map(|dt| dt.with_timezone(&Utc))
            .collect();

        // The rule may not generate its own DTSTART (e.g. BYDAY that
        // excludes it); the contract requires it first regardless.
        if dates.first() != Some(&start) {
            dates.insert(0, start);
        }
        dates
    }
}
