//! Streaming calendar parsing.
//!
//! The parser is a stack of block contexts: one push per nested `BEGIN:`,
//! one pop per matching `END:`. Each context accepts one logical line at a
//! time, so arbitrarily large documents parse in constant extra memory.
//! Context transitions re-deliver the line that triggered them, which lets
//! the header hand its first `BEGIN:` straight to the dispatch context.
//!
//! Parsing is all-or-nothing: the accumulated events are only assembled
//! into a [`Calendar`] once the closing calendar marker has been seen, and
//! any violation aborts the whole parse.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::warn;

use crate::calendar::{Calendar, DEFAULT_CATEGORY_UID};
use crate::error::{AcalResult, ParseError};
use crate::event::Event;
use crate::ics::datetime::{DatePosition, decode_instant};
use crate::ics::line::ContentLine;
use crate::ics::unfold::Unfolder;

const BEGIN_CALENDAR: &str = "BEGIN:VCALENDAR";
const END_CALENDAR: &str = "END:VCALENDAR";
const BEGIN_EVENT: &str = "BEGIN:VEVENT";
const END_EVENT: &str = "END:VEVENT";
const SUPPORTED_VERSION: &str = "2.0";

/// Parse a calendar document from an async line stream.
///
/// Consumes one line at a time and resolves once the stream ends; the
/// first violation aborts with a descriptive error and no partial result.
pub async fn parse<R>(reader: R) -> AcalResult<Calendar>
where
    R: AsyncBufRead + Unpin,
{
    let mut parser = Parser::new();
    let mut lines = reader.lines();
    while let Some(line) = lines.next_line().await? {
        parser.feed_line(&line)?;
    }
    parser.finish()
}

/// Push-based parser for callers that deliver lines themselves.
///
/// Feed *physical* lines in order (unfolding happens internally), then
/// call [`Parser::finish`] at end of stream. One parser per document;
/// to cancel, drop it.
#[derive(Debug)]
pub struct Parser {
    unfolder: Unfolder,
    stack: Vec<Context>,
    events: HashMap<String, Event>,
    done: bool,
}

/// One entry in the parse stack; each variant owns the state of the block
/// it is reading.
#[derive(Debug)]
enum Context {
    /// Calendar preamble, up to the first nested block.
    Header { opened: bool, found_version: bool },
    /// Dispatch point between sibling blocks at the top level.
    Delegate,
    /// Inside a `VEVENT`, accumulating fields.
    Event(EventBuilder),
    /// Inside an unknown block, waiting for its literal end marker.
    Skip { end_marker: String },
}

/// What a context decided about the line it was handed.
enum Step {
    /// Line consumed; stay in this context.
    Consumed,
    /// Line consumed; enter a nested block.
    Push(Context),
    /// Context finished; hand the same line to the replacement.
    Replace(Context),
    /// Block closed; line consumed, resume the enclosing context.
    Pop,
    /// Calendar closed; everything after is not inspected.
    Done,
}

impl Parser {
    pub fn new() -> Self {
        Parser {
            unfolder: Unfolder::new(),
            stack: vec![Context::Header {
                opened: false,
                found_version: false,
            }],
            events: HashMap::new(),
            done: false,
        }
    }

    /// Feed one physical line.
    pub fn feed_line(&mut self, physical: &str) -> AcalResult<()> {
        if self.done {
            return Ok(());
        }
        if let Some(logical) = self.unfolder.push(physical) {
            self.accept(&logical)?;
        }
        Ok(())
    }

    /// Signal end of stream and take the assembled calendar.
    pub fn finish(mut self) -> AcalResult<Calendar> {
        if !self.done {
            if let Some(logical) = self.unfolder.flush() {
                self.accept(&logical)?;
            }
        }
        if !self.done {
            return Err(ParseError::UnexpectedEof);
        }

        let mut calendar = Calendar::new();
        calendar.events = self.events;
        Ok(calendar)
    }

    /// Route one logical line through the context stack, re-delivering on
    /// transitions until some context consumes it.
    fn accept(&mut self, line: &str) -> AcalResult<()> {
        loop {
            let context = self
                .stack
                .last_mut()
                .expect("parse stack is never empty before Done");

            let step = match context {
                Context::Header {
                    opened,
                    found_version,
                } => Self::accept_header(line, opened, found_version)?,
                Context::Delegate => Self::accept_delegate(line)?,
                Context::Event(builder) => Self::accept_event(line, builder)?,
                Context::Skip { end_marker } => Self::accept_skip(line, end_marker),
            };

            match step {
                Step::Consumed => return Ok(()),
                Step::Push(context) => {
                    self.stack.push(context);
                    return Ok(());
                }
                Step::Replace(context) => {
                    *self.stack.last_mut().unwrap() = context;
                    // Same line, new context.
                }
                Step::Pop => {
                    let closed = self.stack.pop().unwrap();
                    if let Context::Event(builder) = closed {
                        self.commit(builder)?;
                    }
                    return Ok(());
                }
                Step::Done => {
                    self.done = true;
                    self.stack.clear();
                    return Ok(());
                }
            }
        }
    }

    fn accept_header(line: &str, opened: &mut bool, found_version: &mut bool) -> AcalResult<Step> {
        if !*opened {
            if line != BEGIN_CALENDAR {
                return Err(ParseError::UnknownLine(line.to_string()));
            }
            *opened = true;
            return Ok(Step::Consumed);
        }

        if line.starts_with("BEGIN:") {
            if !*found_version {
                return Err(ParseError::Version(format!(
                    "no VERSION:{SUPPORTED_VERSION} before first block"
                )));
            }
            return Ok(Step::Replace(Context::Delegate));
        }
        if line == END_CALENDAR {
            if !*found_version {
                return Err(ParseError::Version(format!(
                    "no VERSION:{SUPPORTED_VERSION} declared"
                )));
            }
            return Ok(Step::Done);
        }

        let content = ContentLine::decode(line)?;
        if content.key == "VERSION" {
            if content.value != SUPPORTED_VERSION {
                return Err(ParseError::Version(content.value));
            }
            *found_version = true;
        }
        // Other header properties (PRODID, CALSCALE, ...) are ignored.
        Ok(Step::Consumed)
    }

    fn accept_delegate(line: &str) -> AcalResult<Step> {
        if line == END_CALENDAR {
            return Ok(Step::Done);
        }
        if line == BEGIN_EVENT {
            return Ok(Step::Push(Context::Event(EventBuilder::default())));
        }
        if let Some(kind) = line.strip_prefix("BEGIN:") {
            warn!(block = kind, "skipping unsupported block");
            return Ok(Step::Push(Context::Skip {
                end_marker: format!("END:{kind}"),
            }));
        }
        Err(ParseError::UnknownLine(line.to_string()))
    }

    fn accept_event(line: &str, builder: &mut EventBuilder) -> AcalResult<Step> {
        if line == END_EVENT {
            return Ok(Step::Pop);
        }
        if let Some(kind) = line.strip_prefix("BEGIN:") {
            warn!(block = kind, "skipping unsupported block inside event");
            return Ok(Step::Push(Context::Skip {
                end_marker: format!("END:{kind}"),
            }));
        }
        builder.accept(&ContentLine::decode(line)?)?;
        Ok(Step::Consumed)
    }

    fn accept_skip(line: &str, end_marker: &str) -> Step {
        if line == end_marker {
            return Step::Pop;
        }
        if let Some(kind) = line.strip_prefix("BEGIN:") {
            // A nested block pairs with its own end marker, even when it
            // has the same type as the one being skipped.
            return Step::Push(Context::Skip {
                end_marker: format!("END:{kind}"),
            });
        }
        Step::Consumed
    }

    fn commit(&mut self, builder: EventBuilder) -> AcalResult<()> {
        let event = builder.build()?;
        if self.events.contains_key(&event.uid) {
            return Err(ParseError::DuplicateUid(event.uid));
        }
        self.events.insert(event.uid.clone(), event);
        Ok(())
    }
}

impl Default for Parser {
    fn default() -> Self {
        Parser::new()
    }
}

/// Field accumulator for one `VEVENT` block.
#[derive(Debug, Default)]
struct EventBuilder {
    uid: Option<String>,
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
    title: Option<String>,
    description: Option<String>,
    location: Option<String>,
    rrule: Option<String>,
}

impl EventBuilder {
    fn accept(&mut self, content: &ContentLine) -> AcalResult<()> {
        match content.key.as_str() {
            "UID" => self.uid = Some(content.value.clone()),
            "DTSTART" => self.start = Some(decode_instant(content, DatePosition::Start)?),
            "DTEND" => self.end = Some(decode_instant(content, DatePosition::End)?),
            "RRULE" => self.rrule = Some(content.value.clone()),
            "SUMMARY" => self.title = Some(content.value.clone()),
            "DESCRIPTION" => self.description = Some(content.value.clone()),
            "LOCATION" => self.location = Some(content.value.clone()),
            // Unrecognized event properties are ignored for forward
            // compatibility.
            _ => {}
        }
        Ok(())
    }

    fn build(self) -> AcalResult<Event> {
        let uid = self.uid.ok_or(ParseError::MissingField { field: "uid" })?;
        let start = self
            .start
            .ok_or(ParseError::MissingField { field: "start" })?;
        let end = self.end.ok_or(ParseError::MissingField { field: "end" })?;
        if start > end {
            return Err(ParseError::Temporal(format!(
                "event '{uid}' starts after it ends"
            )));
        }

        Ok(Event {
            uid,
            start,
            end,
            title: self.title,
            description: self.description,
            location: self.location,
            rrule: self.rrule,
            category: DEFAULT_CATEGORY_UID.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn parse_doc(doc: &str) -> AcalResult<Calendar> {
        let mut parser = Parser::new();
        for line in doc.lines() {
            parser.feed_line(line)?;
        }
        parser.finish()
    }

    #[test]
    fn test_parse_simple_calendar() {
        let calendar = parse_doc(
            "BEGIN:VCALENDAR\n\
             VERSION:2.0\n\
             PRODID:-//Test//EN\n\
             BEGIN:VEVENT\n\
             UID:evt-1\n\
             DTSTART:20240101T130000Z\n\
             DTEND:20240101T140000Z\n\
             SUMMARY:Lunch\n\
             DESCRIPTION:With the team\n\
             LOCATION:Cafeteria\n\
             END:VEVENT\n\
             END:VCALENDAR",
        )
        .expect("Should parse");

        assert_eq!(calendar.events.len(), 1);
        let event = &calendar.events["evt-1"];
        assert_eq!(
            event.start,
            Utc.with_ymd_and_hms(2024, 1, 1, 13, 0, 0).unwrap()
        );
        assert_eq!(event.title.as_deref(), Some("Lunch"));
        assert_eq!(event.description.as_deref(), Some("With the team"));
        assert_eq!(event.location.as_deref(), Some("Cafeteria"));
        assert_eq!(event.category, DEFAULT_CATEGORY_UID);
        assert!(
            calendar.categories.contains_key(DEFAULT_CATEGORY_UID),
            "Default category should be synthesized"
        );
    }

    #[test]
    fn test_missing_uid_fails_whole_parse() {
        let err = parse_doc(
            "BEGIN:VCALENDAR\n\
             VERSION:2.0\n\
             BEGIN:VEVENT\n\
             DTSTART:20240101T130000Z\n\
             DTEND:20240101T140000Z\n\
             END:VEVENT\n\
             END:VCALENDAR",
        )
        .unwrap_err();
        assert!(matches!(err, ParseError::MissingField { field: "uid" }));
    }

    #[test]
    fn test_wrong_version_fails_before_events() {
        let err = parse_doc(
            "BEGIN:VCALENDAR\n\
             VERSION:3.0\n\
             BEGIN:VEVENT\n\
             UID:evt-1\n\
             END:VEVENT\n\
             END:VCALENDAR",
        )
        .unwrap_err();
        assert!(matches!(err, ParseError::Version(ref v) if v == "3.0"));
    }

    #[test]
    fn test_missing_version_fails_at_first_block() {
        let err = parse_doc(
            "BEGIN:VCALENDAR\n\
             PRODID:-//Test//EN\n\
             BEGIN:VEVENT\n\
             UID:evt-1\n\
             DTSTART:20240101T130000Z\n\
             DTEND:20240101T140000Z\n\
             END:VEVENT\n\
             END:VCALENDAR",
        )
        .unwrap_err();
        assert!(matches!(err, ParseError::Version(_)));
    }

    #[test]
    fn test_same_type_nested_unknown_block_skipped_as_unit() {
        // The inner END:X must close the inner block, not the outer one;
        // the event after both blocks must still be parsed.
        let calendar = parse_doc(
            "BEGIN:VCALENDAR\n\
             VERSION:2.0\n\
             BEGIN:X-CUSTOM\n\
             FOO:bar\n\
             BEGIN:X-CUSTOM\n\
             BAZ:qux\n\
             END:X-CUSTOM\n\
             STILL:skipped\n\
             END:X-CUSTOM\n\
             BEGIN:VEVENT\n\
             UID:evt-1\n\
             DTSTART:20240101T130000Z\n\
             DTEND:20240101T140000Z\n\
             END:VEVENT\n\
             END:VCALENDAR",
        )
        .expect("Should parse past the nested blocks");
        assert_eq!(calendar.events.len(), 1);
    }

    #[test]
    fn test_unknown_block_before_first_event_is_skipped() {
        let calendar = parse_doc(
            "BEGIN:VCALENDAR\n\
             VERSION:2.0\n\
             BEGIN:VTIMEZONE\n\
             TZID:Europe/Stockholm\n\
             END:VTIMEZONE\n\
             BEGIN:VEVENT\n\
             UID:evt-1\n\
             DTSTART:20240101T130000Z\n\
             DTEND:20240101T140000Z\n\
             END:VEVENT\n\
             END:VCALENDAR",
        )
        .expect("Should parse");
        assert_eq!(calendar.events.len(), 1);
    }

    #[test]
    fn test_alarm_inside_event_is_skipped() {
        let calendar = parse_doc(
            "BEGIN:VCALENDAR\n\
             VERSION:2.0\n\
             BEGIN:VEVENT\n\
             UID:evt-1\n\
             DTSTART:20240101T130000Z\n\
             BEGIN:VALARM\n\
             TRIGGER:-PT15M\n\
             ACTION:DISPLAY\n\
             END:VALARM\n\
             DTEND:20240101T140000Z\n\
             END:VEVENT\n\
             END:VCALENDAR",
        )
        .expect("Should parse");
        assert_eq!(
            calendar.events["evt-1"].end,
            Utc.with_ymd_and_hms(2024, 1, 1, 14, 0, 0).unwrap(),
            "Fields after the nested block should still land on the event"
        );
    }

    #[test]
    fn test_unknown_top_level_line_fails() {
        let err = parse_doc(
            "BEGIN:VCALENDAR\n\
             VERSION:2.0\n\
             BEGIN:VEVENT\n\
             UID:evt-1\n\
             DTSTART:20240101T130000Z\n\
             DTEND:20240101T140000Z\n\
             END:VEVENT\n\
             STRAY:line\n\
             END:VCALENDAR",
        )
        .unwrap_err();
        assert!(matches!(err, ParseError::UnknownLine(_)));
    }

    #[test]
    fn test_duplicate_uid_fails() {
        let event_block = "BEGIN:VEVENT\n\
             UID:evt-1\n\
             DTSTART:20240101T130000Z\n\
             DTEND:20240101T140000Z\n\
             END:VEVENT\n";
        let doc = format!("BEGIN:VCALENDAR\nVERSION:2.0\n{event_block}{event_block}END:VCALENDAR");
        let err = parse_doc(&doc).unwrap_err();
        assert!(matches!(err, ParseError::DuplicateUid(ref uid) if uid == "evt-1"));
    }

    #[test]
    fn test_start_after_end_fails() {
        let err = parse_doc(
            "BEGIN:VCALENDAR\n\
             VERSION:2.0\n\
             BEGIN:VEVENT\n\
             UID:evt-1\n\
             DTSTART:20240102T130000Z\n\
             DTEND:20240101T130000Z\n\
             END:VEVENT\n\
             END:VCALENDAR",
        )
        .unwrap_err();
        assert!(matches!(err, ParseError::Temporal(_)));
    }

    #[test]
    fn test_all_day_range_decodes_closed_closed() {
        let calendar = parse_doc(
            "BEGIN:VCALENDAR\n\
             VERSION:2.0\n\
             BEGIN:VEVENT\n\
             UID:evt-1\n\
             DTSTART;VALUE=DATE:20240101\n\
             DTEND;VALUE=DATE:20240103\n\
             END:VEVENT\n\
             END:VCALENDAR",
        )
        .expect("Should parse");

        let event = &calendar.events["evt-1"];
        assert_eq!(event.start, Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
        assert_eq!(
            event.end,
            Utc.with_ymd_and_hms(2024, 1, 2, 23, 59, 59).unwrap()
                + chrono::Duration::milliseconds(999)
        );
    }

    #[test]
    fn test_empty_calendar_is_valid() {
        let calendar = parse_doc("BEGIN:VCALENDAR\nVERSION:2.0\nEND:VCALENDAR")
            .expect("Should parse");
        assert!(calendar.events.is_empty());
        assert_eq!(calendar.categories.len(), 1);
    }

    #[test]
    fn test_truncated_document_fails() {
        let err = parse_doc(
            "BEGIN:VCALENDAR\n\
             VERSION:2.0\n\
             BEGIN:VEVENT\n\
             UID:evt-1",
        )
        .unwrap_err();
        assert!(matches!(err, ParseError::UnexpectedEof));
    }

    #[test]
    fn test_content_after_close_is_not_inspected() {
        let calendar = parse_doc(
            "BEGIN:VCALENDAR\n\
             VERSION:2.0\n\
             END:VCALENDAR\n\
             total garbage here",
        )
        .expect("Lines after END:VCALENDAR should be ignored");
        assert!(calendar.events.is_empty());
    }

    #[test]
    fn test_rrule_carried_verbatim() {
        let calendar = parse_doc(
            "BEGIN:VCALENDAR\n\
             VERSION:2.0\n\
             BEGIN:VEVENT\n\
             UID:evt-1\n\
             DTSTART:20240101T130000Z\n\
             DTEND:20240101T140000Z\n\
             RRULE:FREQ=WEEKLY;BYDAY=MO;COUNT=4\n\
             END:VEVENT\n\
             END:VCALENDAR",
        )
        .expect("Should parse");
        assert_eq!(
            calendar.events["evt-1"].rrule.as_deref(),
            Some("FREQ=WEEKLY;BYDAY=MO;COUNT=4")
        );
    }

    #[tokio::test]
    async fn test_async_parse_unfolds_across_lines() {
        // The description is folded over three physical lines; the two
        // continuations begin with a single space.
        let doc = concat!(
            "BEGIN:VCALENDAR\r\n",
            "VERSION:2.0\r\n",
            "BEGIN:VEVENT\r\n",
            "UID:evt-1\r\n",
            "DTSTART:20240101T130000Z\r\n",
            "DTEND:20240101T140000Z\r\n",
            "DESCRIPTION:Hello \r\n",
            " world and \r\n",
            " more text\r\n",
            "END:VEVENT\r\n",
            "END:VCALENDAR\r\n",
        );

        let calendar = parse(doc.as_bytes()).await.expect("Should parse");
        assert_eq!(
            calendar.events["evt-1"].description.as_deref(),
            Some("Hello world and more text"),
            "Folded description should reassemble with the fold markers removed"
        );
    }
}
