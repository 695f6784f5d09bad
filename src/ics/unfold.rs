//! Line unfolding.
//!
//! RFC 5545 folds long content lines by breaking them and prefixing each
//! continuation with a single space or tab. This module reverses that
//! incrementally: physical lines go in one at a time, complete logical
//! lines come out, and nothing is buffered beyond the line being built.

/// Incremental line unfolder. Single pass; feed a fresh one per stream.
#[derive(Debug, Default)]
pub struct Unfolder {
    pending: Option<String>,
}

impl Unfolder {
    pub fn new() -> Self {
        Unfolder::default()
    }

    /// Feed one physical line. Returns the previous logical line when
    /// `physical` starts a new one, `None` while a line is still growing.
    pub fn push(&mut self, physical: &str) -> Option<String> {
        if let Some(rest) = strip_fold(physical) {
            // Continuation: splice onto the pending line, no separator.
            if let Some(pending) = self.pending.as_mut() {
                pending.push_str(rest);
            } else {
                // A leading continuation with nothing to continue; treat
                // the remainder as the start of a logical line.
                self.pending = Some(rest.to_string());
            }
            None
        } else {
            self.pending.replace(physical.to_string())
        }
    }

    /// Flush the pending logical line at end of stream.
    pub fn flush(&mut self) -> Option<String> {
        self.pending.take()
    }
}

/// If `line` is a folded continuation, return it minus the single leading
/// whitespace character.
fn strip_fold(line: &str) -> Option<&str> {
    line.strip_prefix(' ').or_else(|| line.strip_prefix('\t'))
}
