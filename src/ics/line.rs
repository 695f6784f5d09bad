//! Content line decoding.
//!
//! One logical line carries `KEY[;PARAM=VALUE]:value`. The decoder
//! recognizes at most one parameter per line; when more are present the
//! first wins and the rest are ignored.

use crate::error::{AcalResult, ParseError};

/// One decoded content line.
#[derive(Debug, Clone, PartialEq)]
pub struct ContentLine {
    pub key: String,
    /// First `name=value` parameter, if the line carried any.
    pub param: Option<(String, String)>,
    pub value: String,
}

impl ContentLine {
    /// Decode a logical line. A line without a `:` delimiter, or with a
    /// parameter segment missing its `=`, is a structural failure.
    pub fn decode(line: &str) -> AcalResult<Self> {
        let key_end = line
            .find([';', ':'])
            .ok_or_else(|| ParseError::Structure(line.to_string()))?;
        let key = &line[..key_end];
        if key.is_empty() || key.contains('=') {
            return Err(ParseError::Structure(line.to_string()));
        }

        let rest = &line[key_end..];
        let (param, value) = if let Some(rest) = rest.strip_prefix(';') {
            let colon = rest
                .find(':')
                .ok_or_else(|| ParseError::Structure(line.to_string()))?;
            let first_segment = rest[..colon]
                .split(';')
                .next()
                .unwrap_or_default();
            let (name, param_value) = first_segment
                .split_once('=')
                .ok_or_else(|| ParseError::Structure(line.to_string()))?;
            if name.is_empty() {
                return Err(ParseError::Structure(line.to_string()));
            }
            (
                Some((name.to_string(), param_value.to_string())),
                &rest[colon + 1..],
            )
        } else {
            // rest starts with ':'
            (None, &rest[1..])
        };

        Ok(ContentLine {
            key: key.to_string(),
            param,
            value: value.to_string(),
        })
    }
}
