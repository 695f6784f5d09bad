//! ICS ingestion: line unfolding, content-line decoding, and the
//! streaming block parser.

mod datetime;
mod line;
mod parse;
mod unfold;

pub use parse::{Parser, parse};
