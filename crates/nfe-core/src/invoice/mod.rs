//! NF-e document parsing.

pub mod fields;
mod parser;
pub mod rules;
pub mod xml;

#[cfg(test)]
pub(crate) mod testdata;

pub use parser::{parse, NfeParser};

use crate::models::invoice::{InvoiceRecord, ParseFailure};

/// Turns the raw bytes of one document into a record.
pub trait DocumentParser {
    /// Parse `content`. `file` only labels diagnostics.
    fn parse(&self, content: &[u8], file: &str) -> Result<InvoiceRecord, ParseFailure>;
}
