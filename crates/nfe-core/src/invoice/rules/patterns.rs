//! Common regex patterns for NF-e value normalization.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // Monetary text: optional sign, digits with dot/comma/space separators
    pub static ref AMOUNT_TEXT: Regex = Regex::new(
        r"^[+-]?\d[\d.,\s\u{00a0}]*$"
    ).unwrap();

    // Digit-only identifiers (CNPJ, CPF, access key)
    pub static ref DIGITS: Regex = Regex::new(r"^[0-9]+$").unwrap();

    // infNFe/@Id carries the access key behind an "NFe" prefix
    pub static ref ACCESS_KEY_ID: Regex = Regex::new(r"^(?i:nfe)?\s*(\S*)$").unwrap();

    // Offset written without a colon, e.g. 2024-01-15T10:30:00-0300
    pub static ref COMPACT_OFFSET: Regex = Regex::new(
        r"^\d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2}[+-]\d{4}$"
    ).unwrap();
}
