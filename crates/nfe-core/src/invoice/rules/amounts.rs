//! Monetary value parsing for NF-e totals.

use rust_decimal::{Decimal, RoundingStrategy};
use std::str::FromStr;

use super::patterns::AMOUNT_TEXT;

/// Decimal places every monetary field is normalized to.
pub const AMOUNT_SCALE: u32 = 2;

/// Parse monetary text as an exact decimal.
///
/// NF-e writes `1234.56` (dot decimal, no grouping). Text produced by other
/// tools is repaired: the rightmost of two different separators is the
/// decimal one (`1.234,56`, `1,234.56`), a single comma is a decimal comma,
/// and a separator repeated several times is grouping (`1.234.567`).
pub fn parse_amount(s: &str) -> Option<Decimal> {
    let s = s.trim();
    if !AMOUNT_TEXT.is_match(s) {
        return None;
    }

    let cleaned: String = s
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '\u{00a0}')
        .collect();

    let commas = cleaned.matches(',').count();
    let dots = cleaned.matches('.').count();

    let normalized = match (commas, dots) {
        (0, 0) | (0, 1) => cleaned,
        (0, _) => cleaned.replace('.', ""),
        (1, 0) => cleaned.replace(',', "."),
        (_, 0) => cleaned.replace(',', ""),
        _ => {
            let comma_pos = cleaned.rfind(',');
            let dot_pos = cleaned.rfind('.');
            match (comma_pos, dot_pos) {
                (Some(c), Some(d)) if c > d && commas == 1 => {
                    cleaned.replace('.', "").replace(',', ".")
                }
                (Some(c), Some(d)) if d > c && dots == 1 => cleaned.replace(',', ""),
                _ => return None,
            }
        }
    };

    Decimal::from_str(&normalized).ok()
}

/// Bring an amount to exactly two decimal places.
///
/// Returns the normalized amount and whether digits were rounded away.
pub fn normalize_amount(amount: Decimal) -> (Decimal, bool) {
    let mut rounded =
        amount.round_dp_with_strategy(AMOUNT_SCALE, RoundingStrategy::MidpointAwayFromZero);
    let lost_precision = rounded != amount;
    rounded.rescale(AMOUNT_SCALE);
    (rounded, lost_precision)
}

/// Format amount in Brazilian style (1.234,56).
pub fn format_brl_amount(amount: Decimal) -> String {
    let (amount, _) = normalize_amount(amount);
    let s = amount.abs().to_string();
    let (integer_part, decimal_part) = s.split_once('.').unwrap_or((s.as_str(), "00"));

    let chars: Vec<char> = integer_part.chars().collect();
    let mut formatted = String::new();
    if amount < Decimal::ZERO {
        formatted.push('-');
    }

    for (i, c) in chars.iter().enumerate() {
        if i > 0 && (chars.len() - i) % 3 == 0 {
            formatted.push('.');
        }
        formatted.push(*c);
    }

    format!("{},{}", formatted, decimal_part)
}
