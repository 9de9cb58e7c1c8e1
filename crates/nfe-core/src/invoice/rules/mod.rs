//! Type coercion rules for NF-e field values.

pub mod amounts;
pub mod dates;
pub mod identifiers;
pub mod patterns;

pub use amounts::{format_brl_amount, normalize_amount, parse_amount, AMOUNT_SCALE};
pub use dates::parse_issue_date;
pub use identifiers::{
    access_key_from_id, check_identifier, format_cnpj, format_cpf, format_tax_id,
    validate_access_key, validate_cnpj, validate_cpf, ACCESS_KEY_LEN, CNPJ_LEN, CPF_LEN,
};

use rust_decimal::Decimal;

use crate::models::config::ExtractionConfig;
use crate::models::invoice::{FieldValue, OperationType};

/// Expected primitive type of a resolved value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    /// Non-empty trimmed text.
    Text,
    /// Calendar date from `dhEmi`/`dEmi`.
    Date,
    /// Non-negative decimal with two places.
    Amount,
    /// Digit-only taxpayer id with one of the given lengths.
    TaxId(&'static [usize]),
    /// 44-digit access key. Format problems only produce warnings.
    AccessKey,
    /// `tpNF` code.
    OperationType,
}

/// A successfully coerced value plus soft warnings about it.
#[derive(Debug, Clone, PartialEq)]
pub struct Coerced {
    pub value: FieldValue,
    pub warnings: Vec<String>,
}

impl Coerced {
    fn clean(value: FieldValue) -> Self {
        Self {
            value,
            warnings: Vec::new(),
        }
    }

    fn with_warning(value: FieldValue, warning: String) -> Self {
        Self {
            value,
            warnings: vec![warning],
        }
    }
}

impl ValueKind {
    /// Value substituted for an absent optional field.
    pub fn default_value(&self) -> FieldValue {
        match self {
            ValueKind::Amount => FieldValue::Amount(normalize_amount(Decimal::ZERO).0),
            _ => FieldValue::Text(String::new()),
        }
    }

    /// Convert raw document text into a typed value.
    ///
    /// `Err` means the value is present but unusable.
    pub fn coerce(&self, raw: &str, config: &ExtractionConfig) -> Result<Coerced, String> {
        let raw = raw.trim();

        match self {
            ValueKind::Text => {
                if raw.is_empty() {
                    Err("empty text".to_string())
                } else {
                    Ok(Coerced::clean(FieldValue::Text(raw.to_string())))
                }
            }
            ValueKind::Date => parse_issue_date(raw, &config.date_formats)
                .map(|d| Coerced::clean(FieldValue::Date(d)))
                .ok_or_else(|| format!("'{}' is not a recognized date", raw)),
            ValueKind::Amount => coerce_amount(raw),
            ValueKind::TaxId(lengths) => {
                let id = check_identifier(raw, lengths)?;
                let valid = match id.len() {
                    CNPJ_LEN => validate_cnpj(&id),
                    CPF_LEN => validate_cpf(&id),
                    _ => true,
                };
                if config.validate_check_digits && !valid {
                    Ok(Coerced::with_warning(
                        FieldValue::Text(id),
                        "check digits do not match".to_string(),
                    ))
                } else {
                    Ok(Coerced::clean(FieldValue::Text(id)))
                }
            }
            ValueKind::AccessKey => Ok(coerce_access_key(raw, config)),
            ValueKind::OperationType => OperationType::from_code(raw)
                .map(|op| Coerced::clean(FieldValue::Operation(op)))
                .ok_or_else(|| format!("'{}' is not an operation type code (0 or 1)", raw)),
        }
    }
}

fn coerce_amount(raw: &str) -> Result<Coerced, String> {
    let amount = parse_amount(raw).ok_or_else(|| format!("'{}' is not a decimal amount", raw))?;

    if amount < Decimal::ZERO {
        return Err(format!("'{}' is negative", raw));
    }

    let (normalized, rounded) = normalize_amount(amount);
    if normalized.scale() != AMOUNT_SCALE {
        return Err(format!("'{}' is too large to keep two decimal places", raw));
    }
    if rounded {
        Ok(Coerced::with_warning(
            FieldValue::Amount(normalized),
            format!("'{}' rounded to {}", raw, normalized),
        ))
    } else {
        Ok(Coerced::clean(FieldValue::Amount(normalized)))
    }
}

fn coerce_access_key(raw: &str, config: &ExtractionConfig) -> Coerced {
    let key = access_key_from_id(raw);

    if let Err(reason) = check_identifier(&key, &[ACCESS_KEY_LEN]) {
        return Coerced::with_warning(FieldValue::Text(key), reason);
    }

    if config.validate_check_digits && !validate_access_key(&key) {
        return Coerced::with_warning(
            FieldValue::Text(key),
            "check digit does not match".to_string(),
        );
    }

    Coerced::clean(FieldValue::Text(key))
}
