//! NF-e document parser: bytes in, one record or one classified failure out.

use std::collections::HashMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use tracing::{debug, warn};

use crate::models::config::ExtractionConfig;
use crate::models::invoice::*;

use super::fields::{FieldPath, Presence, Resolver, FIELD_PATHS};
use super::xml::parse_tree;
use super::DocumentParser;

/// Parser for NF-e XML documents.
#[derive(Debug, Clone, Default)]
pub struct NfeParser {
    config: ExtractionConfig,
}

impl NfeParser {
    /// Create a parser with the given configuration.
    pub fn new(config: ExtractionConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ExtractionConfig {
        &self.config
    }
}

impl DocumentParser for NfeParser {
    fn parse(&self, content: &[u8], file: &str) -> Result<InvoiceRecord, ParseFailure> {
        parse(content, file, &self.config)
    }
}

/// Parse one document.
///
/// Never panics on bad input: every problem becomes a [`ParseFailure`].
pub fn parse(
    content: &[u8],
    file: &str,
    config: &ExtractionConfig,
) -> Result<InvoiceRecord, ParseFailure> {
    let document = parse_tree(content).map_err(|e| ParseFailure::malformed(file, e.to_string()))?;

    let resolver = Resolver::new(&document, &config.namespaces).ok_or_else(|| {
        ParseFailure::unexpected_schema(
            file,
            format!("root element <{}> has no infNFe block", document.name),
        )
    })?;

    let mut values = HashMap::with_capacity(FIELD_PATHS.len());
    let mut warnings = Vec::new();

    for rule in FIELD_PATHS {
        let value = resolve_field(&resolver, rule, file, config, &mut warnings)?;
        values.insert(rule.field, value);
    }

    let item_count = resolver.count_items();
    let record = assemble(file, values, item_count, warnings)?;

    for issue in record.quality_issues() {
        warn!("{}: data quality: {}", file, issue);
    }

    debug!(
        "Parsed {} as invoice {}/{} with {} items and {} warnings",
        file,
        record.header.series,
        record.header.invoice_number,
        record.item_count,
        record.warnings.len()
    );

    Ok(record)
}

fn resolve_field(
    resolver: &Resolver<'_>,
    rule: &FieldPath,
    file: &str,
    config: &ExtractionConfig,
    warnings: &mut Vec<FieldWarning>,
) -> Result<FieldValue, ParseFailure> {
    let Some(raw) = resolver.resolve(rule) else {
        return match rule.presence {
            Presence::Mandatory => Err(ParseFailure::missing_field(
                file,
                rule.field,
                format!("missing mandatory field '{}'", rule.field.label()),
            )),
            Presence::Optional => Ok(rule.kind.default_value()),
        };
    };

    match rule.kind.coerce(raw, config) {
        Ok(coerced) => {
            for message in coerced.warnings {
                warn!("{}: {}: {}", file, rule.field.label(), message);
                warnings.push(FieldWarning::new(rule.field, message));
            }
            Ok(coerced.value)
        }
        Err(reason) => match rule.presence {
            Presence::Mandatory => Err(ParseFailure::missing_field(
                file,
                rule.field,
                format!("unusable value for '{}': {}", rule.field.label(), reason),
            )),
            Presence::Optional => {
                warn!("{}: {}: {}, using default", file, rule.field.label(), reason);
                warnings.push(FieldWarning::new(
                    rule.field,
                    format!("{}, default used", reason),
                ));
                Ok(rule.kind.default_value())
            }
        },
    }
}

struct Values {
    file: String,
    values: HashMap<Field, FieldValue>,
}

impl Values {
    fn missing(&self, field: Field) -> ParseFailure {
        ParseFailure::missing_field(
            &self.file,
            field,
            format!("missing mandatory field '{}'", field.label()),
        )
    }

    fn text(&mut self, field: Field) -> Result<String, ParseFailure> {
        match self.values.remove(&field) {
            Some(FieldValue::Text(s)) => Ok(s),
            _ => Err(self.missing(field)),
        }
    }

    fn date(&mut self, field: Field) -> Result<NaiveDate, ParseFailure> {
        match self.values.remove(&field) {
            Some(FieldValue::Date(d)) => Ok(d),
            _ => Err(self.missing(field)),
        }
    }

    fn amount(&mut self, field: Field) -> Result<Decimal, ParseFailure> {
        match self.values.remove(&field) {
            Some(FieldValue::Amount(a)) => Ok(a),
            _ => Err(self.missing(field)),
        }
    }

    fn operation(&mut self, field: Field) -> Result<OperationType, ParseFailure> {
        match self.values.remove(&field) {
            Some(FieldValue::Operation(op)) => Ok(op),
            _ => Err(self.missing(field)),
        }
    }
}

fn assemble(
    file: &str,
    values: HashMap<Field, FieldValue>,
    item_count: u32,
    mut warnings: Vec<FieldWarning>,
) -> Result<InvoiceRecord, ParseFailure> {
    let mut v = Values {
        file: file.to_string(),
        values,
    };

    let mut record = InvoiceRecord {
        file: file.to_string(),
        header: InvoiceHeader {
            invoice_number: v.text(Field::InvoiceNumber)?,
            series: v.text(Field::Series)?,
            issue_date: v.date(Field::IssueDate)?,
            access_key: v.text(Field::AccessKey)?,
            operation_nature: v.text(Field::OperationNature)?,
            operation_type: v.operation(Field::OperationType)?,
        },
        issuer: Issuer {
            cnpj: v.text(Field::IssuerCnpj)?,
            name: v.text(Field::IssuerName)?,
            trade_name: v.text(Field::IssuerTradeName)?,
        },
        recipient: Recipient {
            tax_id: v.text(Field::RecipientTaxId)?,
            name: v.text(Field::RecipientName)?,
        },
        totals: InvoiceTotals {
            products: v.amount(Field::ProductsTotal)?,
            discount: v.amount(Field::Discount)?,
            freight: v.amount(Field::Freight)?,
            grand_total: v.amount(Field::GrandTotal)?,
            icms: v.amount(Field::Icms)?,
            ipi: v.amount(Field::Ipi)?,
        },
        item_count,
        warnings: Vec::new(),
    };

    let floor = record.totals.products.checked_sub(record.totals.discount);
    if let Some(floor) = floor.filter(|floor| record.totals.grand_total < *floor) {
        warnings.push(FieldWarning::new(
            Field::GrandTotal,
            format!(
                "grand total {} is below product total minus discount {}",
                record.totals.grand_total, floor
            ),
        ));
    }

    record.warnings = warnings;
    Ok(record)
}
