//! Invoice record model: one normalized row per NF-e document.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// The fixed set of columns every [`InvoiceRecord`] carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    InvoiceNumber,
    Series,
    IssueDate,
    AccessKey,
    OperationNature,
    OperationType,
    IssuerCnpj,
    IssuerName,
    IssuerTradeName,
    RecipientTaxId,
    RecipientName,
    ProductsTotal,
    Discount,
    Freight,
    GrandTotal,
    Icms,
    Ipi,
    ItemCount,
}

/// Primitive type stored in a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueType {
    Text,
    Date,
    Amount,
    Count,
    Operation,
}

impl Field {
    /// All columns in export order.
    pub const ALL: [Field; 18] = [
        Field::InvoiceNumber,
        Field::Series,
        Field::IssueDate,
        Field::AccessKey,
        Field::OperationNature,
        Field::OperationType,
        Field::IssuerCnpj,
        Field::IssuerName,
        Field::IssuerTradeName,
        Field::RecipientTaxId,
        Field::RecipientName,
        Field::ProductsTotal,
        Field::Discount,
        Field::Freight,
        Field::GrandTotal,
        Field::Icms,
        Field::Ipi,
        Field::ItemCount,
    ];

    /// Monetary columns, used for statistics.
    pub const MONETARY: [Field; 6] = [
        Field::ProductsTotal,
        Field::Discount,
        Field::Freight,
        Field::GrandTotal,
        Field::Icms,
        Field::Ipi,
    ];

    /// Column name used in headers and on the command line.
    pub fn column(&self) -> &'static str {
        match self {
            Field::InvoiceNumber => "invoice_number",
            Field::Series => "series",
            Field::IssueDate => "issue_date",
            Field::AccessKey => "access_key",
            Field::OperationNature => "operation_nature",
            Field::OperationType => "operation_type",
            Field::IssuerCnpj => "issuer_cnpj",
            Field::IssuerName => "issuer_name",
            Field::IssuerTradeName => "issuer_trade_name",
            Field::RecipientTaxId => "recipient_tax_id",
            Field::RecipientName => "recipient_name",
            Field::ProductsTotal => "products_total",
            Field::Discount => "discount",
            Field::Freight => "freight",
            Field::GrandTotal => "grand_total",
            Field::Icms => "icms",
            Field::Ipi => "ipi",
            Field::ItemCount => "item_count",
        }
    }

    /// Human-readable name used in diagnostics.
    pub fn label(&self) -> &'static str {
        match self {
            Field::InvoiceNumber => "invoice number",
            Field::Series => "series",
            Field::IssueDate => "issue date",
            Field::AccessKey => "access key",
            Field::OperationNature => "operation nature",
            Field::OperationType => "operation type",
            Field::IssuerCnpj => "issuer CNPJ",
            Field::IssuerName => "issuer name",
            Field::IssuerTradeName => "issuer trade name",
            Field::RecipientTaxId => "recipient tax id",
            Field::RecipientName => "recipient name",
            Field::ProductsTotal => "product total",
            Field::Discount => "discount",
            Field::Freight => "freight",
            Field::GrandTotal => "grand total",
            Field::Icms => "ICMS",
            Field::Ipi => "IPI",
            Field::ItemCount => "item count",
        }
    }

    pub fn value_type(&self) -> ValueType {
        match self {
            Field::IssueDate => ValueType::Date,
            Field::OperationType => ValueType::Operation,
            Field::ItemCount => ValueType::Count,
            Field::ProductsTotal
            | Field::Discount
            | Field::Freight
            | Field::GrandTotal
            | Field::Icms
            | Field::Ipi => ValueType::Amount,
            _ => ValueType::Text,
        }
    }

    /// Parse a cell written by [`FieldValue::to_cell`] back into a typed value.
    pub fn parse_value(&self, cell: &str) -> Result<FieldValue, String> {
        match self.value_type() {
            ValueType::Text => Ok(FieldValue::Text(cell.to_string())),
            ValueType::Date => NaiveDate::parse_from_str(cell.trim(), "%Y-%m-%d")
                .map(FieldValue::Date)
                .map_err(|e| e.to_string()),
            ValueType::Amount => Decimal::from_str(cell.trim())
                .map(FieldValue::Amount)
                .map_err(|e| e.to_string()),
            ValueType::Count => cell
                .trim()
                .parse::<u32>()
                .map(FieldValue::Count)
                .map_err(|e| e.to_string()),
            ValueType::Operation => cell.parse::<OperationType>().map(FieldValue::Operation),
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Field {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Field::ALL
            .into_iter()
            .find(|f| f.column().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown column '{}'", s))
    }
}

/// Whether the note records goods entering or leaving the issuer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum OperationType {
    /// Incoming (tpNF = 0).
    Entrada,
    /// Outgoing (tpNF = 1).
    #[serde(rename = "Saída")]
    Saida,
}

impl OperationType {
    /// Map the NF-e `tpNF` code.
    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim() {
            "0" => Some(OperationType::Entrada),
            "1" => Some(OperationType::Saida),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OperationType::Entrada => "Entrada",
            OperationType::Saida => "Saída",
        }
    }
}

impl fmt::Display for OperationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OperationType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "entrada" | "0" => Ok(OperationType::Entrada),
            "saída" | "saida" | "1" => Ok(OperationType::Saida),
            other => Err(format!("unknown operation type '{}'", other)),
        }
    }
}

/// A typed cell value.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    Date(NaiveDate),
    Amount(Decimal),
    Count(u32),
    Operation(OperationType),
}

impl FieldValue {
    /// Locale-independent text form used by every export format.
    pub fn to_cell(&self) -> String {
        match self {
            FieldValue::Text(s) => s.clone(),
            FieldValue::Date(d) => d.format("%Y-%m-%d").to_string(),
            FieldValue::Amount(a) => a.to_string(),
            FieldValue::Count(n) => n.to_string(),
            FieldValue::Operation(op) => op.as_str().to_string(),
        }
    }

    pub fn as_amount(&self) -> Option<Decimal> {
        match self {
            FieldValue::Amount(a) => Some(*a),
            _ => None,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_cell())
    }
}

/// Identification block (`ide`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceHeader {
    pub invoice_number: String,
    pub series: String,
    pub issue_date: NaiveDate,
    /// 44-digit access key; kept as found when its format is off.
    pub access_key: String,
    pub operation_nature: String,
    pub operation_type: OperationType,
}

/// Issuer block (`emit`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issuer {
    pub cnpj: String,
    pub name: String,
    /// Trade name, empty when the document has none.
    pub trade_name: String,
}

/// Recipient block (`dest`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipient {
    /// CNPJ (14 digits) or CPF (11 digits).
    pub tax_id: String,
    pub name: String,
}

/// Monetary totals (`total/ICMSTot`), all with two decimal places.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceTotals {
    pub products: Decimal,
    pub discount: Decimal,
    pub freight: Decimal,
    pub grand_total: Decimal,
    pub icms: Decimal,
    pub ipi: Decimal,
}

/// A soft, field-level annotation on an otherwise valid record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldWarning {
    pub field: Field,
    pub message: String,
}

impl FieldWarning {
    pub fn new(field: Field, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for FieldWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field.label(), self.message)
    }
}

/// One normalized NF-e.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceRecord {
    /// Name of the file the record came from. Diagnostics only.
    pub file: String,
    pub header: InvoiceHeader,
    pub issuer: Issuer,
    pub recipient: Recipient,
    pub totals: InvoiceTotals,
    /// Number of product lines (`det` elements).
    pub item_count: u32,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<FieldWarning>,
}

impl InvoiceRecord {
    /// Read one column as a typed value.
    pub fn value(&self, field: Field) -> FieldValue {
        match field {
            Field::InvoiceNumber => FieldValue::Text(self.header.invoice_number.clone()),
            Field::Series => FieldValue::Text(self.header.series.clone()),
            Field::IssueDate => FieldValue::Date(self.header.issue_date),
            Field::AccessKey => FieldValue::Text(self.header.access_key.clone()),
            Field::OperationNature => FieldValue::Text(self.header.operation_nature.clone()),
            Field::OperationType => FieldValue::Operation(self.header.operation_type),
            Field::IssuerCnpj => FieldValue::Text(self.issuer.cnpj.clone()),
            Field::IssuerName => FieldValue::Text(self.issuer.name.clone()),
            Field::IssuerTradeName => FieldValue::Text(self.issuer.trade_name.clone()),
            Field::RecipientTaxId => FieldValue::Text(self.recipient.tax_id.clone()),
            Field::RecipientName => FieldValue::Text(self.recipient.name.clone()),
            Field::ProductsTotal => FieldValue::Amount(self.totals.products),
            Field::Discount => FieldValue::Amount(self.totals.discount),
            Field::Freight => FieldValue::Amount(self.totals.freight),
            Field::GrandTotal => FieldValue::Amount(self.totals.grand_total),
            Field::Icms => FieldValue::Amount(self.totals.icms),
            Field::Ipi => FieldValue::Amount(self.totals.ipi),
            Field::ItemCount => FieldValue::Count(self.item_count),
        }
    }

    /// Warnings attached to one field.
    pub fn warnings_for(&self, field: Field) -> impl Iterator<Item = &FieldWarning> {
        self.warnings.iter().filter(move |w| w.field == field)
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    /// Data-quality checks that never reject the record.
    pub fn quality_issues(&self) -> Vec<String> {
        let mut issues = Vec::new();

        for field in Field::MONETARY {
            if let Some(amount) = self.value(field).as_amount() {
                if amount < Decimal::ZERO {
                    issues.push(format!("{} is negative ({})", field.label(), amount));
                }
            }
        }

        let floor = self.totals.products.checked_sub(self.totals.discount);
        if let Some(floor) = floor.filter(|floor| self.totals.grand_total < *floor) {
            issues.push(format!(
                "grand total ({}) is below product total minus discount ({})",
                self.totals.grand_total, floor
            ));
        }

        issues
    }
}

/// Category of a document-level failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FailureKind {
    /// Content is not well-formed XML.
    MalformedStructure,
    /// A mandatory field is absent or unusable.
    MissingMandatoryField,
    /// Well-formed XML that is not an NF-e.
    UnexpectedSchema,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::MalformedStructure => "malformed-structure",
            FailureKind::MissingMandatoryField => "missing-mandatory-field",
            FailureKind::UnexpectedSchema => "unexpected-schema",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A document that could not be turned into a record.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[error("{file}: {kind}: {detail}")]
pub struct ParseFailure {
    pub file: String,
    pub kind: FailureKind,
    pub detail: String,
    /// The offending field for `missing-mandatory-field`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<Field>,
}

impl ParseFailure {
    pub fn malformed(file: &str, detail: impl Into<String>) -> Self {
        Self {
            file: file.to_string(),
            kind: FailureKind::MalformedStructure,
            detail: detail.into(),
            field: None,
        }
    }

    pub fn unexpected_schema(file: &str, detail: impl Into<String>) -> Self {
        Self {
            file: file.to_string(),
            kind: FailureKind::UnexpectedSchema,
            detail: detail.into(),
            field: None,
        }
    }

    pub fn missing_field(file: &str, field: Field, detail: impl Into<String>) -> Self {
        Self {
            file: file.to_string(),
            kind: FailureKind::MissingMandatoryField,
            detail: detail.into(),
            field: Some(field),
        }
    }
}
