//! Read-only views over a [`Dataset`]: filtering, projection, sorting and
//! summary statistics.
//!
//! Views borrow the dataset and never modify it. Every operation consumes the
//! view and returns a narrowed one, so they chain:
//!
//! ```ignore
//! let view = DatasetView::new(&dataset)
//!     .filter_operation_type(OperationType::Saida)
//!     .sort_by(Field::IssueDate)
//!     .select(&[Field::InvoiceNumber, Field::GrandTotal]);
//! ```

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::Serialize;

use crate::error::DatasetError;
use crate::invoice::rules::normalize_amount;
use crate::models::dataset::Dataset;
use crate::models::invoice::{Field, FieldValue, InvoiceRecord, OperationType};

/// Columns shown when none are selected.
pub const DEFAULT_COLUMNS: [Field; 7] = [
    Field::InvoiceNumber,
    Field::Series,
    Field::IssueDate,
    Field::IssuerName,
    Field::RecipientName,
    Field::GrandTotal,
    Field::OperationType,
];

/// How to pick an issuer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IssuerFilter {
    /// CNPJ, punctuation ignored.
    Cnpj(String),
    /// Case-insensitive substring of the legal name.
    Name(String),
}

impl IssuerFilter {
    fn matches(&self, record: &InvoiceRecord) -> bool {
        match self {
            IssuerFilter::Cnpj(cnpj) => {
                let digits: String = cnpj.chars().filter(char::is_ascii_digit).collect();
                record.issuer.cnpj == digits
            }
            IssuerFilter::Name(name) => record
                .issuer
                .name
                .to_lowercase()
                .contains(&name.trim().to_lowercase()),
        }
    }
}

/// Rectangular projection of records: one header, typed cells.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Table {
    pub columns: Vec<Field>,
    pub rows: Vec<Vec<FieldValue>>,
}

/// Sum and average of one monetary column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AmountSummary {
    pub sum: Decimal,
    pub average: Decimal,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct OperationSummary {
    pub count: usize,
    pub grand_total: Decimal,
}

/// Summary of the records in a view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Statistics {
    pub count: usize,
    /// Every monetary column, keyed by field.
    pub amounts: BTreeMap<Field, AmountSummary>,
    pub grand_total_min: Option<Decimal>,
    pub grand_total_max: Option<Decimal>,
    pub grand_total_mean: Option<Decimal>,
    pub total_items: u64,
    /// Number of outgoing (Saída) notes.
    pub outgoing_count: usize,
    pub by_operation: BTreeMap<OperationType, OperationSummary>,
}

impl Statistics {
    pub fn amount(&self, field: Field) -> Option<&AmountSummary> {
        self.amounts.get(&field)
    }
}

fn checked_sum(
    field: Field,
    amounts: impl IntoIterator<Item = Decimal>,
) -> Result<Decimal, DatasetError> {
    amounts.into_iter().try_fold(Decimal::ZERO, |sum, amount| {
        sum.checked_add(amount)
            .ok_or_else(|| DatasetError::Overflow(field.column().to_string()))
    })
}

fn average(sum: Decimal, count: usize) -> Decimal {
    if count == 0 {
        return normalize_amount(Decimal::ZERO).0;
    }
    normalize_amount(sum / Decimal::from(count)).0
}

/// A filtered, ordered, projected window onto a dataset.
#[derive(Debug, Clone)]
pub struct DatasetView<'a> {
    dataset: &'a Dataset,
    records: Vec<&'a InvoiceRecord>,
    columns: Vec<Field>,
}

impl<'a> DatasetView<'a> {
    /// Every record, default columns.
    pub fn new(dataset: &'a Dataset) -> Self {
        Self {
            dataset,
            records: dataset.records().iter().collect(),
            columns: DEFAULT_COLUMNS.to_vec(),
        }
    }

    pub fn dataset(&self) -> &'a Dataset {
        self.dataset
    }

    pub fn filter_issuer(mut self, filter: &IssuerFilter) -> Self {
        self.records.retain(|r| filter.matches(r));
        self
    }

    pub fn filter_operation_type(mut self, operation: OperationType) -> Self {
        self.records.retain(|r| r.header.operation_type == operation);
        self
    }

    /// Project onto `columns`. An empty selection keeps the current one.
    pub fn select(mut self, columns: &[Field]) -> Self {
        if !columns.is_empty() {
            self.columns = columns.to_vec();
        }
        self
    }

    /// Stable ascending sort on one field.
    pub fn sort_by(mut self, field: Field) -> Self {
        self.records.sort_by_cached_key(|r| r.value(field));
        self
    }

    pub fn records(&self) -> &[&'a InvoiceRecord] {
        &self.records
    }

    pub fn columns(&self) -> &[Field] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Cell values in the selected columns.
    pub fn rows(&self) -> Vec<Vec<FieldValue>> {
        self.records
            .iter()
            .map(|r| self.columns.iter().map(|&f| r.value(f)).collect())
            .collect()
    }

    pub fn table(&self) -> Table {
        Table {
            columns: self.columns.clone(),
            rows: self.rows(),
        }
    }

    /// Sorted, de-duplicated issuer legal names.
    pub fn distinct_issuers(&self) -> Vec<&'a str> {
        let mut names: Vec<&'a str> = self.records.iter().map(|r| r.issuer.name.as_str()).collect();
        names.sort_unstable();
        names.dedup();
        names
    }

    /// Summary of the records in the view.
    ///
    /// Fails when a column total does not fit in a [`Decimal`].
    pub fn statistics(&self) -> Result<Statistics, DatasetError> {
        let count = self.records.len();

        let amounts: BTreeMap<Field, AmountSummary> = Field::MONETARY
            .into_iter()
            .map(|field| {
                let values = self.records.iter().filter_map(|r| r.value(field).as_amount());
                let sum = normalize_amount(checked_sum(field, values)?).0;
                Ok((field, AmountSummary { sum, average: average(sum, count) }))
            })
            .collect::<Result<_, DatasetError>>()?;

        let grand_totals = self.records.iter().map(|r| r.totals.grand_total);
        let grand_total_min = grand_totals.clone().min();
        let grand_total_max = grand_totals.max();
        let grand_total_mean = amounts
            .get(&Field::GrandTotal)
            .filter(|_| count > 0)
            .map(|summary| summary.average);

        let mut by_operation: BTreeMap<OperationType, OperationSummary> = BTreeMap::new();
        for record in &self.records {
            let entry = by_operation.entry(record.header.operation_type).or_default();
            entry.count += 1;
            entry.grand_total = checked_sum(
                Field::GrandTotal,
                [entry.grand_total, record.totals.grand_total],
            )?;
        }

        Ok(Statistics {
            count,
            amounts,
            grand_total_min,
            grand_total_max,
            grand_total_mean,
            total_items: self.records.iter().map(|r| u64::from(r.item_count)).sum(),
            outgoing_count: by_operation
                .get(&OperationType::Saida)
                .map_or(0, |s| s.count),
            by_operation,
        })
    }
}
