//! Core library for NF-e (Brazilian electronic invoice) extraction.
//!
//! This crate provides:
//! - Namespace-tolerant field resolution over NF-e XML documents
//! - Typed coercion of dates, amounts and taxpayer identifiers
//! - Batch aggregation of a directory into a [`Dataset`] with per-document
//!   failure isolation
//! - Read-only dataset views (filters, projection, statistics)
//! - CSV and SpreadsheetML export with matching readers

pub mod batch;
pub mod dataset;
pub mod error;
pub mod export;
pub mod invoice;
pub mod models;

pub use batch::{process_directory, BatchProcessor, Progress};
pub use dataset::{DatasetView, IssuerFilter, Statistics, Table};
pub use error::{BatchError, DatasetError, ExportError, NfeError, Result, XmlError};
pub use export::ExportKind;
pub use invoice::{parse, DocumentParser, NfeParser};
pub use models::config::NfeConfig;
pub use models::dataset::{BatchCounts, Dataset};
pub use models::invoice::{
    FailureKind, Field, FieldValue, FieldWarning, InvoiceRecord, OperationType, ParseFailure,
};
