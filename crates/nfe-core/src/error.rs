//! Error types for the nfe-core library.

use std::path::PathBuf;

use thiserror::Error;

/// Main error type for the nfe library.
#[derive(Error, Debug)]
pub enum NfeError {
    /// Directory-level batch error.
    #[error("batch error: {0}")]
    Batch(#[from] BatchError),

    /// Dataset summary error.
    #[error("dataset error: {0}")]
    Dataset(#[from] DatasetError),

    /// Export or re-import error.
    #[error("export error: {0}")]
    Export(#[from] ExportError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Errors that abort a whole batch before any document is parsed.
#[derive(Error, Debug)]
pub enum BatchError {
    /// The path does not exist or is not a directory.
    #[error("directory not found: {}", .0.display())]
    DirectoryNotFound(PathBuf),

    /// The directory holds no file with the expected extension.
    #[error("no .{extension} documents found in {}", dir.display())]
    NoDocumentsFound { dir: PathBuf, extension: String },

    /// Listing the directory failed.
    #[error("failed to read directory {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors raised while reading XML content into an element tree.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum XmlError {
    /// The underlying reader rejected the content.
    #[error("XML syntax error at byte {position}: {message}")]
    Syntax { position: u64, message: String },

    /// End of input reached with open elements.
    #[error("unexpected end of document, <{0}> is not closed")]
    Unclosed(String),

    /// No root element at all.
    #[error("document has no root element")]
    Empty,

    /// Elements or text after the root element was closed.
    #[error("content found after the root element")]
    TrailingContent,

    /// Elements nested deeper than the supported limit.
    #[error("elements nested deeper than {0} levels")]
    TooDeep(usize),

    /// Names or text that are not valid UTF-8.
    #[error("invalid UTF-8 in {0}")]
    Encoding(String),
}

/// Errors raised while summarizing a dataset view.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DatasetError {
    /// A column total does not fit in a decimal.
    #[error("sum of {0} exceeds the decimal range")]
    Overflow(String),
}

/// Errors related to dataset export and re-import.
#[derive(Error, Debug)]
pub enum ExportError {
    /// CSV writer/reader error.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Spreadsheet XML error.
    #[error("spreadsheet XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A header names a column that is not part of the record schema.
    #[error("unknown column: {0}")]
    UnknownColumn(String),

    /// A cell could not be converted back to its column type.
    #[error("invalid value for {column}: {value:?} ({reason})")]
    InvalidCell {
        column: String,
        value: String,
        reason: String,
    },

    /// The expected worksheet is not in the workbook.
    #[error("worksheet not found: {0}")]
    MissingWorksheet(String),

    /// A row does not match the header width.
    #[error("row {row} has {found} cells, expected {expected}")]
    RowWidth {
        row: usize,
        found: usize,
        expected: usize,
    },
}

/// Result type for the nfe library.
pub type Result<T> = std::result::Result<T, NfeError>;
