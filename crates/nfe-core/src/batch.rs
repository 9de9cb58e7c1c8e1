//! Batch aggregation: a directory of documents folded into one [`Dataset`].

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::error::BatchError;
use crate::invoice::{DocumentParser, NfeParser};
use crate::models::config::{BatchConfig, NfeConfig};
use crate::models::dataset::Dataset;
use crate::models::invoice::{InvoiceRecord, ParseFailure};

/// Reported before each document is parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress<'a> {
    /// Zero-based position in enumeration order.
    pub index: usize,
    pub total: usize,
    /// Name of the document, relative to the batch directory.
    pub file: &'a str,
}

/// Processes every candidate document of a directory.
#[derive(Debug, Clone)]
pub struct BatchProcessor<P = NfeParser> {
    parser: P,
    config: BatchConfig,
}

impl BatchProcessor<NfeParser> {
    pub fn new(config: &NfeConfig) -> Self {
        Self {
            parser: NfeParser::new(config.extraction.clone()),
            config: config.batch.clone(),
        }
    }
}

impl<P: DocumentParser> BatchProcessor<P> {
    /// Use a custom document parser.
    pub fn with_parser(parser: P, config: BatchConfig) -> Self {
        Self { parser, config }
    }

    /// Candidate files in sorted path order.
    pub fn candidates(&self, dir: &Path) -> Result<Vec<PathBuf>, BatchError> {
        if !dir.is_dir() {
            return Err(BatchError::DirectoryNotFound(dir.to_path_buf()));
        }

        let mut files = Vec::new();
        self.collect(dir, &mut files)?;
        files.sort();

        if files.is_empty() {
            return Err(BatchError::NoDocumentsFound {
                dir: dir.to_path_buf(),
                extension: self.config.extension.clone(),
            });
        }

        Ok(files)
    }

    fn collect(&self, dir: &Path, files: &mut Vec<PathBuf>) -> Result<(), BatchError> {
        let io_error = |source| BatchError::Io {
            path: dir.to_path_buf(),
            source,
        };

        for entry in fs::read_dir(dir).map_err(io_error)? {
            let entry = entry.map_err(io_error)?;
            // file_type() does not follow symlinks: linked directories are never entered
            let file_type = entry.file_type().map_err(io_error)?;
            let path = entry.path();

            if file_type.is_dir() {
                if self.config.recursive {
                    self.collect(&path, files)?;
                }
            } else if (file_type.is_file() || (file_type.is_symlink() && path.is_file()))
                && self.is_candidate(&path)
            {
                files.push(path);
            }
        }

        Ok(())
    }

    fn is_candidate(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case(&self.config.extension))
    }

    /// Read and parse one file. A read error is a malformed document.
    pub fn process_file(&self, path: &Path, file: &str) -> Result<InvoiceRecord, ParseFailure> {
        let content = fs::read(path)
            .map_err(|e| ParseFailure::malformed(file, format!("failed to read file: {}", e)))?;
        self.parser.parse(&content, file)
    }

    pub fn process_directory(&self, dir: &Path) -> Result<Dataset, BatchError> {
        self.process_directory_with(dir, |_| {})
    }

    /// Like [`process_directory`](Self::process_directory), calling `progress`
    /// before each document.
    pub fn process_directory_with<F>(&self, dir: &Path, mut progress: F) -> Result<Dataset, BatchError>
    where
        F: FnMut(Progress<'_>),
    {
        let candidates = self.candidates(dir)?;
        let total = candidates.len();
        info!("Found {} candidate documents in {}", total, dir.display());

        let (records, failures) = candidates.iter().enumerate().fold(
            (Vec::new(), Vec::new()),
            |(mut records, mut failures), (index, path)| {
                let file = display_name(dir, path);
                progress(Progress {
                    index,
                    total,
                    file: &file,
                });

                match self.process_file(path, &file) {
                    Ok(record) => {
                        debug!("{}: parsed", file);
                        records.push(record);
                    }
                    Err(failure) => {
                        warn!("{}", failure);
                        failures.push(failure);
                    }
                }

                (records, failures)
            },
        );

        let dataset = Dataset::new(records, failures);
        info!("Batch complete: {}", dataset.counts());
        Ok(dataset)
    }
}

fn display_name(dir: &Path, path: &Path) -> String {
    path.strip_prefix(dir).unwrap_or(path).display().to_string()
}

/// Process `dir` with the default parser.
pub fn process_directory(dir: &Path, config: &NfeConfig) -> Result<Dataset, BatchError> {
    BatchProcessor::new(config).process_directory(dir)
}
