//! Data models: records, failures, datasets and configuration.

pub mod config;
pub mod dataset;
pub mod invoice;
