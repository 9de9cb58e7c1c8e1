//! Subcommands of the `nfe` binary.

pub mod batch;
pub mod config;
pub mod process;

use std::path::Path;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use tracing::debug;

use nfe_core::invoice::rules::{format_brl_amount, format_tax_id};
use nfe_core::models::config::NfeConfig;
use nfe_core::{Field, FieldValue};

/// Load the configuration from `--config`, the default location, or defaults.
pub fn load_config(config_path: Option<&str>) -> anyhow::Result<NfeConfig> {
    if let Some(path) = config_path {
        return NfeConfig::from_file(Path::new(path))
            .map_err(|e| anyhow::anyhow!("Failed to load config {}: {}", path, e));
    }

    let default_path = config::default_config_path();
    if default_path.exists() {
        debug!("Using config file {}", default_path.display());
        Ok(NfeConfig::from_file(&default_path)?)
    } else {
        Ok(NfeConfig::default())
    }
}

/// Brazilian formatting: `R$ 1.234,56`.
pub fn display_amount(amount: Decimal) -> String {
    format!("R$ {}", format_brl_amount(amount))
}

pub fn display_date(date: NaiveDate) -> String {
    date.format("%d/%m/%Y").to_string()
}

/// Cell text for terminal output.
pub fn display_value(field: Field, value: &FieldValue) -> String {
    match (field, value) {
        (_, FieldValue::Amount(a)) => display_amount(*a),
        (_, FieldValue::Date(d)) => display_date(*d),
        (Field::IssuerCnpj | Field::RecipientTaxId, FieldValue::Text(id)) => format_tax_id(id),
        _ => value.to_cell(),
    }
}
