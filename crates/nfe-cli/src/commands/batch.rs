//! Batch command - aggregate a directory of NF-e documents into one dataset.

use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use chrono::Local;
use clap::Args;
use comfy_table::{presets::UTF8_FULL, Cell, CellAlignment, ContentArrangement, Table};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::{json, Map, Value};
use tracing::debug;

use nfe_core::export::{default_file_name, export_view};
use nfe_core::models::config::NfeConfig;
use nfe_core::{
    BatchProcessor, Dataset, DatasetView, ExportKind, Field, FieldValue, IssuerFilter,
    OperationType, Statistics,
};

use super::{display_amount, display_value, load_config};

/// Arguments for the batch command.
#[derive(Args)]
pub struct BatchArgs {
    /// Directory containing NF-e XML files
    #[arg(required = true)]
    input: PathBuf,

    /// Only notes from this issuer CNPJ
    #[arg(long)]
    issuer_cnpj: Option<String>,

    /// Only notes whose issuer name contains this text
    #[arg(long)]
    issuer_name: Option<String>,

    /// Only notes of this operation type (entrada or saida)
    #[arg(long)]
    operation_type: Option<OperationType>,

    /// Columns to show and export, comma separated (e.g. invoice_number,grand_total)
    #[arg(long, value_delimiter = ',')]
    columns: Vec<Field>,

    /// Sort by this column
    #[arg(long)]
    sort_by: Option<Field>,

    /// Write a CSV file
    #[arg(long)]
    csv: Option<PathBuf>,

    /// Write a SpreadsheetML workbook
    #[arg(long)]
    xls: Option<PathBuf>,

    /// Write both formats with timestamped names into this directory
    #[arg(long)]
    export_dir: Option<PathBuf>,

    /// Print summary statistics
    #[arg(long)]
    stats: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    format: BatchFormat,

    /// Descend into subdirectories
    #[arg(short, long)]
    recursive: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum BatchFormat {
    /// Table on the terminal
    Table,
    /// JSON document on stdout
    Json,
}

pub async fn run(args: BatchArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();

    let mut config = load_config(config_path)?;
    if args.recursive {
        config.batch.recursive = true;
    }

    let dataset = process(&args, &config)?;

    let mut view = DatasetView::new(&dataset);
    if let Some(cnpj) = &args.issuer_cnpj {
        view = view.filter_issuer(&IssuerFilter::Cnpj(cnpj.clone()));
    }
    if let Some(name) = &args.issuer_name {
        view = view.filter_issuer(&IssuerFilter::Name(name.clone()));
    }
    if let Some(operation) = args.operation_type {
        view = view.filter_operation_type(operation);
    }
    if let Some(field) = args.sort_by {
        view = view.sort_by(field);
    }
    view = if args.columns.is_empty() {
        view.select(&config.export.default_columns)
    } else {
        view.select(&args.columns)
    };

    debug!("{} of {} records after filters", view.len(), dataset.records().len());

    match args.format {
        BatchFormat::Table => {
            print_table(&view);
            if args.stats {
                print_statistics(&view.statistics()?);
            }
        }
        BatchFormat::Json => {
            let mut output = json!({
                "counts": dataset.counts(),
                "records": projected_records(&view),
                "failures": dataset.failures(),
            });
            if args.stats {
                output["statistics"] = serde_json::to_value(view.statistics()?)?;
            }
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }

    export(&args, &view, &config)?;

    // Keep stdout parseable for JSON output
    let summary = summary(&dataset, start);
    if args.format == BatchFormat::Json {
        eprintln!("{}", summary);
    } else {
        println!("{}", summary);
    }

    Ok(())
}

fn process(args: &BatchArgs, config: &NfeConfig) -> anyhow::Result<Dataset> {
    let processor = BatchProcessor::new(config);

    let pb = ProgressBar::new(0);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files {msg}")?
            .progress_chars("=>-"),
    );

    let dataset = processor.process_directory_with(&args.input, |progress| {
        pb.set_length(progress.total as u64);
        pb.set_position(progress.index as u64);
        pb.set_message(progress.file.to_string());
    })?;

    pb.finish_and_clear();
    Ok(dataset)
}

fn print_table(view: &DatasetView<'_>) {
    if view.is_empty() {
        println!("{} No records match the filters", style("ℹ").blue());
        return;
    }

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(view.columns().iter().map(|f| Cell::new(f.column())));

    for row in view.rows() {
        table.add_row(view.columns().iter().zip(&row).map(|(&field, value)| {
            let cell = Cell::new(display_value(field, value));
            match value {
                FieldValue::Amount(_) | FieldValue::Count(_) => {
                    cell.set_alignment(CellAlignment::Right)
                }
                _ => cell,
            }
        }));
    }

    println!("{table}");
}

/// One JSON object per record, holding only the selected columns.
fn projected_records(view: &DatasetView<'_>) -> Vec<Map<String, Value>> {
    view.rows()
        .into_iter()
        .map(|row| {
            view.columns()
                .iter()
                .zip(row)
                .map(|(field, value)| (field.column().to_string(), json!(value)))
                .collect()
        })
        .collect()
}

fn print_statistics(stats: &Statistics) {
    println!();
    println!("{}", style("Statistics").bold());
    println!("  Notes:          {}", stats.count);
    println!("  Outgoing:       {}", stats.outgoing_count);
    println!("  Items:          {}", stats.total_items);

    if let (Some(min), Some(max), Some(mean)) = (
        stats.grand_total_min,
        stats.grand_total_max,
        stats.grand_total_mean,
    ) {
        println!(
            "  Grand total:    min {} / max {} / mean {}",
            display_amount(min),
            display_amount(max),
            display_amount(mean)
        );
    }

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_header(vec!["column", "sum", "average"]);
    for (field, summary) in &stats.amounts {
        table.add_row(vec![
            Cell::new(field.column()),
            Cell::new(display_amount(summary.sum)).set_alignment(CellAlignment::Right),
            Cell::new(display_amount(summary.average)).set_alignment(CellAlignment::Right),
        ]);
    }
    println!("{table}");

    for (operation, summary) in &stats.by_operation {
        println!(
            "  {:<8} {} notes, {}",
            operation.to_string(),
            summary.count,
            display_amount(summary.grand_total)
        );
    }
}

fn export(args: &BatchArgs, view: &DatasetView<'_>, config: &NfeConfig) -> anyhow::Result<()> {
    let mut targets: Vec<(ExportKind, PathBuf)> = Vec::new();

    if let Some(path) = &args.csv {
        targets.push((ExportKind::Csv, path.clone()));
    }
    if let Some(path) = &args.xls {
        targets.push((ExportKind::Spreadsheet, path.clone()));
    }
    if let Some(dir) = &args.export_dir {
        fs::create_dir_all(dir)?;
        let now = Local::now().naive_local();
        for kind in [ExportKind::Csv, ExportKind::Spreadsheet] {
            targets.push((kind, dir.join(default_file_name(kind, now))));
        }
    }

    for (kind, path) in targets {
        export_view(view, kind, &path, &config.export)?;
        eprintln!(
            "{} Exported {} records to {}",
            style("✓").green(),
            view.len(),
            path.display()
        );
    }

    Ok(())
}

fn summary(dataset: &Dataset, start: Instant) -> String {
    let counts = dataset.counts();
    let mut lines = vec![
        String::new(),
        format!(
            "{} Processed {} files in {:?}",
            style("✓").green(),
            counts.seen,
            start.elapsed()
        ),
        format!(
            "   {} parsed, {} failed",
            style(counts.parsed).green(),
            style(counts.failed).red()
        ),
    ];

    if !dataset.failures().is_empty() {
        lines.push(String::new());
        lines.push(style("Failed files:").red().to_string());
        for failure in dataset.failures() {
            lines.push(format!(
                "  - {}: {}: {}",
                failure.file, failure.kind, failure.detail
            ));
        }
    }

    let flagged: Vec<_> = dataset.records_with_warnings().collect();
    if !flagged.is_empty() {
        lines.push(String::new());
        lines.push(style("Warnings:").yellow().to_string());
        for record in flagged {
            for warning in &record.warnings {
                lines.push(format!("  - {}: {}", record.file, warning));
            }
        }
    }

    lines.join("\n")
}
