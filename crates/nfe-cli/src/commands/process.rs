//! Process command - extract the fields of a single NF-e document.

use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use clap::Args;
use console::style;
use tracing::info;

use nfe_core::invoice::rules::format_tax_id;
use nfe_core::{DocumentParser, InvoiceRecord, NfeParser};

use super::{display_amount, display_date, load_config};

/// Arguments for the process command.
#[derive(Args)]
pub struct ProcessArgs {
    /// Input NF-e XML file
    #[arg(required = true)]
    input: PathBuf,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    format: OutputFormat,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output
    Json,
    /// Plain text summary
    Text,
}

pub async fn run(args: ProcessArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();
    let config = load_config(config_path)?;

    if !args.input.is_file() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }

    info!("Processing file: {}", args.input.display());

    let content = fs::read(&args.input)?;
    let file = args
        .input
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| args.input.display().to_string());

    let parser = NfeParser::new(config.extraction);
    let record = parser.parse(&content, &file)?;

    let output = match args.format {
        OutputFormat::Json => serde_json::to_string_pretty(&record)?,
        OutputFormat::Text => format_text(&record),
    };

    if let Some(output_path) = &args.output {
        fs::write(output_path, &output)?;
        println!(
            "{} Output written to {}",
            style("✓").green(),
            output_path.display()
        );
    } else {
        println!("{}", output);
    }

    for warning in &record.warnings {
        eprintln!("{} {}", style("⚠").yellow(), warning);
    }

    info!("Processed {} in {:?}", file, start.elapsed());

    Ok(())
}

fn format_text(record: &InvoiceRecord) -> String {
    let mut output = String::new();

    output.push_str(&format!(
        "NF-e: {} (series {})\n",
        record.header.invoice_number, record.header.series
    ));
    output.push_str(&format!("Date: {}\n", display_date(record.header.issue_date)));
    output.push_str(&format!("Access key: {}\n", record.header.access_key));
    output.push_str(&format!(
        "Operation: {} - {}\n",
        record.header.operation_type, record.header.operation_nature
    ));
    output.push('\n');

    output.push_str("Issuer:\n");
    output.push_str(&format!("  {}\n", record.issuer.name));
    if !record.issuer.trade_name.is_empty() {
        output.push_str(&format!("  Trade name: {}\n", record.issuer.trade_name));
    }
    output.push_str(&format!("  CNPJ: {}\n", format_tax_id(&record.issuer.cnpj)));
    output.push('\n');

    output.push_str("Recipient:\n");
    output.push_str(&format!("  {}\n", record.recipient.name));
    output.push_str(&format!("  CNPJ/CPF: {}\n", format_tax_id(&record.recipient.tax_id)));
    output.push('\n');

    let totals = &record.totals;
    output.push_str("Totals:\n");
    output.push_str(&format!("  Products: {}\n", display_amount(totals.products)));
    output.push_str(&format!("  Discount: {}\n", display_amount(totals.discount)));
    output.push_str(&format!("  Freight:  {}\n", display_amount(totals.freight)));
    output.push_str(&format!("  ICMS:     {}\n", display_amount(totals.icms)));
    output.push_str(&format!("  IPI:      {}\n", display_amount(totals.ipi)));
    output.push_str(&format!("  Total:    {}\n", display_amount(totals.grand_total)));
    output.push('\n');

    output.push_str(&format!("Items: {}", record.item_count));

    output
}
