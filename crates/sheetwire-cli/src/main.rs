//! Sheetwire CLI - read and write remote spreadsheet values

use std::fs::File;
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use serde_json::Value;
use sheetwire::http::HttpTransport;
use sheetwire::prelude::*;
use sheetwire::{
    grid_range_to_text_range, text_range_to_grid_range, validate_text_range, CsvExportOptions,
    ResilientExecutor, StaticToken,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "sheetwire")]
#[command(author, version, about = "Read and write remote spreadsheet values by A1 range")]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct GlobalArgs {
    /// Credential file (default: auth/token.json, or $GOOGLE_SERVICE_TOKEN when set)
    #[arg(long, global = true)]
    token_file: Option<PathBuf>,

    /// Use this access token as-is, skipping credential loading and refresh
    #[arg(long, global = true, env = "SHEETWIRE_ACCESS_TOKEN", hide_env_values = true)]
    access_token: Option<String>,

    /// Attempts per request, including the first
    #[arg(long, global = true, default_value = "3")]
    max_attempts: u32,

    /// API root URL
    #[arg(long, global = true)]
    base_url: Option<String>,
}

#[derive(Args)]
struct SheetArgs {
    /// Spreadsheet id (from its URL)
    spreadsheet: String,

    /// Tab name
    #[arg(short, long, conflicts_with = "sheet_id")]
    sheet: Option<String>,

    /// Tab id
    #[arg(long)]
    sheet_id: Option<i64>,
}

#[derive(Subcommand)]
enum Commands {
    /// Read values and print them as JSON or CSV
    #[command(alias = "get")]
    Read {
        #[command(flatten)]
        target: SheetArgs,

        /// A1 range (default: whole tab)
        range: Option<String>,

        /// Write CSV instead of JSON
        #[arg(long)]
        csv: bool,

        /// CSV field delimiter
        #[arg(short, long, default_value = ",")]
        delimiter: char,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Append rows after the table at a range
    Append {
        #[command(flatten)]
        target: SheetArgs,

        /// Rows as JSON, e.g. '[["a", 1], ["b", 2]]'
        #[arg(long)]
        values: String,

        /// A1 range used to find the table (default: whole tab)
        #[arg(long)]
        range: Option<String>,

        /// RAW or USER_ENTERED
        #[arg(long, default_value = "USER_ENTERED")]
        input: ValueInputOption,

        /// INSERT_ROWS or OVERWRITE
        #[arg(long, default_value = "INSERT_ROWS")]
        insert: InsertDataOption,
    },

    /// Overwrite cells at a range; a single cell is the top-left anchor
    Update {
        #[command(flatten)]
        target: SheetArgs,

        /// A1 range or anchor cell
        range: String,

        /// Rows (or columns) as JSON
        #[arg(long)]
        values: String,

        /// RAW or USER_ENTERED
        #[arg(long, default_value = "USER_ENTERED")]
        input: ValueInputOption,

        /// ROWS or COLUMNS
        #[arg(long, default_value = "ROWS")]
        major: MajorDimension,
    },

    /// Write a single cell
    UpdateCell {
        #[command(flatten)]
        target: SheetArgs,

        /// Cell reference, e.g. B7
        cell: String,

        /// Value as JSON; bare text is written as a string
        value: String,
    },

    /// Clear values at a range
    Clear {
        #[command(flatten)]
        target: SheetArgs,

        /// A1 range (default: whole tab)
        range: Option<String>,
    },

    /// Show spreadsheet metadata and its tabs
    Info {
        /// Spreadsheet id
        spreadsheet: String,
    },

    /// Convert or check ranges offline
    #[command(subcommand)]
    Range(RangeCommand),
}

#[derive(Subcommand)]
enum RangeCommand {
    /// A1 text to a zero-based grid range
    ToGrid { text: String },

    /// Grid range JSON to A1 text
    ToA1 { json: String },

    /// Exit non-zero if the A1 text is not a valid range
    Check { text: String },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Read {
            target,
            range,
            csv,
            delimiter,
            output,
        } => read(&cli.global, &target, range.as_deref(), csv, delimiter, output),
        Commands::Append {
            target,
            values,
            range,
            input,
            insert,
        } => {
            let sheet = open_sheet(&cli.global, &target)?;
            let options = WriteOptions::default()
                .with_value_input(input)
                .with_insert_data(insert);
            report(sheet.append(parse_values(&values)?, range.as_deref(), options))
        }
        Commands::Update {
            target,
            range,
            values,
            input,
            major,
        } => {
            let sheet = open_sheet(&cli.global, &target)?;
            let options = WriteOptions::default()
                .with_value_input(input)
                .with_major_dimension(major);
            report(sheet.update(&range, parse_values(&values)?, options))
        }
        Commands::UpdateCell {
            target,
            cell,
            value,
        } => {
            let sheet = open_sheet(&cli.global, &target)?;
            report(sheet.update_cell(&cell, parse_cell(&value)))
        }
        Commands::Clear { target, range } => {
            let sheet = open_sheet(&cli.global, &target)?;
            report(sheet.clear(range.as_deref()))
        }
        Commands::Info { spreadsheet } => show_info(&cli.global, &spreadsheet),
        Commands::Range(command) => range_command(command),
    }
}

fn client(global: &GlobalArgs) -> Result<SheetsClient> {
    let mut config = ClientConfig::from_env();
    config.retry = config.retry.with_max_attempts(global.max_attempts);
    if let Some(base_url) = &global.base_url {
        config.base_url = base_url.clone();
    }
    if let Some(path) = &global.token_file {
        config.credential_source = CredentialSource::File(path.clone());
    }

    if let Some(token) = &global.access_token {
        let executor =
            ResilientExecutor::new(Arc::new(StaticToken::new(token.clone())), config.retry);
        let transport = HttpTransport::new(&config.base_url, config.timeout)?;
        return Ok(SheetsClient::new(executor, transport));
    }

    SheetsClient::from_config(config).context("Failed to set up client")
}

fn open_spreadsheet(global: &GlobalArgs, spreadsheet_id: &str) -> Result<Spreadsheet> {
    let envelope = client(global)?.open(spreadsheet_id);
    envelope
        .into_result()
        .with_context(|| format!("Failed to open spreadsheet '{spreadsheet_id}'"))?
        .ok_or_else(|| anyhow!("Spreadsheet '{spreadsheet_id}' returned no metadata"))
}

fn open_sheet(global: &GlobalArgs, target: &SheetArgs) -> Result<Sheet> {
    let spreadsheet = open_spreadsheet(global, &target.spreadsheet)?;
    let sheet = match (&target.sheet, target.sheet_id) {
        (Some(name), _) => spreadsheet
            .get_by_name(name)
            .with_context(|| format!("Tab '{name}' not found"))?,
        (None, Some(id)) => spreadsheet
            .get_by_id(id)
            .with_context(|| format!("Tab id {id} not found"))?,
        (None, None) => spreadsheet
            .sheets()
            .first()
            .and_then(|info| spreadsheet.get_by_id(info.sheet_id))
            .context("Spreadsheet has no tabs")?,
    };
    tracing::debug!(%sheet, "Selected tab");
    Ok(sheet)
}

/// Print an envelope as JSON; fail the process when it is not ok
fn report<T: serde::Serialize>(envelope: Envelope<T>) -> Result<()> {
    let json = serde_json::to_string_pretty(&envelope).context("Failed to serialize result")?;
    println!("{json}");
    match envelope.error {
        Some(error) if !envelope.ok => Err(anyhow!(error)),
        _ => Ok(()),
    }
}

fn parse_values(json: &str) -> Result<Vec<Vec<CellValue>>> {
    serde_json::from_str(json).context("--values must be a JSON array of arrays")
}

fn parse_cell(text: &str) -> CellValue {
    serde_json::from_str(text).unwrap_or_else(|_| CellValue::from(text))
}

fn read(
    global: &GlobalArgs,
    target: &SheetArgs,
    range: Option<&str>,
    csv: bool,
    delimiter: char,
    output: Option<PathBuf>,
) -> Result<()> {
    let sheet = open_sheet(global, target)?;

    if !csv {
        return report(sheet.read(range));
    }

    if !delimiter.is_ascii() {
        bail!("Delimiter must be a single ASCII character");
    }
    let options = CsvExportOptions {
        delimiter: delimiter as u8,
        ..Default::default()
    };

    let envelope = match &output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create '{}'", path.display()))?;
            sheet.to_csv(file, range, &options)
        }
        None => sheet.to_csv(io::stdout().lock(), range, &options),
    };

    if let Some(error) = envelope.error {
        return Err(anyhow!(error)).context("CSV export failed");
    }
    if let Some(path) = output {
        let rows = envelope
            .context_value("rows_written")
            .and_then(Value::as_u64)
            .unwrap_or(0);
        eprintln!("Wrote {rows} rows to '{}'", path.display());
    }
    Ok(())
}

fn show_info(global: &GlobalArgs, spreadsheet_id: &str) -> Result<()> {
    let spreadsheet = open_spreadsheet(global, spreadsheet_id)?;

    let mut out = io::stdout().lock();
    writeln!(out, "Title: {}", spreadsheet.title())?;
    writeln!(out, "Locale: {}", spreadsheet.locale())?;
    writeln!(out, "Time zone: {}", spreadsheet.time_zone())?;
    writeln!(out, "Sheets: {}", spreadsheet.sheets().len())?;

    for info in spreadsheet.sheets() {
        writeln!(out)?;
        writeln!(out, "  Sheet {} (id {}): \"{}\"", info.index, info.sheet_id, info.title)?;
        writeln!(
            out,
            "    Grid: {} rows x {} columns",
            info.row_count, info.column_count
        )?;
    }

    Ok(())
}

fn range_command(command: RangeCommand) -> Result<()> {
    match command {
        RangeCommand::ToGrid { text } => {
            let grid = text_range_to_grid_range(&text)
                .with_context(|| format!("Cannot convert '{text}'"))?;
            println!("{}", serde_json::to_string(&grid)?);
        }
        RangeCommand::ToA1 { json } => {
            let value: Value = serde_json::from_str(&json).context("Grid range must be JSON")?;
            let scoped = value.get("sheetId").is_some();
            let grid = GridRange::from_json(&value, scoped)?;
            println!("{}", grid_range_to_text_range(&grid)?);
        }
        RangeCommand::Check { text } => {
            if !validate_text_range(&text) {
                bail!("'{text}' is not a valid range");
            }
            println!("ok");
        }
    }
    Ok(())
}
