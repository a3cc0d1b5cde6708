//! bizmodel CLI - Business Projection Workbooks
//!
//! Command-line interface for generating formula-driven 48-month projection
//! workbooks from a business configuration JSON file.

use anyhow::{Context, Result};
use bizmodel_core::{parse_configuration, FixedClock, Generator, MonthAxis, SystemClock};
use bizmodel_render::WorkbookGenerator;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "bizmodel")]
#[command(author, version, about = "Business projection workbook generator", long_about = None)]
struct Cli {
    /// Verbose output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate an xlsx workbook from a configuration file
    Generate {
        /// Configuration JSON file
        #[arg(value_name = "CONFIG")]
        config: PathBuf,

        /// Output workbook path
        #[arg(short, long, default_value = "business_model.xlsx")]
        output: PathBuf,

        /// Currency symbol for money columns
        #[arg(long, env = "BIZMODEL_CURRENCY", default_value = "")]
        currency: String,

        /// First projection month (YYYY-MM-DD, defaults to today)
        #[arg(long, value_parser = parse_date)]
        start_date: Option<NaiveDate>,
    },

    /// Print the planned workbook as JSON without writing xlsx
    Plan {
        /// Configuration JSON file
        #[arg(value_name = "CONFIG")]
        config: PathBuf,

        /// Only print this sheet
        #[arg(short, long)]
        sheet: Option<String>,

        /// First projection month (YYYY-MM-DD, defaults to today)
        #[arg(long, value_parser = parse_date)]
        start_date: Option<NaiveDate>,
    },

    /// Print the 48 month labels
    Months {
        /// First projection month (YYYY-MM-DD, defaults to today)
        #[arg(long, value_parser = parse_date)]
        start_date: Option<NaiveDate>,
    },
}

fn parse_date(s: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|e| format!("expected YYYY-MM-DD: {e}"))
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Some(Commands::Generate {
            config,
            output,
            currency,
            start_date,
        }) => {
            let configuration = read_configuration(&config)?;
            let axis = month_axis(start_date);
            let bytes = WorkbookGenerator::new()
                .currency(currency)
                .generate(&configuration, &axis)
                .with_context(|| format!("Failed to generate workbook from {}", config.display()))?;
            std::fs::write(&output, &bytes)
                .with_context(|| format!("Failed to write {}", output.display()))?;
            println!("Wrote {} ({} bytes)", output.display(), bytes.len());
        }
        Some(Commands::Plan {
            config,
            sheet,
            start_date,
        }) => {
            let configuration = read_configuration(&config)?;
            let plan = WorkbookGenerator::new().plan(&configuration, &month_axis(start_date))?;
            let json = match sheet {
                Some(name) => {
                    let sheet = plan.sheet(&name).with_context(|| {
                        format!("No sheet named '{name}' (have {})", plan.sheet_names().join(", "))
                    })?;
                    serde_json::to_string_pretty(sheet)?
                }
                None => serde_json::to_string_pretty(&plan)?,
            };
            println!("{json}");
        }
        Some(Commands::Months { start_date }) => {
            for label in month_axis(start_date).iter() {
                println!("{label}");
            }
        }
        None => {
            println!("bizmodel - Business Projection Workbooks");
            println!("Run with --help for usage information");
        }
    }

    Ok(())
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn read_configuration(path: &Path) -> Result<bizmodel_core::BusinessConfiguration> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    parse_configuration(&json)
        .with_context(|| format!("Invalid configuration in {}", path.display()))
}

fn month_axis(start_date: Option<NaiveDate>) -> MonthAxis {
    match start_date {
        Some(date) => MonthAxis::from_clock(&FixedClock::new(date)),
        None => MonthAxis::from_clock(&SystemClock),
    }
}
