use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;
use vizspec::family::entries;
use vizspec::palette::ColorPalette;
use vizspec::{recommend, ChartOptions, Engine, EngineConfig, RowSet};

#[derive(Parser, Debug)]
#[command(name = "vizspec")]
#[command(about = "Profile tabular data and build declarative chart specifications", long_about = None)]
struct Args {
    /// Engine config file (JSON); missing fields take their defaults
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Pretty-print JSON output
    #[arg(long, global = true)]
    pretty: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print per-column types and statistics
    Profile {
        /// CSV or JSON file, or '-' for CSV on stdin
        file: String,
    },
    /// Build a chart specification
    Chart {
        /// CSV or JSON file, or '-' for CSV on stdin
        file: String,
        /// Chart family (e.g. bar, line, groupedBar)
        #[arg(long = "type", short = 't')]
        family: String,
        /// Chart options as a JSON object (e.g. '{"xColumn": "region"}')
        #[arg(long)]
        options: Option<String>,
    },
    /// Suggest chart families for the data
    Recommend {
        /// CSV or JSON file, or '-' for CSV on stdin
        file: String,
    },
    /// List supported chart families
    Families,
    /// List colour palette names
    Palettes,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct FamilyListing {
    family: &'static str,
    display_name: &'static str,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();

    let config = match &args.config {
        Some(path) => EngineConfig::from_path(path)?,
        None => EngineConfig::default(),
    };
    let engine = Engine::with_config(config);

    match &args.command {
        Command::Profile { file } => {
            let rows = read_rows(file)?;
            emit(&engine.profile(&rows), args.pretty)
        }
        Command::Chart { file, family, options } => {
            let rows = read_rows(file)?;
            let options: ChartOptions = match options {
                Some(raw) => serde_json::from_str(raw).context("Failed to parse --options JSON")?,
                None => ChartOptions::default(),
            };
            let spec = engine
                .build_chart_named(&rows, family, &options)
                .with_context(|| format!("Failed to build '{}' chart", family))?;
            emit(&spec, args.pretty)
        }
        Command::Recommend { file } => {
            let rows = read_rows(file)?;
            emit(&recommend(&engine.profile(&rows)), args.pretty)
        }
        Command::Families => {
            let listing: Vec<FamilyListing> = entries()
                .iter()
                .map(|e| FamilyListing {
                    family: e.family.as_str(),
                    display_name: e.family.display_name(),
                })
                .collect();
            emit(&listing, args.pretty)
        }
        Command::Palettes => emit(&ColorPalette::names(), args.pretty),
    }
}

fn read_rows(file: &str) -> Result<RowSet> {
    if file == "-" {
        return RowSet::from_csv_reader(io::stdin().lock()).context("Failed to read CSV from stdin");
    }
    RowSet::from_path(Path::new(file)).with_context(|| format!("Failed to read data file '{}'", file))
}

fn emit<T: Serialize>(value: &T, pretty: bool) -> Result<()> {
    let json = if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    }
    .context("Failed to serialize output")?;

    let stdout = io::stdout();
    let mut handle = stdout.lock();
    writeln!(handle, "{}", json).context("Failed to write to stdout")?;
    handle.flush().context("Failed to flush stdout")?;
    Ok(())
}
