use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use sqlscribe_core::SqlscribeConfig;

mod commands;
mod logging;
mod output;

use commands::pipeline::{InputFormat, Pipeline};

const DEFAULT_CONFIG_FILE: &str = "sqlscribe.yaml";

#[derive(Parser, Debug)]
#[command(
    name = "sqlscribe",
    version,
    about = "Recover SQL from model output and tables from query results"
)]
struct Cli {
    /// Configuration file. Defaults to ./sqlscribe.yaml when it exists.
    #[arg(long, global = true, env = "SQLSCRIBE_CONFIG")]
    config: Option<PathBuf>,

    /// Print tables and reports as JSON
    #[arg(long, global = true, default_value_t = false)]
    json: bool,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Extract the SQL statement from model output
    Extract {
        /// Model output file (stdin when omitted or "-")
        input: Option<PathBuf>,
    },

    /// Rewrite table and column names to their schema casing
    Normalize {
        /// SQL file (stdin when omitted or "-")
        input: Option<PathBuf>,

        /// Also print which identifiers were corrected
        #[arg(long, default_value_t = false)]
        report: bool,
    },

    /// Print the column names a SELECT statement produces
    Columns {
        /// SQL file (stdin when omitted or "-")
        input: Option<PathBuf>,
    },

    /// Parse a raw query result into a table
    ParseResult {
        /// Result file (stdin when omitted or "-")
        input: Option<PathBuf>,

        /// Column names to use when the rows fit them, comma-separated
        #[arg(long, value_delimiter = ',')]
        columns: Vec<String>,

        /// How to read the result file
        #[arg(long, value_enum, default_value_t = InputFormat::Auto)]
        format: InputFormat,
    },

    /// Extract, normalize and infer columns, then parse a result file with them
    Run {
        /// Model output file (stdin when omitted or "-")
        input: Option<PathBuf>,

        /// Raw result of executing the extracted statement
        #[arg(long)]
        result: Option<PathBuf>,

        /// How to read the result file
        #[arg(long, value_enum, default_value_t = InputFormat::Auto)]
        format: InputFormat,
    },

    /// Validate the configuration and print a schema summary
    Check,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = load_config(cli.config.as_deref())?;
    logging::init(&config.logging);

    let pipeline = || Pipeline::from_config(&config);
    let json = cli.json;

    match cli.cmd {
        Command::Extract { input } => {
            let text = read_input(input.as_deref())?;
            pipeline()?.extract(&text, json)?;
        }
        Command::Normalize { input, report } => {
            let sql = read_input(input.as_deref())?;
            pipeline()?.normalize(&sql, report, json)?;
        }
        Command::Columns { input } => {
            let sql = read_input(input.as_deref())?;
            pipeline()?.columns(&sql, json)?;
        }
        Command::ParseResult {
            input,
            columns,
            format,
        } => {
            let text = read_input(input.as_deref())?;
            pipeline()?.parse_result(text, format, &columns, json)?;
        }
        Command::Run {
            input,
            result,
            format,
        } => {
            let text = read_input(input.as_deref())?;
            let raw = result.as_deref().map(read_file).transpose()?;
            pipeline()?.run(&text, raw, format, json)?;
        }
        Command::Check => {
            let path = cli
                .config
                .clone()
                .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
            commands::check::run_check(&path, &config, json)?;
        }
    }

    Ok(())
}

/// Load the configuration file.
///
/// An explicit path must exist. Without one, `./sqlscribe.yaml` is used when
/// present and an empty configuration otherwise.
fn load_config(path: Option<&Path>) -> Result<SqlscribeConfig> {
    let path = match path {
        Some(path) => path.to_path_buf(),
        None => {
            let default = PathBuf::from(DEFAULT_CONFIG_FILE);
            if !default.exists() {
                return Ok(SqlscribeConfig::default());
            }
            default
        }
    };

    SqlscribeConfig::load_with_context(&path)
        .with_context(|| format!("Failed to load configuration from {}", path.display()))
}

fn read_input(path: Option<&Path>) -> Result<String> {
    match path {
        Some(path) if path != Path::new("-") => read_file(path),
        _ => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read stdin")?;
            Ok(buf)
        }
    }
}

fn read_file(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}
