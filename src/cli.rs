use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::readers::Strategy;

#[derive(Debug, Parser)]
#[command(author, version, about = "Read DSSAT output and observed-data files as tables", long_about = None)]
pub struct Cli {
    /// YAML configuration overriding reader and reference-file defaults
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Preview the first rows of a parsed model file in a formatted table
    Preview(PreviewArgs),
    /// List parsed columns with inferred kinds and variable labels
    Columns(ColumnsArgs),
    /// Convert a parsed model file to CSV
    Convert(ConvertArgs),
    /// Compare a simulated column against observations
    Compare(CompareArgs),
    /// Look up variable codes and registered crops in the reference files
    Lookup(LookupArgs),
}

/// Which reader to apply; `auto` tries the conventional order for the file
/// name and keeps the first that succeeds.
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq, Default)]
#[value(rename_all = "kebab-case")]
pub enum ReaderFormat {
    #[default]
    Auto,
    Sections,
    NameField,
    Blocks,
}

impl ReaderFormat {
    pub fn strategy(&self) -> Option<Strategy> {
        match self {
            ReaderFormat::Auto => None,
            ReaderFormat::Sections => Some(Strategy::Sections),
            ReaderFormat::NameField => Some(Strategy::NameField),
            ReaderFormat::Blocks => Some(Strategy::Blocks),
        }
    }
}

#[derive(Debug, Args)]
pub struct PreviewArgs {
    /// Model output or observed-data file
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
    /// File layout (auto, sections, name-field, blocks)
    #[arg(long, value_enum, default_value = "auto")]
    pub format: ReaderFormat,
    /// Number of rows to display
    #[arg(long, default_value_t = 10)]
    pub rows: usize,
    /// Restrict output to this comma-separated list of columns
    #[arg(short = 'C', long = "columns", value_delimiter = ',')]
    pub columns: Vec<String>,
    /// Only show rows for this treatment number
    #[arg(long)]
    pub treatment: Option<String>,
}

#[derive(Debug, Args)]
pub struct ColumnsArgs {
    /// Model output or observed-data file
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
    /// File layout (auto, sections, name-field, blocks)
    #[arg(long, value_enum, default_value = "auto")]
    pub format: ReaderFormat,
    /// Emit JSON instead of a table
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct ConvertArgs {
    /// Model output or observed-data file
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
    /// Output CSV file (stdout if omitted or `-`)
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,
    /// File layout (auto, sections, name-field, blocks)
    #[arg(long, value_enum, default_value = "auto")]
    pub format: ReaderFormat,
    /// Output delimiter character (supports ',', 'tab', ';', '|')
    #[arg(long, value_parser = parse_delimiter, default_value = ",")]
    pub delimiter: u8,
}

#[derive(Debug, Args)]
pub struct CompareArgs {
    /// Simulated output file (for example PlantGro.OUT)
    #[arg(long)]
    pub simulated: PathBuf,
    /// Observed time-series or summary file (for example UFGA8201.MZT)
    #[arg(long)]
    pub observed: PathBuf,
    /// Column present in both files
    #[arg(long)]
    pub column: String,
    /// Only compare rows for this treatment number
    #[arg(long)]
    pub treatment: Option<String>,
    /// Comma-separated key columns used to match rows (defaults to TRT,DATE)
    #[arg(long, value_delimiter = ',')]
    pub keys: Vec<String>,
    /// Layout of the simulated file
    #[arg(long = "simulated-format", value_enum, default_value = "auto")]
    pub simulated_format: ReaderFormat,
    /// Layout of the observed file
    #[arg(long = "observed-format", value_enum, default_value = "auto")]
    pub observed_format: ReaderFormat,
}

#[derive(Debug, Args)]
pub struct LookupArgs {
    /// Variable code to describe (for example LAID)
    #[arg(long)]
    pub variable: Option<String>,
    /// Two-letter crop code to describe (for example MZ)
    #[arg(long, conflicts_with = "variable")]
    pub crop: Option<String>,
    /// List every registered crop
    #[arg(long, conflicts_with_all = ["variable", "crop"])]
    pub crops: bool,
}

/// Field separator for `convert` output: one ASCII character, or one of the
/// names `tab`, `comma`, `semicolon`, `pipe` and `space`.
pub fn parse_delimiter(value: &str) -> Result<u8, String> {
    let named = match value.to_ascii_lowercase().as_str() {
        "tab" => Some(b'\t'),
        "comma" => Some(b','),
        "semicolon" => Some(b';'),
        "pipe" => Some(b'|'),
        "space" => Some(b' '),
        _ => None,
    };
    if let Some(byte) = named {
        return Ok(byte);
    }
    match value.as_bytes() {
        [] => Err("Delimiter cannot be empty".to_string()),
        [b'"' | b'\n' | b'\r'] => Err(format!("{value:?} cannot separate CSV fields")),
        [byte] if byte.is_ascii() => Ok(*byte),
        _ => Err(format!(
            "Delimiter {value:?} must be one ASCII character or a name such as tab"
        )),
    }
}
