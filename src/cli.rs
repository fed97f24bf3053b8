use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Analyze SNI industry segments and product adoption gaps",
    long_about = None
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Rank the most common SNI industry groups in a dataset
    Industries(IndustriesArgs),
    /// Show product adoption within a selected industry segment
    Products(ProductsArgs),
    /// Analyze accounts lacking the top products: alternatives, lift, exports
    Gap(GapArgs),
}

#[derive(Debug, Args)]
pub struct IndustriesArgs {
    /// Input file (.csv, .tsv, or .xlsx; '-' reads CSV from stdin)
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
    /// Count rows or distinct accounts per industry group
    #[arg(long = "mode", default_value = "rows")]
    pub mode: CountMode,
    /// Number of industry groups to show
    #[arg(long, default_value_t = 10, value_parser = clap::builder::RangedU64ValueParser::<usize>::new().range(1..=50))]
    pub top: usize,
    /// CSV delimiter character (supports ',', 'tab', ';', '|')
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Character encoding of the input file (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
    /// Emit the ranking as JSON instead of a table
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct ProductsArgs {
    /// Input file (.csv, .tsv, or .xlsx; '-' reads CSV from stdin)
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
    /// Primary SNI description selecting the segment
    #[arg(short = 's', long = "industry")]
    pub industry: String,
    /// Number of top products to show
    #[arg(long, default_value_t = 2, value_parser = clap::builder::RangedU64ValueParser::<usize>::new().range(1..=10))]
    pub top: usize,
    /// Show every product in the segment, not just the top ones
    #[arg(long)]
    pub all: bool,
    /// CSV delimiter character (supports ',', 'tab', ';', '|')
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Character encoding of the input file (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
    /// Emit the adoption report as JSON instead of tables
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct GapArgs {
    /// Input file (.csv, .tsv, or .xlsx; '-' reads CSV from stdin)
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
    /// Primary SNI description selecting the segment
    #[arg(short = 's', long = "industry")]
    pub industry: String,
    /// Number of top products defining the top set
    #[arg(long, default_value_t = 2, value_parser = clap::builder::RangedU64ValueParser::<usize>::new().range(1..=10))]
    pub top: usize,
    /// Show every alternative product instead of the first ten
    #[arg(long)]
    pub all: bool,
    /// Write the alternative-product table (with lift) to this CSV file
    #[arg(long = "export-alternatives")]
    pub export_alternatives: Option<PathBuf>,
    /// Write the accounts missing all top products to this CSV file
    #[arg(long = "export-missing")]
    pub export_missing: Option<PathBuf>,
    /// CSV delimiter character (supports ',', 'tab', ';', '|')
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Character encoding of the input file (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
    /// Emit the gap report as JSON instead of tables
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
#[value(rename_all = "kebab-case")]
pub enum CountMode {
    /// Count every (account, product) row
    Rows,
    /// Count distinct account ids
    UniqueAccounts,
}

impl Default for CountMode {
    fn default() -> Self {
        CountMode::Rows
    }
}

pub fn parse_delimiter(value: &str) -> Result<u8, String> {
    match value {
        "tab" | "\t" => Ok(b'\t'),
        "comma" | "," => Ok(b','),
        "|" | "pipe" => Ok(b'|'),
        ";" | "semicolon" => Ok(b';'),
        other => {
            let mut chars = other.chars();
            let first = chars
                .next()
                .ok_or_else(|| "Delimiter cannot be empty".to_string())?;
            if chars.next().is_some() {
                return Err("Delimiter must be a single character".to_string());
            }
            if !first.is_ascii() {
                return Err("Delimiter must be ASCII".to_string());
            }
            Ok(first as u8)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_delimiter_accepts_names_and_single_characters() {
        assert_eq!(parse_delimiter("tab").unwrap(), b'\t');
        assert_eq!(parse_delimiter(";").unwrap(), b';');
        assert!(parse_delimiter("ab").is_err());
        assert!(parse_delimiter("").is_err());
    }
}
