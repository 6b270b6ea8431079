use chrono::NaiveDate;
use clap::{Parser, ValueEnum};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(name = "campaign")]
#[command(about = "Turn a free-form campaign response sheet into normalized records")]
pub struct Cli {
    /// Path to input CSV file
    #[arg(
        value_name = "INPUT",
        conflicts_with = "url",
        required_unless_present_any = ["url", "print_config"]
    )]
    pub input: Option<String>,

    /// Google Sheets link or bare spreadsheet id
    #[arg(long, value_name = "URL", conflicts_with = "input")]
    pub url: Option<String>,

    /// Sheet tab to read when fetching by --url (defaults to 'Form Responses 1')
    #[arg(long, value_name = "NAME", requires = "url")]
    pub sheet: Option<String>,

    /// Path to output file (defaults to stdout)
    #[arg(short, long)]
    pub output: Option<String>,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
    pub format: OutputFormat,

    /// TOML file overriding the built-in column aliases
    #[arg(long, value_name = "FILE")]
    pub config: Option<String>,

    /// Keep responses dated on or after this day (YYYY-MM-DD)
    #[arg(long, value_name = "DATE")]
    pub from: Option<NaiveDate>,

    /// Keep responses dated on or before this day (YYYY-MM-DD)
    #[arg(long, value_name = "DATE")]
    pub to: Option<NaiveDate>,

    /// Keep responses whose name, remark or place contains this text
    #[arg(long, value_name = "TEXT")]
    pub search: Option<String>,

    /// Keep only responses with at least one photo or video
    #[arg(long)]
    pub has_media: bool,

    /// Show detailed mapping statistics
    #[arg(long)]
    pub stats: bool,

    /// Print the text digest used for AI summaries
    #[arg(long)]
    pub digest: bool,

    /// Print the default mapping configuration and exit
    #[arg(long)]
    pub print_config: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum, PartialEq, Eq, Hash)]
pub enum OutputFormat {
    /// Array of records with every field
    Json,
    /// Flat table with the list-view columns
    Csv,
}
