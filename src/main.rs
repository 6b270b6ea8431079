use anyhow::{Context, Result};
use campaign::{
    analysis_digest, parse_csv_text, read_csv_file, write_csv, write_json, CampaignResponse, Cli,
    DatasetSummary, FilterState, MappingConfig, MappingStats, OutputFormat, RowMapper,
    SheetSource, DEFAULT_TOML_STR,
};
use clap::Parser;
use env_logger::Env;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();

    if cli.print_config {
        print!("{}", DEFAULT_TOML_STR);
        return Ok(());
    }

    let config = match cli.config.as_deref() {
        Some(path) => MappingConfig::from_toml_path(path)?,
        None => MappingConfig::default(),
    };

    let rows = match (cli.input.as_deref(), cli.url.as_deref()) {
        (Some(input_path), None) => {
            if !Path::new(input_path).exists() {
                anyhow::bail!("Input file does not exist: {}", input_path);
            }
            read_csv_file(input_path)?
        }
        (None, Some(url)) => {
            let source = SheetSource::from_input(url, cli.sheet.as_deref())?;
            let csv_text = source.fetch_csv()?;
            parse_csv_text(&csv_text, true)?
        }
        (Some(_), Some(_)) => {
            anyhow::bail!("Specify either a file path or --url, not both");
        }
        (None, None) => {
            anyhow::bail!(
                "No input provided. Pass a file path or use --url with a Google Sheets link"
            );
        }
    };

    let mut report: Box<dyn Write> = if report_on_stdout(cli.output.as_deref()) {
        Box::new(io::stdout())
    } else {
        Box::new(io::stderr())
    };

    let mapper = RowMapper::new(config);
    let (responses, stats) = mapper.map_rows_with_stats(&rows);

    if responses.is_empty() {
        writeln!(
            report,
            "WARNING: Connected to sheet but found no rows. Please check if the sheet has data."
        )?;
    }

    let filter = FilterState {
        start_date: cli.from,
        end_date: cli.to,
        search_query: cli.search.clone().unwrap_or_default(),
        has_media: cli.has_media,
    };
    let selected = filter.apply(&responses);

    match cli.output.as_deref() {
        Some(path) => {
            let file = File::create(path).context("Failed to create output file")?;
            export(BufWriter::new(file), cli.format, &selected)?;
        }
        None => export(io::stdout().lock(), cli.format, &selected)?,
    }

    writeln!(report, "Processing complete!")?;
    writeln!(report, "Mapped {} rows", stats.total_rows)?;
    writeln!(report, "Kept {} responses", responses.len())?;
    if selected.len() != responses.len() {
        writeln!(report, "{} responses match the filters", selected.len())?;
    }
    if let Some(path) = cli.output.as_deref() {
        writeln!(report, "Output written to: {}", path)?;
    }

    if cli.stats {
        print_detailed_stats(&mut report, &stats, &selected)?;
    }

    if cli.digest {
        writeln!(report, "\nAnalysis digest:")?;
        writeln!(report, "{}", analysis_digest(&selected))?;
    }

    Ok(())
}

fn init_logging() {
    let env = Env::default().filter_or("RUST_LOG", "warn");
    let _ = env_logger::Builder::from_env(env)
        .format_timestamp_secs()
        .format_target(false)
        .try_init();
}

/// Run summaries share stdout only when the export goes to a file.
fn report_on_stdout(output: Option<&str>) -> bool {
    output.is_some()
}

fn export<W: Write>(writer: W, format: OutputFormat, responses: &[&CampaignResponse]) -> Result<()> {
    match format {
        OutputFormat::Json => write_json(writer, responses),
        OutputFormat::Csv => write_csv(writer, responses),
    }
}

fn print_detailed_stats(
    out: &mut dyn Write,
    stats: &MappingStats,
    selected: &[&CampaignResponse],
) -> Result<()> {
    let summary = DatasetSummary::from_responses(selected.iter().copied());

    writeln!(out, "\nDetailed Statistics:")?;
    writeln!(out, "- Total rows mapped: {}", stats.total_rows)?;
    writeln!(out, "- Blank rows dropped: {}", stats.dropped_rows)?;
    writeln!(out, "- Dates defaulted to now: {}", stats.fallback_dates)?;
    writeln!(out, "- Photos found: {}", stats.photos)?;
    writeln!(out, "- Videos found: {}", stats.videos)?;
    print_columns(out, "Media columns", &stats.media_columns)?;
    print_columns(out, "Extra columns", &stats.extra_columns)?;

    writeln!(out, "\nSelected responses: {}", summary.total)?;
    writeln!(
        out,
        "- Sentiment: {} positive, {} neutral, {} negative",
        summary.positive, summary.neutral, summary.negative
    )?;
    writeln!(
        out,
        "- With media: {} ({} photos, {} videos)",
        summary.with_media, summary.photos, summary.videos
    )?;
    writeln!(out, "- Undated: {}", summary.undated)?;

    Ok(())
}

fn print_columns<'a, I>(out: &mut dyn Write, label: &str, columns: I) -> Result<()>
where
    I: IntoIterator<Item = &'a String>,
{
    let names: Vec<&str> = columns.into_iter().map(String::as_str).collect();
    writeln!(out, "- {}: {}", label, names.len())?;
    if !names.is_empty() {
        writeln!(out, "  Columns: {}", names.join(", "))?;
    }
    Ok(())
}
