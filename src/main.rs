mod analysis;
mod config;
mod data;
mod error;
mod pipeline;

use anyhow::Context;
use config::Config;
use dotenv::dotenv;
use pipeline::{AnalysisReport, Stage};
use std::io::{self, Write};

/// Prints where the data came from and how many records were read, followed
/// by the status distribution and the missing-value count of each column.
fn print_dataset_profile(out: &mut impl Write, report: &AnalysisReport) -> io::Result<()> {
    writeln!(out, "Start-up market analysis")?;
    writeln!(
        out,
        "Input: {} ({})",
        report.config.input_path.display(),
        report.config.encoding
    )?;
    writeln!(out, "Generated: {}", report.generated_at.format("%Y-%m-%d %H:%M:%S UTC"))?;
    writeln!(out, "Records: {}", report.records)?;

    writeln!(out, "\nStatus counts:")?;
    for (status, count) in report.status.counts.iter() {
        writeln!(out, "{:<12} {}", status, count)?;
    }
    writeln!(out, "{:<12} {}", "(missing)", report.status.missing)?;

    writeln!(
        out,
        "Records with missing values: {}",
        report.incomplete_records
    )?;

    writeln!(out, "\nMissing values per column:")?;
    for profile in &report.missing {
        writeln!(out, "{:<20} {}", profile.column, profile.missing)?;
    }

    Ok(())
}

/// Prints the joined market table after the threshold filter.
fn print_market_summary(out: &mut impl Write, report: &AnalysisReport) -> io::Result<()> {
    writeln!(
        out,
        "\nMarkets: {} in total, {} with more than {} start-ups",
        report.joined_markets,
        report.summary.len(),
        analysis::MARKET_THRESHOLD
    )?;

    let width = report
        .summary
        .iter()
        .map(|s| s.market.chars().count())
        .max()
        .unwrap_or(0)
        .max("market".len());

    writeln!(
        out,
        "{:<width$} {:>9} {:>8} {:>6} {:>6} {:>6} {:>7} {:>12} {:>14} {:>13} {:>11}",
        "market",
        "Operating",
        "Acquired",
        "Closed",
        "Total",
        "Added",
        "Missing",
        "Missing_Perc",
        "Operating_Perc",
        "Acquired_Perc",
        "Closed_Perc"
    )?;
    for s in &report.summary {
        writeln!(
            out,
            "{:<width$} {:>9} {:>8} {:>6} {:>6} {:>6} {:>7} {:>12.2} {:>14.2} {:>13.2} {:>11.2}",
            s.market,
            s.operating,
            s.acquired,
            s.closed,
            s.total,
            s.added,
            s.missing,
            s.missing_perc,
            s.operating_perc,
            s.acquired_perc,
            s.closed_perc
        )?;
    }

    Ok(())
}

/// Prints the top markets for each percentage column.
fn print_rankings(out: &mut impl Write, report: &AnalysisReport) -> io::Result<()> {
    for ranking in &report.rankings {
        writeln!(
            out,
            "\nTop {} markets by {}:",
            ranking.entries.len(),
            ranking.column.name()
        )?;
        write!(out, "{}", ranking)?;
    }
    Ok(())
}

fn write_report(out: &mut impl Write, report: &AnalysisReport) -> io::Result<()> {
    print_dataset_profile(out, report)?;
    print_market_summary(out, report)?;
    print_rankings(out, report)?;
    out.flush()
}

/// Entry point for the start-up market analysis.
///
/// Loads the configured CSV, runs every analysis stage and prints the
/// dataset profile, the market summary and the three rankings to stdout.
/// Any failure aborts the run with a message naming the failing stage.
fn main() -> anyhow::Result<()> {
    // Logs go to stderr; stdout carries only the report
    tracing_subscriber::fmt().with_writer(io::stderr).init();

    // Load environment variables from .env file
    dotenv().ok();

    let config = Config::from_env()?;
    let report = pipeline::run(&config)?;

    let stdout = io::stdout();
    write_report(&mut stdout.lock(), &report).context(Stage::Report)?;

    Ok(())
}
