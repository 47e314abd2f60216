use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use roadstats::analysis::{build_analysis_report, build_trend_report};
use std::path::PathBuf;
use tracing::error;

#[derive(Parser)]
#[command(name = "roadstats-report")]
#[command(about = "Derived reports over the road fatality table")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Monthly totals with the change from the previous month
    Trend {
        #[arg(long, default_value = "data/five_yr_fatalities.csv")]
        input: PathBuf,
        #[arg(long, default_value = "data/fatality_trends.csv")]
        output: PathBuf,
    },
    /// Yearly totals joined with population, per-capita and per-100k rates
    Analysis {
        #[arg(long, default_value = "data/five_yr_fatalities.csv")]
        input: PathBuf,
        #[arg(long, default_value = "data/population_breakdown.csv")]
        population: PathBuf,
        #[arg(long, default_value = "data/fatality_analysis.csv")]
        output: PathBuf,
    },
}

fn main() {
    roadstats::telemetry::init_tracing("roadstats=info");

    if let Err(err) = run(Cli::parse()) {
        error!(error = %format!("{err:#}"), "report generation failed");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Trend { input, output } => {
            let rows = build_trend_report(&input, &output)
                .with_context(|| format!("Failed to build trend report from '{}'", input.display()))?;
            println!(
                "Trend data for {} periods saved to {}",
                rows.len(),
                output.display()
            );
        }
        Command::Analysis {
            input,
            population,
            output,
        } => {
            let report = build_analysis_report(&input, &population, &output).with_context(|| {
                format!(
                    "Failed to build analysis report from '{}' and '{}'",
                    input.display(),
                    population.display()
                )
            })?;
            for row in &report.rows {
                println!(
                    "{}: {} fatalities, {:.2} per 100,000",
                    row.year, row.fatalities, row.fatalities_per_100k
                );
            }
            let dropped = report.diagnostics.dropped_count();
            if dropped > 0 {
                println!("{} unmatched year(s) left out of the analysis", dropped);
            }
            println!("Analysis results saved to {}", output.display());
        }
    }
    Ok(())
}
