use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;
use veta::cli::{Cli, OutputFormat};
use veta::{loader, miner, report};

/// Initialize tracing subscriber for debug output
fn init_tracing(debug: bool) {
    if debug {
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::from_default_env().add_directive(tracing::Level::TRACE.into()),
            )
            .with_writer(std::io::stderr)
            .init();
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.debug);

    let table = loader::load_csv(&cli.input, &cli.anomaly_column)?;
    let config = cli.to_config()?;

    let outcome = miner::mine_patterns(&table, &config)?;

    match cli.format {
        OutputFormat::Text => {
            print!(
                "{}",
                report::render_text(&outcome.patterns, table.dimension_names())
            );
            eprintln!(
                "{} patterns qualified; {} of {} evaluations avoided (efficiency {:.2})",
                outcome.patterns.len(),
                outcome.stats.avoided_evaluations,
                outcome.stats.total_candidates,
                outcome.stats.efficiency
            );
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&outcome)?);
        }
        OutputFormat::Csv => {
            print!(
                "{}",
                report::render_csv(&outcome.patterns, table.dimension_names())
            );
        }
    }

    Ok(())
}
