//! CLI argument parsing for Veta

use crate::config::{ConfigError, MinerConfig, Selection};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Output format for mined patterns
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable aligned table (default)
    Text,
    /// JSON format for machine parsing
    Json,
    /// CSV format for spreadsheet analysis
    Csv,
}

#[derive(Parser, Debug)]
#[command(name = "veta")]
#[command(version)]
#[command(about = "Sequence pattern miner for anomaly-associated sensor readings", long_about = None)]
pub struct Cli {
    /// CSV file with numeric sensor columns plus one 0/1 anomaly column
    pub input: PathBuf,

    /// Name of the 0/1 anomaly column
    #[arg(
        long = "anomaly-column",
        value_name = "NAME",
        default_value = "ncwindow"
    )]
    pub anomaly_column: String,

    /// Pattern length in rows
    #[arg(
        short = 'l',
        long = "pattern-length",
        value_name = "ROWS",
        default_value = "2"
    )]
    pub pattern_length: usize,

    /// Maximum lag between a pattern and the anomalous window it leads
    #[arg(long = "lag", value_name = "ROWS", default_value = "0")]
    pub lag: usize,

    /// Support threshold used by both pruning strategies
    #[arg(
        long = "support-threshold",
        value_name = "VALUE",
        default_value = "0.5"
    )]
    pub support_threshold: f64,

    /// Crossk threshold (required with --pruning bidirectional)
    #[arg(long = "crossk-threshold", value_name = "VALUE")]
    pub crossk_threshold: Option<f64>,

    /// Pruning strategy: apriori or bidirectional
    #[arg(long = "pruning", value_name = "STRATEGY", default_value = "apriori")]
    pub pruning: String,

    /// Output ranking metric: support, crossk or confidence
    #[arg(long = "metric", value_name = "METRIC", default_value = "crossk")]
    pub metric: String,

    /// Output selection mode: topk or threshold
    #[arg(long = "select", value_name = "MODE", default_value = "topk")]
    pub select: String,

    /// Number of patterns for --select topk
    #[arg(long = "top-k", value_name = "K", default_value = "100")]
    pub top_k: usize,

    /// Cutoff value for --select threshold
    #[arg(long = "output-threshold", value_name = "VALUE")]
    pub output_threshold: Option<f64>,

    /// Break row indexes no pattern may span, comma separated ascending
    #[arg(
        long = "invalid-indexes",
        value_name = "ROWS",
        value_delimiter = ','
    )]
    pub invalid_indexes: Vec<usize>,

    /// Output format
    #[arg(long = "format", value_enum, default_value = "text")]
    pub format: OutputFormat,

    /// Enable debug tracing to stderr
    #[arg(long)]
    pub debug: bool,
}

impl Cli {
    /// Resolve the selector strings into a validated mining configuration
    pub fn to_config(&self) -> Result<MinerConfig, ConfigError> {
        let config = MinerConfig {
            pattern_length: self.pattern_length,
            lag: self.lag,
            support_threshold: self.support_threshold,
            crossk_threshold: self.crossk_threshold,
            pruning: self.pruning.parse()?,
            output_metric: self.metric.parse()?,
            selection: Selection::parse(&self.select, Some(self.top_k), self.output_threshold)?,
            invalid_indexes: self.invalid_indexes.clone(),
        };
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Metric, PruningKind};

    fn parse(args: &[&str]) -> Cli {
        Cli::parse_from(std::iter::once("veta").chain(args.iter().copied()))
    }

    #[test]
    fn test_defaults() {
        let cli = parse(&["readings.csv"]);
        let config = cli.to_config().unwrap();

        assert_eq!(config.pattern_length, 2);
        assert_eq!(config.lag, 0);
        assert_eq!(config.pruning, PruningKind::Apriori);
        assert_eq!(config.output_metric, Metric::Crossk);
        assert_eq!(config.selection, Selection::TopK(100));
    }

    #[test]
    fn test_selector_strings_resolve_through_config() {
        let cli = parse(&[
            "readings.csv",
            "--pruning",
            "bidirectional",
            "--crossk-threshold",
            "3.5",
            "--metric",
            "support",
            "--select",
            "threshold",
            "--output-threshold",
            "0.4",
            "--invalid-indexes",
            "3,7",
        ]);
        let config = cli.to_config().unwrap();

        assert_eq!(config.pruning, PruningKind::Bidirectional);
        assert_eq!(config.output_metric, Metric::Support);
        assert_eq!(config.selection, Selection::Threshold(0.4));
        assert_eq!(config.invalid_indexes, vec![3, 7]);
    }

    #[test]
    fn test_bad_selectors_surface_config_errors() {
        let cli = parse(&["readings.csv", "--metric", "lift"]);
        assert!(matches!(
            cli.to_config().unwrap_err(),
            ConfigError::UnknownMetric(_)
        ));

        let cli = parse(&["readings.csv", "--select", "threshold"]);
        assert_eq!(cli.to_config().unwrap_err(), ConfigError::MissingCutoff);

        let cli = parse(&["readings.csv", "--pruning", "bidirectional"]);
        assert_eq!(
            cli.to_config().unwrap_err(),
            ConfigError::MissingCrosskThreshold
        );
    }
}
