//! Mining configuration and selector types
//!
//! Everything the engine needs to know before touching the data: pattern
//! length, lag, thresholds, which pruning strategy to run, and how to select
//! the final output. All selector parsing funnels into `ConfigError` so the
//! CLI and library callers fail the same way.

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Errors for configuration and selector parsing
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("unknown metric '{0}' (expected support, crossk or confidence)")]
    UnknownMetric(String),

    #[error("unknown selection mode '{0}' (expected topk or threshold)")]
    UnknownSelectionMode(String),

    #[error("selection mode 'topk' requires k")]
    MissingTopK,

    #[error("selection mode 'threshold' requires a cutoff value")]
    MissingCutoff,

    #[error("unknown pruning strategy '{0}' (expected apriori or bidirectional)")]
    UnknownStrategy(String),

    #[error("pruning strategy 'bidirectional' requires a crossk threshold")]
    MissingCrosskThreshold,

    #[error("pattern length must be at least 1")]
    ZeroPatternLength,

    #[error("no anomalous windows in the reading table")]
    EmptyAnomalyWindows,
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Association metric computed per enumerated pattern
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    /// Fraction of all readings covered by anomaly overlaps
    Support,
    /// Normalized lift-like score against the baseline anomaly rate
    Crossk,
    /// Fraction of occurrences overlapping at least one anomalous window
    Confidence,
}

impl FromStr for Metric {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "support" => Ok(Metric::Support),
            "crossk" => Ok(Metric::Crossk),
            "confidence" => Ok(Metric::Confidence),
            other => Err(ConfigError::UnknownMetric(other.to_string())),
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Metric::Support => write!(f, "support"),
            Metric::Crossk => write!(f, "crossk"),
            Metric::Confidence => write!(f, "confidence"),
        }
    }
}

/// How qualified patterns are selected for output
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Selection {
    /// Highest k values of the output metric, ties broken by enumeration order
    TopK(usize),
    /// Every pattern whose output metric is at least the cutoff
    Threshold(f64),
}

impl Selection {
    /// Build a selection from its CLI spelling plus the mode-specific value
    ///
    /// `k` and `cutoff` are both optional at the parsing layer; the mode
    /// decides which one is mandatory.
    pub fn parse(mode: &str, k: Option<usize>, cutoff: Option<f64>) -> Result<Self> {
        match mode {
            "topk" => k.map(Selection::TopK).ok_or(ConfigError::MissingTopK),
            "threshold" => cutoff
                .map(Selection::Threshold)
                .ok_or(ConfigError::MissingCutoff),
            other => Err(ConfigError::UnknownSelectionMode(other.to_string())),
        }
    }
}

/// Pruning strategy selector
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PruningKind {
    /// Bottom-up apriori pruning on support only
    Apriori,
    /// Bi-directional pruning alternating apriori and upper-bound passes
    Bidirectional,
}

impl FromStr for PruningKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "apriori" => Ok(PruningKind::Apriori),
            "bidirectional" => Ok(PruningKind::Bidirectional),
            other => Err(ConfigError::UnknownStrategy(other.to_string())),
        }
    }
}

/// Full configuration for one mining run
#[derive(Debug, Clone)]
pub struct MinerConfig {
    /// Fixed pattern length L (rows per pattern window)
    pub pattern_length: usize,
    /// Maximum lag between a pattern start and the anomalous window it may lead
    pub lag: usize,
    /// Support threshold used by both strategies
    pub support_threshold: f64,
    /// Crossk threshold, required for bidirectional pruning
    pub crossk_threshold: Option<f64>,
    /// Which pruning strategy drives the lattice walk
    pub pruning: PruningKind,
    /// Metric ranking the final output
    pub output_metric: Metric,
    /// Top-k or threshold selection of qualified patterns
    pub selection: Selection,
    /// Ascending row indexes no pattern may span across (sensor dropouts)
    pub invalid_indexes: Vec<usize>,
}

impl MinerConfig {
    /// Check cross-field requirements that individual parsers cannot see
    pub fn validate(&self) -> Result<()> {
        if self.pattern_length == 0 {
            return Err(ConfigError::ZeroPatternLength);
        }

        if self.pruning == PruningKind::Bidirectional && self.crossk_threshold.is_none() {
            return Err(ConfigError::MissingCrosskThreshold);
        }

        Ok(())
    }
}

impl Default for MinerConfig {
    fn default() -> Self {
        Self {
            pattern_length: 2,
            lag: 0,
            support_threshold: 0.5,
            crossk_threshold: None,
            pruning: PruningKind::Apriori,
            output_metric: Metric::Crossk,
            selection: Selection::TopK(100),
            invalid_indexes: Vec::new(),
        }
    }
}
