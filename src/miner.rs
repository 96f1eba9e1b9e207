//! Candidate interval enumeration and mining driver
//!
//! For every anomalous window and every lag value down to zero, the miner
//! derives the candidate interval that could lead the window, filters out
//! invalid candidates (out of bounds, already visited, spanning a break
//! index), and hands the survivors to the configured pruning strategy. The
//! avoided-evaluation counts reported back are the engine's efficiency
//! measure.

use crate::config::MinerConfig;
use crate::loader::ReadingTable;
use crate::pattern_store::PatternStore;
use crate::pruning::{strategy_for, PruningStrategy};
use crate::report::{build_summaries, PatternSummary};
use crate::sequence_index::SequenceIndex;
use anyhow::Result;
use fnv::FnvHashSet;
use serde::Serialize;
use std::time::Instant;

/// Work accounting for one mining run
#[derive(Debug, Clone, Serialize)]
pub struct MiningStats {
    /// Candidate intervals that survived validity filtering
    pub valid_intervals: usize,
    /// Pattern evaluations skipped by pruning and memoization
    pub avoided_evaluations: usize,
    /// valid_intervals × (2^D − 1)
    pub total_candidates: usize,
    /// avoided / total, in [0, 1]
    pub efficiency: f64,
}

/// Result of a full `mine_patterns` run
#[derive(Debug, Clone, Serialize)]
pub struct MiningOutcome {
    /// Qualified patterns under the configured metric and selection
    pub patterns: Vec<PatternSummary>,
    pub stats: MiningStats,
}

/// Drives a pruning strategy over all valid candidate intervals
pub struct PatternMiner<'a> {
    table: &'a ReadingTable,
    pattern_length: usize,
    max_lag: usize,
    /// Ascending break indexes no pattern may span across
    invalid_indexes: Vec<usize>,
    /// Intervals already evaluated; the same (start, end) recurs across
    /// different (window, lag) pairs
    visited: FnvHashSet<(usize, usize)>,
    /// Optional deadline, checked between candidate intervals only
    deadline: Option<Instant>,
}

impl<'a> PatternMiner<'a> {
    pub fn new(
        table: &'a ReadingTable,
        pattern_length: usize,
        max_lag: usize,
        invalid_indexes: Vec<usize>,
    ) -> Self {
        debug_assert!(invalid_indexes.windows(2).all(|pair| pair[0] < pair[1]));

        Self {
            table,
            pattern_length,
            max_lag,
            invalid_indexes,
            visited: FnvHashSet::default(),
            deadline: None,
        }
    }

    /// Stop between candidate intervals once the deadline passes
    ///
    /// This is the only cancellation point the engine honors; a running
    /// interval always completes.
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Evaluate every valid candidate interval with the given strategy
    pub fn mine(
        &mut self,
        store: &mut PatternStore,
        strategy: &mut dyn PruningStrategy,
    ) -> Result<MiningStats> {
        let mut valid_intervals = 0;
        let mut avoided_evaluations = 0;
        let windows = store.anomalous_windows().to_vec();

        'mining: for window in windows {
            for lag in (0..=self.max_lag).rev() {
                if let Some(deadline) = self.deadline {
                    if Instant::now() >= deadline {
                        tracing::warn!(window, "deadline reached, stopping between intervals");
                        break 'mining;
                    }
                }

                let Some(start) = window.checked_sub(lag) else {
                    continue;
                };
                let end = start + self.pattern_length;

                if !self.is_valid_interval(start, end) {
                    continue;
                }

                self.visited.insert((start, end));
                valid_intervals += 1;
                avoided_evaluations += strategy.evaluate_interval(store, start, end)?;
            }
        }

        let per_interval = (1usize << self.table.num_dimensions()) - 1;
        let total_candidates = valid_intervals * per_interval;
        let efficiency = if total_candidates == 0 {
            0.0
        } else {
            avoided_evaluations as f64 / total_candidates as f64
        };

        tracing::info!(
            valid_intervals,
            avoided_evaluations,
            total_candidates,
            efficiency,
            "mining complete"
        );

        Ok(MiningStats {
            valid_intervals,
            avoided_evaluations,
            total_candidates,
            efficiency,
        })
    }

    /// A candidate is valid if it lies inside the table, was not already
    /// evaluated, and no row strictly between start (exclusive) and end
    /// carries a break index
    fn is_valid_interval(&self, start: usize, end: usize) -> bool {
        if end > self.table.num_rows() {
            return false;
        }

        if self.visited.contains(&(start, end)) {
            return false;
        }

        if !self.invalid_indexes.is_empty() {
            for row in start + 1..end {
                if self.invalid_indexes.binary_search(&row).is_ok() {
                    return false;
                }
            }
        }

        true
    }
}

/// Mine one reading table end to end
///
/// Validates the configuration, builds the sequence index and pattern
/// store, runs the configured strategy over all candidate intervals, and
/// selects the qualified patterns for output.
pub fn mine_patterns(table: &ReadingTable, config: &MinerConfig) -> Result<MiningOutcome> {
    config.validate()?;

    tracing::info!(
        rows = table.num_rows(),
        dimensions = table.num_dimensions(),
        pattern_length = config.pattern_length,
        lag = config.lag,
        strategy = ?config.pruning,
        "starting pattern mining"
    );

    let index = SequenceIndex::build(table, config.pattern_length);
    let mut store = PatternStore::new(
        table.anomalous_windows(),
        table.num_rows(),
        config.lag,
    )?;

    let mut strategy = strategy_for(config, table, &index);
    let mut miner = PatternMiner::new(
        table,
        config.pattern_length,
        config.lag,
        config.invalid_indexes.clone(),
    );
    let stats = miner.mine(&mut store, strategy.as_mut())?;

    let ids = store.query(config.output_metric, config.selection);
    let patterns = build_summaries(&store, table, &ids);

    tracing::info!(qualified = patterns.len(), "selection complete");

    Ok(MiningOutcome { patterns, stats })
}
