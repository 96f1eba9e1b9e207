//! Lattice pruning strategies
//!
//! Both strategies walk the subset lattice for one candidate interval and
//! decide which subsets never need their patterns materialized. Apriori
//! pruning climbs bottom-up on support alone; bounded pruning alternates
//! bottom-up apriori passes with top-down upper-bound passes that can skip
//! occurrence lookups entirely.
//!
//! A strategy's return value is the number of avoided evaluations for the
//! interval: (2^D − 1) minus the patterns it actually had to enumerate.

mod bounded;
mod support;

pub use bounded::BoundedPruning;
pub use support::SupportPruning;

use crate::config::{MinerConfig, PruningKind};
use crate::loader::ReadingTable;
use crate::pattern::PatternKey;
use crate::pattern_store::PatternStore;
use crate::sequence_index::SequenceIndex;
use anyhow::Result;

/// One pruning strategy driving the lattice walk for candidate intervals
pub trait PruningStrategy {
    /// Evaluate the candidate interval `[start, end)`, enumerating whatever
    /// the pruning logic cannot rule out; returns the avoided-evaluation
    /// count for this interval
    fn evaluate_interval(
        &mut self,
        store: &mut PatternStore,
        start: usize,
        end: usize,
    ) -> Result<usize>;
}

/// Instantiate the strategy selected by the configuration
///
/// `validate()` has already guaranteed the crossk threshold exists for the
/// bidirectional case.
pub fn strategy_for<'a>(
    config: &MinerConfig,
    table: &'a ReadingTable,
    index: &'a SequenceIndex,
) -> Box<dyn PruningStrategy + 'a> {
    match config.pruning {
        PruningKind::Apriori => Box::new(SupportPruning::new(
            table,
            index,
            config.support_threshold,
        )),
        PruningKind::Bidirectional => Box::new(BoundedPruning::new(
            table,
            index,
            config.support_threshold,
            config.crossk_threshold.unwrap_or(f64::INFINITY),
        )),
    }
}

/// Memo-or-materialize one pattern window
///
/// Returns the pattern's store id and whether this call enumerated it. The
/// memo probe comes first so a repeated key never touches the sequence
/// index.
pub(crate) fn find_or_enumerate(
    table: &ReadingTable,
    index: &SequenceIndex,
    store: &mut PatternStore,
    subset: &[usize],
    start: usize,
) -> Result<(usize, bool)> {
    let key = PatternKey::from_window(table, subset, start, index.pattern_length());

    if let Some(id) = store.find(&key) {
        return Ok((id, false));
    }

    let occurrences = index.lookup(subset, start, table)?;
    let id = store.enumerate(key, occurrences);
    Ok((id, true))
}
