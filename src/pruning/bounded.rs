//! Bi-directional bounded pruning
//!
//! Two frontiers move toward each other: a `deep` frontier running the
//! apriori inner loop bottom-up, and a `shallow` frontier running an
//! upper-bound pass top-down. The upper-bound pass estimates the best
//! crossk any node could reach from its singletons' joinset cardinalities
//! and a propagated occurrence-count lower bound (`bound_hint`); estimates
//! below the crossk threshold prune whole subtrees without ever touching
//! the sequence index, which is where the avoided work comes from.

use super::{find_or_enumerate, PruningStrategy};
use crate::config::Metric;
use crate::lattice::{Direction, Lattice};
use crate::loader::ReadingTable;
use crate::pattern_store::PatternStore;
use crate::sequence_index::SequenceIndex;
use anyhow::Result;

/// Bi-directional pruning on support and crossk
pub struct BoundedPruning<'a> {
    table: &'a ReadingTable,
    index: &'a SequenceIndex,
    support_threshold: f64,
    crossk_threshold: f64,
}

impl<'a> BoundedPruning<'a> {
    pub fn new(
        table: &'a ReadingTable,
        index: &'a SequenceIndex,
        support_threshold: f64,
        crossk_threshold: f64,
    ) -> Self {
        Self {
            table,
            index,
            support_threshold,
            crossk_threshold,
        }
    }

    /// Apriori inner loop at one level, bottom-up
    ///
    /// Identical to plain support pruning, plus: every singleton's joinset
    /// cardinality lands in `singleton_joinsets` for the upper-bound
    /// passes. Returns (newly enumerated, entire level pruned); an
    /// entirely-pruned level terminates the whole interval.
    fn apriori_pass(
        &self,
        lattice: &mut Lattice,
        store: &mut PatternStore,
        start: usize,
        level: usize,
        singleton_joinsets: &mut [usize],
    ) -> Result<(usize, bool)> {
        let mut enumerated = 0;
        let mut all_pruned = true;

        for id in lattice.level_nodes(level).to_vec() {
            if lattice.node(id).is_pruned() {
                continue;
            }

            let subset = lattice.node(id).subset().to_vec();
            let (pattern, newly_enumerated) =
                find_or_enumerate(self.table, self.index, store, &subset, start)?;
            if newly_enumerated {
                enumerated += 1;
            }

            if let [dimension] = subset[..] {
                singleton_joinsets[dimension] = store.record(pattern).joinset;
            }

            if store.mark_qualified(pattern, Metric::Support, self.support_threshold) {
                all_pruned = false;
            } else {
                lattice.prune(id, Direction::Ancestors);
            }
        }

        Ok((enumerated, all_pruned))
    }

    /// Upper-bound pass at one level, top-down
    ///
    /// Returns (newly enumerated, interval aborted). Abort fires at the
    /// root only: a memoized root key means the whole lattice was already
    /// explored for identical values, and a root crossk bound below the
    /// threshold means no subset anywhere can qualify.
    fn upper_bound_pass(
        &self,
        lattice: &mut Lattice,
        store: &mut PatternStore,
        start: usize,
        level: usize,
        singleton_joinsets: &[usize],
    ) -> Result<(usize, bool)> {
        let mut enumerated = 0;
        let crossk_const = store.crossk_const();

        for id in lattice.level_nodes(level).to_vec() {
            if lattice.node(id).is_pruned() {
                continue;
            }

            let subset = lattice.node(id).subset().to_vec();

            if level != 0 {
                // Best crossk this subtree could reach, without touching
                // the index: the largest member-singleton joinset over the
                // occurrence-count lower bound propagated from above
                let max_leaf = subset
                    .iter()
                    .map(|&dimension| singleton_joinsets[dimension])
                    .max()
                    .unwrap_or(0);
                let bound = lattice.node(id).bound_hint().max(1);
                let ub_crossk = crossk_const * max_leaf as f64 / bound as f64;

                if ub_crossk < self.crossk_threshold {
                    lattice.prune(id, Direction::Descendants);
                    continue;
                }
            }

            let (pattern, newly_enumerated) =
                find_or_enumerate(self.table, self.index, store, &subset, start)?;
            if !newly_enumerated {
                if level == 0 {
                    // Identical root values were fully explored before
                    return Ok((enumerated, true));
                }
                // A repeated key implies its subtree was already explored
                lattice.prune(id, Direction::Descendants);
                continue;
            }
            enumerated += 1;

            // Support last: the stored qualified flag keeps the support
            // verdict for the final selection
            store.mark_qualified(pattern, Metric::Crossk, self.crossk_threshold);
            store.mark_qualified(pattern, Metric::Support, self.support_threshold);

            let count = store.record(pattern).count;

            if level == 0 {
                let max_leaf = singleton_joinsets.iter().copied().max().unwrap_or(0);
                let ub_crossk = crossk_const * max_leaf as f64 / count as f64;
                if ub_crossk < self.crossk_threshold {
                    return Ok((enumerated, true));
                }
            }

            let hint = count.max(lattice.node(id).bound_hint());
            for child in lattice.node(id).children().to_vec() {
                lattice.raise_bound_hint(child, hint);
            }
        }

        Ok((enumerated, false))
    }
}

impl PruningStrategy for BoundedPruning<'_> {
    fn evaluate_interval(
        &mut self,
        store: &mut PatternStore,
        start: usize,
        end: usize,
    ) -> Result<usize> {
        debug_assert_eq!(end - start, self.index.pattern_length());

        let dimensions = self.table.num_dimensions();
        let mut lattice = Lattice::build(dimensions);
        let mut enumerated = 0;

        // Filled by the first apriori pass (every singleton is live in
        // round one) before any upper-bound pass reads it
        let mut singleton_joinsets = vec![0usize; dimensions];

        let mut shallow: isize = 0;
        let mut deep: isize = dimensions as isize - 1;

        while shallow <= deep {
            let (newly_enumerated, all_pruned) = self.apriori_pass(
                &mut lattice,
                store,
                start,
                deep as usize,
                &mut singleton_joinsets,
            )?;
            enumerated += newly_enumerated;
            deep -= 1;
            if all_pruned {
                break;
            }

            if shallow <= deep {
                let (newly_enumerated, aborted) = self.upper_bound_pass(
                    &mut lattice,
                    store,
                    start,
                    shallow as usize,
                    &singleton_joinsets,
                )?;
                enumerated += newly_enumerated;
                shallow += 1;
                if aborted {
                    tracing::debug!(start, "interval aborted at the lattice root");
                    break;
                }
            }
        }

        Ok(lattice.num_nodes() - enumerated)
    }
}
