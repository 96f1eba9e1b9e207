//! Apriori support pruning
//!
//! Bottom-up walk from singletons to the full set. Support is
//! anti-monotone under this formula's construction: a superset's
//! occurrences are an intersection of its subsets' occurrences, so adding
//! dimensions can only shrink the joinset. A subset below the support
//! threshold therefore rules out every strict superset, and pruning its
//! ancestor closure is sound.

use super::{find_or_enumerate, PruningStrategy};
use crate::config::Metric;
use crate::lattice::{Direction, Lattice};
use crate::loader::ReadingTable;
use crate::pattern_store::PatternStore;
use crate::sequence_index::SequenceIndex;
use anyhow::Result;

/// Bottom-up apriori pruning on the support metric
pub struct SupportPruning<'a> {
    table: &'a ReadingTable,
    index: &'a SequenceIndex,
    support_threshold: f64,
}

impl<'a> SupportPruning<'a> {
    pub fn new(table: &'a ReadingTable, index: &'a SequenceIndex, support_threshold: f64) -> Self {
        Self {
            table,
            index,
            support_threshold,
        }
    }
}

impl PruningStrategy for SupportPruning<'_> {
    fn evaluate_interval(
        &mut self,
        store: &mut PatternStore,
        start: usize,
        end: usize,
    ) -> Result<usize> {
        debug_assert_eq!(end - start, self.index.pattern_length());

        let mut lattice = Lattice::build(self.table.num_dimensions());
        let mut enumerated = 0;

        for level in (0..lattice.num_dimensions()).rev() {
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

                if store.mark_qualified(pattern, Metric::Support, self.support_threshold) {
                    all_pruned = false;
                } else {
                    lattice.prune(id, Direction::Ancestors);
                }
            }

            if all_pruned {
                // Nothing shallower is still reachable unpruned
                tracing::debug!(level, "entire level pruned, stopping interval early");
                break;
            }
        }

        Ok(lattice.num_nodes() - enumerated)
    }
}
