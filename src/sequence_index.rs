//! Per-dimension exact-sequence occurrence index
//!
//! Hashes every L-length value tuple of every dimension once, up front, so
//! that pattern occurrence lookup is a handful of map probes plus a sorted
//! intersection instead of a table scan per candidate. The index is
//! read-only after build and safe to share.

use crate::loader::ReadingTable;
use fnv::FnvHashMap;
use thiserror::Error;

/// Invariant violations inside the occurrence index
///
/// These indicate a programming error (the lattice and the index were built
/// for different dimension universes), not a recoverable condition.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IndexError {
    #[error("dimension {0} is not covered by the sequence index")]
    DimensionNotIndexed(usize),
}

pub type Result<T> = std::result::Result<T, IndexError>;

/// L-length value tuple, keyed by exact bit patterns
type SequenceKey = Vec<u64>;

/// Read-only index from value tuples to ascending occurrence-start lists
pub struct SequenceIndex {
    /// One map per dimension: tuple bits → starts
    maps: Vec<FnvHashMap<SequenceKey, Vec<usize>>>,
    pattern_length: usize,
}

impl SequenceIndex {
    /// Hash every dimension's L-length tuples across the whole table
    ///
    /// Occurrence lists are ascending by construction since starts are
    /// visited in order. Cost O(N · D · L).
    pub fn build(table: &ReadingTable, pattern_length: usize) -> Self {
        let num_rows = table.num_rows();
        let mut maps = Vec::with_capacity(table.num_dimensions());

        for dimension in 0..table.num_dimensions() {
            let column = table.column(dimension);
            let mut map: FnvHashMap<SequenceKey, Vec<usize>> = FnvHashMap::default();

            if num_rows >= pattern_length {
                for start in 0..=num_rows - pattern_length {
                    let key: SequenceKey = column[start..start + pattern_length]
                        .iter()
                        .map(|value| value.to_bits())
                        .collect();
                    map.entry(key).or_default().push(start);
                }
            }

            maps.push(map);
        }

        let total_entries: usize = maps.iter().map(|map| map.len()).sum();
        tracing::info!(
            dimensions = maps.len(),
            entries = total_entries,
            pattern_length,
            "sequence index built"
        );

        Self {
            maps,
            pattern_length,
        }
    }

    /// Pattern length the index was built for
    pub fn pattern_length(&self) -> usize {
        self.pattern_length
    }

    /// All starts where the joint pattern at `[start, start + L)` over
    /// `dimensions` occurs in the table, ascending
    ///
    /// Returns an empty list as soon as any dimension's tuple is unseen —
    /// the joint pattern cannot occur anywhere. Errors only if a dimension
    /// lies outside the indexed universe.
    pub fn lookup(
        &self,
        dimensions: &[usize],
        start: usize,
        table: &ReadingTable,
    ) -> Result<Vec<usize>> {
        let mut joint: Option<Vec<usize>> = None;

        for &dimension in dimensions {
            let map = self
                .maps
                .get(dimension)
                .ok_or(IndexError::DimensionNotIndexed(dimension))?;

            let key: SequenceKey = table.column(dimension)[start..start + self.pattern_length]
                .iter()
                .map(|value| value.to_bits())
                .collect();

            let starts = match map.get(&key) {
                Some(starts) => starts,
                None => return Ok(Vec::new()),
            };

            joint = Some(match joint {
                None => starts.clone(),
                Some(previous) => intersect_sorted(&previous, starts),
            });
        }

        Ok(joint.unwrap_or_default())
    }
}

/// Intersection of two ascending lists, ascending
fn intersect_sorted(left: &[usize], right: &[usize]) -> Vec<usize> {
    let mut result = Vec::with_capacity(left.len().min(right.len()));
    let (mut i, mut j) = (0, 0);

    while i < left.len() && j < right.len() {
        match left[i].cmp(&right[j]) {
            std::cmp::Ordering::Less => i += 1,
            std::cmp::Ordering::Greater => j += 1,
            std::cmp::Ordering::Equal => {
                result.push(left[i]);
                i += 1;
                j += 1;
            }
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture() -> ReadingTable {
        ReadingTable::from_columns(
            vec!["engrpm".to_string(), "brkpw".to_string()],
            vec![
                vec![2015.0, 1755.0, 1076.0, 2015.0, 1755.0, 1076.0, 2014.0, 1755.0, 1076.0],
                vec![660.0, 574.0, 158.0, 610.0, 574.0, 158.0, 660.0, 574.0, 158.0],
            ],
            vec![false; 9],
        )
        .unwrap()
    }

    #[test]
    fn test_single_dimension_occurrences_ascending() {
        let table = fixture();
        let index = SequenceIndex::build(&table, 2);

        // (1755, 1076) repeats at starts 1, 4 and 7
        let starts = index.lookup(&[0], 1, &table).unwrap();
        assert_eq!(starts, vec![1, 4, 7]);
    }

    #[test]
    fn test_joint_lookup_intersects_dimensions() {
        let table = fixture();
        let index = SequenceIndex::build(&table, 2);

        // engrpm (2015, 1755) occurs at {0, 3}; brkpw (660, 574) at {0, 6}
        let starts = index.lookup(&[0, 1], 0, &table).unwrap();
        assert_eq!(starts, vec![0]);
    }

    #[test]
    fn test_longer_windows_narrow_the_join() {
        let table = fixture();
        // engrpm (2015, 1755, 1076) occurs at {0, 3}; brkpw narrows the
        // joint window at start 3 down to itself
        let index = SequenceIndex::build(&table, 3);

        let starts = index.lookup(&[0, 1], 3, &table).unwrap();
        assert_eq!(starts, vec![3]);
    }

    #[test]
    fn test_unseen_tuple_short_circuits_empty() {
        let table = fixture();
        let index = SequenceIndex::build(&table, 2);

        // Probe with a window the index has never hashed
        let mut columns: Vec<Vec<f64>> =
            (0..table.num_dimensions()).map(|d| table.column(d).to_vec()).collect();
        columns[1][0] = 9999.0;
        let other =
            ReadingTable::from_columns(table.dimension_names().to_vec(), columns, vec![false; 9])
                .unwrap();

        let starts = index.lookup(&[0, 1], 0, &other).unwrap();
        assert_eq!(starts, Vec::<usize>::new());
    }

    #[test]
    fn test_unknown_dimension_is_an_invariant_violation() {
        let table = fixture();
        let index = SequenceIndex::build(&table, 2);

        let err = index.lookup(&[0, 7], 0, &table).unwrap_err();
        assert_eq!(err, IndexError::DimensionNotIndexed(7));
    }

    #[test]
    fn test_pattern_longer_than_table() {
        let table = ReadingTable::from_columns(
            vec!["engrpm".to_string()],
            vec![vec![1.0, 2.0]],
            vec![false; 2],
        )
        .unwrap();
        let index = SequenceIndex::build(&table, 3);

        // No tuple of length 3 exists anywhere
        assert!(index.maps[0].is_empty());
    }

    #[test]
    fn test_intersect_sorted() {
        assert_eq!(intersect_sorted(&[1, 4, 7], &[4, 7]), vec![4, 7]);
        assert_eq!(intersect_sorted(&[1, 2, 3], &[4, 5]), Vec::<usize>::new());
        assert_eq!(intersect_sorted(&[], &[1]), Vec::<usize>::new());
    }
}
