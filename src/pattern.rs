//! Canonical pattern key encoding
//!
//! A pattern is an (dimension subset, start row, length) window of raw
//! values. Its key must be exact and order-preserving so that byte-identical
//! windows taken from different intervals collide in the memo. The encoding
//! keeps the ascending dimension indexes plus the bit pattern of every
//! (row, dimension) value; bit patterns give exact equality and hashing for
//! f64 without touching float comparison semantics.

use crate::loader::ReadingTable;

/// Content-addressed identity of one pattern window
///
/// Two windows with identical values on identical dimensions, anywhere in
/// the table, produce equal keys. The key is also decodable: reporting
/// reconstructs the raw values from the stored bits.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PatternKey {
    dimensions: Vec<usize>,
    /// Value bits, row-major: rows × dimensions in subset order
    value_bits: Vec<u64>,
    length: usize,
}

impl PatternKey {
    /// Encode the window `[start, start + length)` over `dimensions`
    ///
    /// `dimensions` must be ascending; the lattice only hands out canonical
    /// subsets.
    pub fn from_window(
        table: &ReadingTable,
        dimensions: &[usize],
        start: usize,
        length: usize,
    ) -> Self {
        debug_assert!(dimensions.windows(2).all(|pair| pair[0] < pair[1]));

        let mut value_bits = Vec::with_capacity(length * dimensions.len());
        for row in start..start + length {
            for &dimension in dimensions {
                value_bits.push(table.value(dimension, row).to_bits());
            }
        }

        Self {
            dimensions: dimensions.to_vec(),
            value_bits,
            length,
        }
    }

    /// Dimensions participating in the pattern, ascending
    pub fn dimensions(&self) -> &[usize] {
        &self.dimensions
    }

    /// Pattern length in rows
    pub fn length(&self) -> usize {
        self.length
    }

    /// Decode the value at (row offset, position within the subset)
    pub fn value(&self, row_offset: usize, subset_pos: usize) -> f64 {
        f64::from_bits(self.value_bits[row_offset * self.dimensions.len() + subset_pos])
    }

    /// Decode the full value sequence of one participating dimension
    ///
    /// Returns `None` if the dimension is not part of this pattern.
    pub fn dimension_values(&self, dimension: usize) -> Option<Vec<f64>> {
        let subset_pos = self.dimensions.iter().position(|&d| d == dimension)?;
        Some(
            (0..self.length)
                .map(|row| self.value(row, subset_pos))
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture() -> ReadingTable {
        // Rows 1..3 and 4..6 carry identical values on both dimensions
        ReadingTable::from_columns(
            vec!["engrpm".to_string(), "brkpw".to_string()],
            vec![
                vec![2015.0, 1755.0, 1076.0, 2015.0, 1755.0, 1076.0],
                vec![660.0, 574.0, 158.0, 610.0, 574.0, 158.0],
            ],
            vec![false; 6],
        )
        .unwrap()
    }

    #[test]
    fn test_identical_windows_collide() {
        let table = fixture();
        let a = PatternKey::from_window(&table, &[0, 1], 1, 2);
        let b = PatternKey::from_window(&table, &[0, 1], 4, 2);
        assert_eq!(a, b);
    }

    #[test]
    fn test_different_values_differ() {
        let table = fixture();
        let a = PatternKey::from_window(&table, &[0, 1], 0, 2);
        let b = PatternKey::from_window(&table, &[0, 1], 3, 2);
        // brkpw row 0 is 660, row 3 is 610
        assert_ne!(a, b);
    }

    #[test]
    fn test_dimension_identity_is_part_of_the_key() {
        let table = ReadingTable::from_columns(
            vec!["nox".to_string(), "absp".to_string()],
            vec![vec![48.0, 26.0], vec![48.0, 26.0]],
            vec![false; 2],
        )
        .unwrap();

        let a = PatternKey::from_window(&table, &[0], 0, 2);
        let b = PatternKey::from_window(&table, &[1], 0, 2);
        // Same values on different dimensions must not collide
        assert_ne!(a, b);
    }

    #[test]
    fn test_decoding_round_trip() {
        let table = fixture();
        let key = PatternKey::from_window(&table, &[0, 1], 1, 2);

        assert_eq!(key.dimensions(), &[0, 1]);
        assert_eq!(key.length(), 2);
        assert_eq!(key.dimension_values(0), Some(vec![1755.0, 1076.0]));
        assert_eq!(key.dimension_values(1), Some(vec![574.0, 158.0]));
        assert_eq!(key.dimension_values(5), None);
    }
}
