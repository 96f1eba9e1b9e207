//! Content-addressed pattern memo and metric store
//!
//! Every distinct pattern key is enumerated exactly once per run: the store
//! counts its occurrences against the anomalous windows, derives support,
//! confidence and crossk, and keeps the record for the lifetime of the run.
//! Records accumulate monotonically and are never revised except for the
//! single mutable `qualified` flag, which always reflects the most recent
//! threshold check.
//!
//! Metrics are only meaningful relative to the (N, anomalousWindows, lag)
//! triple the store was built with; a different triple means a fresh store.

use crate::config::{ConfigError, Metric, Selection};
use crate::pattern::PatternKey;
use fnv::FnvHashMap;
use serde::Serialize;

/// Anomalous windows are pre-binned in buckets of this many rows so joinset
/// counting scans only nearby windows instead of the whole set
const WINDOW_BIN_SIZE: usize = 50;

/// Emit a progress line every this many enumerated patterns
const ENUMERATION_LOG_INTERVAL: usize = 10_000;

/// Metrics and occurrence data for one enumerated pattern
#[derive(Debug, Clone, Serialize)]
pub struct PatternRecord {
    /// Ascending occurrence starts
    pub occurrences: Vec<usize>,
    /// Occurrence count
    pub count: usize,
    /// Total overlap size between occurrence windows and anomalous windows
    pub joinset: usize,
    /// Occurrences overlapping at least one anomalous window
    pub unique_joinset: usize,
    pub support: f64,
    pub confidence: f64,
    pub crossk: f64,
    /// Outcome of the most recent threshold check, any metric
    pub qualified: bool,
}

/// Serializable snapshot of a store, carrying the triple its metrics were
/// computed against
#[derive(Debug, Serialize)]
pub struct StoreExport {
    pub num_readings: usize,
    pub anomalous_windows: Vec<usize>,
    pub lag: usize,
    pub records: Vec<PatternRecord>,
}

/// Memo from canonical pattern key to dense metric records
#[derive(Debug)]
pub struct PatternStore {
    lag: usize,
    num_readings: usize,
    anomalous_windows: Vec<usize>,
    /// Windows bucketed by `row / WINDOW_BIN_SIZE` for range queries
    window_bins: FnvHashMap<usize, Vec<usize>>,
    /// N / |W|, the crossk normalization constant
    crossk_const: f64,
    ids: FnvHashMap<PatternKey, usize>,
    /// Keys in enumeration order, parallel to `records`
    keys: Vec<PatternKey>,
    records: Vec<PatternRecord>,
}

impl PatternStore {
    /// Create a store for one (anomalousWindows, N, lag) triple
    ///
    /// # Errors
    ///
    /// An empty anomaly-window set is a `ConfigError`: the crossk constant
    /// N/|W| would be undefined.
    pub fn new(
        anomalous_windows: Vec<usize>,
        num_readings: usize,
        lag: usize,
    ) -> Result<Self, ConfigError> {
        if anomalous_windows.is_empty() {
            return Err(ConfigError::EmptyAnomalyWindows);
        }

        let mut window_bins: FnvHashMap<usize, Vec<usize>> = FnvHashMap::default();
        for &window in &anomalous_windows {
            window_bins
                .entry(window / WINDOW_BIN_SIZE)
                .or_default()
                .push(window);
        }

        let crossk_const = num_readings as f64 / anomalous_windows.len() as f64;

        Ok(Self {
            lag,
            num_readings,
            anomalous_windows,
            window_bins,
            crossk_const,
            ids: FnvHashMap::default(),
            keys: Vec::new(),
            records: Vec::new(),
        })
    }

    pub fn lag(&self) -> usize {
        self.lag
    }

    pub fn num_readings(&self) -> usize {
        self.num_readings
    }

    pub fn anomalous_windows(&self) -> &[usize] {
        &self.anomalous_windows
    }

    /// N / |W|, shared with bounded pruning's upper-bound formula
    pub fn crossk_const(&self) -> f64 {
        self.crossk_const
    }

    /// Number of enumerated patterns
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Id of an already-enumerated pattern
    pub fn find(&self, key: &PatternKey) -> Option<usize> {
        self.ids.get(key).copied()
    }

    pub fn record(&self, id: usize) -> &PatternRecord {
        &self.records[id]
    }

    pub fn key(&self, id: usize) -> &PatternKey {
        &self.keys[id]
    }

    /// Memoize a pattern and compute its metrics
    ///
    /// Idempotent: a key that already exists returns its id unchanged, with
    /// no recomputation. `occurrences` must be non-empty and ascending —
    /// the driver only enumerates windows read from the table, which occur
    /// at least at their own start.
    pub fn enumerate(&mut self, key: PatternKey, occurrences: Vec<usize>) -> usize {
        if let Some(&id) = self.ids.get(&key) {
            return id;
        }

        debug_assert!(!occurrences.is_empty(), "enumerating a pattern with no occurrences");

        let mut joinset = 0;
        let mut unique_joinset = 0;
        for &start in &occurrences {
            let overlap = self.window_overlap(start);
            if overlap > 0 {
                joinset += overlap;
                unique_joinset += 1;
            }
        }

        let count = occurrences.len();
        let confidence = unique_joinset as f64 / count as f64;
        let support = joinset as f64 / self.num_readings as f64;
        let crossk = self.crossk_const * (joinset as f64 / count as f64);

        let id = self.records.len();
        self.records.push(PatternRecord {
            occurrences,
            count,
            joinset,
            unique_joinset,
            support,
            confidence,
            crossk,
            qualified: true,
        });
        self.keys.push(key.clone());
        self.ids.insert(key, id);

        if self.records.len() % ENUMERATION_LOG_INTERVAL == 0 {
            tracing::info!(patterns = self.records.len(), "pattern enumeration progress");
        }

        id
    }

    /// Size of `[start, start + lag]` ∩ anomalousWindows, via the bins
    fn window_overlap(&self, start: usize) -> usize {
        let end = start + self.lag;
        let mut overlap = 0;

        for bin in start / WINDOW_BIN_SIZE..=end / WINDOW_BIN_SIZE {
            if let Some(windows) = self.window_bins.get(&bin) {
                overlap += windows
                    .iter()
                    .filter(|&&window| window >= start && window <= end)
                    .count();
            }
        }

        overlap
    }

    /// One metric of one record
    pub fn metric_value(&self, id: usize, metric: Metric) -> f64 {
        let record = &self.records[id];
        match metric {
            Metric::Support => record.support,
            Metric::Crossk => record.crossk,
            Metric::Confidence => record.confidence,
        }
    }

    /// Re-evaluate and overwrite a pattern's qualified flag
    ///
    /// The flag is a single slot shared by all metrics: it reflects only
    /// the most recent check, so interleaving checks on different metrics
    /// is order-sensitive. Callers relying on a specific metric's verdict
    /// must check that metric last.
    pub fn mark_qualified(&mut self, id: usize, metric: Metric, threshold: f64) -> bool {
        let qualified = self.metric_value(id, metric) >= threshold;
        self.records[id].qualified = qualified;
        qualified
    }

    /// Ids of currently-qualified patterns under a selection
    ///
    /// Top-k ranks by the metric descending with ties broken by enumeration
    /// order; threshold mode filters `value >= cutoff` in enumeration order.
    pub fn query(&self, metric: Metric, selection: Selection) -> Vec<usize> {
        let qualified: Vec<usize> = (0..self.records.len())
            .filter(|&id| self.records[id].qualified)
            .collect();

        match selection {
            Selection::TopK(k) => {
                let mut ranked = qualified;
                ranked.sort_by(|&a, &b| {
                    self.metric_value(b, metric)
                        .partial_cmp(&self.metric_value(a, metric))
                        .unwrap_or(std::cmp::Ordering::Equal)
                        .then(a.cmp(&b))
                });
                ranked.truncate(k);
                ranked
            }
            Selection::Threshold(cutoff) => qualified
                .into_iter()
                .filter(|&id| self.metric_value(id, metric) >= cutoff)
                .collect(),
        }
    }

    /// Snapshot for callers that persist results between runs
    pub fn export(&self) -> StoreExport {
        StoreExport {
            num_readings: self.num_readings,
            anomalous_windows: self.anomalous_windows.clone(),
            lag: self.lag,
            records: self.records.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::ReadingTable;

    fn store() -> PatternStore {
        // 9 readings, anomalous rows {1, 2, 3, 5, 7, 8}, lag 1
        PatternStore::new(vec![1, 2, 3, 5, 7, 8], 9, 1).unwrap()
    }

    fn key_on(dimensions: &[usize], start: usize) -> PatternKey {
        let table = ReadingTable::from_columns(
            vec!["engrpm".to_string(), "brkpw".to_string(), "nox".to_string()],
            vec![
                vec![2015.0, 1755.0, 1076.0, 2015.0, 1755.0, 1076.0, 2014.0, 1755.0, 1076.0],
                vec![660.0, 574.0, 158.0, 610.0, 574.0, 158.0, 660.0, 574.0, 158.0],
                vec![82.0, 48.0, 27.0, 13.0, 48.0, 26.0, 13.0, 48.0, 26.0],
            ],
            vec![false; 9],
        )
        .unwrap();
        PatternKey::from_window(&table, dimensions, start, 2)
    }

    #[test]
    fn test_empty_anomaly_windows_rejected() {
        let err = PatternStore::new(vec![], 9, 1).unwrap_err();
        assert_eq!(err, ConfigError::EmptyAnomalyWindows);
    }

    #[test]
    fn test_metric_formulas_on_fixture() {
        let mut store = store();

        // Pattern over {engrpm, brkpw} at rows [1, 3): occurs at 1, 4, 7
        let id = store.enumerate(key_on(&[0, 1], 1), vec![1, 4, 7]);
        let record = store.record(id);

        assert_eq!(record.count, 3);
        assert_eq!(record.joinset, 5);
        assert_eq!(record.unique_joinset, 3);
        assert!((record.support - 5.0 / 9.0).abs() < 1e-9);
        assert_eq!(record.confidence, 1.0);
        assert!((record.crossk - 2.5).abs() < 1e-9);
    }

    #[test]
    fn test_enumerate_is_idempotent() {
        let mut store = store();

        let first = store.enumerate(key_on(&[0, 1], 1), vec![1, 4, 7]);
        let support = store.record(first).support;

        // Re-enumeration with different occurrences must be a no-op
        let second = store.enumerate(key_on(&[0, 1], 1), vec![1]);
        assert_eq!(first, second);
        assert_eq!(store.len(), 1);
        assert_eq!(store.record(first).count, 3);
        assert_eq!(store.record(first).support, support);
    }

    #[test]
    fn test_identical_windows_share_a_record() {
        let mut store = store();

        let a = store.enumerate(key_on(&[0, 1], 1), vec![1, 4, 7]);
        // Rows [4, 6) carry the same values on both dimensions
        let b = store.enumerate(key_on(&[0, 1], 4), vec![1, 4, 7]);
        assert_eq!(a, b);
    }

    #[test]
    fn test_qualified_flag_is_last_writer_wins() {
        let mut store = store();
        let id = store.enumerate(key_on(&[0, 1], 1), vec![1, 4, 7]);

        // support 0.556 passes, crossk 2.5 fails a 3.5 threshold: the flag
        // tracks whichever check ran last
        assert!(store.mark_qualified(id, Metric::Support, 0.5));
        assert!(store.record(id).qualified);

        assert!(!store.mark_qualified(id, Metric::Crossk, 3.5));
        assert!(!store.record(id).qualified);

        assert!(store.mark_qualified(id, Metric::Support, 0.5));
        assert!(store.record(id).qualified);
    }

    #[test]
    fn test_query_topk_breaks_ties_by_enumeration_order() {
        let mut store = store();

        // Three patterns with identical metrics, distinct keys
        let a = store.enumerate(key_on(&[0], 1), vec![1, 4, 7]);
        let b = store.enumerate(key_on(&[1], 1), vec![1, 4, 7]);
        let c = store.enumerate(key_on(&[0, 1], 1), vec![1, 4, 7]);
        for id in [a, b, c] {
            store.mark_qualified(id, Metric::Support, 0.5);
        }

        assert_eq!(store.query(Metric::Crossk, Selection::TopK(2)), vec![a, b]);
        assert_eq!(
            store.query(Metric::Crossk, Selection::TopK(10)),
            vec![a, b, c]
        );
    }

    #[test]
    fn test_query_ranks_by_metric_descending() {
        let mut store = store();

        let low = store.enumerate(key_on(&[2], 1), vec![1]); // joinset 2
        let high = store.enumerate(key_on(&[0], 1), vec![1, 4, 7]); // joinset 5
        store.mark_qualified(low, Metric::Support, 0.0);
        store.mark_qualified(high, Metric::Support, 0.0);

        assert_eq!(store.query(Metric::Support, Selection::TopK(2)), vec![high, low]);
    }

    #[test]
    fn test_query_threshold_filters_unqualified() {
        let mut store = store();

        let a = store.enumerate(key_on(&[0], 1), vec![1, 4, 7]);
        let b = store.enumerate(key_on(&[2], 1), vec![1]);
        store.mark_qualified(a, Metric::Support, 0.5);
        store.mark_qualified(b, Metric::Support, 0.5); // 0.222 -> unqualified

        // b's support would pass a 0.1 cutoff but its flag is stale-false
        assert_eq!(store.query(Metric::Support, Selection::Threshold(0.1)), vec![a]);
    }

    #[test]
    fn test_window_overlap_spans_bins() {
        // Window 60 lives in bin 1; a lagged span from bin 0 must reach it
        let mut store = PatternStore::new(vec![60], 100, 55).unwrap();
        let id = store.enumerate(key_on(&[0], 1), vec![10]);

        assert_eq!(store.record(id).joinset, 1);
        assert_eq!(store.record(id).unique_joinset, 1);
    }

    #[test]
    fn test_export_carries_the_metric_triple() {
        let mut store = store();
        store.enumerate(key_on(&[0, 1], 1), vec![1, 4, 7]);

        let export = store.export();
        assert_eq!(export.num_readings, 9);
        assert_eq!(export.anomalous_windows, vec![1, 2, 3, 5, 7, 8]);
        assert_eq!(export.lag, 1);
        assert_eq!(export.records.len(), 1);

        let json = serde_json::to_string(&export).unwrap();
        assert!(json.contains("\"lag\":1"));
        assert!(json.contains("\"joinset\":5"));
    }
}
