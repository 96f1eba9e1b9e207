//! Output formatting for qualified patterns
//!
//! Turns store records into presentation rows: one value-sequence string
//! per table dimension (empty for dimensions outside the pattern's subset)
//! plus the metric columns. Text and CSV renderers live here; JSON comes
//! straight from serde on the summary types.

use crate::loader::ReadingTable;
use crate::pattern_store::PatternStore;
use serde::Serialize;

/// Metric column headers, in output order
const METRIC_HEADERS: [&str; 5] = [
    "Count",
    "Support",
    "Kvalue",
    "Confidence",
    "First Occurrence Index",
];

/// One qualified pattern, ready for rendering
#[derive(Debug, Clone, Serialize)]
pub struct PatternSummary {
    /// Space-joined value sequence per table dimension, aligned with the
    /// table's dimension order; empty for dimensions the pattern ignores
    pub dimension_values: Vec<String>,
    pub count: usize,
    pub support: f64,
    pub crossk: f64,
    pub confidence: f64,
    pub first_occurrence: usize,
}

/// Build presentation rows for the given store ids, in order
pub fn build_summaries(
    store: &PatternStore,
    table: &ReadingTable,
    ids: &[usize],
) -> Vec<PatternSummary> {
    ids.iter()
        .map(|&id| {
            let key = store.key(id);
            let record = store.record(id);

            let dimension_values = (0..table.num_dimensions())
                .map(|dimension| match key.dimension_values(dimension) {
                    Some(values) => values
                        .iter()
                        .map(f64::to_string)
                        .collect::<Vec<_>>()
                        .join(" "),
                    None => String::new(),
                })
                .collect();

            PatternSummary {
                dimension_values,
                count: record.count,
                support: record.support,
                crossk: record.crossk,
                confidence: record.confidence,
                first_occurrence: record.occurrences[0],
            }
        })
        .collect()
}

/// Row cells in header order
fn row_cells(summary: &PatternSummary) -> Vec<String> {
    let mut cells = summary.dimension_values.clone();
    cells.push(summary.count.to_string());
    cells.push(format!("{:.4}", summary.support));
    cells.push(format!("{:.4}", summary.crossk));
    cells.push(format!("{:.4}", summary.confidence));
    cells.push(summary.first_occurrence.to_string());
    cells
}

fn headers(dimension_names: &[String]) -> Vec<String> {
    dimension_names
        .iter()
        .cloned()
        .chain(METRIC_HEADERS.iter().map(|header| header.to_string()))
        .collect()
}

/// Render an aligned text table
pub fn render_text(summaries: &[PatternSummary], dimension_names: &[String]) -> String {
    let headers = headers(dimension_names);
    let rows: Vec<Vec<String>> = summaries.iter().map(row_cells).collect();

    let mut widths: Vec<usize> = headers.iter().map(String::len).collect();
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.len());
        }
    }

    let format_row = |cells: &[String]| {
        cells
            .iter()
            .zip(&widths)
            .map(|(cell, &width)| format!("{cell:width$}"))
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };

    let mut lines = vec![format_row(&headers)];
    lines.push(widths.iter().map(|w| "-".repeat(*w)).collect::<Vec<_>>().join("  "));
    for row in &rows {
        lines.push(format_row(row));
    }
    lines.push(String::new());

    lines.join("\n")
}

/// Render CSV with one header row
pub fn render_csv(summaries: &[PatternSummary], dimension_names: &[String]) -> String {
    let mut lines = vec![headers(dimension_names).join(",")];
    for summary in summaries {
        lines.push(row_cells(summary).join(","));
    }
    lines.push(String::new());

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Metric, Selection};
    use crate::pattern::PatternKey;

    fn fixture() -> (PatternStore, ReadingTable) {
        let table = ReadingTable::from_columns(
            vec!["engrpm".to_string(), "brkpw".to_string(), "nox".to_string()],
            vec![
                vec![2015.0, 1755.0, 1076.0, 2015.0, 1755.0, 1076.0, 2014.0, 1755.0, 1076.0],
                vec![660.0, 574.0, 158.0, 610.0, 574.0, 158.0, 660.0, 574.0, 158.0],
                vec![82.0, 48.0, 27.0, 13.0, 48.0, 26.0, 13.0, 48.0, 26.0],
            ],
            vec![false, true, true, true, false, true, false, true, true],
        )
        .unwrap();

        let mut store = PatternStore::new(vec![1, 2, 3, 5, 7, 8], 9, 1).unwrap();
        let id = store.enumerate(
            PatternKey::from_window(&table, &[0, 1], 1, 2),
            vec![1, 4, 7],
        );
        store.mark_qualified(id, Metric::Support, 0.5);

        (store, table)
    }

    #[test]
    fn test_build_summaries_layout() {
        let (store, table) = fixture();
        let ids = store.query(Metric::Crossk, Selection::TopK(10));
        let summaries = build_summaries(&store, &table, &ids);

        assert_eq!(summaries.len(), 1);
        let summary = &summaries[0];
        // nox is not part of the pattern: its column stays empty
        assert_eq!(
            summary.dimension_values,
            vec!["1755 1076".to_string(), "574 158".to_string(), String::new()]
        );
        assert_eq!(summary.count, 3);
        assert_eq!(summary.first_occurrence, 1);
    }

    #[test]
    fn test_render_text_includes_headers_and_values() {
        let (store, table) = fixture();
        let summaries = build_summaries(&store, &table, &[0]);
        let text = render_text(&summaries, table.dimension_names());

        assert!(text.contains("Kvalue"));
        assert!(text.contains("First Occurrence Index"));
        assert!(text.contains("1755 1076"));
        assert!(text.contains("2.5000"));
    }

    #[test]
    fn test_render_csv_shape() {
        let (store, table) = fixture();
        let summaries = build_summaries(&store, &table, &[0]);
        let csv = render_csv(&summaries, table.dimension_names());

        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(
            lines[0],
            "engrpm,brkpw,nox,Count,Support,Kvalue,Confidence,First Occurrence Index"
        );
        assert!(lines[1].starts_with("1755 1076,574 158,,3,"));
    }

    #[test]
    fn test_summaries_serialize_to_json() {
        let (store, table) = fixture();
        let summaries = build_summaries(&store, &table, &[0]);
        let json = serde_json::to_string(&summaries).unwrap();

        assert!(json.contains("\"count\":3"));
        assert!(json.contains("1755 1076"));
    }
}
