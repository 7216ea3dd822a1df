use crate::cell::RawGrid;

/// How to find one export kind's header row.
///
/// The exports are produced by a point-of-sale package that renames, drops
/// and truncates columns between versions, so the header is located by fuzzy
/// keyword scoring rather than exact position or exact names. All values here
/// are per-kind constants, never inferred from the file.
#[derive(Debug, Clone, Copy)]
pub struct HeaderSpec {
    /// Canonical keywords expected somewhere in the header row.
    pub keywords: &'static [&'static str],
    /// Minimum score a row must reach. A fraction of `keywords.len()`:
    /// exports are allowed to omit columns.
    pub min_score: usize,
    /// Rows scanned from the top of the grid.
    pub search_window: usize,
    /// Some exports split the logical header over two physical rows
    /// (e.g. "Article" above "Codi"); score row pairs instead.
    pub paired_rows: bool,
    /// Leftmost column considered; exports sometimes pad the left edge with
    /// decorative blank columns.
    pub column_offset: usize,
}

/// A located header: where it is, and where the data resumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeaderLocation {
    pub header_row: usize,
    /// First data row: `header_row + 1`, or `header_row + 2` for a paired
    /// header occupying two physical rows.
    pub data_start: usize,
}

/// Result of a scan: the winning location if any row met `min_score`, plus
/// the best score seen (for the error message when nothing qualified).
#[derive(Debug, Clone, Copy)]
pub struct Scan {
    pub location: Option<HeaderLocation>,
    pub best_score: usize,
}

/// Scan the top of the grid for the header row described by `spec`.
///
/// Each candidate row scores +1 per keyword that matches some cell label by
/// case-insensitive substring in either direction (a truncated header cell
/// still matches its keyword). The highest score wins; ties keep the topmost
/// row.
pub fn locate(grid: &RawGrid, spec: &HeaderSpec) -> Scan {
    let mut best_score = 0usize;
    let mut location = None;

    let last_candidate = if spec.paired_rows {
        grid.len().saturating_sub(1)
    } else {
        grid.len()
    };

    for row in 0..last_candidate.min(spec.search_window) {
        let labels = if spec.paired_rows {
            paired_labels(grid, row, spec.column_offset)
        } else {
            row_labels(grid, row, spec.column_offset)
        };

        let score = score_labels(&labels, spec.keywords);
        if score > best_score {
            best_score = score;
            if score >= spec.min_score {
                let data_start = if spec.paired_rows { row + 2 } else { row + 1 };
                location = Some(HeaderLocation {
                    header_row: row,
                    data_start,
                });
            }
        }
    }

    Scan {
        location,
        best_score,
    }
}

/// Labels of one physical row, lowercased, from `offset` onward.
pub fn row_labels(grid: &RawGrid, row: usize, offset: usize) -> Vec<String> {
    grid[row]
        .iter()
        .skip(offset)
        .map(|c| c.lower_text())
        .collect()
}

/// Column-wise concatenation of two stacked header rows with a single space.
/// A column present in only one of the rows keeps that row's text.
pub fn paired_labels(grid: &RawGrid, row: usize, offset: usize) -> Vec<String> {
    let top = &grid[row];
    let bottom = &grid[row + 1];
    let width = top.len().max(bottom.len());

    (offset..width)
        .map(|col| {
            let a = top.get(col).map(|c| c.lower_text()).unwrap_or_default();
            let b = bottom.get(col).map(|c| c.lower_text()).unwrap_or_default();
            match (a.is_empty(), b.is_empty()) {
                (true, _) => b,
                (_, true) => a,
                _ => format!("{} {}", a, b),
            }
        })
        .collect()
}

fn score_labels(labels: &[String], keywords: &[&str]) -> usize {
    keywords
        .iter()
        .filter(|kw| {
            labels
                .iter()
                .any(|label| !label.is_empty() && (label.contains(*kw) || kw.contains(label.as_str())))
        })
        .count()
}

/// Resolve one keyword to a column index against a located header row.
/// First match wins, same either-direction substring rule as scoring.
pub fn resolve_column(labels: &[String], keyword: &str) -> Option<usize> {
    labels
        .iter()
        .position(|label| !label.is_empty() && (label.contains(keyword) || keyword.contains(label.as_str())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::Cell;

    fn text_row(cells: &[&str]) -> Vec<Cell> {
        cells.iter().map(|s| Cell::Text(s.to_string())).collect()
    }

    fn spec(keywords: &'static [&'static str], min_score: usize) -> HeaderSpec {
        HeaderSpec {
            keywords,
            min_score,
            search_window: 10,
            paired_rows: false,
            column_offset: 0,
        }
    }

    #[test]
    fn test_locates_best_scoring_row() {
        let grid: RawGrid = vec![
            text_row(&["Resum de vendes", "", ""]),
            text_row(&["", "", ""]),
            text_row(&["Data", "Import", "Tiquets"]),
            text_row(&["01/02/2023", "100", "12"]),
        ];
        let scan = locate(&grid, &spec(&["data", "import", "tiquets"], 2));
        assert_eq!(
            scan.location,
            Some(HeaderLocation {
                header_row: 2,
                data_start: 3
            })
        );
        assert_eq!(scan.best_score, 3);
    }

    #[test]
    fn test_partial_header_meets_threshold() {
        // 6 of 10 keywords present, minimum 3
        let keywords: &[&str] = &[
            "data",
            "dia",
            "venedor",
            "botiga",
            "import",
            "tiquets",
            "kgs",
            "unit",
            "mitja",
            "total",
        ];
        let grid: RawGrid = vec![
            text_row(&[""]),
            text_row(&[""]),
            text_row(&[""]),
            text_row(&["Data", "Dia", "Import", "Tiquets", "Kgs", "Unit"]),
        ];
        let scan = locate(
            &grid,
            &HeaderSpec {
                keywords,
                min_score: 3,
                search_window: 10,
                paired_rows: false,
                column_offset: 0,
            },
        );
        assert_eq!(scan.location.map(|l| l.header_row), Some(3));
        assert_eq!(scan.best_score, 6);
    }

    #[test]
    fn test_not_found_below_threshold() {
        let grid: RawGrid = vec![text_row(&["Data", "Altres"])];
        let scan = locate(&grid, &spec(&["codi", "descripcio", "total"], 2));
        assert!(scan.location.is_none());
        assert_eq!(scan.best_score, 0);
    }

    #[test]
    fn test_truncated_cell_still_matches() {
        // "descrip" is a truncation of the keyword "descripcio"
        let grid: RawGrid = vec![text_row(&["Codi", "Descrip.", "Total"])];
        let scan = locate(&grid, &spec(&["codi", "descripcio", "total"], 3));
        assert!(scan.location.is_some());
    }

    #[test]
    fn test_score_monotonicity() {
        let sparse = vec![text_row(&["Data", "x", "y"])];
        let dense = vec![text_row(&["Data", "Import", "Tiquets"])];
        let kws: &[&str] = &["data", "import", "tiquets"];
        let sparse_score = locate(&sparse, &spec(kws, 99)).best_score;
        let dense_score = locate(&dense, &spec(kws, 99)).best_score;
        assert!(dense_score >= sparse_score);
    }

    #[test]
    fn test_tie_keeps_topmost_row() {
        let grid: RawGrid = vec![
            text_row(&["Data", "Import"]),
            text_row(&["Data", "Import"]),
        ];
        let scan = locate(&grid, &spec(&["data", "import"], 1));
        assert_eq!(scan.location.map(|l| l.header_row), Some(0));
    }

    #[test]
    fn test_paired_rows_concatenate_columns() {
        let grid: RawGrid = vec![
            text_row(&["Article", "", "Mesos"]),
            text_row(&["Codi", "Descripció", "Gener"]),
            text_row(&["A1", "Barra", "10"]),
        ];
        let scan = locate(
            &grid,
            &HeaderSpec {
                keywords: &["codi", "descripció", "gener"],
                min_score: 2,
                search_window: 10,
                paired_rows: true,
                column_offset: 0,
            },
        );
        assert_eq!(
            scan.location,
            Some(HeaderLocation {
                header_row: 0,
                data_start: 2
            })
        );
    }

    #[test]
    fn test_column_offset_skips_padding() {
        let grid: RawGrid = vec![vec![
            Cell::Text("data".into()),
            Cell::Text("Codi".into()),
            Cell::Text("Total".into()),
        ]];
        // With offset 1, the stray "data" cell in the padding column is not scored
        let labels = row_labels(&grid, 0, 1);
        assert_eq!(resolve_column(&labels, "data"), None);
        assert_eq!(resolve_column(&labels, "codi"), Some(0));
    }

    #[test]
    fn test_empty_label_never_matches() {
        let labels = vec![String::new(), "codi".to_string()];
        assert_eq!(resolve_column(&labels, "total"), None);
    }
}
