//! Filtering, sorting and pagination over flattened rows.
//!
//! Every function here is pure: rows are borrowed, never reordered in place,
//! and the result can be recomputed on every keystroke.

use std::cmp::Ordering;

use resultgrid_types::{CellValue, Row, SortDirection, ViewState};

use crate::format::CellFormatter;

/// One page of a filtered and sorted row set.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<'a> {
    pub rows: Vec<&'a Row>,
    /// Clamped 1-based page number.
    pub page: usize,
    pub total_pages: usize,
    /// Row count after filtering.
    pub total_rows: usize,
}

/// Keeps rows where any selected column contains `query`, ignoring case.
///
/// Both the raw and the formatted rendering of a cell are searched, so
/// `12,34%` matches a relative-difference cell as well as `0.1234` does. A
/// blank query keeps every row.
pub fn filter_rows<'a>(rows: &'a [Row], columns: &[String], query: &str, formatter: &CellFormatter) -> Vec<&'a Row> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return rows.iter().collect();
    }
    rows.iter()
        .filter(|row| {
            columns.iter().any(|column| {
                let cell = row.get(column);
                let raw = cell.map(CellValue::to_raw_string).unwrap_or_default();
                raw.to_lowercase().contains(&needle)
                    || formatter.format_cell(column, cell).to_lowercase().contains(&needle)
            })
        })
        .collect()
}

/// Stable sort on one column. Ties keep their input order.
pub fn sort_rows(rows: &mut [&Row], column: &str, direction: SortDirection) {
    rows.sort_by(|left, right| direction.apply(compare_cells(left.get(column), right.get(column))));
}

/// Ascending comparison of two cells.
///
/// Missing and null cells are equal to each other and sort before anything
/// else. Two numbers compare numerically; any other pair compares as text.
pub fn compare_cells(left: Option<&CellValue>, right: Option<&CellValue>) -> Ordering {
    let left = left.filter(|cell| !cell.is_null());
    let right = right.filter(|cell| !cell.is_null());
    match (left, right) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(left), Some(right)) => match (left.as_f64(), right.as_f64()) {
            (Some(left), Some(right)) => left.partial_cmp(&right).unwrap_or(Ordering::Equal),
            _ => locale_compare(&left.to_raw_string(), &right.to_raw_string()),
        },
    }
}

/// Collation-style text comparison: accents and case are ignored first, then
/// case, then exact code points break the tie.
pub fn locale_compare(left: &str, right: &str) -> Ordering {
    let base = |text: &str| text.chars().flat_map(char::to_lowercase).map(fold_accent).collect::<String>();
    base(left)
        .cmp(&base(right))
        .then_with(|| left.to_lowercase().cmp(&right.to_lowercase()))
        .then_with(|| left.cmp(right))
}

fn fold_accent(ch: char) -> char {
    match ch {
        'á' | 'à' | 'â' | 'ã' | 'ä' | 'å' => 'a',
        'é' | 'è' | 'ê' | 'ë' => 'e',
        'í' | 'ì' | 'î' | 'ï' => 'i',
        'ó' | 'ò' | 'ô' | 'õ' | 'ö' => 'o',
        'ú' | 'ù' | 'û' | 'ü' => 'u',
        'ç' => 'c',
        'ñ' => 'n',
        other => other,
    }
}

pub fn total_pages(row_count: usize, page_size: usize) -> usize {
    row_count.div_ceil(page_size.max(1)).max(1)
}

/// Slices out the requested page, clamping it into `[1, total_pages]`.
pub fn paginate<'a>(rows: &[&'a Row], page: usize, page_size: usize) -> Page<'a> {
    let page_size = page_size.max(1);
    let total_pages = total_pages(rows.len(), page_size);
    let page = page.clamp(1, total_pages);
    let start = ((page - 1) * page_size).min(rows.len());
    let end = (start + page_size).min(rows.len());
    Page {
        rows: rows[start..end].to_vec(),
        page,
        total_pages,
        total_rows: rows.len(),
    }
}

/// Filter then sort, the row set an export sees.
pub fn visible_rows<'a>(rows: &'a [Row], columns: &[String], state: &ViewState, formatter: &CellFormatter) -> Vec<&'a Row> {
    let mut visible = filter_rows(rows, columns, &state.query, formatter);
    if let Some(column) = state.sort_column.as_deref() {
        sort_rows(&mut visible, column, state.sort_direction);
    }
    visible
}

/// Filter, sort and paginate in one pass.
pub fn apply_view<'a>(rows: &'a [Row], columns: &[String], state: &ViewState, formatter: &CellFormatter) -> Page<'a> {
    let visible = visible_rows(rows, columns, state, formatter);
    paginate(&visible, state.page, state.page_size)
}
