//! One result view: a fetched document, its datasets and the view state.

use std::cell::OnceCell;
use std::mem;

use resultgrid_types::{Dataset, Row, SortDirection, ViewState};
use serde_json::Value;
use tracing::debug;

use crate::columns::select_columns;
use crate::discover::discover;
use crate::export::{ExportError, csv_file_name, to_delimited, to_pretty_json};
use crate::format::CellFormatter;
use crate::options::TabularOptions;
use crate::view::{apply_view, total_pages, visible_rows};

/// A rendered page, cells already formatted for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageView {
    pub dataset: String,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
    pub page: usize,
    pub total_pages: usize,
    /// Rows that survived the filter.
    pub total_rows: usize,
    /// Rows in the dataset before filtering.
    pub dataset_rows: usize,
}

/// Holds a result document for the lifetime of one view.
///
/// Discovery runs once on construction. Column sets are computed on first use
/// per dataset and kept until the session is dropped. State changes go through
/// the pure `ViewState` transitions.
#[derive(Debug)]
pub struct ResultSession {
    document: Value,
    datasets: Vec<Dataset>,
    active: usize,
    state: ViewState,
    options: TabularOptions,
    formatter: CellFormatter,
    column_cache: Vec<OnceCell<Vec<String>>>,
}

impl ResultSession {
    pub fn new(document: Value, options: TabularOptions) -> Self {
        let datasets = discover(&document, &options.discovery);
        let column_cache = datasets.iter().map(|_| OnceCell::new()).collect();
        let formatter = CellFormatter::new(options.format.clone());
        Self {
            document,
            datasets,
            active: 0,
            state: ViewState::default(),
            options,
            formatter,
            column_cache,
        }
    }

    /// Replaces the view state; the page is clamped to the pages that exist.
    pub fn with_state(mut self, state: ViewState) -> Self {
        self.update(|_| state);
        self
    }

    pub fn document(&self) -> &Value {
        &self.document
    }

    pub fn datasets(&self) -> &[Dataset] {
        &self.datasets
    }

    pub fn has_tabular_data(&self) -> bool {
        !self.datasets.is_empty()
    }

    pub fn active_index(&self) -> usize {
        self.active
    }

    pub fn active_dataset(&self) -> Option<&Dataset> {
        self.datasets.get(self.active)
    }

    pub fn state(&self) -> &ViewState {
        &self.state
    }

    pub fn formatter(&self) -> &CellFormatter {
        &self.formatter
    }

    /// Switches dataset and returns to page 1. Out-of-range indexes are ignored.
    pub fn select_dataset(&mut self, index: usize) -> bool {
        if index >= self.datasets.len() {
            return false;
        }
        if index != self.active {
            self.active = index;
            self.update(ViewState::reset_page);
        }
        true
    }

    pub fn select_dataset_by_name(&mut self, name: &str) -> bool {
        match self.datasets.iter().position(|dataset| dataset.name == name) {
            Some(index) => self.select_dataset(index),
            None => false,
        }
    }

    pub fn set_query(&mut self, query: impl Into<String>) {
        let query = query.into();
        self.update(|state| state.with_query(query));
    }

    pub fn set_page_size(&mut self, page_size: usize) {
        self.update(|state| state.with_page_size(page_size));
    }

    /// Header-click sort toggle.
    pub fn sort_by(&mut self, column: &str) {
        self.update(|state| state.toggled_sort(column));
    }

    pub fn set_sort(&mut self, column: Option<String>, direction: SortDirection) {
        self.update(|state| state.with_sort(column, direction));
    }

    pub fn set_page(&mut self, page: usize) {
        self.update(|state| state.with_page(page));
    }

    pub fn next_page(&mut self) {
        let total = self.total_pages();
        self.update(|state| state.next_page(total));
    }

    pub fn prev_page(&mut self) {
        self.update(ViewState::prev_page);
    }

    /// Display columns of the active dataset.
    pub fn columns(&self) -> &[String] {
        match self.column_cache.get(self.active) {
            Some(cell) => cell
                .get_or_init(|| {
                    let columns = select_columns(self.active_rows(), &self.options.columns);
                    debug!(dataset = self.active, columns = columns.len(), "selected display columns");
                    columns
                })
                .as_slice(),
            None => &[],
        }
    }

    /// Filtered and sorted rows of the active dataset, the export row set.
    pub fn export_rows(&self) -> Vec<&Row> {
        visible_rows(self.active_rows(), self.columns(), &self.state, &self.formatter)
    }

    pub fn total_pages(&self) -> usize {
        total_pages(self.export_rows().len(), self.state.page_size)
    }

    pub fn current_page(&self) -> PageView {
        let columns = self.columns();
        let page = apply_view(self.active_rows(), columns, &self.state, &self.formatter);
        let rows = page
            .rows
            .iter()
            .map(|row| {
                columns
                    .iter()
                    .map(|column| self.formatter.format_cell(column, row.get(column)))
                    .collect()
            })
            .collect();
        PageView {
            dataset: self.active_dataset().map(|dataset| dataset.name.clone()).unwrap_or_default(),
            columns: columns.to_vec(),
            rows,
            page: page.page,
            total_pages: page.total_pages,
            total_rows: page.total_rows,
            dataset_rows: self.active_rows().len(),
        }
    }

    /// Delimited export of exactly what the view shows, across all pages.
    pub fn export_csv(&self) -> Result<String, ExportError> {
        to_delimited(&self.export_rows(), self.columns(), &self.options.export)
    }

    pub fn export_json(&self) -> Result<String, ExportError> {
        to_pretty_json(&self.document)
    }

    pub fn csv_file_name(&self) -> String {
        csv_file_name(self.active_dataset().map(|dataset| dataset.name.as_str()).unwrap_or_default())
    }

    fn active_rows(&self) -> &[Row] {
        self.active_dataset().map(|dataset| dataset.rows.as_slice()).unwrap_or_default()
    }

    /// Applies `transition`, then keeps the stored page in `[1, total_pages]`.
    fn update(&mut self, transition: impl FnOnce(ViewState) -> ViewState) {
        let state = mem::take(&mut self.state);
        self.state = transition(state);
        let total = self.total_pages();
        if self.state.page > total {
            self.state = mem::take(&mut self.state).with_page(total);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn session() -> ResultSession {
        ResultSession::new(
            json!({
                "meta": {"kind": "precos"},
                "cruzado": [
                    {"codigo": "3", "a_valor": 30.0, "dif_rel": 0.5, "obs": "linha\nquebrada"},
                    {"codigo": "1", "a_valor": 1234.5, "dif_rel": 0.1234},
                    {"codigo": "2", "a_valor": 20.0, "dif_rel": null}
                ],
                "divergencias": [{"ref": "SINAPI", "codigo": "1"}]
            }),
            TabularOptions::default(),
        )
    }

    #[test]
    fn largest_dataset_is_active_first() {
        let session = session();
        assert_eq!(session.datasets().len(), 2);
        assert_eq!(session.active_dataset().unwrap().name, "cruzado");
        assert_eq!(session.columns(), ["codigo", "a_valor", "dif_rel", "obs"]);
    }

    #[test]
    fn page_cells_are_formatted() {
        let mut session = session();
        session.set_sort(Some("codigo".into()), SortDirection::Asc);
        let page = session.current_page();
        assert_eq!(page.rows[0], vec!["1", "1.234,5", "12,34%", ""]);
        assert_eq!(page.total_rows, 3);
        assert_eq!(page.dataset_rows, 3);
    }

    #[test]
    fn switching_dataset_resets_page_and_columns() {
        let mut session = session().with_state(ViewState::default().with_page_size(1));
        session.set_page(3);
        assert_eq!(session.current_page().page, 3);
        assert!(session.select_dataset(1));
        assert_eq!(session.state().page, 1);
        assert_eq!(session.columns(), ["codigo", "ref"]);
        assert!(!session.select_dataset(5));
        assert!(session.select_dataset_by_name("cruzado"));
        assert_eq!(session.active_index(), 0);
    }

    #[test]
    fn sorting_keeps_page_but_query_resets_it() {
        let mut session = session().with_state(ViewState::default().with_page_size(1));
        session.next_page();
        session.next_page();
        assert_eq!(session.state().page, 3);
        session.sort_by("a_valor");
        assert_eq!(session.state().page, 3);
        session.set_query("1");
        assert_eq!(session.state().page, 1);
        session.next_page();
        session.next_page();
        assert_eq!(session.state().page, session.total_pages());
    }

    #[test]
    fn out_of_range_page_is_stored_clamped() {
        let mut session = session().with_state(ViewState::default().with_page_size(1));
        session.set_page(100);
        assert_eq!(session.state().page, 3);
        session.prev_page();
        assert_eq!(session.current_page().page, 2);

        let session = self::session().with_state(ViewState::default().with_page_size(2).with_page(9));
        assert_eq!(session.state().page, 2);
    }

    #[test]
    fn export_reflects_filter_and_sort() {
        let mut session = session();
        session.set_query("%");
        session.sort_by("a_valor");
        session.sort_by("a_valor");
        let csv = session.export_csv().unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "\"codigo\",\"a_valor\",\"dif_rel\",\"obs\"");
        assert_eq!(lines[1], "\"1\",\"1234.5\",\"0.1234\",\"\"");
        assert_eq!(lines[2], "\"3\",\"30\",\"0.5\",\"linha quebrada\"");
        assert_eq!(session.csv_file_name(), "cruzado.csv");
    }

    #[test]
    fn documents_without_tables_still_export_json() {
        let session = ResultSession::new(json!({"meta": {"x": 1}}), TabularOptions::default());
        assert!(!session.has_tabular_data());
        assert!(session.columns().is_empty());
        assert!(session.current_page().rows.is_empty());
        assert_eq!(session.export_json().unwrap(), "{\n  \"meta\": {\n    \"x\": 1\n  }\n}");
        assert_eq!(session.export_csv().unwrap(), "");
    }
}
