use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

/// Rows per page when nothing else is configured.
pub const DEFAULT_PAGE_SIZE: usize = 25;

/// Page sizes offered by front ends.
pub const PAGE_SIZE_CHOICES: [usize; 5] = [10, 25, 50, 100, 200];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn toggled(self) -> Self {
        match self {
            Self::Asc => Self::Desc,
            Self::Desc => Self::Asc,
        }
    }

    /// Applies the direction to an ascending comparison result.
    pub fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            Self::Asc => ordering,
            Self::Desc => ordering.reverse(),
        }
    }
}

/// Filter, sort and page configuration for one dataset view.
///
/// Every transition consumes the state and returns the next one. Changing the
/// query or the page size returns to page 1; sort changes keep the page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewState {
    pub query: String,
    pub sort_column: Option<String>,
    pub sort_direction: SortDirection,
    /// 1-based page number. Clamped against the row count when paginating.
    pub page: usize,
    pub page_size: usize,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            query: String::new(),
            sort_column: None,
            sort_direction: SortDirection::Asc,
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl ViewState {
    pub fn with_page_size_default(page_size: usize) -> Self {
        Self {
            page_size: page_size.max(1),
            ..Self::default()
        }
    }

    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        let query = query.into();
        if query != self.query {
            self.query = query;
            self.page = 1;
        }
        self
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        let page_size = page_size.max(1);
        if page_size != self.page_size {
            self.page_size = page_size;
            self.page = 1;
        }
        self
    }

    pub fn with_sort(mut self, column: Option<String>, direction: SortDirection) -> Self {
        self.sort_column = column;
        self.sort_direction = direction;
        self
    }

    /// Header-click behavior: the active column flips direction, any other
    /// column becomes the sort column in ascending order.
    pub fn toggled_sort(mut self, column: &str) -> Self {
        if self.sort_column.as_deref() == Some(column) {
            self.sort_direction = self.sort_direction.toggled();
        } else {
            self.sort_column = Some(column.to_string());
            self.sort_direction = SortDirection::Asc;
        }
        self
    }

    pub fn with_page(mut self, page: usize) -> Self {
        self.page = page.max(1);
        self
    }

    pub fn next_page(mut self, total_pages: usize) -> Self {
        self.page = (self.page + 1).min(total_pages.max(1));
        self
    }

    pub fn prev_page(mut self) -> Self {
        self.page = self.page.saturating_sub(1).max(1);
        self
    }

    /// Used when the active dataset changes.
    pub fn reset_page(mut self) -> Self {
        self.page = 1;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_change_resets_page() {
        let state = ViewState::default().with_page(4).with_query("foo");
        assert_eq!(state.page, 1);
        assert_eq!(state.query, "foo");
    }

    #[test]
    fn unchanged_query_keeps_page() {
        let state = ViewState::default().with_query("foo").with_page(3).with_query("foo");
        assert_eq!(state.page, 3);
    }

    #[test]
    fn page_size_change_resets_page() {
        let state = ViewState::default().with_page(3).with_page_size(50);
        assert_eq!(state.page, 1);
        assert_eq!(state.page_size, 50);
        assert_eq!(ViewState::default().with_page_size(0).page_size, 1);
    }

    #[test]
    fn sort_change_keeps_page() {
        let state = ViewState::default().with_page(3).toggled_sort("codigo");
        assert_eq!(state.page, 3);
        assert_eq!(state.sort_column.as_deref(), Some("codigo"));
        assert_eq!(state.sort_direction, SortDirection::Asc);
    }

    #[test]
    fn toggling_active_column_flips_direction() {
        let state = ViewState::default().toggled_sort("codigo").toggled_sort("codigo");
        assert_eq!(state.sort_direction, SortDirection::Desc);
        let state = state.toggled_sort("dif_rel");
        assert_eq!(state.sort_column.as_deref(), Some("dif_rel"));
        assert_eq!(state.sort_direction, SortDirection::Asc);
    }

    #[test]
    fn paging_stays_in_bounds() {
        let state = ViewState::default().next_page(2).next_page(2).next_page(2);
        assert_eq!(state.page, 2);
        let state = state.prev_page().prev_page();
        assert_eq!(state.page, 1);
    }
}
