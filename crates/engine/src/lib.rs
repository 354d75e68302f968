//! # Resultgrid Engine
//!
//! Turns arbitrary job result documents into browsable tables. Nothing here
//! knows the shape of a particular result: datasets are found by walking the
//! document, rows are flattened to dotted keys, and the view layer filters,
//! sorts and paginates them for display or export.
//!
//! ## Usage
//!
//! ```rust
//! use resultgrid_engine::{ResultSession, TabularOptions};
//! use serde_json::json;
//!
//! let document = json!({
//!     "meta": {"op": "precos_auto"},
//!     "cruzado": [
//!         {"codigo": "1", "sinapi": {"valor": 10.5, "ok": true}},
//!         {"codigo": "2", "sinapi": {"valor": 7.25, "ok": false}}
//!     ]
//! });
//!
//! let mut session = ResultSession::new(document, TabularOptions::default());
//! session.set_query("true");
//! let page = session.current_page();
//! assert_eq!(page.dataset, "cruzado");
//! assert_eq!(page.columns, ["codigo", "sinapi.valor", "sinapi.ok"]);
//! assert_eq!(page.rows, vec![vec!["1", "10,5", "true"]]);
//! ```
//!
//! ## Architecture
//!
//! - **`shape`**: Classifies JSON values into scalars, records and lists
//! - **`flatten`**: Projects nested records into flat rows
//! - **`discover`**: Bounded walk that finds every record array in a document
//! - **`columns`**: Display column selection with preferred ordering
//! - **`format`**: Locale-aware cell rendering
//! - **`view`**: Filtering, stable sorting and pagination
//! - **`export`**: Delimited and JSON exports
//! - **`session`**: Per-view state tying the pieces together

pub mod columns;
pub mod discover;
pub mod export;
pub mod flatten;
pub mod format;
pub mod options;
pub mod session;
pub mod shape;
pub mod view;

pub use columns::{ColumnOptions, select_columns};
pub use discover::{DiscoveryOptions, discover, discover_datasets};
pub use export::{ExportError, ExportOptions, csv_file_name, json_file_name, to_delimited, to_pretty_json};
pub use flatten::{flatten, flatten_all};
pub use format::{CellFormatter, FormatOptions, NumberLocale, format_number};
pub use options::TabularOptions;
pub use session::{PageView, ResultSession};
pub use shape::{Shape, classify};
pub use view::{Page, apply_view, compare_cells, filter_rows, paginate, sort_rows, total_pages, visible_rows};
