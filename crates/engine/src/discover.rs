//! Discovery of tabular datasets inside arbitrary result documents.

use std::collections::{HashMap, HashSet};

use resultgrid_types::Dataset;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::flatten::{flatten_all, join_path};
use crate::shape::{Shape, classify};

pub const DEFAULT_MAX_DEPTH: usize = 3;
pub const DEFAULT_MAX_NODES: usize = 10_000;
pub const DEFAULT_FALLBACK_NAME: &str = "resultado";
pub const DEFAULT_FALLBACK_KEY: &str = "data";
/// Metadata sections of job results that never hold row data.
pub const DEFAULT_IGNORED_KEYS: &[&str] = &["meta", "resumo", "params", "inputs"];

/// Tuning for [`discover`]. Every field falls back to its default when absent
/// from a configuration file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscoveryOptions {
    /// Deepest record level the walk descends into; the root is level 0.
    pub max_depth: usize,
    /// Keys skipped at every level of the walk.
    pub ignored_keys: Vec<String>,
    /// Name given to a dataset found at the document root.
    pub fallback_name: String,
    /// Root key consulted when the walk finds nothing.
    pub fallback_key: String,
    /// Upper bound on visited nodes per discovery pass.
    pub max_nodes: usize,
}

impl Default for DiscoveryOptions {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            ignored_keys: DEFAULT_IGNORED_KEYS.iter().map(|key| key.to_string()).collect(),
            fallback_name: DEFAULT_FALLBACK_NAME.to_string(),
            fallback_key: DEFAULT_FALLBACK_KEY.to_string(),
            max_nodes: DEFAULT_MAX_NODES,
        }
    }
}

/// Discovers datasets with the default options.
pub fn discover_datasets(root: &Value) -> Vec<Dataset> {
    discover(root, &DiscoveryOptions::default())
}

/// Extracts every array of records reachable from `root`.
///
/// Results are ordered by row count (largest first) and then by name. A
/// document without any record array yields an empty list.
pub fn discover(root: &Value, options: &DiscoveryOptions) -> Vec<Dataset> {
    if let Some(items) = classify(root).table_rows() {
        debug!(rows = items.len(), "result document is a bare record array");
        return vec![Dataset::new(options.fallback_name.clone(), flatten_all(items))];
    }

    let Shape::Record(map) = classify(root) else {
        return Vec::new();
    };

    let mut walker = Walker::new(options);
    walker.visit_record(map, "", 0);
    let mut datasets = walker.found;

    if datasets.is_empty()
        && let Some(items) = map.get(&options.fallback_key).and_then(|value| classify(value).table_rows())
    {
        datasets.push(Dataset::new(options.fallback_key.clone(), flatten_all(items)));
    }

    make_names_unique(&mut datasets);
    datasets.sort_by(|left, right| right.len().cmp(&left.len()).then_with(|| left.name.cmp(&right.name)));

    debug!(
        datasets = datasets.len(),
        visited = walker.visited,
        "discovered datasets in result document"
    );
    datasets
}

struct Walker<'o> {
    options: &'o DiscoveryOptions,
    ignored: HashSet<&'o str>,
    visited: usize,
    exhausted: bool,
    found: Vec<Dataset>,
}

impl<'o> Walker<'o> {
    fn new(options: &'o DiscoveryOptions) -> Self {
        Self {
            options,
            ignored: options.ignored_keys.iter().map(String::as_str).collect(),
            visited: 0,
            exhausted: false,
            found: Vec::new(),
        }
    }

    fn visit_record(&mut self, map: &Map<String, Value>, path: &str, depth: usize) {
        for (key, child) in map {
            if self.ignored.contains(key.as_str()) {
                continue;
            }
            if !self.charge() {
                return;
            }

            let child_path = join_path(path, key);
            let shape = classify(child);
            if let Some(items) = shape.table_rows() {
                let name = if child_path.is_empty() {
                    self.options.fallback_name.clone()
                } else {
                    child_path
                };
                self.found.push(Dataset::new(name, flatten_all(items)));
            } else if let Shape::Record(nested) = shape
                && depth < self.options.max_depth
            {
                self.visit_record(nested, &child_path, depth + 1);
            }
        }
    }

    fn charge(&mut self) -> bool {
        if self.visited >= self.options.max_nodes {
            if !self.exhausted {
                warn!(
                    max_nodes = self.options.max_nodes,
                    "node budget exhausted while discovering datasets; remaining keys skipped"
                );
                self.exhausted = true;
            }
            return false;
        }
        self.visited += 1;
        true
    }
}

/// Suffixes repeated names with ` (2)`, ` (3)`, ... in discovery order.
fn make_names_unique(datasets: &mut [Dataset]) {
    let mut seen: HashMap<String, usize> = HashMap::new();
    for dataset in datasets.iter_mut() {
        let count = seen.entry(dataset.name.clone()).or_insert(0);
        *count += 1;
        if *count > 1 {
            dataset.name = format!("{} ({})", dataset.name, count);
        }
    }
}
