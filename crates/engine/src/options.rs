use serde::{Deserialize, Serialize};

use crate::columns::ColumnOptions;
use crate::discover::DiscoveryOptions;
use crate::export::ExportOptions;
use crate::format::FormatOptions;

/// All tunables of the tabularization pipeline, as read from configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TabularOptions {
    pub discovery: DiscoveryOptions,
    pub columns: ColumnOptions,
    pub format: FormatOptions,
    pub export: ExportOptions,
}
