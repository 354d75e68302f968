//! Shared type definitions for resultgrid.
//!
//! The tabular model (`CellValue`, `Row`, `Dataset`) and the view model
//! (`ViewState`, `SortDirection`) are consumed by the engine and the CLI; the
//! job wire types mirror the job service's JSON payloads.

pub mod job;
pub mod table;
pub mod view;

pub use job::{CreateJobPayload, FileEntry, FilesResponse, Job, JobStatus, PriceCheckPayload, StructureCheckPayload};
pub use table::{CellValue, Dataset, Row};
pub use view::{DEFAULT_PAGE_SIZE, PAGE_SIZE_CHOICES, SortDirection, ViewState};
