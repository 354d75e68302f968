//! Configuration and local persistence shared by the resultgrid binaries.

pub mod config;
pub mod path_processing;
pub mod recent_jobs;

pub use config::{AppConfig, CONFIG_PATH_ENV, ConfigError, default_config_path};
pub use path_processing::{app_file_path, expand_tilde};
pub use recent_jobs::{RECENT_JOBS_PATH_ENV, RecentJob, RecentJobs, RecentJobsError, default_recent_jobs_path};
