use std::env;
use std::path::PathBuf;

use dirs_next::{config_dir, home_dir};

/// Directory under the platform config dir holding every resultgrid file.
pub const APP_DIR_NAME: &str = "resultgrid";

pub fn expand_tilde(path: &str) -> PathBuf {
    let p = path.trim();
    if p == "~" {
        return home_dir().unwrap_or_else(|| PathBuf::from("~"));
    }
    if let Some(rest) = p.strip_prefix("~/") {
        return home_dir().unwrap_or_else(|| PathBuf::from("~")).join(rest);
    }
    if let Some(rest) = p.strip_prefix("~\\") {
        // Windows-style
        return home_dir().unwrap_or_else(|| PathBuf::from("~")).join(rest);
    }
    PathBuf::from(p)
}

/// Resolves a per-user file: a non-blank `env_var` wins, otherwise
/// `<config_dir>/resultgrid/<file_name>`.
pub fn app_file_path(env_var: &str, file_name: &str) -> PathBuf {
    if let Ok(path) = env::var(env_var)
        && !path.trim().is_empty()
    {
        return expand_tilde(&path);
    }

    config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR_NAME)
        .join(file_name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tilde_expands_to_home() {
        let home = home_dir().unwrap_or_else(|| PathBuf::from("~"));
        assert_eq!(expand_tilde("~"), home);
        assert_eq!(expand_tilde(" ~/jobs/recent.json "), home.join("jobs/recent.json"));
        assert_eq!(expand_tilde("/tmp/x.json"), PathBuf::from("/tmp/x.json"));
    }

    #[test]
    fn env_override_beats_config_dir() {
        temp_env::with_var("RESULTGRID_TEST_PATH", Some("/tmp/override.json"), || {
            assert_eq!(app_file_path("RESULTGRID_TEST_PATH", "x.json"), PathBuf::from("/tmp/override.json"));
        });
        temp_env::with_var("RESULTGRID_TEST_PATH", Some("  "), || {
            let path = app_file_path("RESULTGRID_TEST_PATH", "x.json");
            assert!(path.ends_with("resultgrid/x.json"), "{}", path.display());
        });
    }
}
