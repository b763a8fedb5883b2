use std::fs;
use std::path::Path;

use mind_logging::{mind_info, mind_warn};
use mind_worker::WorkerConfig;

/// Reads the worker configuration from a RON file.
///
/// A missing file silently yields defaults; an unreadable or malformed one
/// is logged and also yields defaults.
pub(crate) fn load_worker_config(path: &Path) -> WorkerConfig {
    let content = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            return WorkerConfig::default();
        }
        Err(err) => {
            mind_warn!("Failed to read config from {:?}: {}", path, err);
            return WorkerConfig::default();
        }
    };

    match ron::from_str::<WorkerConfig>(&content) {
        Ok(config) => {
            mind_info!("Loaded worker config from {:?}", path);
            config
        }
        Err(err) => {
            mind_warn!("Failed to parse config from {:?}: {}", path, err);
            WorkerConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mind_worker::DEFAULT_SNAPSHOT_KEY;
    use tempfile::TempDir;

    #[test]
    fn missing_file_yields_defaults() {
        let temp = TempDir::new().unwrap();
        let config = load_worker_config(&temp.path().join("absent.ron"));
        assert_eq!(config.snapshot_key, DEFAULT_SNAPSHOT_KEY);
        assert_eq!(config.search.top_k, 5);
    }

    #[test]
    fn partial_file_overrides_only_given_fields() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("local_mind.ron");
        fs::write(&path, "(search: (top_k: 3), snapshot_key: \"team_index\")").unwrap();

        let config = load_worker_config(&path);
        assert_eq!(config.search.top_k, 3);
        assert_eq!(config.search.threshold, 0.5);
        assert_eq!(config.snapshot_key, "team_index");
        assert_eq!(config.model, mind_worker::ModelAssets::default());
    }

    #[test]
    fn malformed_file_yields_defaults() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("local_mind.ron");
        fs::write(&path, "(search: [not, a, struct").unwrap();

        let config = load_worker_config(&path);
        assert_eq!(config.search.top_k, 5);
    }
}
