use std::sync::Arc;

use swcache_core::{CacheError, DiskStore, HttpFetcher, TracingHost, Url, Worker, WorkerConfig};

use super::args::GlobalArgs;

pub mod cache;
pub mod dispatch;
pub mod fetch;
pub mod lifecycle;
pub mod message;
pub mod notify;

pub use dispatch::dispatch;

/// Config file (or defaults plus environment), then command-line overrides.
pub(crate) fn load_config(global: &GlobalArgs) -> anyhow::Result<WorkerConfig> {
    let mut config = match &global.config {
        Some(path) => WorkerConfig::from_yaml_file(path)?,
        None => WorkerConfig::from_env()?,
    };

    if let Some(origin) = &global.origin {
        let origin = Url::parse(origin).map_err(|e| CacheError::Config {
            message: format!("invalid --origin {:?}: {}", origin, e),
        })?;
        config = config.with_origin(origin);
    }
    if let Some(version) = &global.cache_version {
        config = config.with_version(version);
    }
    if let Some(dir) = &global.cache_dir {
        config.cache_dir = Some(dir.clone());
    }

    config.validate()?;
    Ok(config)
}

/// A fresh worker instance over the disk store and the real network.
pub(crate) fn build_worker(global: &GlobalArgs) -> anyhow::Result<Worker> {
    let config = load_config(global)?;
    let store = match &config.cache_dir {
        Some(dir) => DiskStore::with_dir(dir),
        None => DiskStore::new()?,
    };
    tracing::debug!(root = %store.root().display(), "using disk store");

    let fetcher = Arc::new(HttpFetcher::new(&config)?);
    Ok(Worker::new(config, Arc::new(store), fetcher, Arc::new(TracingHost))?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use swcache_core::PartitionKind;
    use tempfile::TempDir;

    #[test]
    fn test_flags_override_config_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("swcache.yaml");
        std::fs::write(
            &path,
            "app_prefix: \"demo-\"\norigin: \"https://mint.example.com/\"\ntimeout_secs: 7\n",
        )
        .unwrap();

        let global = GlobalArgs {
            config: Some(path),
            cache_dir: Some(temp_dir.path().join("store")),
            origin: Some("https://staging.example.com/".to_string()),
            cache_version: Some("v3".to_string()),
            json_logs: false,
        };
        let config = load_config(&global).unwrap();

        assert_eq!(config.app_prefix, "demo-");
        assert_eq!(config.timeout_secs, 7);
        assert_eq!(config.origin.as_str(), "https://staging.example.com/");
        assert_eq!(config.identity(PartitionKind::Static), "demo-static-v3");
        assert_eq!(config.cache_dir, Some(temp_dir.path().join("store")));
    }

    #[test]
    fn test_invalid_origin_is_config_error() {
        let global = GlobalArgs {
            origin: Some("not a url".to_string()),
            ..Default::default()
        };
        let err = load_config(&global).unwrap_err();
        let err = err.downcast_ref::<CacheError>().unwrap();
        assert!(matches!(err, CacheError::Config { .. }));
        assert_eq!(err.exit_code(), crate::exit_codes::INVALID_INPUT);
    }

    #[tokio::test]
    async fn test_build_worker_uses_cache_dir() {
        let temp_dir = TempDir::new().unwrap();
        let global = GlobalArgs {
            cache_dir: Some(temp_dir.path().to_path_buf()),
            ..Default::default()
        };
        let worker = build_worker(&global).unwrap();
        assert_eq!(worker.cache_size().await.unwrap(), 0);
    }
}
