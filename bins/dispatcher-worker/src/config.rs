// Worker configuration, read from the environment at startup
use anyhow::{bail, Result};
use dispatch_common::config::ClientConfig;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_MAX_RETRIES: u32 = 3;
pub const DEFAULT_RETRY_DELAY_MS: u64 = 1000;

#[derive(Debug, Clone)]
pub struct WorkerConfig {
    pub build_id: String,
    pub test_suite: String,
    pub workspace: PathBuf,
    pub test_binary: Option<PathBuf>,
    pub max_retries: u32,
    pub retry_delay: Duration,
    pub client: ClientConfig,
}

impl WorkerConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let require = |name: &str| -> Result<String> {
            match lookup(name).filter(|v| !v.trim().is_empty()) {
                Some(value) => Ok(value),
                None => bail!("{} must be set", name),
            }
        };

        Ok(Self {
            build_id: require("WORKER_BUILD_ID")?,
            test_suite: require("WORKER_TEST_SUITE")?,
            workspace: PathBuf::from(require("WORKER_WORKSPACE")?),
            test_binary: lookup("WORKER_TEST_BINARY")
                .filter(|v| !v.trim().is_empty())
                .map(PathBuf::from),
            max_retries: lookup("WORKER_MAX_RETRIES")
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_MAX_RETRIES),
            retry_delay: Duration::from_millis(
                lookup("WORKER_RETRY_DELAY_MS")
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(DEFAULT_RETRY_DELAY_MS),
            ),
            client: ClientConfig::from_lookup(&lookup),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_requires_build_and_suite() {
        let err = WorkerConfig::from_lookup(lookup(&[("WORKER_WORKSPACE", "/ws")])).unwrap_err();
        assert!(err.to_string().contains("WORKER_BUILD_ID"));
    }

    #[test]
    fn test_full_config() {
        let config = WorkerConfig::from_lookup(lookup(&[
            ("WORKER_BUILD_ID", "b1"),
            ("WORKER_TEST_SUITE", "LongSystemTests"),
            ("WORKER_WORKSPACE", "/ws"),
            ("WORKER_MAX_RETRIES", "7"),
            ("TESTS_DISPATCHER_URL", "http://dispatcher:5000"),
        ]))
        .unwrap();
        assert_eq!(config.build_id, "b1");
        assert_eq!(config.workspace, PathBuf::from("/ws"));
        assert!(config.test_binary.is_none());
        assert_eq!(config.max_retries, 7);
        assert_eq!(config.retry_delay, Duration::from_millis(DEFAULT_RETRY_DELAY_MS));
        assert_eq!(config.client.dispatcher_url, "http://dispatcher:5000");
    }
}
