// Environment configuration, read once at process start

use std::time::Duration;

use crate::store::DEFAULT_DRAINED_MEMORY;

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:5000";
pub const DEFAULT_DISPATCHER_URL: &str = "http://127.0.0.1:5000/";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_addr: String,
    pub drained_memory: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            drained_memory: DEFAULT_DRAINED_MEMORY,
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        Self {
            bind_addr: lookup("DISPATCHER_BIND").unwrap_or(defaults.bind_addr),
            drained_memory: lookup("DISPATCHER_DRAINED_MEMORY")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.drained_memory),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub dispatcher_url: String,
    pub timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            dispatcher_url: DEFAULT_DISPATCHER_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl ClientConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        Self {
            dispatcher_url: lookup("TESTS_DISPATCHER_URL")
                .filter(|v| !v.trim().is_empty())
                .unwrap_or(defaults.dispatcher_url),
            timeout: lookup("DISPATCHER_TIMEOUT_SECS")
                .and_then(|v| v.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.timeout),
        }
    }
}

/// Join URL parts with exactly one `/` between them.
pub fn slash_join(parts: &[&str]) -> String {
    parts
        .iter()
        .map(|p| p.trim_matches('/'))
        .collect::<Vec<_>>()
        .join("/")
}
