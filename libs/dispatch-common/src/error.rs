// Error types shared by the dispatcher server, worker and CLI.

use std::collections::BTreeSet;
use std::path::PathBuf;

use thiserror::Error;

use crate::types::SuiteKey;

/// Failures while reading a duration record source.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("malformed duration record at line {line}: {content:?}")]
    MalformedRecord { line: usize, content: String },

    #[error("failed to read duration data {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Failures of the external test enumeration process.
#[derive(Debug, Error)]
pub enum EnumerationError {
    #[error("failed to spawn test binary {}: {source}", binary.display())]
    Spawn {
        binary: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("test listing exited with {status}: {stderr}")]
    Failed { status: String, stderr: String },
}

/// Failures while building the ordered test list for a suite.
#[derive(Debug, Error)]
pub enum WorkListError {
    #[error(
        "incomplete duration data for suite {suite}; missing tests: {}",
        join_names(missing)
    )]
    IncompleteDurationData {
        suite: String,
        missing: BTreeSet<String>,
    },

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Enumeration(#[from] EnumerationError),
}

/// Rejections from the keyed queue store. None of these mutate state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("a queue already exists for {0}")]
    AlreadyExists(SuiteKey),

    #[error("refusing to create an empty queue for {0}")]
    EmptyTestList(SuiteKey),

    #[error("invalid suite key: {0}")]
    InvalidKey(&'static str),
}

/// Caller errors surfaced by the dispatch service.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServiceError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl From<StoreError> for ServiceError {
    fn from(err: StoreError) -> Self {
        ServiceError::InvalidRequest(err.to_string())
    }
}

/// Failures talking to the dispatcher over HTTP.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("invalid dispatcher url {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("dispatcher returned {status}: {body}")]
    Status { status: u16, body: String },
}

impl ClientError {
    /// Whether retrying the same request may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            ClientError::Transport(e) => e.is_connect() || e.is_timeout() || e.is_request(),
            ClientError::Status { status, .. } => *status >= 500,
            ClientError::InvalidUrl { .. } => false,
        }
    }
}

fn join_names(names: &BTreeSet<String>) -> String {
    names.iter().map(String::as_str).collect::<Vec<_>>().join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_incomplete_data_message_lists_all_missing() {
        let err = WorkListError::IncompleteDurationData {
            suite: "LongSystemTests".to_string(),
            missing: ["t2".to_string(), "t1".to_string()].into_iter().collect(),
        };
        assert_eq!(
            err.to_string(),
            "incomplete duration data for suite LongSystemTests; missing tests: t1, t2"
        );
    }

    #[test]
    fn test_status_errors_transient_only_for_server_side() {
        let bad_gateway = ClientError::Status { status: 502, body: String::new() };
        let conflict = ClientError::Status { status: 409, body: String::new() };
        assert!(bad_gateway.is_transient());
        assert!(!conflict.is_transient());
    }
}
