// Key and wire types shared by the dispatcher, worker and CLI

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::StoreError;

/// Identifies one independent work queue: a suite within a build.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SuiteKey {
    build_id: String,
    test_suite: String,
}

impl SuiteKey {
    /// Both parts must be non-blank.
    pub fn new(build_id: impl Into<String>, test_suite: impl Into<String>) -> Result<Self, StoreError> {
        let build_id = build_id.into();
        let test_suite = test_suite.into();
        if build_id.trim().is_empty() {
            return Err(StoreError::InvalidKey("build_id must not be empty"));
        }
        if test_suite.trim().is_empty() {
            return Err(StoreError::InvalidKey("test_suite must not be empty"));
        }
        Ok(Self { build_id, test_suite })
    }

    pub fn build_id(&self) -> &str {
        &self.build_id
    }

    pub fn test_suite(&self) -> &str {
        &self.test_suite
    }
}

impl fmt::Display for SuiteKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.build_id, self.test_suite)
    }
}

/// Historical duration estimate for one test, in seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestRecord {
    pub name: String,
    pub duration: f64,
}

impl TestRecord {
    pub fn new(name: impl Into<String>, duration: f64) -> Self {
        Self {
            name: name.into(),
            duration,
        }
    }
}

/// Body of `POST /push_list`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PushListRequest {
    pub build_id: String,
    pub test_suite: String,
    pub tests: Vec<String>,
}

/// Successful `POST /push_list` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PushListResponse {
    pub status: String,
    pub queued: usize,
}

/// Query string of `GET /next_test`. Fields are optional so that a missing
/// parameter can be reported as a 400 by the handler itself.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NextTestQuery {
    pub build_id: Option<String>,
    pub test_suite: Option<String>,
}

/// `GET /next_test` response. An empty `details` means there is no more work.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NextTestResponse {
    pub details: String,
}

/// One entry of the diagnostic snapshot served at `GET /`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueSnapshot {
    pub build_id: String,
    pub test_suite: String,
    pub tests: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SnapshotResponse {
    pub queues: Vec<QueueSnapshot>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_suite_key_rejects_blank_parts() {
        assert!(SuiteKey::new("", "Suite").is_err());
        assert!(SuiteKey::new("b1", "  ").is_err());
        assert!(SuiteKey::new("b1", "Suite").is_ok());
    }

    #[test]
    fn test_suite_key_display() {
        let key = SuiteKey::new("b1", "LongSystemTests").unwrap();
        assert_eq!(key.to_string(), "b1/LongSystemTests");
    }

    #[test]
    fn test_next_test_query_tolerates_missing_fields() {
        let query: NextTestQuery = serde_json::from_str(r#"{"build_id":"b1"}"#).unwrap();
        assert_eq!(query.build_id.as_deref(), Some("b1"));
        assert!(query.test_suite.is_none());
    }
}
