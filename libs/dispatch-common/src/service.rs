// Transport-independent enqueue/dequeue contract over [`DispatchStore`].

use std::collections::BTreeMap;

use tracing::{debug, info, warn};

use crate::error::{ServiceError, StoreError};
use crate::store::{DispatchStore, PopOutcome};
use crate::types::{QueueSnapshot, SuiteKey};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnqueueOutcome {
    Created { queued: usize },
    /// A queue already exists for this build and suite; it was left as is.
    Conflict,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DequeueOutcome {
    NextTest(String),
    /// Never submitted, or drained long enough ago to be forgotten.
    NoSuchQueue,
    QueueExhausted,
}

impl DequeueOutcome {
    /// The test name, if any. Both terminal variants map to `None`.
    pub fn into_test(self) -> Option<String> {
        match self {
            DequeueOutcome::NextTest(name) => Some(name),
            DequeueOutcome::NoSuchQueue | DequeueOutcome::QueueExhausted => None,
        }
    }
}

#[derive(Debug, Default)]
pub struct DispatchService {
    store: DispatchStore,
}

impl DispatchService {
    pub fn new(store: DispatchStore) -> Self {
        Self { store }
    }

    pub fn enqueue(
        &self,
        build_id: &str,
        test_suite: &str,
        tests: Vec<String>,
    ) -> Result<EnqueueOutcome, ServiceError> {
        let key = SuiteKey::new(build_id, test_suite)?;
        if tests.iter().any(|t| t.trim().is_empty()) {
            return Err(ServiceError::InvalidRequest(
                "test names must not be empty".to_string(),
            ));
        }

        match self.store.create_queue(key, tests) {
            Ok(queued) => {
                info!(build_id, test_suite, queued, "Queue created");
                Ok(EnqueueOutcome::Created { queued })
            }
            Err(StoreError::AlreadyExists(_)) => {
                warn!(build_id, test_suite, "Queue already exists, submission rejected");
                Ok(EnqueueOutcome::Conflict)
            }
            Err(e) => Err(e.into()),
        }
    }

    pub fn dequeue(&self, build_id: &str, test_suite: &str) -> Result<DequeueOutcome, ServiceError> {
        let key = SuiteKey::new(build_id, test_suite)?;

        let outcome = match self.store.pop_front(&key) {
            PopOutcome::Popped { test, remaining } => {
                debug!(build_id, test_suite, test = %test, remaining, "Dispatched test");
                if remaining == 0 {
                    info!(build_id, test_suite, "Queue drained");
                }
                DequeueOutcome::NextTest(test)
            }
            PopOutcome::Exhausted => DequeueOutcome::QueueExhausted,
            PopOutcome::Absent => {
                debug!(build_id, test_suite, "Dequeue on unknown queue");
                DequeueOutcome::NoSuchQueue
            }
        };
        Ok(outcome)
    }

    pub fn snapshot(&self) -> BTreeMap<SuiteKey, Vec<String>> {
        self.store.snapshot()
    }

    /// Snapshot flattened into the wire representation.
    pub fn queue_snapshots(&self) -> Vec<QueueSnapshot> {
        self.snapshot()
            .into_iter()
            .map(|(key, tests)| QueueSnapshot {
                build_id: key.build_id().to_string(),
                test_suite: key.test_suite().to_string(),
                tests,
            })
            .collect()
    }

    pub fn active_queues(&self) -> usize {
        self.store.len()
    }
}
