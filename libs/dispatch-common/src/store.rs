// Keyed FIFO queues of test names, one per (build, suite).
//
// Every operation runs as a single critical section over the whole map, so
// concurrent pops on the same key never hand out the same test and a queue
// that has been drained is removed before anyone else can observe it.

use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::error::StoreError;
use crate::types::SuiteKey;

/// How many drained keys are remembered to tell `Exhausted` from `Absent`.
pub const DEFAULT_DRAINED_MEMORY: usize = 1024;

/// Result of [`DispatchStore::pop_front`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PopOutcome {
    /// The head of the queue, and how many tests are still queued after it.
    Popped { test: String, remaining: usize },
    /// The queue existed and has been fully handed out.
    Exhausted,
    /// No queue was ever created for the key, or it was drained long ago.
    Absent,
}

#[derive(Debug, Default)]
struct StoreState {
    queues: HashMap<SuiteKey, VecDeque<String>>,
    drained: HashSet<SuiteKey>,
    drained_order: VecDeque<SuiteKey>,
}

impl StoreState {
    fn mark_drained(&mut self, key: SuiteKey, capacity: usize) {
        if capacity == 0 || !self.drained.insert(key.clone()) {
            return;
        }
        self.drained_order.push_back(key);
        while self.drained_order.len() > capacity {
            if let Some(oldest) = self.drained_order.pop_front() {
                self.drained.remove(&oldest);
            }
        }
    }

    fn forget_drained(&mut self, key: &SuiteKey) {
        if self.drained.remove(key) {
            self.drained_order.retain(|k| k != key);
        }
    }
}

#[derive(Debug)]
pub struct DispatchStore {
    state: Mutex<StoreState>,
    drained_memory: usize,
}

impl Default for DispatchStore {
    fn default() -> Self {
        Self::new()
    }
}

impl DispatchStore {
    pub fn new() -> Self {
        Self::with_drained_memory(DEFAULT_DRAINED_MEMORY)
    }

    pub fn with_drained_memory(drained_memory: usize) -> Self {
        Self {
            state: Mutex::new(StoreState::default()),
            drained_memory,
        }
    }

    // Every mutation completes before the guard drops, so a poisoned lock
    // still holds a consistent map.
    fn lock(&self) -> MutexGuard<'_, StoreState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Insert a new queue. An existing queue for `key` is never merged or
    /// replaced.
    pub fn create_queue<I>(&self, key: SuiteKey, items: I) -> Result<usize, StoreError>
    where
        I: IntoIterator<Item = String>,
    {
        let items: VecDeque<String> = items.into_iter().collect();
        if items.is_empty() {
            return Err(StoreError::EmptyTestList(key));
        }

        let mut state = self.lock();
        if state.queues.contains_key(&key) {
            return Err(StoreError::AlreadyExists(key));
        }
        state.forget_drained(&key);
        let len = items.len();
        state.queues.insert(key, items);
        Ok(len)
    }

    /// Remove and return the head of the queue for `key`. Taking the last
    /// element deletes the key in the same step.
    pub fn pop_front(&self, key: &SuiteKey) -> PopOutcome {
        let mut state = self.lock();

        let Some(queue) = state.queues.get_mut(key) else {
            return if state.drained.contains(key) {
                PopOutcome::Exhausted
            } else {
                PopOutcome::Absent
            };
        };

        let Some(test) = queue.pop_front() else {
            // Unreachable while the non-empty invariant holds; repair it.
            state.queues.remove(key);
            state.mark_drained(key.clone(), self.drained_memory);
            return PopOutcome::Exhausted;
        };

        let remaining = queue.len();
        if remaining == 0 {
            state.queues.remove(key);
            state.mark_drained(key.clone(), self.drained_memory);
        }

        PopOutcome::Popped { test, remaining }
    }

    /// Consistent copy of all live queues.
    pub fn snapshot(&self) -> BTreeMap<SuiteKey, Vec<String>> {
        let state = self.lock();
        state
            .queues
            .iter()
            .map(|(key, queue)| (key.clone(), queue.iter().cloned().collect()))
            .collect()
    }

    /// Number of live queues.
    pub fn len(&self) -> usize {
        self.lock().queues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
