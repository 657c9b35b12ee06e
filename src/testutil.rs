//! Mock host and record for exercising the engine without a real store
//! (SPEC_FULL.md §10.5, §9 "Mock host for tests").
//!
//! Deliberately a plain `pub mod`, not `#[cfg(test)]`: integration tests
//! under `tests/` compile as a separate crate and need these types to
//! reach the public API the same way a real host would.

use crate::value::Value;
use crate::{Host, Record};
use std::collections::HashMap;

/// A record backed by a plain map, mirroring the host's bin storage.
#[derive(Debug, Default, Clone)]
pub struct MockRecord {
    bins: HashMap<String, Value>,
}

impl MockRecord {
    pub fn new() -> Self {
        Self { bins: HashMap::new() }
    }

    /// Build a record already populated with the given bins.
    pub fn with_bins(bins: impl IntoIterator<Item = (&'static str, Value)>) -> Self {
        let mut r = Self::new();
        for (k, v) in bins {
            r.set(k, v);
        }
        r
    }
}

impl Record for MockRecord {
    fn get(&self, bin: &str) -> Option<&Value> {
        self.bins.get(bin)
    }

    fn set(&mut self, bin: &str, value: Value) {
        self.bins.insert(bin.to_string(), value);
    }

    fn remove(&mut self, bin: &str) {
        self.bins.remove(bin);
    }

    fn num_bins(&self) -> usize {
        self.bins.len()
    }
}

/// A host whose `commit` always succeeds.
#[derive(Debug, Default)]
pub struct MockHost {
    commits: usize,
}

impl MockHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn commit_count(&self) -> usize {
        self.commits
    }
}

impl Host for MockHost {
    fn commit(&mut self, _record: &mut dyn Record) -> i32 {
        self.commits += 1;
        0
    }
}

/// A host that fails its next `commit` exactly once, then succeeds, to
/// exercise `UPDATE_FAILED` handling.
#[derive(Debug)]
pub struct FailOnceHost {
    failed: bool,
    commits: usize,
}

impl FailOnceHost {
    pub fn new() -> Self {
        Self { failed: false, commits: 0 }
    }

    pub fn commit_count(&self) -> usize {
        self.commits
    }
}

impl Default for FailOnceHost {
    fn default() -> Self {
        Self::new()
    }
}

impl Host for FailOnceHost {
    fn commit(&mut self, _record: &mut dyn Record) -> i32 {
        self.commits += 1;
        if !self.failed {
            self.failed = true;
            return 1;
        }
        0
    }
}
