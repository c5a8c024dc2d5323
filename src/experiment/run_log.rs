//! Run Log - in-memory collection of run records keyed by method
//!
//! This is the input of a table build: every method maps to the ordered
//! list of its run records.

use rustc_hash::FxHashMap;

use super::RunRecord;

/// In-memory log of run records.
///
/// ## Design
///
/// Methods are kept in discovery order (the order in which their first run
/// was added), with an `FxHashMap` index for O(1) lookup by name. Runs of a
/// method stay in insertion order.
#[derive(Debug, Default, Clone)]
pub struct RunLog {
    index: FxHashMap<String, usize>,
    methods: Vec<(String, Vec<RunRecord>)>,
}

impl RunLog {
    /// Create a new empty run log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if the log holds no methods.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }

    /// Get the number of methods.
    #[must_use]
    pub fn method_count(&self) -> usize {
        self.methods.len()
    }

    /// Get the total number of runs across methods.
    #[must_use]
    pub fn run_count(&self) -> usize {
        self.methods.iter().map(|(_, runs)| runs.len()).sum()
    }

    /// Register a method with no runs yet.
    ///
    /// Registered methods without runs produce an "empty" outcome instead
    /// of a table row.
    pub fn add_method(&mut self, method: impl Into<String>) {
        let method = method.into();
        self.slot(&method);
    }

    /// Add a run under its own method name.
    pub fn add_run(&mut self, run: RunRecord) {
        let method = run.method().to_string();
        self.add_run_to(&method, run);
    }

    /// Add a run under an explicit method key.
    ///
    /// The key does not have to match `run.method()`; a mismatch is a data
    /// error that surfaces when the method is aggregated.
    pub fn add_run_to(&mut self, method: &str, run: RunRecord) {
        let slot = self.slot(method);
        self.methods[slot].1.push(run);
    }

    /// Get the runs of a method, if the method is known.
    #[must_use]
    pub fn runs_for_method(&self, method: &str) -> Option<&[RunRecord]> {
        self.index
            .get(method)
            .map(|&slot| self.methods[slot].1.as_slice())
    }

    /// Method names in discovery order.
    pub fn methods(&self) -> impl Iterator<Item = &str> + '_ {
        self.methods.iter().map(|(name, _)| name.as_str())
    }

    fn slot(&mut self, method: &str) -> usize {
        if let Some(&slot) = self.index.get(method) {
            return slot;
        }
        let slot = self.methods.len();
        self.methods.push((method.to_string(), Vec::new()));
        self.index.insert(method.to_string(), slot);
        slot
    }
}

impl FromIterator<RunRecord> for RunLog {
    fn from_iter<I: IntoIterator<Item = RunRecord>>(iter: I) -> Self {
        let mut log = Self::new();
        for run in iter {
            log.add_run(run);
        }
        log
    }
}

impl Extend<RunRecord> for RunLog {
    fn extend<I: IntoIterator<Item = RunRecord>>(&mut self, iter: I) {
        for run in iter {
            self.add_run(run);
        }
    }
}
