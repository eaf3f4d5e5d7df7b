//! Persisted record for one canonical context.

use crate::identity::content_hash_hex;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Timestamp type using UTC timezone.
pub type Timestamp = DateTime<Utc>;

/// One stored carve. `context_hash` is the uniqueness key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CarveRecord {
    pub project: String,
    pub function_name: String,
    /// Input that produced the run, when known.
    pub testcase: Option<String>,
    pub call_index: u64,
    /// Canonical form, or the raw dump text when `raw` is set.
    pub context: String,
    pub context_hash: String,
    pub is_crash: bool,
    pub raw: bool,
    pub carved_at: Timestamp,
}

impl CarveRecord {
    /// Build a record, hashing `context` for deduplication.
    pub fn new(
        project: impl Into<String>,
        function_name: impl Into<String>,
        call_index: u64,
        context: String,
    ) -> Self {
        let context_hash = content_hash_hex(&context);
        Self {
            project: project.into(),
            function_name: function_name.into(),
            testcase: None,
            call_index,
            context,
            context_hash,
            is_crash: false,
            raw: false,
            carved_at: Utc::now(),
        }
    }

    pub fn with_testcase(mut self, testcase: impl Into<String>) -> Self {
        self.testcase = Some(testcase.into());
        self
    }

    pub fn with_crash(mut self, is_crash: bool) -> Self {
        self.is_crash = is_crash;
        self
    }

    pub fn with_raw(mut self, raw: bool) -> Self {
        self.raw = raw;
        self
    }
}
