//! In-memory loader for tests and embedded question sets.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;

use examforge_core::error::LoadError;
use examforge_core::model::{QuestionSet, DEFAULT_DURATION_SECS};
use examforge_core::parser::parse_question_set_json;
use examforge_core::traits::QuestionSetLoader;

/// Serves JSON resources from a map of test id → resource text.
///
/// Resources are parsed on every load, so a malformed entry fails the same
/// way a malformed file would.
pub struct InMemoryLoader {
    resources: HashMap<String, String>,
    default_duration_secs: u64,
    call_count: AtomicU32,
}

impl InMemoryLoader {
    pub fn new(resources: HashMap<String, String>) -> Self {
        Self {
            resources,
            default_duration_secs: DEFAULT_DURATION_SECS,
            call_count: AtomicU32::new(0),
        }
    }

    /// A loader serving a single resource.
    pub fn with_resource(test_id: &str, json: &str) -> Self {
        Self::new(HashMap::from([(test_id.to_string(), json.to_string())]))
    }

    pub fn with_default_duration(mut self, secs: u64) -> Self {
        self.default_duration_secs = secs;
        self
    }

    /// Number of `load` calls made so far.
    pub fn call_count(&self) -> u32 {
        self.call_count.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl QuestionSetLoader for InMemoryLoader {
    fn name(&self) -> &str {
        "memory"
    }

    async fn load(&self, test_id: &str) -> Result<QuestionSet, LoadError> {
        self.call_count.fetch_add(1, Ordering::Relaxed);

        let content = self
            .resources
            .get(test_id)
            .ok_or_else(|| LoadError::NotFound(test_id.to_string()))?;
        parse_question_set_json(content, test_id, self.default_duration_secs)
    }
}
