//! Loader for test resources stored in a local directory.

use std::path::PathBuf;

use async_trait::async_trait;
use tracing::instrument;

use examforge_core::error::LoadError;
use examforge_core::model::QuestionSet;
use examforge_core::parser::{parse_question_set_str, ResourceFormat};
use examforge_core::traits::QuestionSetLoader;

/// Resolves `<id>` to `<tests_dir>/<id>.json`, then `<tests_dir>/<id>.toml`.
pub struct FileSystemLoader {
    tests_dir: PathBuf,
    default_duration_secs: u64,
}

impl FileSystemLoader {
    pub fn new(tests_dir: impl Into<PathBuf>, default_duration_secs: u64) -> Self {
        Self {
            tests_dir: tests_dir.into(),
            default_duration_secs,
        }
    }

    fn candidates(&self, test_id: &str) -> [(PathBuf, ResourceFormat); 2] {
        [
            (
                self.tests_dir.join(format!("{test_id}.json")),
                ResourceFormat::Json,
            ),
            (
                self.tests_dir.join(format!("{test_id}.toml")),
                ResourceFormat::Toml,
            ),
        ]
    }
}

/// Test ids name a file directly inside the tests directory.
pub(crate) fn is_plain_id(test_id: &str) -> bool {
    !test_id.is_empty()
        && !test_id.contains(&['/', '\\'][..])
        && test_id != "."
        && !test_id.contains("..")
}

#[async_trait]
impl QuestionSetLoader for FileSystemLoader {
    fn name(&self) -> &str {
        "filesystem"
    }

    #[instrument(skip(self), fields(dir = %self.tests_dir.display()))]
    async fn load(&self, test_id: &str) -> Result<QuestionSet, LoadError> {
        if !is_plain_id(test_id) {
            return Err(LoadError::NotFound(test_id.to_string()));
        }

        for (path, format) in self.candidates(test_id) {
            match tokio::fs::read_to_string(&path).await {
                Ok(content) => {
                    tracing::debug!(path = %path.display(), "loading test resource");
                    return parse_question_set_str(
                        &content,
                        format,
                        test_id,
                        self.default_duration_secs,
                    );
                }
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
                Err(e) => return Err(LoadError::transport(test_id, e)),
            }
        }

        Err(LoadError::NotFound(test_id.to_string()))
    }
}
