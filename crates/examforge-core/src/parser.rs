//! Test resource parser.
//!
//! Normalizes the accepted resource shapes into a single `QuestionSet`:
//!
//! - a bare JSON array of questions (default duration),
//! - a JSON object with `questions` and optional `durationMinutes`/`title`,
//! - a TOML file with an optional `[test]` header and `[[questions]]` tables.
//!
//! Parsing checks shape only. Semantic checks (empty set, out-of-range
//! correct index) happen when a session is initialized.

use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::Value;

use crate::error::LoadError;
use crate::model::{Question, QuestionSet};

/// On-disk or on-wire format of a test resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceFormat {
    Json,
    Toml,
}

impl ResourceFormat {
    /// Pick a format from a file extension. Anything but `.toml` is JSON.
    pub fn from_path(path: &Path) -> Self {
        if path.extension().is_some_and(|ext| ext == "toml") {
            ResourceFormat::Toml
        } else {
            ResourceFormat::Json
        }
    }
}

/// Object form of a JSON resource.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct JsonTestObject {
    questions: Vec<Question>,
    #[serde(default)]
    duration_minutes: Option<f64>,
    #[serde(default)]
    title: Option<String>,
}

/// Intermediate TOML structure.
#[derive(Debug, Deserialize)]
struct TomlTestFile {
    #[serde(default)]
    test: TomlTestHeader,
    questions: Vec<Question>,
}

#[derive(Debug, Default, Deserialize)]
struct TomlTestHeader {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    duration_minutes: Option<f64>,
}

fn minutes_to_secs(test_id: &str, minutes: f64) -> Result<u64, LoadError> {
    if !minutes.is_finite() || minutes < 0.0 {
        return Err(LoadError::parse(
            test_id,
            format!("durationMinutes must be a non-negative number, got {minutes}"),
        ));
    }
    Ok((minutes * 60.0).round() as u64)
}

fn default_title(test_id: &str) -> String {
    test_id.to_uppercase()
}

/// Parse a JSON resource in either of its two accepted shapes.
pub fn parse_question_set_json(
    content: &str,
    test_id: &str,
    default_duration_secs: u64,
) -> Result<QuestionSet, LoadError> {
    let value: Value = serde_json::from_str(content).map_err(|e| LoadError::parse(test_id, e))?;

    let (questions, duration_secs, title) = match value {
        Value::Array(_) => {
            let questions: Vec<Question> =
                serde_json::from_value(value).map_err(|e| LoadError::parse(test_id, e))?;
            (questions, default_duration_secs, None)
        }
        Value::Object(_) => {
            let object: JsonTestObject =
                serde_json::from_value(value).map_err(|e| LoadError::parse(test_id, e))?;
            let duration_secs = match object.duration_minutes {
                Some(minutes) => minutes_to_secs(test_id, minutes)?,
                None => default_duration_secs,
            };
            (object.questions, duration_secs, object.title)
        }
        other => {
            return Err(LoadError::parse(
                test_id,
                format!("expected an array or an object, found {}", json_kind(&other)),
            ))
        }
    };

    Ok(QuestionSet {
        id: test_id.to_string(),
        title: title.unwrap_or_else(|| default_title(test_id)),
        questions,
        duration_secs,
    })
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Parse a TOML resource.
pub fn parse_question_set_toml(
    content: &str,
    test_id: &str,
    default_duration_secs: u64,
) -> Result<QuestionSet, LoadError> {
    let parsed: TomlTestFile = toml::from_str(content).map_err(|e| LoadError::parse(test_id, e))?;

    let duration_secs = match parsed.test.duration_minutes {
        Some(minutes) => minutes_to_secs(test_id, minutes)?,
        None => default_duration_secs,
    };

    Ok(QuestionSet {
        id: test_id.to_string(),
        title: parsed.test.title.unwrap_or_else(|| default_title(test_id)),
        questions: parsed.questions,
        duration_secs,
    })
}

/// Parse a resource string in the given format.
pub fn parse_question_set_str(
    content: &str,
    format: ResourceFormat,
    test_id: &str,
    default_duration_secs: u64,
) -> Result<QuestionSet, LoadError> {
    match format {
        ResourceFormat::Json => parse_question_set_json(content, test_id, default_duration_secs),
        ResourceFormat::Toml => parse_question_set_toml(content, test_id, default_duration_secs),
    }
}

/// Read and parse a single resource file. The test id is the file stem.
pub fn parse_question_set_file(
    path: &Path,
    default_duration_secs: u64,
) -> Result<QuestionSet, LoadError> {
    let test_id = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();

    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(LoadError::NotFound(path.display().to_string()))
        }
        Err(e) => return Err(LoadError::transport(test_id, e)),
    };

    parse_question_set_str(
        &content,
        ResourceFormat::from_path(path),
        &test_id,
        default_duration_secs,
    )
}

fn is_resource_file(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext == "json" || ext == "toml")
}

/// Recursively load all `.json` and `.toml` resources from a directory.
///
/// Files that fail to parse are skipped with a warning.
pub fn load_test_directory(dir: &Path, default_duration_secs: u64) -> Result<Vec<QuestionSet>> {
    let mut sets = Vec::new();

    if !dir.is_dir() {
        anyhow::bail!("not a directory: {}", dir.display());
    }

    let mut entries = std::fs::read_dir(dir)
        .with_context(|| format!("failed to read directory: {}", dir.display()))?
        .collect::<std::io::Result<Vec<_>>>()?;
    entries.sort_by_key(|e| e.path());

    for entry in entries {
        let path = entry.path();

        if path.is_dir() {
            sets.extend(load_test_directory(&path, default_duration_secs)?);
        } else if is_resource_file(&path) {
            match parse_question_set_file(&path, default_duration_secs) {
                Ok(set) => sets.push(set),
                Err(e) => {
                    tracing::warn!("skipping {}: {}", path.display(), e);
                }
            }
        }
    }

    Ok(sets)
}

/// A warning from question set validation.
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    /// 0-based question index (if applicable).
    pub question: Option<usize>,
    /// Warning message.
    pub message: String,
}

/// Check a question set for issues that do not prevent a session from
/// starting but are probably mistakes.
pub fn validate_question_set(set: &QuestionSet) -> Vec<ValidationWarning> {
    let mut warnings = Vec::new();

    if set.duration_secs == 0 {
        warnings.push(ValidationWarning {
            question: None,
            message: "duration is zero; the test expires on the first tick".into(),
        });
    }

    for (i, q) in set.questions.iter().enumerate() {
        if q.prompt.trim().is_empty() {
            warnings.push(ValidationWarning {
                question: Some(i),
                message: "question text is empty".into(),
            });
        }

        if q.options.len() < 2 {
            warnings.push(ValidationWarning {
                question: Some(i),
                message: format!("only {} option(s)", q.options.len()),
            });
        }

        let mut seen = std::collections::HashSet::new();
        for option in &q.options {
            if !seen.insert(option.trim()) {
                warnings.push(ValidationWarning {
                    question: Some(i),
                    message: format!("duplicate option: {option}"),
                });
            }
        }
    }

    warnings
}
