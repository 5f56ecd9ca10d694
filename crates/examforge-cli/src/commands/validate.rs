//! The `examforge validate` command.

use std::path::PathBuf;

use anyhow::Result;

use examforge_core::parser;
use examforge_core::timer::format_clock;
use examforge_loaders::config::load_config_from;

pub fn execute(test_path: PathBuf, config_path: Option<PathBuf>) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    let default_duration = config.default_duration_secs;

    let sets = if test_path.is_dir() {
        parser::load_test_directory(&test_path, default_duration)?
    } else {
        vec![parser::parse_question_set_file(&test_path, default_duration)?]
    };

    let mut total_warnings = 0;
    let mut total_errors = 0;

    for set in &sets {
        println!(
            "Test: {} ({} questions, {})",
            set.title,
            set.len(),
            format_clock(set.duration_secs)
        );

        if let Err(e) = set.check_integrity() {
            println!("  ERROR: {e}");
            total_errors += 1;
        }

        let warnings = parser::validate_question_set(set);
        for w in &warnings {
            let prefix = w
                .question
                .map(|i| format!("  [Q{}]", i + 1))
                .unwrap_or_else(|| "  ".to_string());
            println!("{prefix} WARNING: {}", w.message);
        }
        total_warnings += warnings.len();
    }

    if total_errors > 0 {
        anyhow::bail!("{total_errors} test(s) cannot be started");
    }

    if total_warnings == 0 {
        println!("All tests valid.");
    } else {
        println!("\n{total_warnings} warning(s) found.");
    }

    Ok(())
}
