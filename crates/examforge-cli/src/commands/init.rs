//! The `examforge init` command.

use std::path::Path;

use anyhow::Result;

pub fn execute() -> Result<()> {
    if Path::new("examforge.toml").exists() {
        println!("examforge.toml already exists, skipping.");
    } else {
        std::fs::write("examforge.toml", SAMPLE_CONFIG)?;
        println!("Created examforge.toml");
    }

    std::fs::create_dir_all("tests")?;
    let sample_path = Path::new("tests/sample.json");
    if sample_path.exists() {
        println!("tests/sample.json already exists, skipping.");
    } else {
        std::fs::write(sample_path, SAMPLE_TEST)?;
        println!("Created tests/sample.json");
    }

    println!("\nNext steps:");
    println!("  1. Run: examforge validate --test tests/sample.json");
    println!("  2. Run: examforge take --test sample");

    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# examforge configuration

default_duration_secs = 600
tick_interval_ms = 1000
# report_dir = "results"

[source]
type = "filesystem"
tests_dir = "./tests"

# [source]
# type = "http"
# base_url = "${EXAMFORGE_SERVER}"
"#;

const SAMPLE_TEST: &str = r#"{
  "title": "Sample Test",
  "durationMinutes": 5,
  "questions": [
    {
      "question": "Which keyword declares an immutable binding in Rust?",
      "options": ["var", "let", "const fn", "static mut"],
      "correctIndex": 1
    },
    {
      "question": "What does the `?` operator do on an `Err` value?",
      "options": ["Panics", "Ignores it", "Returns it early", "Converts it to None"],
      "correctIndex": 2
    },
    {
      "question": "Which type owns a growable UTF-8 string?",
      "options": ["String", "&str", "char", "Vec<u16>"],
      "correctIndex": 0
    }
  ]
}
"#;
