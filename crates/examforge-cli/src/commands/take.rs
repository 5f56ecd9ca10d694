//! The `examforge take` command.

use std::io::BufRead;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio::sync::mpsc;

use examforge_core::controller::{run_session, Command, SessionController};
use examforge_core::report::SessionReport;
use examforge_core::review::{Phase, SessionSnapshot};
use examforge_core::scoring::{SessionResult, SubmitReason};
use examforge_core::traits::{QuestionSetLoader, RenderSink};
use examforge_loaders::config::load_config_from;
use examforge_loaders::{create_loader, LoaderConfig};

const HELP: &str = "Commands: <number> select option, n next, p previous, c clear, \
pause, resume, s submit, y confirm, no cancel, r review, restart, q exit";

/// What the terminal last drew, minus the clock.
#[derive(Debug, Clone, PartialEq)]
struct ViewKey {
    phase: Phase,
    position: usize,
    answer: Option<usize>,
}

impl ViewKey {
    fn of(snapshot: &SessionSnapshot) -> Self {
        Self {
            phase: snapshot.phase,
            position: snapshot.position,
            answer: snapshot.answer,
        }
    }
}

/// Draws the session as plain text on stdout.
///
/// A full redraw happens when the question, answer or phase changes. Clock
/// ticks alone only print a short time notice once a minute and during the
/// last ten seconds.
struct TerminalSink {
    last: Option<ViewKey>,
}

impl TerminalSink {
    fn new() -> Self {
        Self { last: None }
    }

    fn draw(snapshot: &SessionSnapshot) {
        println!();
        println!(
            "== {} ==  Q{}/{}  [{}]  answered {}/{}",
            snapshot.title,
            snapshot.position,
            snapshot.total,
            snapshot.remaining,
            snapshot.answered_count,
            snapshot.total
        );

        match snapshot.phase {
            Phase::Paused => {
                println!("-- paused -- type `resume` to continue");
                return;
            }
            Phase::ConfirmingSubmit => {
                println!("Submit the test now? (y / no)");
                return;
            }
            Phase::Submitted => {
                println!("Test submitted. Type `r` to review answers, `restart` or `q`.");
                return;
            }
            Phase::Active | Phase::Reviewing => {}
        }

        println!("Q{}. {}", snapshot.position, snapshot.question);
        for (i, option) in snapshot.options.iter().enumerate() {
            let marker = if option.correct {
                "[+]"
            } else if option.wrong {
                "[-]"
            } else if option.selected {
                "[*]"
            } else {
                "[ ]"
            };
            println!("  {marker} {}. {}", i + 1, option.text);
        }

        let mut nav = Vec::new();
        if snapshot.can_go_previous {
            nav.push("p previous");
        }
        if snapshot.can_go_next {
            nav.push("n next");
        }
        if !nav.is_empty() {
            println!("  ({})", nav.join(", "));
        }
    }
}

impl RenderSink for TerminalSink {
    fn render(&mut self, snapshot: &SessionSnapshot) {
        let key = ViewKey::of(snapshot);
        if self.last.as_ref() != Some(&key) {
            Self::draw(snapshot);
            self.last = Some(key);
        } else if snapshot.phase == Phase::Active
            && (snapshot.remaining_secs % 60 == 0 || snapshot.remaining_secs <= 10)
        {
            println!("  [time left {}]", snapshot.remaining);
        }
    }

    fn on_submitted(&mut self, result: &SessionResult, reason: SubmitReason) {
        if reason == SubmitReason::TimeExpired {
            println!("\nTime is up!");
        }
        print_result(result);
    }

    fn on_error(&mut self, message: &str) {
        eprintln!("Error: {message}");
        self.last = None;
    }

    fn on_exit(&mut self) {
        println!("Session ended.");
    }
}

fn print_result(result: &SessionResult) {
    use comfy_table::{Cell, Table};

    let mut table = Table::new();
    table.set_header(vec!["Total", "Attempted", "Correct", "Wrong", "Accuracy"]);
    table.add_row(vec![
        Cell::new(result.total),
        Cell::new(result.attempted),
        Cell::new(result.correct),
        Cell::new(result.wrong()),
        Cell::new(format!("{:.2}%", result.accuracy)),
    ]);

    println!("\n{table}");
}

/// Map a line of user input to a command. Option numbers are 1-based.
fn parse_command(line: &str) -> Option<Command> {
    let input = line.trim().to_lowercase();
    if let Ok(n) = input.parse::<usize>() {
        return n.checked_sub(1).map(Command::SelectOption);
    }

    let command = match input.as_str() {
        "n" | "next" => Command::Next,
        "p" | "prev" | "previous" => Command::Previous,
        "c" | "clear" => Command::ClearAnswer,
        "pause" => Command::Pause,
        "resume" => Command::Resume,
        "s" | "submit" => Command::RequestSubmit,
        "y" | "yes" | "confirm" => Command::ConfirmSubmit,
        "no" | "cancel" => Command::CancelSubmit,
        "r" | "review" => Command::EnterReview,
        "restart" => Command::Restart,
        "q" | "quit" | "exit" => Command::Exit,
        _ => return None,
    };
    Some(command)
}

/// Forward stdin lines to the session until input ends or the session
/// stops listening.
///
/// Runs on a plain thread: a blocked stdin read must not hold the runtime
/// open once the session has exited.
fn forward_input(commands: mpsc::Sender<Command>) {
    for line in std::io::stdin().lock().lines() {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                tracing::warn!("failed to read input: {e}");
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }

        match parse_command(&line) {
            Some(command) => {
                if commands.blocking_send(command).is_err() {
                    break;
                }
            }
            None => eprintln!("{HELP}"),
        }
    }
}

pub async fn execute(
    test_id: String,
    tests_dir: Option<PathBuf>,
    base_url: Option<String>,
    report_path: Option<PathBuf>,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let mut config = load_config_from(config_path.as_deref())?;

    if let Some(dir) = tests_dir {
        config.source = LoaderConfig::Filesystem { tests_dir: dir };
    }
    if let Some(url) = base_url {
        config.source = LoaderConfig::Http { base_url: url };
    }

    let loader: Arc<dyn QuestionSetLoader> =
        Arc::from(create_loader(&config.source, config.default_duration_secs)?);

    let mut controller = SessionController::new(loader, Box::new(TerminalSink::new()));

    // A failed load ends the command before any countdown exists.
    controller.start(&test_id).await?;
    eprintln!("{HELP}");

    let (tx, rx) = mpsc::channel(32);
    std::thread::spawn(move || forward_input(tx));

    let controller = run_session(
        controller,
        rx,
        Duration::from_millis(config.tick_interval_ms),
    )
    .await;

    let report_path = report_path.or_else(|| {
        config.report_dir.as_ref().map(|dir| {
            let timestamp = chrono::Utc::now().format("%Y-%m-%dT%H%M%S");
            dir.join(format!("{test_id}-{timestamp}.json"))
        })
    });

    if let (Some(path), Some(report)) = (report_path, controller.report()) {
        save_report(report, &path)?;
    }

    Ok(())
}

fn save_report(report: &SessionReport, path: &std::path::Path) -> Result<()> {
    report.save_json(path)?;
    eprintln!("Report saved to: {}", path.display());
    Ok(())
}
