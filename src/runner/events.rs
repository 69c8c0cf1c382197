use tokio::sync::broadcast;

use super::status::TestStatus;

/// Suite execution events for real-time console narration.
#[derive(Debug, Clone)]
pub enum TestEvent {
    SuiteStarted {
        session_id: String,
        environment: String,
        test_count: usize,
    },
    SuiteFinished {
        passed: u32,
        failed: u32,
        duration_ms: u64,
    },

    TestStarted {
        name: String,
        index: usize,
        total: usize,
    },
    TestFinished {
        name: String,
        status: TestStatus,
        duration_ms: u64,
        failure_reason: String,
    },

    StepStarted {
        name: String,
    },
    StepPassed {
        name: String,
        duration_ms: u64,
    },
    StepFailed {
        name: String,
        error: String,
        duration_ms: u64,
    },
    StepSkipped {
        name: String,
        reason: String,
    },
    StepRetrying {
        name: String,
        attempt: u32,
        max_attempts: u32,
    },

    Log {
        message: String,
    },
}

/// Event emitter broadcasting suite events to any number of listeners.
pub struct EventEmitter {
    sender: broadcast::Sender<TestEvent>,
}

impl EventEmitter {
    pub fn new() -> (Self, broadcast::Receiver<TestEvent>) {
        let (sender, receiver) = broadcast::channel(256);
        (Self { sender }, receiver)
    }

    pub fn emit(&self, event: TestEvent) {
        let _ = self.sender.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<TestEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventEmitter {
    fn default() -> Self {
        let (sender, _) = broadcast::channel(256);
        Self { sender }
    }
}

use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use std::time::Duration as StdDuration;

/// Console event listener: one spinner for the in-flight step, direct
/// println for everything terminal.
pub struct ConsoleEventListener;

impl ConsoleEventListener {
    pub async fn listen(mut receiver: broadcast::Receiver<TestEvent>) {
        use colored::Colorize;
        use indicatif::ProgressDrawTarget;
        use std::io::IsTerminal;

        let multi = if std::io::stdout().is_terminal() {
            MultiProgress::new()
        } else {
            // Piped output: hidden target avoids terminal escape codes
            MultiProgress::with_draw_target(ProgressDrawTarget::hidden())
        };

        let mut spinner: Option<ProgressBar> = None;
        let mut step_text = String::new();

        while let Ok(event) = receiver.recv().await {
            match event {
                TestEvent::SuiteStarted {
                    session_id,
                    environment,
                    test_count,
                } => {
                    multi
                        .println(format!(
                            "\n{} Booking suite started: {} ({} tests, env: {})",
                            "▶".green().bold(),
                            session_id.cyan(),
                            test_count,
                            environment.cyan()
                        ))
                        .ok();
                }

                TestEvent::SuiteFinished {
                    passed,
                    failed,
                    duration_ms,
                } => {
                    if let Some(pb) = spinner.take() {
                        pb.finish();
                    }
                    println!("\n{} Suite finished", "■".blue().bold());
                    println!(
                        "  {} passed, {} failed",
                        passed.to_string().green(),
                        failed.to_string().red()
                    );
                    println!("  Duration: {}ms", duration_ms);
                }

                TestEvent::TestStarted { name, index, total } => {
                    println!(
                        "\n  {} Test [{}/{}]: {}",
                        "→".blue(),
                        index + 1,
                        total,
                        name.white().bold()
                    );
                }

                TestEvent::TestFinished {
                    name,
                    status,
                    duration_ms,
                    failure_reason,
                } => {
                    if let Some(pb) = spinner.take() {
                        pb.finish();
                    }
                    let banner = match status {
                        TestStatus::Passed => "PASSED".green().bold(),
                        TestStatus::Failed => "FAILED".red().bold(),
                    };
                    println!("  {} Test {} [{}] ({}ms)", "←".blue(), name, banner, duration_ms);
                    if !failure_reason.is_empty() {
                        println!("    {}", failure_reason.red());
                    }
                }

                TestEvent::StepStarted { name } => {
                    let pb = multi.add(ProgressBar::new_spinner());
                    let style = ProgressStyle::default_spinner()
                        .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏ ")
                        .template("    {spinner} {msg}")
                        .unwrap();
                    pb.set_style(style);

                    let body = format!("{}... ", name.dimmed());
                    pb.set_message(body.clone());
                    pb.enable_steady_tick(StdDuration::from_millis(100));

                    spinner = Some(pb);
                    step_text = body;
                }

                TestEvent::StepPassed { duration_ms, .. } => {
                    let done = format!("    {} {}({}ms)", "✓".green(), step_text, duration_ms);
                    if let Some(pb) = spinner.take() {
                        pb.finish_and_clear();
                    }
                    println!("{}", done);
                }

                TestEvent::StepFailed {
                    error, duration_ms, ..
                } => {
                    let done = format!(
                        "    {} {}({}ms)\n      {}",
                        "✗".red(),
                        step_text,
                        duration_ms,
                        error.red()
                    );
                    if let Some(pb) = spinner.take() {
                        pb.finish_and_clear();
                    }
                    println!("{}", done);
                }

                TestEvent::StepSkipped { name, reason } => {
                    if let Some(pb) = spinner.take() {
                        pb.finish_and_clear();
                    }
                    println!("    {} {}... ({})", "○".yellow(), name, reason.dimmed());
                }

                TestEvent::StepRetrying {
                    attempt,
                    max_attempts,
                    ..
                } => {
                    if let Some(pb) = &spinner {
                        pb.set_message(format!(
                            "{} {}",
                            step_text,
                            format!("↻ retry {}/{}", attempt, max_attempts).yellow()
                        ));
                    }
                }

                TestEvent::Log { message } => {
                    multi.println(format!("      {}", message)).ok();
                }
            }
        }
    }
}
