use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;

use bookwright::driver::session::{BrowserKind, GRID_VAR};
use bookwright::report;
use bookwright::report::output::RUN_FOLDER_BASE;
use bookwright::runner::{self, SuiteOptions};

#[derive(Parser)]
#[command(name = "bookwright")]
#[command(version = "0.1.0")]
#[command(about = "End-to-end hotel booking test suite", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the booking suite against an environment
    Run {
        /// Path to the environments config file
        #[arg(short, long, default_value = "config/environments.json")]
        config: PathBuf,

        /// Path to the hotel fixtures file
        #[arg(short, long, default_value = "fixtures/hotels.json")]
        fixtures: PathBuf,

        /// Environment name (overrides the config default)
        #[arg(short, long)]
        env: Option<String>,

        /// Output directory for reports and artifacts
        #[arg(short, long, default_value = "./output")]
        output: PathBuf,

        /// Run only the destination with this name
        #[arg(short, long)]
        destination: Option<String>,

        /// Browser engine (chromium, firefox, webkit)
        #[arg(short, long, default_value = "chromium")]
        browser: String,

        /// Run with a visible browser window
        #[arg(long, default_value = "false")]
        headed: bool,

        /// Run on the cloud grid instead of a local browser
        #[arg(long, default_value = "false")]
        grid: bool,
    },

    /// Generate report from run results
    Report {
        /// Path to run results JSON
        results: PathBuf,

        /// Output format (json, html, junit)
        #[arg(short, long, default_value = "html")]
        format: String,

        /// Output file path
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Open the generated report in the default browser
        #[arg(long, default_value = "false")]
        open: bool,
    },

    /// Delete report folders from previous runs
    Clean {
        /// Output directory holding the run folders
        #[arg(short, long, default_value = "./output")]
        output: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            config,
            fixtures,
            env,
            output,
            destination,
            browser,
            headed,
            grid,
        } => {
            println!(
                "{} Running booking suite (config: {})",
                "▶".green().bold(),
                config.display().to_string().cyan()
            );
            if let Some(ref name) = env {
                println!("  Environment: {}", name.cyan());
            }
            println!("  Browser: {}", browser.cyan());
            if headed {
                println!("  Headed: {}", "Enabled".yellow());
            }
            if grid {
                println!("  Grid: {}", "Enabled".yellow());
                // Session construction reads the grid flag from the
                // environment, same as spawned workers do.
                std::env::set_var(GRID_VAR, "1");
            }
            if let Some(ref name) = destination {
                println!("  Destination: {}", name.cyan());
            }
            println!("  Output: {}", output.display().to_string().cyan());

            let passed = runner::run_suite(SuiteOptions {
                config_path: config,
                fixture_path: fixtures,
                environment: env,
                output,
                destination,
                browser: BrowserKind::parse(&browser),
                headless: if headed { Some(false) } else { None },
            })
            .await?;

            if !passed {
                std::process::exit(1);
            }
        }

        Commands::Report {
            results,
            format,
            output,
            open,
        } => {
            println!(
                "{} Generating {} report from: {}",
                "📊".to_string().blue(),
                format.cyan(),
                results.display()
            );
            report::generate_report(&results, &format, output.as_deref()).await?;

            if open {
                match output {
                    Some(ref path) => {
                        let opener = if cfg!(target_os = "macos") {
                            "open"
                        } else {
                            "xdg-open"
                        };
                        let _ = tokio::process::Command::new(opener).arg(path).spawn();
                    }
                    None => println!("  {} --open needs --output", "⚠".yellow()),
                }
            }
        }

        Commands::Clean { output } => {
            let mut removed = 0u32;
            if output.is_dir() {
                for entry in std::fs::read_dir(&output)? {
                    let entry = entry?;
                    let name = entry.file_name().to_string_lossy().to_string();
                    if entry.path().is_dir() && name.starts_with(RUN_FOLDER_BASE) {
                        std::fs::remove_dir_all(entry.path())?;
                        println!("  {} removed {}", "✗".red(), name);
                        removed += 1;
                    }
                }
            }
            println!("{} Removed {} run folder(s)", "✓".green(), removed);
        }
    }

    Ok(())
}
