use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Prefix shared by every HTML-style run folder. Pruning keys off this.
pub const RUN_FOLDER_BASE: &str = "booking-report";

/// Env var carrying the run stamp to worker processes spawned after the
/// first worker computed it.
pub const RUN_STAMP_VAR: &str = "BOOKWRIGHT_RUN_STAMP";

const OUTPUT_DIR_VAR: &str = "BOOKWRIGHT_OUTPUT_DIR";
const RESULTS_DIR_VAR: &str = "BOOKWRIGHT_RESULTS_DIR";

/// Minute-granularity run stamp shared by all workers of one suite
/// invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunStamp(pub String);

impl RunStamp {
    /// Acquire the run stamp: reuse the env-var handoff when a parent
    /// already computed one, otherwise compute it and publish it.
    /// First-writer-wins; child workers inherit the variable at spawn.
    pub fn acquire() -> Self {
        if let Ok(existing) = std::env::var(RUN_STAMP_VAR) {
            if !existing.is_empty() {
                return Self(existing);
            }
        }
        let stamp = chrono::Local::now().format("%Y-%m-%d_%H-%M").to_string();
        std::env::set_var(RUN_STAMP_VAR, &stamp);
        Self(stamp)
    }
}

impl std::fmt::Display for RunStamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Process-wide output locations for one suite run.
///
/// The run folder name is a pure function of base name, environment,
/// platform tag and stamp, so parallel workers compute the identical path
/// independently. Built once in the suite's setup phase and passed
/// explicitly into each worker.
#[derive(Debug, Clone)]
pub struct RunContext {
    pub base_dir: PathBuf,
    pub environment: String,
    pub platform_tag: String,
    pub stamp: RunStamp,
}

impl RunContext {
    pub fn new(base_dir: &Path, environment: &str, platform_tag: &str, stamp: RunStamp) -> Self {
        Self {
            base_dir: base_dir.to_path_buf(),
            environment: environment.to_string(),
            platform_tag: platform_tag.to_string(),
            stamp,
        }
    }

    /// Build from CLI arguments plus environment overrides, acquiring the
    /// shared run stamp.
    pub fn establish(output: &Path, environment: &str, grid: bool) -> Self {
        let base_dir = std::env::var(OUTPUT_DIR_VAR)
            .map(PathBuf::from)
            .unwrap_or_else(|_| output.to_path_buf());
        let platform_tag = if grid { "grid" } else { "local" };
        Self::new(&base_dir, environment, platform_tag, RunStamp::acquire())
    }

    pub fn folder_name(&self) -> String {
        format!(
            "{}-{}-{}-{}",
            RUN_FOLDER_BASE, self.environment, self.platform_tag, self.stamp
        )
    }

    /// The timestamped folder holding this run's human-facing artifacts.
    pub fn run_dir(&self) -> PathBuf {
        self.base_dir.join(self.folder_name())
    }

    /// Fixed location for machine-readable artifacts (results JSON, JUnit
    /// XML), overwritten every run rather than accumulated.
    pub fn results_dir(&self) -> PathBuf {
        match std::env::var(RESULTS_DIR_VAR) {
            Ok(sub) if !sub.is_empty() => self.base_dir.join(sub),
            _ => self.base_dir.join("results"),
        }
    }

    /// Create the current run folder, deleting sibling run folders from
    /// prior runs first. Destructive on purpose: exactly one HTML-style
    /// run folder survives on disk.
    pub fn ensure_output_dir(&self) -> Result<PathBuf> {
        let run_dir = self.run_dir();
        let current = self.folder_name();

        if self.base_dir.is_dir() {
            for entry in std::fs::read_dir(&self.base_dir)
                .with_context(|| format!("Failed to list {}", self.base_dir.display()))?
            {
                let entry = match entry {
                    Ok(e) => e,
                    Err(_) => continue,
                };
                let name = entry.file_name().to_string_lossy().to_string();
                if entry.path().is_dir() && name.starts_with(RUN_FOLDER_BASE) && name != current {
                    log::info!("pruning stale run folder {}", name);
                    if let Err(e) = std::fs::remove_dir_all(entry.path()) {
                        log::warn!("could not prune {}: {}", name, e);
                    }
                }
            }
        }

        std::fs::create_dir_all(&run_dir)
            .with_context(|| format!("Failed to create {}", run_dir.display()))?;
        std::fs::create_dir_all(self.results_dir())
            .with_context(|| format!("Failed to create {}", self.results_dir().display()))?;
        Ok(run_dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn temp_base() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("bookwright-out-{}", Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn workers_with_shared_stamp_derive_identical_paths() {
        let base = temp_base();
        let stamp = RunStamp("2026-08-27_10-30".to_string());

        let worker_a = RunContext::new(&base, "staging", "local", stamp.clone());
        let worker_b = RunContext::new(&base, "staging", "local", stamp);

        assert_eq!(worker_a.run_dir(), worker_b.run_dir());
        assert_eq!(
            worker_a.folder_name(),
            "booking-report-staging-local-2026-08-27_10-30"
        );

        std::fs::remove_dir_all(base).ok();
    }

    #[test]
    fn stamp_handoff_is_first_writer_wins() {
        std::env::remove_var(RUN_STAMP_VAR);
        let first = RunStamp::acquire();
        let second = RunStamp::acquire();
        assert_eq!(first, second);
        std::env::remove_var(RUN_STAMP_VAR);
    }

    #[test]
    fn ensure_output_dir_prunes_prior_runs() {
        let base = temp_base();
        let prev1 = base.join("booking-report-staging-local-2026-08-26_09-00");
        let prev2 = base.join("booking-report-prod-grid-2026-08-25_17-45");
        let unrelated = base.join("keep-me");
        std::fs::create_dir_all(&prev1).unwrap();
        std::fs::create_dir_all(&prev2).unwrap();
        std::fs::create_dir_all(&unrelated).unwrap();

        let ctx = RunContext::new(
            &base,
            "staging",
            "local",
            RunStamp("2026-08-27_10-30".to_string()),
        );
        let run_dir = ctx.ensure_output_dir().unwrap();

        assert!(run_dir.is_dir());
        assert!(!prev1.exists());
        assert!(!prev2.exists());
        assert!(unrelated.is_dir());

        std::fs::remove_dir_all(base).ok();
    }

    #[test]
    fn ensure_output_dir_keeps_current_folder_contents() {
        let base = temp_base();
        let ctx = RunContext::new(
            &base,
            "staging",
            "local",
            RunStamp("2026-08-27_10-30".to_string()),
        );
        let run_dir = ctx.ensure_output_dir().unwrap();
        std::fs::write(run_dir.join("summary.json"), "{}").unwrap();

        // A second worker ensuring the same folder must not wipe it.
        ctx.ensure_output_dir().unwrap();
        assert!(run_dir.join("summary.json").exists());

        std::fs::remove_dir_all(base).ok();
    }
}
