//! Bookkeeping around a test's start and end, independent of which step
//! failed: metadata attachment, summary persistence, screenshot capture.

use anyhow::Result;
use chrono::{DateTime, Local};
use playwright::api::Page;
use std::path::PathBuf;
use std::time::Instant;

use crate::config::fixtures::BookingData;
use crate::report::output::RunContext;

use super::status::{StatusRecord, TestSummary, CLOSING_STEP};

/// Live bookkeeping for one running test, created by [`initialize_test`]
/// and consumed by [`finalize_test`].
pub struct TestHandle {
    pub title: String,
    pub status: StatusRecord,
    pub data: BookingData,
    started: Instant,
    started_wall: DateTime<Local>,
    run: RunContext,
    browser: String,
}

impl TestHandle {
    pub fn slug(&self) -> String {
        slugify(&self.title)
    }

    pub fn summary_path(&self) -> PathBuf {
        self.run.run_dir().join(format!("{}-summary.json", self.slug()))
    }

    fn shot_name(&self) -> String {
        if self.status.success {
            format!("{}-final.png", self.slug())
        } else {
            format!("{}-failure.png", self.slug())
        }
    }
}

fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    for c in title.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.ends_with('-') {
            slug.push('-');
        }
    }
    slug.trim_matches('-').to_string()
}

/// Record the start time, create a fresh status record and attach the
/// metadata snapshot plus the raw fixture data to the run folder.
/// Attachment write failures are reporting-side: warned, never raised.
pub fn initialize_test(
    title: &str,
    run: &RunContext,
    browser: &str,
    data: BookingData,
) -> TestHandle {
    let handle = TestHandle {
        title: title.to_string(),
        status: StatusRecord::new(),
        data,
        started: Instant::now(),
        started_wall: Local::now(),
        run: run.clone(),
        browser: browser.to_string(),
    };

    let metadata = serde_json::json!({
        "title": handle.title,
        "environment": run.environment,
        "platform": run.platform_tag,
        "runStamp": run.stamp.to_string(),
        "runDir": run.run_dir(),
        "resultsDir": run.results_dir(),
        "startedAt": handle.started_wall.to_rfc3339(),
        "testData": handle.data.raw,
    });
    let meta_path = run.run_dir().join(format!("{}-meta.json", handle.slug()));
    if let Err(e) = write_json(&meta_path, &metadata) {
        log::warn!("could not attach test metadata: {}", e);
    }

    handle
}

/// A page handle is usable only when present and still answering; the
/// check itself swallows every error.
pub async fn page_is_usable(page: Option<&Page>) -> bool {
    match page {
        Some(p) => p
            .evaluate::<(), String>("() => document.readyState", ())
            .await
            .is_ok(),
        None => false,
    }
}

/// Close out a test: stamp the canonical closing step when nothing failed,
/// compute the duration, persist the summary and capture end-of-test
/// artifacts. Reporting glitches never flip a passing test to failing.
pub async fn finalize_test(mut handle: TestHandle, page: Option<&Page>) -> TestSummary {
    if !handle.status.success && !handle.status.has_failed() {
        handle.status.mark_success();
        handle.status.current_step = CLOSING_STEP.to_string();
    }

    let capture = if page_is_usable(page).await {
        let path = handle.run.run_dir().join(handle.shot_name());
        Some(capture_screenshot(page, &path).await)
    } else {
        None
    };

    conclude(handle, capture)
}

/// Tail of [`finalize_test`], split from the browser-facing half so the
/// capture outcome is an input. `None` means no usable page; a capture error
/// degrades to a warning and a missing screenshot, never a failed test.
fn conclude(handle: TestHandle, capture: Option<Result<()>>) -> TestSummary {
    let duration_ms = handle.started.elapsed().as_millis() as u64;
    let finished_wall = Local::now();

    let screenshot = match capture {
        Some(Ok(())) => Some(handle.shot_name()),
        Some(Err(e)) => {
            log::warn!("screenshot failed: {}", e);
            None
        }
        None => {
            if !handle.status.success {
                // No screenshot possible; leave a note explaining why.
                let note_path = handle
                    .run
                    .run_dir()
                    .join(format!("{}-failure.txt", handle.slug()));
                let note = format!(
                    "No failure screenshot: page handle unavailable or closed.\nLast step: {}\nReason: {}\n",
                    handle.status.current_step, handle.status.failure_reason
                );
                if let Err(e) = std::fs::write(&note_path, note) {
                    log::warn!("could not write failure note: {}", e);
                }
            }
            None
        }
    };

    let summary = TestSummary {
        name: handle.title.clone(),
        status: handle.status.status(),
        failure_reason: handle.status.failure_reason.clone(),
        last_step: handle.status.current_step.clone(),
        duration_ms,
        environment: handle.run.environment.clone(),
        browser: handle.browser.clone(),
        test_data: handle.data.raw.clone(),
        screenshot,
        started_at: handle.started_wall.to_rfc3339(),
        finished_at: finished_wall.to_rfc3339(),
    };

    match serde_json::to_value(&summary) {
        Ok(value) => {
            if let Err(e) = write_json(&handle.summary_path(), &value) {
                log::warn!("could not persist test summary: {}", e);
            }
        }
        Err(e) => log::warn!("could not serialize test summary: {}", e),
    }

    summary
}

async fn capture_screenshot(page: Option<&Page>, path: &PathBuf) -> Result<()> {
    let page = match page {
        Some(p) => p,
        None => return Ok(()),
    };
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    page.screenshot_builder()
        .path(path.clone())
        .full_page(true)
        .screenshot()
        .await?;
    Ok(())
}

fn write_json(path: &PathBuf, value: &serde_json::Value) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, serde_json::to_string_pretty(value)?)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::output::{RunContext, RunStamp};
    use crate::runner::status::TestStatus;
    use chrono::NaiveDate;
    use uuid::Uuid;

    fn sample_data() -> BookingData {
        BookingData {
            destination: "Amsterdam".to_string(),
            check_in: NaiveDate::from_ymd_opt(2026, 9, 10).unwrap(),
            check_out: NaiveDate::from_ymd_opt(2026, 9, 12).unwrap(),
            skip_payment: false,
            guest: Default::default(),
            booker: Default::default(),
            payment: Default::default(),
            raw: serde_json::json!({ "skipPayment": false, "guest": { "firstName": "Ada" } }),
        }
    }

    fn temp_run() -> RunContext {
        let base = std::env::temp_dir().join(format!("bookwright-run-{}", Uuid::new_v4()));
        let ctx = RunContext::new(
            &base,
            "staging",
            "local",
            RunStamp("2026-08-27_10-30".to_string()),
        );
        ctx.ensure_output_dir().unwrap();
        ctx
    }

    #[tokio::test]
    async fn clean_finish_marks_success_with_closing_step() {
        let run = temp_run();
        let handle = initialize_test("Book Amsterdam", &run, "chromium", sample_data());

        let summary = finalize_test(handle, None).await;

        assert_eq!(summary.status, TestStatus::Passed);
        assert_eq!(summary.last_step, CLOSING_STEP);
        assert!(summary.failure_reason.is_empty());
        std::fs::remove_dir_all(run.base_dir).ok();
    }

    #[tokio::test]
    async fn finalize_is_idempotent_on_preset_success() {
        let run = temp_run();
        let mut handle = initialize_test("Book Amsterdam", &run, "chromium", sample_data());
        handle.status.success = true;
        handle.status.current_step = "Enter payment details".to_string();

        let summary = finalize_test(handle, None).await;

        // The canonical closing label must not clobber the real last step.
        assert_eq!(summary.last_step, "Enter payment details");
        assert_eq!(summary.status, TestStatus::Passed);
        std::fs::remove_dir_all(run.base_dir).ok();
    }

    #[tokio::test]
    async fn summary_round_trips_through_disk() {
        let run = temp_run();
        let mut handle = initialize_test("Book Lisbon", &run, "firefox", sample_data());
        handle.status.record_failure("Search hotels", "timeout after 10000ms");
        let summary_path = handle.summary_path();

        let summary = finalize_test(handle, None).await;
        assert_eq!(summary.status, TestStatus::Failed);

        let raw = std::fs::read_to_string(&summary_path).unwrap();
        let parsed: TestSummary = serde_json::from_str(&raw).unwrap();

        assert_eq!(parsed.status, summary.status);
        assert_eq!(parsed.failure_reason, summary.failure_reason);
        assert_eq!(parsed.test_data, summary.test_data);
        assert_eq!(parsed.environment, "staging");
        std::fs::remove_dir_all(run.base_dir).ok();
    }

    #[tokio::test]
    async fn unusable_page_on_failure_leaves_a_note() {
        let run = temp_run();
        let mut handle = initialize_test("Book Oslo", &run, "chromium", sample_data());
        handle.status.record_failure("Select a room", "no rooms listed");
        let note_path = run
            .run_dir()
            .join("book-oslo-failure.txt");

        finalize_test(handle, None).await;

        let note = std::fs::read_to_string(&note_path).unwrap();
        assert!(note.contains("Select a room"));
        assert!(note.contains("no rooms listed"));
        std::fs::remove_dir_all(run.base_dir).ok();
    }

    #[tokio::test]
    async fn missing_page_never_fails_a_passing_test() {
        let run = temp_run();
        let handle = initialize_test("Book Riga", &run, "chromium", sample_data());

        // Screenshot capture is impossible here; finalize must neither
        // raise nor downgrade the status.
        let summary = finalize_test(handle, None).await;
        assert_eq!(summary.status, TestStatus::Passed);
        std::fs::remove_dir_all(run.base_dir).ok();
    }

    #[test]
    fn capture_error_on_a_usable_page_keeps_the_test_passing() {
        let run = temp_run();
        let mut handle = initialize_test("Book Vienna", &run, "chromium", sample_data());
        handle.status.mark_success();
        handle.status.current_step = CLOSING_STEP.to_string();

        // The page answered the usability check but the screenshot call
        // itself blew up mid-capture.
        let summary = conclude(
            handle,
            Some(Err(anyhow::anyhow!("page crashed during capture"))),
        );

        assert_eq!(summary.status, TestStatus::Passed);
        assert!(summary.screenshot.is_none());
        assert!(summary.failure_reason.is_empty());
        std::fs::remove_dir_all(run.base_dir).ok();
    }

    #[test]
    fn successful_capture_lands_in_the_summary() {
        let run = temp_run();
        let mut handle = initialize_test("Book Vienna", &run, "chromium", sample_data());
        handle.status.mark_success();

        let summary = conclude(handle, Some(Ok(())));

        assert_eq!(summary.screenshot.as_deref(), Some("book-vienna-final.png"));
        std::fs::remove_dir_all(run.base_dir).ok();
    }

    #[test]
    fn slugs_are_filesystem_safe() {
        assert_eq!(slugify("Book: Amsterdam (2 nights)!"), "book-amsterdam-2-nights");
    }
}
