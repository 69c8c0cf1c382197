pub mod events;
pub mod lifecycle;
pub mod status;
pub mod steps;

use anyhow::Result;
use std::future::Future;
use std::path::PathBuf;
use std::time::Instant;
use uuid::Uuid;

use crate::config::fixtures::{BookingData, FixtureStore};
use crate::config::Settings;
use crate::driver::session::{BrowserKind, BrowserSession, SessionConfig};
use crate::pages::base::with_retry;
use crate::pages::{BookingPages, WebBookingPages};
use crate::report;
use crate::report::output::RunContext;
use crate::report::types::RunResults;

use events::{ConsoleEventListener, EventEmitter, TestEvent};
use lifecycle::{finalize_test, initialize_test};
use status::StatusRecord;

/// Run one mandatory step with console narration around it.
async fn step<T, Fut>(
    emitter: &EventEmitter,
    status: &mut StatusRecord,
    name: &str,
    fut: Fut,
) -> Result<T>
where
    Fut: Future<Output = Result<T>>,
{
    emitter.emit(TestEvent::StepStarted {
        name: name.to_string(),
    });
    let started = Instant::now();
    let result = steps::execute_step(name, status, fut).await;
    let duration_ms = started.elapsed().as_millis() as u64;

    match &result {
        Ok(_) => emitter.emit(TestEvent::StepPassed {
            name: name.to_string(),
            duration_ms,
        }),
        Err(e) => emitter.emit(TestEvent::StepFailed {
            name: name.to_string(),
            error: e.to_string(),
            duration_ms,
        }),
    }
    result
}

/// Optional-step counterpart; failures never fail the test and are
/// narrated as skipped rather than passed.
async fn optional_step<T, Fut>(
    emitter: &EventEmitter,
    status: &mut StatusRecord,
    name: &str,
    fut: Fut,
    default: T,
) -> T
where
    Fut: Future<Output = Result<T>>,
{
    emitter.emit(TestEvent::StepStarted {
        name: name.to_string(),
    });
    let started = Instant::now();

    let mut failure = None;
    let value = steps::execute_optional_step(
        name,
        status,
        async {
            match fut.await {
                Ok(v) => Ok(v),
                Err(e) => {
                    failure = Some(e.to_string());
                    Err(e)
                }
            }
        },
        default,
    )
    .await;

    match failure {
        Some(error) => emitter.emit(TestEvent::StepSkipped {
            name: name.to_string(),
            reason: format!("ignored: {}", error),
        }),
        None => emitter.emit(TestEvent::StepPassed {
            name: name.to_string(),
            duration_ms: started.elapsed().as_millis() as u64,
        }),
    }
    value
}

/// Drive the booking flow from home page to confirmed booking against any
/// [`BookingPages`] implementation.
///
/// Step names here are the names that show up in failure reasons and
/// reports. The search step is wrapped in the configured fixed-count retry;
/// everything else is single-shot. Payment is skipped entirely when the
/// test data says so.
pub async fn run_booking_flow<P>(
    pages: &P,
    data: &BookingData,
    status: &mut StatusRecord,
    emitter: &EventEmitter,
    retry_attempts: u32,
    retry_delay_ms: u64,
) -> Result<()>
where
    P: BookingPages + ?Sized,
{
    step(emitter, status, "Open home page", pages.open_home()).await?;

    let dismissed = optional_step(
        emitter,
        status,
        "Dismiss cookie banner",
        pages.dismiss_cookie_banner(),
        false,
    )
    .await;
    if !dismissed {
        emitter.emit(TestEvent::Log {
            message: "no cookie banner shown".to_string(),
        });
    }

    step(
        emitter,
        status,
        "Set destination",
        pages.set_destination(&data.destination),
    )
    .await?;
    step(
        emitter,
        status,
        "Set stay dates",
        pages.set_stay_dates(data.check_in, data.check_out),
    )
    .await?;

    {
        let mut attempt = 0u32;
        step(
            emitter,
            status,
            "Search hotels",
            with_retry(retry_attempts, retry_delay_ms, "Search hotels", || {
                attempt += 1;
                if attempt > 1 {
                    emitter.emit(TestEvent::StepRetrying {
                        name: "Search hotels".to_string(),
                        attempt,
                        max_attempts: retry_attempts.max(1),
                    });
                }
                pages.search()
            }),
        )
        .await?;
    }

    let hotel = step(emitter, status, "Choose a hotel", pages.choose_hotel()).await?;
    if !hotel.is_empty() {
        emitter.emit(TestEvent::Log {
            message: format!("hotel: {}", hotel),
        });
    }

    let room = step(emitter, status, "Select a room", pages.select_room()).await?;
    if !room.is_empty() {
        emitter.emit(TestEvent::Log {
            message: format!("room: {}", room),
        });
    }

    step(
        emitter,
        status,
        "Fill guest details",
        pages.fill_guest_details(&data.guest, &data.booker),
    )
    .await?;

    if data.skip_payment {
        emitter.emit(TestEvent::StepSkipped {
            name: "Enter payment details".to_string(),
            reason: "skipPayment enabled in test data".to_string(),
        });
    } else {
        step(
            emitter,
            status,
            "Enter payment details",
            pages.enter_payment(&data.payment),
        )
        .await?;
    }

    Ok(())
}

/// Write the end-of-run reports. Reporting-side I/O failures are warned
/// and swallowed; they must not change the run's outcome.
fn persist_reports(results: &RunResults, run: &RunContext) {
    if let Err(e) = report::write_all(results, run) {
        log::warn!("could not write run reports: {}", e);
    }
}

/// Options for one suite invocation, assembled by the CLI.
#[derive(Debug, Clone)]
pub struct SuiteOptions {
    pub config_path: PathBuf,
    pub fixture_path: PathBuf,
    pub environment: Option<String>,
    pub output: PathBuf,
    pub destination: Option<String>,
    pub browser: BrowserKind,
    pub headless: Option<bool>,
}

/// Run the whole booking suite: one test per fixture destination.
///
/// Returns Ok(true) when every test passed. Test failures are captured in
/// the results, not propagated; only setup problems (bad config, bad
/// fixtures, unwritable output) error out.
pub async fn run_suite(opts: SuiteOptions) -> Result<bool> {
    let mut settings = Settings::load(&opts.config_path)?;
    if let Some(env) = &opts.environment {
        settings.switch_environment(env)?;
    }

    let mut session_config = SessionConfig::default();
    session_config.browser = opts.browser;
    if let Some(headless) = opts.headless {
        session_config.headless = headless;
    }

    // Computed once for the whole run; workers and reports all derive
    // their paths from this.
    let run = RunContext::establish(
        &opts.output,
        settings.environment(),
        session_config.grid.is_some(),
    );
    run.ensure_output_dir()?;

    let fixtures = FixtureStore::new().load(&opts.fixture_path)?;
    let destinations: Vec<_> = fixtures
        .destinations
        .iter()
        .filter(|d| match &opts.destination {
            Some(filter) => d.name.eq_ignore_ascii_case(filter),
            None => true,
        })
        .cloned()
        .collect();
    if destinations.is_empty() {
        anyhow::bail!("No destinations matched in {}", opts.fixture_path.display());
    }

    let session_id = Uuid::new_v4().to_string();
    let (emitter, receiver) = EventEmitter::new();
    let listener = tokio::spawn(ConsoleEventListener::listen(receiver));

    emitter.emit(TestEvent::SuiteStarted {
        session_id: session_id.clone(),
        environment: settings.environment().to_string(),
        test_count: destinations.len(),
    });

    let suite_started = Instant::now();
    let mut summaries = Vec::with_capacity(destinations.len());

    for (index, destination) in destinations.iter().enumerate() {
        let title = format!("Book a hotel in {}", destination.name);
        emitter.emit(TestEvent::TestStarted {
            name: title.clone(),
            index,
            total: destinations.len(),
        });

        let data = fixtures.booking_data(destination)?.with_generated_guest();
        let mut handle = initialize_test(&title, &run, opts.browser.name(), data);

        let summary = match BrowserSession::launch(session_config.clone()).await {
            Ok(session) => {
                let pages = WebBookingPages::new(
                    session.page(),
                    settings.base_url(),
                    settings.default_timeout_ms(),
                );
                let data = handle.data.clone();
                // Errors land in the status record; the suite moves on.
                let _ = run_booking_flow(
                    &pages,
                    &data,
                    &mut handle.status,
                    &emitter,
                    settings.retry_attempts(),
                    settings.retry_delay_ms(),
                )
                .await;

                let summary = finalize_test(handle, Some(session.page())).await;
                session.shutdown().await;
                summary
            }
            Err(e) => {
                handle
                    .status
                    .record_failure("Launch browser", &e.to_string());
                finalize_test(handle, None).await
            }
        };

        emitter.emit(TestEvent::TestFinished {
            name: summary.name.clone(),
            status: summary.status,
            duration_ms: summary.duration_ms,
            failure_reason: summary.failure_reason.clone(),
        });
        summaries.push(summary);
    }

    let results = RunResults::from_tests(
        &session_id,
        settings.environment(),
        &run.platform_tag,
        summaries,
    );
    persist_reports(&results, &run);

    emitter.emit(TestEvent::SuiteFinished {
        passed: results.summary.passed as u32,
        failed: results.summary.failed as u32,
        duration_ms: suite_started.elapsed().as_millis() as u64,
    });

    // Dropping the emitter closes the channel; wait for the listener to
    // drain its backlog so nothing prints after we return.
    drop(emitter);
    let _ = listener.await;

    Ok(results.all_passed())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::fixtures::{GuestDetails, PaymentDetails};
    use anyhow::anyhow;
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;

    /// Scripted stand-in for the real page objects: records every call and
    /// fails `search` a configurable number of times.
    struct ScriptedPages {
        calls: Mutex<Vec<&'static str>>,
        search_failures: AtomicU32,
        banner_fails: bool,
    }

    impl ScriptedPages {
        fn new(search_failures: u32) -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
                search_failures: AtomicU32::new(search_failures),
                banner_fails: false,
            }
        }

        fn record(&self, call: &'static str) {
            self.calls.lock().unwrap().push(call);
        }

        fn calls(&self) -> Vec<&'static str> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl BookingPages for ScriptedPages {
        async fn open_home(&self) -> Result<()> {
            self.record("open_home");
            Ok(())
        }

        async fn dismiss_cookie_banner(&self) -> Result<bool> {
            self.record("dismiss_cookie_banner");
            if self.banner_fails {
                return Err(anyhow!("banner button detached"));
            }
            Ok(true)
        }

        async fn set_destination(&self, _destination: &str) -> Result<()> {
            self.record("set_destination");
            Ok(())
        }

        async fn set_stay_dates(&self, _check_in: NaiveDate, _check_out: NaiveDate) -> Result<()> {
            self.record("set_stay_dates");
            Ok(())
        }

        async fn search(&self) -> Result<()> {
            self.record("search");
            if self.search_failures.load(Ordering::SeqCst) > 0 {
                self.search_failures.fetch_sub(1, Ordering::SeqCst);
                return Err(anyhow!("results grid never appeared"));
            }
            Ok(())
        }

        async fn choose_hotel(&self) -> Result<String> {
            self.record("choose_hotel");
            Ok("Grand Scripted Hotel".to_string())
        }

        async fn select_room(&self) -> Result<String> {
            self.record("select_room");
            Ok("Double Room".to_string())
        }

        async fn fill_guest_details(
            &self,
            _guest: &GuestDetails,
            _booker: &GuestDetails,
        ) -> Result<()> {
            self.record("fill_guest_details");
            Ok(())
        }

        async fn enter_payment(&self, _payment: &PaymentDetails) -> Result<()> {
            self.record("enter_payment");
            Ok(())
        }
    }

    fn booking_data(destination: &str, skip_payment: bool) -> BookingData {
        BookingData {
            destination: destination.to_string(),
            check_in: NaiveDate::from_ymd_opt(2026, 9, 10).unwrap(),
            check_out: NaiveDate::from_ymd_opt(2026, 9, 12).unwrap(),
            skip_payment,
            guest: GuestDetails::default(),
            booker: GuestDetails::default(),
            payment: PaymentDetails::default(),
            raw: serde_json::Value::Null,
        }
    }

    #[tokio::test]
    async fn every_destination_reaches_payment() {
        for destination in ["Amsterdam", "Lisbon", "Oslo"] {
            let pages = ScriptedPages::new(0);
            let mut status = StatusRecord::new();
            let emitter = EventEmitter::default();

            let result = run_booking_flow(
                &pages,
                &booking_data(destination, false),
                &mut status,
                &emitter,
                3,
                1,
            )
            .await;

            assert!(result.is_ok(), "{} flow failed", destination);
            assert_eq!(pages.calls().last(), Some(&"enter_payment"));
            assert!(status.failure_reason.is_empty());
        }
    }

    #[tokio::test]
    async fn skip_payment_never_touches_the_payment_form() {
        let pages = ScriptedPages::new(0);
        let mut status = StatusRecord::new();
        let (emitter, mut receiver) = EventEmitter::new();

        let result = run_booking_flow(
            &pages,
            &booking_data("Amsterdam", true),
            &mut status,
            &emitter,
            3,
            1,
        )
        .await;

        assert!(result.is_ok());
        assert!(!pages.calls().contains(&"enter_payment"));
        assert_eq!(pages.calls().last(), Some(&"fill_guest_details"));

        drop(emitter);
        let mut skipped = false;
        while let Ok(event) = receiver.try_recv() {
            if let TestEvent::StepSkipped { name, .. } = event {
                assert_eq!(name, "Enter payment details");
                skipped = true;
            }
        }
        assert!(skipped);
    }

    #[tokio::test]
    async fn search_recovers_within_the_retry_budget() {
        let pages = ScriptedPages::new(2);
        let mut status = StatusRecord::new();
        let emitter = EventEmitter::default();

        let result = run_booking_flow(
            &pages,
            &booking_data("Lisbon", false),
            &mut status,
            &emitter,
            3,
            1,
        )
        .await;

        assert!(result.is_ok());
        let searches = pages.calls().iter().filter(|c| **c == "search").count();
        assert_eq!(searches, 3);
        // The transient failures leave no trace on the record.
        assert!(status.failure_reason.is_empty());
    }

    #[tokio::test]
    async fn failed_optional_banner_is_narrated_as_skipped_not_passed() {
        let mut pages = ScriptedPages::new(0);
        pages.banner_fails = true;
        let mut status = StatusRecord::new();
        let (emitter, mut receiver) = EventEmitter::new();

        let result = run_booking_flow(
            &pages,
            &booking_data("Amsterdam", false),
            &mut status,
            &emitter,
            3,
            1,
        )
        .await;

        assert!(result.is_ok());
        assert!(status.failure_reason.is_empty());

        drop(emitter);
        let mut skipped = false;
        while let Ok(event) = receiver.try_recv() {
            match event {
                TestEvent::StepSkipped { name, .. } if name == "Dismiss cookie banner" => {
                    skipped = true;
                }
                TestEvent::StepPassed { name, .. } => {
                    assert_ne!(name, "Dismiss cookie banner");
                }
                _ => {}
            }
        }
        assert!(skipped);
    }

    #[test]
    fn report_write_failure_does_not_change_the_run_outcome() {
        use crate::report::output::RunStamp;
        use crate::runner::status::{TestStatus, TestSummary};

        let base = std::env::temp_dir().join(format!("bookwright-suite-{}", Uuid::new_v4()));
        std::fs::create_dir_all(&base).unwrap();
        let run = RunContext::new(
            &base,
            "staging",
            "local",
            RunStamp("2026-08-27_10-30".to_string()),
        );
        // The run folder path is occupied by a plain file, so every report
        // write fails.
        std::fs::write(run.run_dir(), "in the way").unwrap();

        let results = RunResults::from_tests(
            "s",
            "staging",
            "local",
            vec![TestSummary {
                name: "Book a hotel in Amsterdam".to_string(),
                status: TestStatus::Passed,
                failure_reason: String::new(),
                last_step: "Booking flow completed".to_string(),
                duration_ms: 900,
                environment: "staging".to_string(),
                browser: "chromium".to_string(),
                test_data: serde_json::Value::Null,
                screenshot: None,
                started_at: "2026-08-27T10:30:00+02:00".to_string(),
                finished_at: "2026-08-27T10:30:01+02:00".to_string(),
            }],
        );

        persist_reports(&results, &run);

        assert!(results.all_passed());
        std::fs::remove_dir_all(&base).ok();
    }

    #[tokio::test]
    async fn exhausted_search_fails_the_flow_at_the_right_step() {
        let pages = ScriptedPages::new(5);
        let mut status = StatusRecord::new();
        let emitter = EventEmitter::default();

        let result = run_booking_flow(
            &pages,
            &booking_data("Oslo", false),
            &mut status,
            &emitter,
            3,
            1,
        )
        .await;

        assert!(result.is_err());
        assert_eq!(
            pages.calls().iter().filter(|c| **c == "search").count(),
            3
        );
        assert!(!pages.calls().contains(&"choose_hotel"));
        assert!(status
            .failure_reason
            .starts_with("Failed at step 'Search hotels':"));
    }
}
