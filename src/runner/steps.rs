use anyhow::Result;
use std::future::Future;
use std::sync::{Mutex, MutexGuard, OnceLock};

use super::status::StatusRecord;

/// Run a mandatory step against an explicit status record.
///
/// The step name is written to `status.current_step` before the future is
/// awaited, so even a hard crash mid-step leaves the record pointing at the
/// step that was running. On failure the record gets a
/// `Failed at step '<name>': <message>` reason and the error propagates to
/// abort the test.
pub async fn execute_step<T, Fut>(name: &str, status: &mut StatusRecord, fut: Fut) -> Result<T>
where
    Fut: Future<Output = Result<T>>,
{
    status.current_step = name.to_string();
    log::debug!("step '{}' started", name);

    match fut.await {
        Ok(value) => Ok(value),
        Err(e) => {
            status.record_failure(name, &e.to_string());
            Err(e)
        }
    }
}

/// Run an optional step against an explicit status record.
///
/// Failures are logged as warnings and swallowed; the caller gets `default`
/// back and the record's failure reason is left untouched. Used for
/// non-critical interactions (cookie banners, promo popups) whose failure
/// must not fail the test.
pub async fn execute_optional_step<T, Fut>(
    name: &str,
    status: &mut StatusRecord,
    fut: Fut,
    default: T,
) -> T
where
    Fut: Future<Output = Result<T>>,
{
    status.current_step = name.to_string();

    match fut.await {
        Ok(value) => value,
        Err(e) => {
            log::warn!("optional step '{}' failed: {}", name, e);
            default
        }
    }
}

fn global_record() -> &'static Mutex<StatusRecord> {
    static GLOBAL: OnceLock<Mutex<StatusRecord>> = OnceLock::new();
    GLOBAL.get_or_init(|| Mutex::new(StatusRecord::new()))
}

/// Lock the process-wide status record used by the `_global` step variants.
///
/// Poisoning is unwrapped into the inner record: the record stays readable
/// even if a holder panicked.
pub fn global_status() -> MutexGuard<'static, StatusRecord> {
    global_record()
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Reset the process-wide record, e.g. between tests that opt into the
/// ambient form.
pub fn reset_global_status() {
    *global_status() = StatusRecord::new();
}

/// Mandatory step against the process-wide record, for callers that do not
/// want to thread a record explicitly. Distinctly named rather than
/// overloaded so the contract stays unambiguous.
pub async fn execute_step_global<T, Fut>(name: &str, fut: Fut) -> Result<T>
where
    Fut: Future<Output = Result<T>>,
{
    global_status().current_step = name.to_string();

    match fut.await {
        Ok(value) => Ok(value),
        Err(e) => {
            global_status().record_failure(name, &e.to_string());
            Err(e)
        }
    }
}

/// Optional step against the process-wide record.
pub async fn execute_optional_step_global<T, Fut>(name: &str, fut: Fut, default: T) -> T
where
    Fut: Future<Output = Result<T>>,
{
    global_status().current_step = name.to_string();

    match fut.await {
        Ok(value) => value,
        Err(e) => {
            log::warn!("optional step '{}' failed: {}", name, e);
            default
        }
    }
}
