//! Low-level element interactions shared by every page object.
//!
//! Each helper takes a fallback chain of CSS/XPath selectors tried in
//! order; booking sites A/B-test their markup, so a single selector is
//! rarely stable across environments.

use anyhow::{bail, Result};
use playwright::api::{ElementHandle, Page};
use std::future::Future;
use std::time::Instant;

const POLL_INTERVAL_MS: u64 = 250;

/// Wait until any selector in the chain matches; returns the selector that
/// matched. Exhausting the timeout errors with every candidate named.
pub async fn wait_any(page: &Page, selectors: &[&str], timeout_ms: u64) -> Result<String> {
    let start = Instant::now();
    loop {
        for sel in selectors {
            if page.query_selector(sel).await.ok().flatten().is_some() {
                return Ok((*sel).to_string());
            }
        }
        if start.elapsed().as_millis() >= timeout_ms as u128 {
            bail!(
                "No selector matched within {}ms: [{}]",
                timeout_ms,
                selectors.join(", ")
            );
        }
        tokio::time::sleep(tokio::time::Duration::from_millis(POLL_INTERVAL_MS)).await;
    }
}

/// Click the first matching selector in the chain.
pub async fn click_any(page: &Page, selectors: &[&str], timeout_ms: u64) -> Result<()> {
    let sel = wait_any(page, selectors, timeout_ms).await?;
    page.click_builder(&sel).click().await?;
    Ok(())
}

/// Fill the first matching selector in the chain with `value`.
pub async fn fill_any(page: &Page, selectors: &[&str], value: &str, timeout_ms: u64) -> Result<()> {
    let sel = wait_any(page, selectors, timeout_ms).await?;
    match page.query_selector(&sel).await? {
        Some(el) => {
            el.fill_builder(value).fill().await?;
            Ok(())
        }
        None => bail!("Element vanished before fill: {}", sel),
    }
}

/// Text of one specific element handle, empty when unreadable.
pub async fn handle_text(page: &Page, handle: &ElementHandle) -> String {
    let js = "el => el.value || el.innerText || el.textContent || ''";
    page.evaluate(js, handle).await.unwrap_or_default()
}

/// Pick a random element of a slice; the returned reference is the element
/// at the returned index, so callers read and act on the same element.
pub fn pick_random<T>(items: &[T]) -> Option<(usize, &T)> {
    use rand::Rng;
    if items.is_empty() {
        return None;
    }
    let index = rand::thread_rng().gen_range(0..items.len());
    Some((index, &items[index]))
}

/// All elements matching the first selector in the chain that has any.
pub async fn all_matching(
    page: &Page,
    selectors: &[&str],
    timeout_ms: u64,
) -> Result<Vec<ElementHandle>> {
    let sel = wait_any(page, selectors, timeout_ms).await?;
    Ok(page.query_selector_all(&sel).await?)
}

/// Fixed-count, fixed-delay retry around a flaky UI action. No exponential
/// backoff, no jitter; each failed attempt is logged with its number and
/// the last error propagates.
pub async fn with_retry<T, F, Fut>(attempts: u32, delay_ms: u64, label: &str, mut op: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let attempts = attempts.max(1);
    let mut last_error = None;

    for attempt in 1..=attempts {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) => {
                if attempt < attempts {
                    log::warn!("'{}' attempt {}/{} failed: {}", label, attempt, attempts, e);
                    tokio::time::sleep(tokio::time::Duration::from_millis(delay_ms)).await;
                }
                last_error = Some(e);
            }
        }
    }

    Err(last_error.unwrap_or_else(|| anyhow::anyhow!("'{}' failed with no attempts", label)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test]
    async fn retry_succeeds_after_transient_failures() {
        let calls = AtomicU32::new(0);

        let result = with_retry(3, 1, "search", || {
            let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
            async move {
                if n < 3 {
                    Err(anyhow!("attempt {} flaked", n))
                } else {
                    Ok(n)
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), 3);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn retry_propagates_last_error_when_exhausted() {
        let calls = AtomicU32::new(0);

        let result: Result<()> = with_retry(2, 1, "submit", || {
            let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
            async move { Err(anyhow!("boom {}", n)) }
        })
        .await;

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(result.unwrap_err().to_string().contains("boom 2"));
    }

    #[test]
    fn random_pick_returns_the_element_at_its_index() {
        let items = ["alpha", "beta", "gamma", "delta"];
        for _ in 0..50 {
            let (index, item) = pick_random(&items).unwrap();
            assert!(std::ptr::eq(item, &items[index]));
        }
        assert!(pick_random::<u8>(&[]).is_none());
    }

    #[tokio::test]
    async fn retry_runs_once_when_attempts_is_one() {
        let calls = AtomicU32::new(0);
        let result = with_retry(1, 1, "once", || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Ok(()) }
        })
        .await;
        assert!(result.is_ok());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
