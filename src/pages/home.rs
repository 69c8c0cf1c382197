use anyhow::Result;
use chrono::NaiveDate;
use playwright::api::Page;

use super::base;

const COOKIE_ACCEPT: &[&str] = &[
    "#onetrust-accept-btn-handler",
    "button[data-testid='cookie-accept']",
    "//button[contains(., 'Accept')]",
];

const DESTINATION_INPUT: &[&str] = &[
    "input[data-testid='destination-input']",
    "input[name='destination']",
    "//input[@placeholder='Where are you going?']",
];

const DESTINATION_SUGGESTION: &[&str] = &[
    "[data-testid='autocomplete-result']:first-child",
    "ul.autocomplete-list li:first-child",
    "//ul[contains(@class,'autocomplete')]//li[1]",
];

const CHECK_IN_INPUT: &[&str] = &[
    "input[data-testid='check-in']",
    "input[name='checkIn']",
    "//input[@aria-label='Check-in date']",
];

const CHECK_OUT_INPUT: &[&str] = &[
    "input[data-testid='check-out']",
    "input[name='checkOut']",
    "//input[@aria-label='Check-out date']",
];

const SEARCH_BUTTON: &[&str] = &[
    "button[data-testid='search-submit']",
    "button[type='submit']",
    "//button[contains(., 'Search')]",
];

/// Landing page: destination search form.
pub struct HomePage<'a> {
    page: &'a Page,
    timeout_ms: u64,
}

impl<'a> HomePage<'a> {
    pub fn new(page: &'a Page, timeout_ms: u64) -> Self {
        Self { page, timeout_ms }
    }

    pub async fn open(&self, base_url: &str) -> Result<()> {
        self.page.goto_builder(base_url).goto().await?;
        base::wait_any(self.page, DESTINATION_INPUT, self.timeout_ms).await?;
        Ok(())
    }

    /// Accept the consent banner if one shows up. Returns whether a banner
    /// was dismissed; absence is not an error.
    pub async fn dismiss_cookie_banner(&self) -> Result<bool> {
        match base::click_any(self.page, COOKIE_ACCEPT, 3_000).await {
            Ok(()) => Ok(true),
            Err(_) => Ok(false),
        }
    }

    pub async fn set_destination(&self, destination: &str) -> Result<()> {
        base::fill_any(self.page, DESTINATION_INPUT, destination, self.timeout_ms).await?;

        // The autocomplete popover is flaky on slower environments; fall
        // back to the raw text when no suggestion renders.
        if base::click_any(self.page, DESTINATION_SUGGESTION, 3_000)
            .await
            .is_err()
        {
            log::debug!("no autocomplete suggestion for '{}', using raw text", destination);
        }
        Ok(())
    }

    pub async fn set_stay_dates(&self, check_in: NaiveDate, check_out: NaiveDate) -> Result<()> {
        let fmt = "%Y-%m-%d";
        base::fill_any(
            self.page,
            CHECK_IN_INPUT,
            &check_in.format(fmt).to_string(),
            self.timeout_ms,
        )
        .await?;
        base::fill_any(
            self.page,
            CHECK_OUT_INPUT,
            &check_out.format(fmt).to_string(),
            self.timeout_ms,
        )
        .await?;
        Ok(())
    }

    /// Submit the search form. Callers wrap this in the fixed retry
    /// helper; the click itself is a single attempt.
    pub async fn search(&self) -> Result<()> {
        base::click_any(self.page, SEARCH_BUTTON, self.timeout_ms).await
    }
}
