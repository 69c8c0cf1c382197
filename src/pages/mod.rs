pub mod base;
pub mod details;
pub mod guest;
pub mod home;
pub mod listing;
pub mod payment;

use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;
use playwright::api::Page;

use crate::config::fixtures::{GuestDetails, PaymentDetails};

/// Intention-revealing operations of the booking flow, one logical screen
/// interaction per method.
///
/// The runner drives this trait rather than concrete page objects so that
/// flow-level behavior (step attribution, optional steps, retry, payment
/// skipping) can be exercised against scripted doubles without a browser.
#[async_trait]
pub trait BookingPages: Send + Sync {
    /// Navigate to the home page and wait for the search form.
    async fn open_home(&self) -> Result<()>;

    /// Accept the cookie banner if present; Ok(false) when absent.
    async fn dismiss_cookie_banner(&self) -> Result<bool>;

    async fn set_destination(&self, destination: &str) -> Result<()>;

    async fn set_stay_dates(&self, check_in: NaiveDate, check_out: NaiveDate) -> Result<()>;

    /// Submit the search. Single attempt; the flow wraps this in the
    /// fixed-count retry.
    async fn search(&self) -> Result<()>;

    /// Pick a hotel from the listing; returns its display name.
    async fn choose_hotel(&self) -> Result<String>;

    /// Pick a room on the details screen; returns the room label.
    async fn select_room(&self) -> Result<String>;

    async fn fill_guest_details(&self, guest: &GuestDetails, booker: &GuestDetails) -> Result<()>;

    /// Fill the payment form. Never called when the fixture sets
    /// `skipPayment`.
    async fn enter_payment(&self, payment: &PaymentDetails) -> Result<()>;
}

/// Playwright-backed implementation composing the five page objects over
/// one live page.
pub struct WebBookingPages<'a> {
    page: &'a Page,
    base_url: String,
    timeout_ms: u64,
}

impl<'a> WebBookingPages<'a> {
    pub fn new(page: &'a Page, base_url: &str, timeout_ms: u64) -> Self {
        Self {
            page,
            base_url: base_url.to_string(),
            timeout_ms,
        }
    }

    fn home(&self) -> home::HomePage<'a> {
        home::HomePage::new(self.page, self.timeout_ms)
    }

    fn listing(&self) -> listing::ListingPage<'a> {
        listing::ListingPage::new(self.page, self.timeout_ms)
    }

    fn details(&self) -> details::DetailsPage<'a> {
        details::DetailsPage::new(self.page, self.timeout_ms)
    }

    fn guest(&self) -> guest::GuestPage<'a> {
        guest::GuestPage::new(self.page, self.timeout_ms)
    }

    fn payment(&self) -> payment::PaymentPage<'a> {
        payment::PaymentPage::new(self.page, self.timeout_ms)
    }
}

#[async_trait]
impl<'a> BookingPages for WebBookingPages<'a> {
    async fn open_home(&self) -> Result<()> {
        self.home().open(&self.base_url).await
    }

    async fn dismiss_cookie_banner(&self) -> Result<bool> {
        self.home().dismiss_cookie_banner().await
    }

    async fn set_destination(&self, destination: &str) -> Result<()> {
        self.home().set_destination(destination).await
    }

    async fn set_stay_dates(&self, check_in: NaiveDate, check_out: NaiveDate) -> Result<()> {
        self.home().set_stay_dates(check_in, check_out).await
    }

    async fn search(&self) -> Result<()> {
        self.home().search().await
    }

    async fn choose_hotel(&self) -> Result<String> {
        let listing = self.listing();
        listing.wait_for_results().await?;
        listing.open_random_hotel().await
    }

    async fn select_room(&self) -> Result<String> {
        let details = self.details();
        details.wait_for_rooms().await?;
        let label = details.select_random_room().await?;
        details.proceed_to_booking().await?;
        Ok(label)
    }

    async fn fill_guest_details(&self, guest: &GuestDetails, booker: &GuestDetails) -> Result<()> {
        let page = self.guest();
        page.fill_guest(guest).await?;
        page.fill_booker(booker).await?;
        page.continue_to_payment().await
    }

    async fn enter_payment(&self, payment: &PaymentDetails) -> Result<()> {
        let page = self.payment();
        page.fill_payment(payment).await?;
        page.submit().await
    }
}
