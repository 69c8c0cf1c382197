use anyhow::Result;
use playwright::api::Page;

use crate::config::fixtures::GuestDetails;

use super::base;

const FIRST_NAME: &[&str] = &[
    "input[data-testid='guest-first-name']",
    "input[name='firstName']",
];
const LAST_NAME: &[&str] = &[
    "input[data-testid='guest-last-name']",
    "input[name='lastName']",
];
const EMAIL: &[&str] = &["input[data-testid='guest-email']", "input[name='email']"];
const PHONE: &[&str] = &["input[data-testid='guest-phone']", "input[name='phone']"];

const BOOKER_FIRST_NAME: &[&str] = &[
    "input[data-testid='booker-first-name']",
    "input[name='bookerFirstName']",
];
const BOOKER_LAST_NAME: &[&str] = &[
    "input[data-testid='booker-last-name']",
    "input[name='bookerLastName']",
];

const CONTINUE_BUTTON: &[&str] = &[
    "button[data-testid='guest-continue']",
    "button[type='submit']",
    "//button[contains(., 'Continue')]",
];

/// Guest details form: who stays and who books.
pub struct GuestPage<'a> {
    page: &'a Page,
    timeout_ms: u64,
}

impl<'a> GuestPage<'a> {
    pub fn new(page: &'a Page, timeout_ms: u64) -> Self {
        Self { page, timeout_ms }
    }

    pub async fn fill_guest(&self, guest: &GuestDetails) -> Result<()> {
        base::fill_any(self.page, FIRST_NAME, &guest.first_name, self.timeout_ms).await?;
        base::fill_any(self.page, LAST_NAME, &guest.last_name, self.timeout_ms).await?;
        base::fill_any(self.page, EMAIL, &guest.email, self.timeout_ms).await?;
        if !guest.phone.is_empty() {
            base::fill_any(self.page, PHONE, &guest.phone, self.timeout_ms).await?;
        }
        Ok(())
    }

    /// Booker fields only exist when booking for someone else; missing
    /// fields are skipped silently.
    pub async fn fill_booker(&self, booker: &GuestDetails) -> Result<()> {
        if booker.first_name.is_empty() {
            return Ok(());
        }
        if base::fill_any(self.page, BOOKER_FIRST_NAME, &booker.first_name, 3_000)
            .await
            .is_ok()
        {
            base::fill_any(self.page, BOOKER_LAST_NAME, &booker.last_name, 3_000).await?;
        }
        Ok(())
    }

    pub async fn continue_to_payment(&self) -> Result<()> {
        base::click_any(self.page, CONTINUE_BUTTON, self.timeout_ms).await
    }
}
