use anyhow::Result;
use playwright::api::Page;

use crate::config::fixtures::PaymentDetails;

use super::base;

const CARD_HOLDER: &[&str] = &[
    "input[data-testid='card-holder']",
    "input[name='cardHolder']",
];
const CARD_NUMBER: &[&str] = &[
    "input[data-testid='card-number']",
    "input[name='cardNumber']",
];
const EXPIRY: &[&str] = &["input[data-testid='card-expiry']", "input[name='expiry']"];
const CVC: &[&str] = &["input[data-testid='card-cvc']", "input[name='cvc']"];

const PAY_BUTTON: &[&str] = &[
    "button[data-testid='pay-now']",
    "button.pay-now",
    "//button[contains(., 'Pay')]",
];

/// Payment form: card details and the final submit.
pub struct PaymentPage<'a> {
    page: &'a Page,
    timeout_ms: u64,
}

impl<'a> PaymentPage<'a> {
    pub fn new(page: &'a Page, timeout_ms: u64) -> Self {
        Self { page, timeout_ms }
    }

    pub async fn fill_payment(&self, payment: &PaymentDetails) -> Result<()> {
        base::fill_any(self.page, CARD_HOLDER, &payment.card_holder, self.timeout_ms).await?;
        base::fill_any(self.page, CARD_NUMBER, &payment.card_number, self.timeout_ms).await?;
        base::fill_any(self.page, EXPIRY, &payment.expiry, self.timeout_ms).await?;
        base::fill_any(self.page, CVC, &payment.cvc, self.timeout_ms).await?;
        Ok(())
    }

    pub async fn submit(&self) -> Result<()> {
        base::click_any(self.page, PAY_BUTTON, self.timeout_ms).await
    }
}
