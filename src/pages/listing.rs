use anyhow::{bail, Result};
use playwright::api::Page;

use super::base;

const HOTEL_CARDS: &[&str] = &[
    "[data-testid='hotel-card']",
    "div.sr_property_block",
    "//div[contains(@class,'hotel-card')]",
];

/// Search results: one card per hotel.
pub struct ListingPage<'a> {
    page: &'a Page,
    timeout_ms: u64,
}

impl<'a> ListingPage<'a> {
    pub fn new(page: &'a Page, timeout_ms: u64) -> Self {
        Self { page, timeout_ms }
    }

    pub async fn wait_for_results(&self) -> Result<usize> {
        let cards = base::all_matching(self.page, HOTEL_CARDS, self.timeout_ms).await?;
        if cards.is_empty() {
            bail!("Search returned no hotel cards");
        }
        Ok(cards.len())
    }

    /// Open the details of a random result card; returns the hotel name
    /// when the card exposes one.
    pub async fn open_random_hotel(&self) -> Result<String> {
        let cards = base::all_matching(self.page, HOTEL_CARDS, self.timeout_ms).await?;
        let (index, card) = match base::pick_random(&cards) {
            Some(pick) => pick,
            None => bail!("Search returned no hotel cards"),
        };

        // The name must come from the card we are about to click, not the
        // first card on the page.
        let name = base::handle_text(self.page, card).await;
        card.click_builder().click().await?;

        log::info!("opened hotel card {} of {}", index + 1, cards.len());
        Ok(name.trim().to_string())
    }
}
