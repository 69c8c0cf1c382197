use anyhow::{bail, Result};
use playwright::api::Page;

use super::base;

const ROOM_ROWS: &[&str] = &[
    "[data-testid='room-row']",
    "table.room-table tbody tr",
    "//tr[contains(@class,'room-option')]",
];

const RESERVE_BUTTON: &[&str] = &[
    "button[data-testid='reserve']",
    "button.reserve-room",
    "//button[contains(., 'Reserve') or contains(., 'Book now')]",
];

/// Hotel details: room/rate table plus the reserve action.
pub struct DetailsPage<'a> {
    page: &'a Page,
    timeout_ms: u64,
}

impl<'a> DetailsPage<'a> {
    pub fn new(page: &'a Page, timeout_ms: u64) -> Self {
        Self { page, timeout_ms }
    }

    pub async fn wait_for_rooms(&self) -> Result<usize> {
        let rows = base::all_matching(self.page, ROOM_ROWS, self.timeout_ms).await?;
        if rows.is_empty() {
            bail!("Hotel details page listed no rooms");
        }
        Ok(rows.len())
    }

    /// Pick a random room row and reserve it; returns the room label when
    /// readable.
    pub async fn select_random_room(&self) -> Result<String> {
        let rows = base::all_matching(self.page, ROOM_ROWS, self.timeout_ms).await?;
        let (index, row) = match base::pick_random(&rows) {
            Some(pick) => pick,
            None => bail!("Hotel details page listed no rooms"),
        };

        // Read the label off the chosen row before the click navigates.
        let label = base::handle_text(self.page, row).await;
        row.click_builder().click().await?;

        log::info!("selected room {} of {}", index + 1, rows.len());
        Ok(label.trim().to_string())
    }

    pub async fn proceed_to_booking(&self) -> Result<()> {
        base::click_any(self.page, RESERVE_BUTTON, self.timeout_ms).await
    }
}
