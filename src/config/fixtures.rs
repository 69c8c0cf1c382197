use anyhow::{Context, Result};
use chrono::{Duration, Local, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// One searchable destination plus its stay parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Destination {
    pub name: String,
    #[serde(default = "default_check_in_offset")]
    pub check_in_offset_days: i64,
    #[serde(default = "default_nights")]
    pub nights: i64,
    /// Per-destination overrides merged over `commonData`.
    #[serde(default)]
    pub overrides: serde_json::Value,
}

fn default_check_in_offset() -> i64 {
    14
}

fn default_nights() -> i64 {
    2
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct GuestDetails {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct PaymentDetails {
    #[serde(default)]
    pub card_holder: String,
    #[serde(default)]
    pub card_number: String,
    #[serde(default)]
    pub expiry: String,
    #[serde(default)]
    pub cvc: String,
}

/// Shared defaults applied to every destination unless overridden.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct CommonData {
    #[serde(default)]
    pub skip_payment: bool,
    #[serde(default)]
    pub guest: GuestDetails,
    #[serde(default)]
    pub booker: GuestDetails,
    #[serde(default)]
    pub payment: PaymentDetails,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct HotelsSection {
    destinations: Vec<Destination>,
    #[serde(default)]
    common_data: serde_json::Value,
}

#[derive(Debug, Clone, Deserialize)]
struct FixtureFile {
    hotels: HotelsSection,
}

/// Parsed fixture document: destinations plus raw common data.
#[derive(Debug, Clone)]
pub struct HotelFixtures {
    pub destinations: Vec<Destination>,
    common_data: serde_json::Value,
}

impl HotelFixtures {
    pub fn parse(raw: &str) -> Result<Self> {
        let file: FixtureFile = serde_json::from_str(raw).context("Invalid fixture JSON")?;
        Ok(Self {
            destinations: file.hotels.destinations,
            common_data: file.hotels.common_data,
        })
    }

    /// Resolve the effective data for one destination: its overrides merged
    /// over the shared defaults, with stay dates computed from today.
    pub fn booking_data(&self, destination: &Destination) -> Result<BookingData> {
        let mut merged = self.common_data.clone();
        merge_json(&mut merged, &destination.overrides);
        let common: CommonData =
            serde_json::from_value(merged.clone()).context("Invalid commonData in fixture")?;

        let today = Local::now().date_naive();
        let check_in = today + Duration::days(destination.check_in_offset_days);
        let check_out = check_in + Duration::days(destination.nights.max(1));

        Ok(BookingData {
            destination: destination.name.clone(),
            check_in,
            check_out,
            skip_payment: common.skip_payment,
            guest: common.guest,
            booker: common.booker,
            payment: common.payment,
            raw: merged,
        })
    }
}

/// Effective input for one booking test: the merged fixture snapshot.
#[derive(Debug, Clone)]
pub struct BookingData {
    pub destination: String,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub skip_payment: bool,
    pub guest: GuestDetails,
    pub booker: GuestDetails,
    pub payment: PaymentDetails,
    /// Raw merged JSON, attached to reports verbatim.
    pub raw: serde_json::Value,
}

impl BookingData {
    /// Fill empty guest identity fields with generated values.
    pub fn with_generated_guest(mut self) -> Self {
        use fake::faker::internet::en::SafeEmail;
        use fake::faker::name::en::{FirstName, LastName};
        use fake::Fake;

        if self.guest.first_name.is_empty() {
            self.guest.first_name = FirstName().fake();
        }
        if self.guest.last_name.is_empty() {
            self.guest.last_name = LastName().fake();
        }
        if self.guest.email.is_empty() {
            self.guest.email = SafeEmail().fake();
        }
        self
    }
}

/// Recursive merge of `patch` over `base`; objects merge key-wise, anything
/// else replaces.
fn merge_json(base: &mut serde_json::Value, patch: &serde_json::Value) {
    match (base, patch) {
        (serde_json::Value::Object(base_map), serde_json::Value::Object(patch_map)) => {
            for (key, value) in patch_map {
                merge_json(
                    base_map.entry(key.clone()).or_insert(serde_json::Value::Null),
                    value,
                );
            }
        }
        (base_slot, patch_value) => {
            if !patch_value.is_null() {
                *base_slot = patch_value.clone();
            }
        }
    }
}

/// Fixture loader with an in-memory cache keyed by filename. Files are
/// parsed once per process; later loads return the cached parse.
#[derive(Default)]
pub struct FixtureStore {
    cache: Mutex<HashMap<PathBuf, Arc<HotelFixtures>>>,
}

impl FixtureStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load(&self, path: &Path) -> Result<Arc<HotelFixtures>> {
        let key = path.to_path_buf();
        {
            let cache = self.cache.lock().unwrap_or_else(|p| p.into_inner());
            if let Some(hit) = cache.get(&key) {
                return Ok(hit.clone());
            }
        }

        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read fixture file {}", path.display()))?;
        let parsed = Arc::new(HotelFixtures::parse(&raw)?);

        let mut cache = self.cache.lock().unwrap_or_else(|p| p.into_inner());
        Ok(cache.entry(key).or_insert(parsed).clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIXTURE: &str = r#"{
        "hotels": {
            "destinations": [
                { "name": "Amsterdam", "checkInOffsetDays": 7, "nights": 3 },
                { "name": "Lisbon" },
                { "name": "Oslo", "overrides": { "skipPayment": true } }
            ],
            "commonData": {
                "skipPayment": false,
                "guest": {
                    "firstName": "Ada",
                    "lastName": "Lovelace",
                    "email": "ada@example.com",
                    "phone": "+31 20 000 0000"
                },
                "payment": {
                    "cardHolder": "Ada Lovelace",
                    "cardNumber": "4111111111111111",
                    "expiry": "12/30",
                    "cvc": "737"
                }
            }
        }
    }"#;

    #[test]
    fn parses_destinations_and_defaults() {
        let fixtures = HotelFixtures::parse(FIXTURE).unwrap();
        assert_eq!(fixtures.destinations.len(), 3);

        let lisbon = &fixtures.destinations[1];
        assert_eq!(lisbon.check_in_offset_days, 14);
        assert_eq!(lisbon.nights, 2);

        let data = fixtures.booking_data(lisbon).unwrap();
        assert_eq!(data.destination, "Lisbon");
        assert_eq!((data.check_out - data.check_in).num_days(), 2);
        assert!(!data.skip_payment);
        assert_eq!(data.guest.first_name, "Ada");
        assert_eq!(data.payment.cvc, "737");
    }

    #[test]
    fn destination_overrides_win_over_common_data() {
        let fixtures = HotelFixtures::parse(FIXTURE).unwrap();
        let oslo = fixtures
            .destinations
            .iter()
            .find(|d| d.name == "Oslo")
            .unwrap();

        let data = fixtures.booking_data(oslo).unwrap();
        assert!(data.skip_payment);
        // Untouched defaults survive the merge.
        assert_eq!(data.guest.email, "ada@example.com");
        assert_eq!(data.raw["skipPayment"], serde_json::json!(true));
    }

    #[test]
    fn generated_guest_fills_only_missing_fields() {
        let fixtures = HotelFixtures::parse(
            r#"{ "hotels": { "destinations": [ { "name": "Riga" } ],
                 "commonData": { "guest": { "firstName": "Kept" } } } }"#,
        )
        .unwrap();
        let data = fixtures
            .booking_data(&fixtures.destinations[0])
            .unwrap()
            .with_generated_guest();

        assert_eq!(data.guest.first_name, "Kept");
        assert!(!data.guest.last_name.is_empty());
        assert!(data.guest.email.contains('@'));
    }

    #[test]
    fn store_caches_by_filename() {
        let path = std::env::temp_dir().join(format!("bookwright-fixture-{}.json", uuid::Uuid::new_v4()));
        std::fs::write(&path, FIXTURE).unwrap();

        let store = FixtureStore::new();
        let first = store.load(&path).unwrap();

        // Corrupt the file on disk; the cache must still serve the parse.
        std::fs::write(&path, "not json").unwrap();
        let second = store.load(&path).unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        std::fs::remove_file(&path).ok();
    }
}
