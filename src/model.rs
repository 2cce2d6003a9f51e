use std::collections::BTreeSet;

use chrono::NaiveDate;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use serde_json::Value;

// Raw wire records. The API controls these shapes, not us: every field is
// optional and several have alternate spellings. Decoding must never fail a
// whole record over one bad field.

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RawItinerary {
    pub legs: Vec<RawLeg>,
    pub price: Option<RawPrice>,
}

/// `price` arrives either as a bare number or as an object with a numeric
/// `raw` field. Anything else resolves to no price.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawPrice {
    Amount(f64),
    Tagged {
        #[serde(default)]
        raw: Option<f64>,
    },
    Other(Value),
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RawLeg {
    pub origin: Option<RawPlace>,
    pub destination: Option<RawPlace>,
    pub departure: Option<String>,
    pub departure_date_time: Option<String>,
    pub arrival: Option<String>,
    pub arrival_date_time: Option<String>,
    pub stop_count: Option<u32>,
    pub stops: Option<Vec<Value>>,
    pub duration_in_minutes: Option<i64>,
    pub duration: Option<i64>,
    pub segments: Vec<RawSegment>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RawPlace {
    pub display_code: Option<String>,
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RawSegment {
    pub operating_carrier: Option<RawCarrier>,
    pub marketing_carrier: Option<RawCarrier>,
    pub flight_number: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RawCarrier {
    pub name: Option<String>,
    pub alternate_id: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RawAirport {
    pub sky_id: Option<String>,
    pub entity_id: Option<String>,
    pub presentation: Option<RawPresentation>,
    pub navigation: Option<RawNavigation>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RawPresentation {
    pub title: Option<String>,
    pub suggestion_title: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RawNavigation {
    pub relevant_flight_params: Option<RawFlightParams>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RawFlightParams {
    pub sky_id: Option<String>,
    pub entity_id: Option<String>,
}

impl RawAirport {
    /// The ids the flight-search endpoint wants live under
    /// `navigation.relevantFlightParams`, not at the top level.
    pub fn flight_params(&self) -> Option<FlightParams> {
        let params = self.navigation.as_ref()?.relevant_flight_params.as_ref()?;
        Some(FlightParams {
            sky_id: params.sky_id.clone()?,
            entity_id: params.entity_id.clone()?,
        })
    }

    pub fn title(&self) -> &str {
        self.presentation
            .as_ref()
            .and_then(|p| p.title.as_deref())
            .unwrap_or("")
    }

    pub fn subtitle(&self) -> &str {
        self.presentation
            .as_ref()
            .and_then(|p| p.suggestion_title.as_deref())
            .unwrap_or("")
    }
}

// Resolved records. Built once per input change by the normalizer; filter,
// sort, and render all read these instead of re-probing raw fields.

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Itinerary {
    pub carrier_name: Option<String>,
    pub flight_label: Option<String>,
    pub price: Option<f64>,
    pub outbound: LegView,
    pub return_leg: Option<LegView>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LegView {
    pub depart_time: String,
    pub arrive_time: String,
    pub origin_label: String,
    pub dest_label: String,
    pub stop_count: u32,
    pub duration_minutes: Option<i64>,
    pub duration_label: String,
}

/// User-owned filter selection. Lives for the whole session and survives new
/// searches; only an explicit reset clears it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterState {
    pub stops: StopFilter,
    pub airlines: BTreeSet<String>,
}

impl FilterState {
    pub fn reset(&mut self) {
        *self = FilterState::default();
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum StopFilter {
    #[default]
    Any,
    Direct,
    #[value(name = "onestop")]
    OneStop,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum SortKey {
    #[default]
    Best,
    #[value(name = "price_low")]
    PriceLow,
    #[value(name = "duration_short")]
    DurationShort,
}

impl SortKey {
    /// Value the search endpoint expects for `sortBy`.
    pub fn wire(self) -> &'static str {
        match self {
            SortKey::Best => "best",
            SortKey::PriceLow => "price_low",
            SortKey::DurationShort => "duration_short",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum CabinClass {
    #[default]
    Economy,
    #[value(name = "premium_economy")]
    PremiumEconomy,
    Business,
    First,
}

impl CabinClass {
    pub fn wire(self) -> &'static str {
        match self {
            CabinClass::Economy => "economy",
            CabinClass::PremiumEconomy => "premium_economy",
            CabinClass::Business => "business",
            CabinClass::First => "first",
        }
    }
}

/// A picked airport, reduced to the two ids the search endpoint needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlightParams {
    pub sky_id: String,
    pub entity_id: String,
}

#[derive(Debug, Clone)]
pub struct SearchCriteria {
    pub origin: Option<FlightParams>,
    pub destination: Option<FlightParams>,
    pub date: Option<NaiveDate>,
    pub return_date: Option<NaiveDate>,
    pub one_way: bool,
    pub adults: u32,
    pub cabin: CabinClass,
    pub sort_by: SortKey,
    pub currency: String,
    pub market: String,
    pub country_code: String,
}

impl Default for SearchCriteria {
    fn default() -> Self {
        SearchCriteria {
            origin: None,
            destination: None,
            date: None,
            return_date: None,
            one_way: false,
            adults: 1,
            cabin: CabinClass::Economy,
            sort_by: SortKey::Best,
            currency: "USD".to_string(),
            market: "en-US".to_string(),
            country_code: "US".to_string(),
        }
    }
}
