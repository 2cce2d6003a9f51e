//! REST client for the sky-scrapper flight API (RapidAPI).
//!
//! Read-only GETs against a fixed host. Failures are terminal for the
//! request: the status and body are surfaced verbatim, there is no retry.

use reqwest::{Client, StatusCode};
use serde_json::Value;
use thiserror::Error;

use crate::model::{RawAirport, RawItinerary, SearchCriteria};

pub const RAPID_HOST: &str = "sky-scrapper.p.rapidapi.com";
const AUTOCOMPLETE_URL: &str = "https://sky-scrapper.p.rapidapi.com/api/v1/flights/searchAirport";
const SEARCH_URL: &str = "https://sky-scrapper.p.rapidapi.com/api/v2/flights/searchFlights";

/// Autocomplete queries shorter than this never hit the network.
pub const MIN_QUERY_LEN: usize = 2;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("API {status}: {body}")]
    Status { status: StatusCode, body: String },

    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

pub struct FlightApi {
    client: Client,
    api_key: String,
}

impl FlightApi {
    pub fn new(api_key: impl Into<String>) -> Self {
        FlightApi {
            client: Client::new(),
            api_key: api_key.into(),
        }
    }

    pub async fn search_airports(&self, query: &str) -> Result<Vec<RawAirport>, ApiError> {
        if query.chars().count() < MIN_QUERY_LEN {
            return Ok(Vec::new());
        }
        let payload = self
            .get(
                AUTOCOMPLETE_URL,
                &[
                    ("query", query.to_string()),
                    ("locale", "en-US".to_string()),
                ],
            )
            .await?;
        Ok(airport_list(payload))
    }

    pub async fn search_flights(
        &self,
        criteria: &SearchCriteria,
    ) -> Result<Vec<RawItinerary>, ApiError> {
        let payload = self.get(SEARCH_URL, &query_params(criteria)).await?;
        Ok(itinerary_list(payload))
    }

    async fn get(&self, url: &str, params: &[(&str, String)]) -> Result<Value, ApiError> {
        tracing::debug!(url, params = ?params.iter().map(|(k, _)| *k).collect::<Vec<_>>(), "GET");
        let response = self
            .client
            .get(url)
            .query(params)
            .header("x-rapidapi-key", &self.api_key)
            .header("x-rapidapi-host", RAPID_HOST)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Status { status, body });
        }
        Ok(response.json().await?)
    }
}

/// Empty or absent values are omitted from the query string entirely.
fn query_params(criteria: &SearchCriteria) -> Vec<(&'static str, String)> {
    let mut params = Vec::new();
    if let Some(origin) = &criteria.origin {
        params.push(("originSkyId", origin.sky_id.clone()));
        params.push(("originEntityId", origin.entity_id.clone()));
    }
    if let Some(dest) = &criteria.destination {
        params.push(("destinationSkyId", dest.sky_id.clone()));
        params.push(("destinationEntityId", dest.entity_id.clone()));
    }
    if let Some(date) = criteria.date {
        params.push(("date", date.to_string()));
    }
    if !criteria.one_way {
        if let Some(ret) = criteria.return_date {
            params.push(("returnDate", ret.to_string()));
        }
    }
    params.push(("cabinClass", criteria.cabin.wire().to_string()));
    params.push(("adults", criteria.adults.to_string()));
    params.push(("sortBy", criteria.sort_by.wire().to_string()));
    params.push(("currency", criteria.currency.clone()));
    params.push(("market", criteria.market.clone()));
    params.push(("countryCode", criteria.country_code.clone()));
    params
}

/// Some responses wrap the payload in a root `data` field, some do not.
fn unwrap_data(payload: Value) -> Value {
    match payload {
        Value::Object(mut map) if map.get("data").is_some_and(|v| !v.is_null()) => {
            map.remove("data").unwrap_or(Value::Null)
        }
        other => other,
    }
}

/// A missing or non-sequence `itineraries` field is an empty result set, not
/// an error. A malformed element degrades to the all-defaults record instead
/// of dropping the whole response.
fn itinerary_list(payload: Value) -> Vec<RawItinerary> {
    let data = unwrap_data(payload);
    let Some(items) = data.get("itineraries").and_then(Value::as_array) else {
        return Vec::new();
    };
    items
        .iter()
        .map(|item| serde_json::from_value(item.clone()).unwrap_or_default())
        .collect()
}

fn airport_list(payload: Value) -> Vec<RawAirport> {
    match unwrap_data(payload) {
        Value::Array(items) => items
            .into_iter()
            .map(|item| serde_json::from_value(item).unwrap_or_default())
            .collect(),
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::FlightParams;
    use chrono::NaiveDate;
    use serde_json::json;

    fn criteria() -> SearchCriteria {
        SearchCriteria {
            origin: Some(FlightParams {
                sky_id: "JFK".into(),
                entity_id: "95565058".into(),
            }),
            destination: Some(FlightParams {
                sky_id: "LHR".into(),
                entity_id: "95565050".into(),
            }),
            date: NaiveDate::from_ymd_opt(2026, 8, 10),
            return_date: NaiveDate::from_ymd_opt(2026, 8, 13),
            ..Default::default()
        }
    }

    #[test]
    fn query_params_include_round_trip_fields() {
        let params = query_params(&criteria());
        let get = |k: &str| params.iter().find(|(p, _)| *p == k).map(|(_, v)| v.as_str());
        assert_eq!(get("originSkyId"), Some("JFK"));
        assert_eq!(get("destinationEntityId"), Some("95565050"));
        assert_eq!(get("date"), Some("2026-08-10"));
        assert_eq!(get("returnDate"), Some("2026-08-13"));
        assert_eq!(get("cabinClass"), Some("economy"));
        assert_eq!(get("sortBy"), Some("best"));
        assert_eq!(get("market"), Some("en-US"));
    }

    #[test]
    fn one_way_omits_return_date() {
        let mut c = criteria();
        c.one_way = true;
        let params = query_params(&c);
        assert!(params.iter().all(|(k, _)| *k != "returnDate"));
    }

    #[test]
    fn unresolved_endpoints_are_omitted() {
        let params = query_params(&SearchCriteria::default());
        assert!(params.iter().all(|(k, _)| *k != "originSkyId"));
        assert!(params.iter().all(|(k, _)| *k != "date"));
    }

    #[test]
    fn itineraries_with_and_without_data_wrapper() {
        let wrapped = json!({ "data": { "itineraries": [{ "price": 100.0 }] } });
        assert_eq!(itinerary_list(wrapped).len(), 1);

        let bare = json!({ "itineraries": [{ "price": 100.0 }, { "price": 200.0 }] });
        assert_eq!(itinerary_list(bare).len(), 2);
    }

    #[test]
    fn missing_or_malformed_itineraries_treated_as_empty() {
        assert!(itinerary_list(json!({ "data": {} })).is_empty());
        assert!(itinerary_list(json!({ "itineraries": "oops" })).is_empty());
        assert!(itinerary_list(json!({ "data": null })).is_empty());
        assert!(itinerary_list(json!(null)).is_empty());
    }

    #[test]
    fn malformed_element_degrades_to_default_record() {
        let list = itinerary_list(json!({ "itineraries": [42, { "price": 10.0 }] }));
        assert_eq!(list.len(), 2);
        assert!(list[0].legs.is_empty());
        assert!(list[0].price.is_none());
    }

    #[test]
    fn airport_payload_shapes() {
        let wrapped = json!({ "data": [{ "skyId": "JFK" }] });
        assert_eq!(airport_list(wrapped).len(), 1);
        assert!(airport_list(json!({ "data": null })).is_empty());
        assert!(airport_list(json!({})).is_empty());
    }

    #[tokio::test]
    async fn short_autocomplete_query_skips_the_network() {
        // a single character must resolve to empty without any request
        let api = FlightApi::new("unused");
        let options = api.search_airports("j").await.unwrap();
        assert!(options.is_empty());
    }
}
