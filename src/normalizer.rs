//! Field resolution for loosely-typed itinerary records.
//!
//! The API reports the same fact under several alternate names and shapes.
//! Everything downstream (filter, sort, render) reads the resolved
//! [`Itinerary`] built here instead of probing raw fields again.

use chrono::{DateTime, NaiveDateTime};

use crate::model::{Itinerary, LegView, RawItinerary, RawLeg, RawPlace, RawPrice};

/// Rendered for an unparsable or missing timestamp.
pub const TIME_PLACEHOLDER: &str = "—";
/// Rendered when neither carrier field resolves.
pub const UNKNOWN_CARRIER: &str = "Unknown carrier";

pub fn normalize(raw: &RawItinerary) -> Itinerary {
    let default_leg = RawLeg::default();
    Itinerary {
        carrier_name: carrier_name(raw).map(str::to_string),
        flight_label: flight_label(raw),
        price: price(raw),
        outbound: leg_view(raw.legs.first().unwrap_or(&default_leg)),
        return_leg: raw.legs.get(1).map(leg_view),
    }
}

/// `stopCount` if present, else the length of the `stops` sequence, else 0.
pub fn stop_count(leg: &RawLeg) -> u32 {
    leg.stop_count
        .or_else(|| leg.stops.as_ref().map(|s| s.len() as u32))
        .unwrap_or(0)
}

/// `durationInMinutes` if present, else `duration`.
pub fn duration_minutes(leg: &RawLeg) -> Option<i64> {
    leg.duration_in_minutes.or(leg.duration)
}

/// Carrier shown in the result list and offered by the airline filter:
/// operating carrier of the first outbound segment, falling back to the
/// marketing carrier of that same segment.
pub fn carrier_name(raw: &RawItinerary) -> Option<&str> {
    let seg = raw.legs.first()?.segments.first()?;
    seg.operating_carrier
        .as_ref()
        .and_then(|c| c.name.as_deref())
        .or_else(|| seg.marketing_carrier.as_ref().and_then(|c| c.name.as_deref()))
}

/// `price.raw` if present, else `price` itself when numeric.
pub fn price(raw: &RawItinerary) -> Option<f64> {
    match raw.price.as_ref()? {
        RawPrice::Amount(v) => Some(*v),
        RawPrice::Tagged { raw } => *raw,
        RawPrice::Other(_) => None,
    }
}

fn flight_label(raw: &RawItinerary) -> Option<String> {
    let seg = raw.legs.first()?.segments.first()?;
    let number = seg.flight_number.as_deref()?;
    let code = seg
        .operating_carrier
        .as_ref()
        .and_then(|c| c.alternate_id.as_deref())?;
    Some(format!("{code}{number}"))
}

fn leg_view(leg: &RawLeg) -> LegView {
    let duration = duration_minutes(leg);
    LegView {
        depart_time: time_label(leg.departure.as_deref(), leg.departure_date_time.as_deref()),
        arrive_time: time_label(leg.arrival.as_deref(), leg.arrival_date_time.as_deref()),
        origin_label: place_label(leg.origin.as_ref()),
        dest_label: place_label(leg.destination.as_ref()),
        stop_count: stop_count(leg),
        duration_minutes: duration,
        duration_label: duration_label(duration),
    }
}

fn place_label(place: Option<&RawPlace>) -> String {
    place
        .and_then(|p| p.display_code.as_deref().or(p.name.as_deref()))
        .unwrap_or("")
        .to_string()
}

/// `7h 5m` style label; empty for a missing or non-positive duration rather
/// than `0h 0m`.
fn duration_label(minutes: Option<i64>) -> String {
    match minutes {
        Some(m) if m > 0 => format!("{}h {}m", m / 60, m % 60),
        _ => String::new(),
    }
}

fn time_label(primary: Option<&str>, fallback: Option<&str>) -> String {
    primary
        .or(fallback)
        .and_then(parse_time)
        .unwrap_or_else(|| TIME_PLACEHOLDER.to_string())
}

/// The API emits bare `YYYY-MM-DDTHH:MM:SS` local timestamps; RFC 3339 is
/// accepted too.
fn parse_time(value: &str) -> Option<String> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.format("%H:%M").to_string());
    }
    NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S")
        .ok()
        .map(|dt| dt.format("%H:%M").to_string())
}
