//! Derives the filtered, sorted result view from the raw search response.
//!
//! `derive_view` is pure: same inputs, same ordered output. The caller's raw
//! list is never mutated; a fresh normalized list is built on every call.

use std::collections::BTreeSet;

use crate::model::{FilterState, Itinerary, RawItinerary, SortKey, StopFilter};
use crate::normalizer;

pub fn derive_view(raw: &[RawItinerary], filters: &FilterState, sort: SortKey) -> Vec<Itinerary> {
    let mut view: Vec<Itinerary> = raw.iter().map(normalizer::normalize).collect();

    match filters.stops {
        StopFilter::Any => {}
        StopFilter::Direct => view.retain(|it| it.outbound.stop_count == 0),
        StopFilter::OneStop => view.retain(|it| it.outbound.stop_count == 1),
    }

    // Records with no resolvable carrier drop out while the filter is active.
    if !filters.airlines.is_empty() {
        view.retain(|it| {
            it.carrier_name
                .as_deref()
                .is_some_and(|name| filters.airlines.contains(name))
        });
    }

    // Sorts are stable, so ties keep the upstream relevance order. `Best`
    // trusts that order entirely.
    match sort {
        SortKey::Best => {}
        SortKey::PriceLow => view.sort_by(|a, b| price_key(a).total_cmp(&price_key(b))),
        SortKey::DurationShort => view.sort_by_key(total_duration),
    }

    view
}

/// An unresolved price sorts last, it is not an error.
fn price_key(it: &Itinerary) -> f64 {
    it.price.unwrap_or(f64::INFINITY)
}

/// Outbound plus return; a missing leg duration contributes 0.
fn total_duration(it: &Itinerary) -> i64 {
    it.outbound.duration_minutes.unwrap_or(0)
        + it
            .return_leg
            .as_ref()
            .and_then(|l| l.duration_minutes)
            .unwrap_or(0)
}

/// Sorted, deduplicated carrier names over the *unfiltered* list, so the
/// filter panel always offers every airline seen in the last search.
pub fn available_airlines(raw: &[RawItinerary]) -> Vec<String> {
    let names: BTreeSet<&str> = raw.iter().filter_map(normalizer::carrier_name).collect();
    names.into_iter().map(str::to_string).collect()
}
