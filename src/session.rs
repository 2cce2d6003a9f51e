//! Search-session state: the raw result set, the user's filter and sort
//! selection, and the request-generation guard.
//!
//! Results are replaced wholesale on every completed search. Filters and the
//! sort key deliberately survive searches; only an explicit reset clears
//! them. Completions are keyed by generation so a slow, superseded search
//! can never overwrite the result set of a newer one — the newest issued
//! search wins, not the last one to resolve.

use crate::model::{FilterState, Itinerary, RawItinerary, SearchCriteria, SortKey, StopFilter};
use crate::pipeline;

#[derive(Debug, Clone, Default, PartialEq)]
pub enum SearchStatus {
    #[default]
    Idle,
    Loading,
    Complete,
    Failed(String),
}

#[derive(Debug, Default)]
pub struct SearchSession {
    results: Vec<RawItinerary>,
    filters: FilterState,
    sort: SortKey,
    generation: u64,
    status: SearchStatus,
}

impl SearchSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a new search: bumps the generation, clears the previous result
    /// set, enters the loading state. Returns the token the completion must
    /// present.
    pub fn begin_search(&mut self) -> u64 {
        self.generation += 1;
        self.results.clear();
        self.status = SearchStatus::Loading;
        self.generation
    }

    /// Applies the outcome of the search started with the given token. A
    /// completion carrying a stale generation is dropped untouched; returns
    /// whether the outcome was applied.
    pub fn complete_search(
        &mut self,
        generation: u64,
        outcome: Result<Vec<RawItinerary>, String>,
    ) -> bool {
        if generation != self.generation {
            tracing::debug!(generation, current = self.generation, "dropping stale completion");
            return false;
        }
        match outcome {
            Ok(items) => {
                self.results = items;
                self.status = SearchStatus::Complete;
            }
            Err(message) => {
                self.results.clear();
                self.status = SearchStatus::Failed(message);
            }
        }
        true
    }

    /// Filtered, sorted view of the current results. Pure over session state.
    pub fn view(&self) -> Vec<Itinerary> {
        pipeline::derive_view(&self.results, &self.filters, self.sort)
    }

    /// Every airline seen in the last search, independent of active filters.
    pub fn airlines(&self) -> Vec<String> {
        pipeline::available_airlines(&self.results)
    }

    pub fn results(&self) -> &[RawItinerary] {
        &self.results
    }

    pub fn status(&self) -> &SearchStatus {
        &self.status
    }

    pub fn filters(&self) -> &FilterState {
        &self.filters
    }

    pub fn set_stop_filter(&mut self, stops: StopFilter) {
        self.filters.stops = stops;
    }

    pub fn toggle_airline(&mut self, name: &str) {
        if !self.filters.airlines.remove(name) {
            self.filters.airlines.insert(name.to_string());
        }
    }

    pub fn set_sort(&mut self, sort: SortKey) {
        self.sort = sort;
    }

    pub fn reset_filters(&mut self) {
        self.filters.reset();
    }
}

/// Search preconditions: an API key, both endpoints resolved, a departure
/// date, and for round trips a return date. Without a key no network call is
/// attempted at all.
pub fn can_search(criteria: &SearchCriteria, has_key: bool) -> bool {
    has_key
        && criteria.origin.is_some()
        && criteria.destination.is_some()
        && criteria.date.is_some()
        && (criteria.one_way || criteria.return_date.is_some())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::FlightParams;
    use chrono::NaiveDate;
    use serde_json::json;

    fn results(v: serde_json::Value) -> Vec<RawItinerary> {
        serde_json::from_value(v).unwrap()
    }

    #[test]
    fn search_lifecycle() {
        let mut session = SearchSession::new();
        assert_eq!(*session.status(), SearchStatus::Idle);

        let generation = session.begin_search();
        assert_eq!(*session.status(), SearchStatus::Loading);

        let applied = session.complete_search(
            generation,
            Ok(results(json!([{ "price": 100.0 }]))),
        );
        assert!(applied);
        assert_eq!(*session.status(), SearchStatus::Complete);
        assert_eq!(session.results().len(), 1);
    }

    #[test]
    fn stale_completion_is_dropped() {
        let mut session = SearchSession::new();
        let first = session.begin_search();
        let second = session.begin_search();

        // the superseded search resolves late with data
        assert!(!session.complete_search(first, Ok(results(json!([{ "price": 1.0 }])))));
        assert!(session.results().is_empty());
        assert_eq!(*session.status(), SearchStatus::Loading);

        assert!(session.complete_search(second, Ok(results(json!([{}, {}])))));
        assert_eq!(session.results().len(), 2);
    }

    #[test]
    fn failure_clears_results_and_keeps_message() {
        let mut session = SearchSession::new();
        let generation = session.begin_search();
        session.complete_search(generation, Ok(results(json!([{}]))));

        let generation = session.begin_search();
        session.complete_search(generation, Err("API 403: quota exceeded".to_string()));
        assert!(session.results().is_empty());
        assert_eq!(
            *session.status(),
            SearchStatus::Failed("API 403: quota exceeded".to_string())
        );
    }

    #[test]
    fn filters_survive_a_new_search() {
        let mut session = SearchSession::new();
        session.set_stop_filter(StopFilter::Direct);
        session.toggle_airline("United");

        let generation = session.begin_search();
        session.complete_search(generation, Ok(Vec::new()));

        assert_eq!(session.filters().stops, StopFilter::Direct);
        assert!(session.filters().airlines.contains("United"));

        session.reset_filters();
        assert_eq!(*session.filters(), FilterState::default());
    }

    #[test]
    fn toggle_airline_round_trips() {
        let mut session = SearchSession::new();
        session.toggle_airline("KLM");
        assert!(session.filters().airlines.contains("KLM"));
        session.toggle_airline("KLM");
        assert!(session.filters().airlines.is_empty());
    }

    #[test]
    fn view_applies_session_filters() {
        let mut session = SearchSession::new();
        let generation = session.begin_search();
        session.complete_search(
            generation,
            Ok(results(json!([
                { "legs": [{ "stopCount": 0 }] },
                { "legs": [{ "stopCount": 1 }] },
            ]))),
        );
        session.set_stop_filter(StopFilter::Direct);
        assert_eq!(session.view().len(), 1);
        assert_eq!(session.airlines().len(), 0);
    }

    #[test]
    fn can_search_requires_a_key_above_all() {
        let complete = SearchCriteria {
            origin: Some(FlightParams {
                sky_id: "JFK".into(),
                entity_id: "1".into(),
            }),
            destination: Some(FlightParams {
                sky_id: "LHR".into(),
                entity_id: "2".into(),
            }),
            date: NaiveDate::from_ymd_opt(2026, 8, 10),
            return_date: NaiveDate::from_ymd_opt(2026, 8, 13),
            ..Default::default()
        };
        assert!(can_search(&complete, true));
        assert!(!can_search(&complete, false));

        let mut one_way = complete.clone();
        one_way.one_way = true;
        one_way.return_date = None;
        assert!(can_search(&one_way, true));

        let mut round_without_return = complete.clone();
        round_without_return.return_date = None;
        assert!(!can_search(&round_without_return, true));

        let mut unresolved = complete;
        unresolved.destination = None;
        assert!(!can_search(&unresolved, true));
    }
}
