//! Debounced, superseding airport-suggestion lookups.
//!
//! One gate per input field. A lookup fires only after the input has been
//! quiescent for [`DEBOUNCE`]; an edit restarts the window and discards the
//! pending timer. Each issued lookup carries a generation token, and a
//! result arriving for anything but the newest issued lookup is ignored —
//! the in-flight request itself is not cancelled. The clock is passed in so
//! the policy tests without timers.

use std::time::{Duration, Instant};

use crate::api::MIN_QUERY_LEN;
use crate::model::RawAirport;

pub const DEBOUNCE: Duration = Duration::from_millis(300);

/// Ticket for one issued lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lookup {
    pub generation: u64,
    pub query: String,
}

#[derive(Debug, Default)]
pub struct SuggestGate {
    query: String,
    pending_since: Option<Instant>,
    issued: u64,
    options: Vec<RawAirport>,
}

impl SuggestGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records an edit to the input field and restarts the quiescence window.
    pub fn input(&mut self, text: &str, now: Instant) {
        self.query = text.to_string();
        self.pending_since = Some(now);
    }

    /// Time left until the pending edit becomes due, if any.
    pub fn ready_in(&self, now: Instant) -> Option<Duration> {
        let since = self.pending_since?;
        Some(DEBOUNCE.saturating_sub(now.duration_since(since)))
    }

    /// Issues a lookup once the input has been stable for the full window.
    /// A query below the minimum length clears the option list and never
    /// fires.
    pub fn poll(&mut self, now: Instant) -> Option<Lookup> {
        let since = self.pending_since?;
        if now.duration_since(since) < DEBOUNCE {
            return None;
        }
        self.pending_since = None;
        if self.query.chars().count() < MIN_QUERY_LEN {
            self.options.clear();
            return None;
        }
        self.issued += 1;
        Some(Lookup {
            generation: self.issued,
            query: self.query.clone(),
        })
    }

    /// Applies a lookup's results; a superseded generation is dropped.
    /// Returns whether the options were replaced.
    pub fn accept(&mut self, generation: u64, results: Vec<RawAirport>) -> bool {
        if generation != self.issued {
            tracing::debug!(generation, newest = self.issued, "dropping superseded lookup");
            return false;
        }
        self.options = results;
        true
    }

    pub fn options(&self) -> &[RawAirport] {
        &self.options
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn airports(n: usize) -> Vec<RawAirport> {
        (0..n)
            .map(|i| serde_json::from_value(json!({ "skyId": format!("A{i}") })).unwrap())
            .collect()
    }

    #[test]
    fn fires_only_after_quiescence() {
        let t0 = Instant::now();
        let mut gate = SuggestGate::new();
        gate.input("london", t0);

        assert_eq!(gate.poll(t0 + Duration::from_millis(100)), None);
        let lookup = gate.poll(t0 + DEBOUNCE).expect("due");
        assert_eq!(lookup.query, "london");

        // one edit, one firing
        assert_eq!(gate.poll(t0 + Duration::from_secs(5)), None);
    }

    #[test]
    fn edit_restarts_the_window() {
        let t0 = Instant::now();
        let mut gate = SuggestGate::new();
        gate.input("lo", t0);
        gate.input("lon", t0 + Duration::from_millis(200));

        // 150ms after the second edit: not due yet
        assert_eq!(gate.poll(t0 + Duration::from_millis(350)), None);
        let lookup = gate.poll(t0 + Duration::from_millis(500)).expect("due");
        assert_eq!(lookup.query, "lon");
    }

    #[test]
    fn short_query_clears_options_and_never_fires() {
        let t0 = Instant::now();
        let mut gate = SuggestGate::new();
        gate.input("london", t0);
        let lookup = gate.poll(t0 + DEBOUNCE).unwrap();
        assert!(gate.accept(lookup.generation, airports(3)));
        assert_eq!(gate.options().len(), 3);

        gate.input("j", t0 + Duration::from_secs(1));
        assert_eq!(gate.poll(t0 + Duration::from_secs(2)), None);
        assert!(gate.options().is_empty());
    }

    #[test]
    fn superseded_lookup_is_ignored() {
        let t0 = Instant::now();
        let mut gate = SuggestGate::new();
        gate.input("par", t0);
        let first = gate.poll(t0 + DEBOUNCE).unwrap();

        gate.input("paris", t0 + Duration::from_secs(1));
        let second = gate.poll(t0 + Duration::from_secs(2)).unwrap();

        // the older lookup resolves after the newer one was issued
        assert!(!gate.accept(first.generation, airports(5)));
        assert!(gate.options().is_empty());

        assert!(gate.accept(second.generation, airports(2)));
        assert_eq!(gate.options().len(), 2);
    }

    #[test]
    fn ready_in_counts_down() {
        let t0 = Instant::now();
        let mut gate = SuggestGate::new();
        assert_eq!(gate.ready_in(t0), None);
        gate.input("rome", t0);
        assert_eq!(gate.ready_in(t0), Some(DEBOUNCE));
        assert_eq!(
            gate.ready_in(t0 + Duration::from_millis(250)),
            Some(Duration::from_millis(50))
        );
        assert_eq!(gate.ready_in(t0 + Duration::from_secs(1)), Some(Duration::ZERO));
    }
}
