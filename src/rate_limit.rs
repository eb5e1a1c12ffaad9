use axum::http::Method;
use chrono::{DateTime, FixedOffset, TimeDelta};
use dashmap::DashMap;
use tracing::debug;

use crate::error::Rejection;
use crate::gate::Stage;
use crate::models::{ClientKey, RequestDescriptor};

/// Sliding-window quota: at most `max_requests` counted requests per client within
/// the trailing `window`.
///
/// Only methods listed in `methods` are counted; everything else passes untouched.
/// Per-client timestamps are pruned lazily on that client's next counted request.
/// Keys are never evicted, so the map grows with the number of distinct clients.
pub struct RateGate {
    max_requests: usize,
    window: TimeDelta,
    methods: Vec<Method>,
    records: DashMap<ClientKey, Vec<DateTime<FixedOffset>>>, // ClientKey -> arrival times
}

impl RateGate {
    pub fn new(max_requests: usize, window_seconds: u32, methods: Vec<Method>) -> Self {
        Self {
            max_requests,
            window: TimeDelta::seconds(i64::from(window_seconds)),
            methods,
            records: DashMap::new(),
        }
    }

    pub fn max_requests(&self) -> usize {
        self.max_requests
    }

    pub fn applies_to(&self, method: &Method) -> bool {
        self.methods.contains(method)
    }

    // Prune, count, then record. The entry guard keeps the shard locked for the
    // whole sequence so two requests from one client cannot both take the last slot.
    pub fn admit(&self, client: &ClientKey, now: DateTime<FixedOffset>) -> Result<(), Rejection> {
        let mut records = self.records.entry(client.clone()).or_default();

        records.retain(|&at| now - at < self.window);

        if records.len() >= self.max_requests {
            return Err(Rejection::RateLimitExceeded {
                max_requests: self.max_requests,
            });
        }

        records.push(now);
        debug!(client = %client, used = records.len(), max = self.max_requests, "request counted");
        Ok(())
    }

    // How many timestamps are currently retained for the client (no pruning)
    pub fn recorded(&self, client: &ClientKey) -> usize {
        self.records.get(client).map_or(0, |records| records.len())
    }

    pub fn tracked_clients(&self) -> usize {
        self.records.len()
    }
}

impl Stage for RateGate {
    fn name(&self) -> &'static str {
        "rate"
    }

    fn check(&self, request: &RequestDescriptor) -> Result<(), Rejection> {
        if !self.applies_to(&request.method) {
            return Ok(());
        }
        self.admit(&request.client, request.received_at)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::{Clock, ManualClock};
    use chrono::NaiveTime;
    use std::sync::Arc;
    use std::thread;

    fn clock() -> ManualClock {
        ManualClock::at_time_of_day(NaiveTime::from_hms_opt(22, 0, 0).unwrap())
    }

    fn post_gate(max: usize, window: u32) -> RateGate {
        RateGate::new(max, window, vec![Method::POST])
    }

    #[test]
    fn sixth_request_in_a_minute_is_rejected_until_the_first_ages_out() {
        let gate = post_gate(5, 60);
        let clock = clock();
        let start = clock.now();
        let client = ClientKey::from("1.1.1.1");

        for offset in 0..5 {
            clock.set(start + TimeDelta::seconds(offset));
            assert_eq!(gate.admit(&client, clock.now()), Ok(()), "request {}", offset + 1);
        }

        clock.set(start + TimeDelta::seconds(5));
        assert_eq!(
            gate.admit(&client, clock.now()),
            Err(Rejection::RateLimitExceeded { max_requests: 5 })
        );
        // the rejected request was not recorded
        assert_eq!(gate.recorded(&client), 5);

        // first request is exactly 60s old: `now - t < window` no longer holds
        clock.set(start + TimeDelta::seconds(60));
        assert_eq!(gate.admit(&client, clock.now()), Ok(()));
        assert_eq!(gate.recorded(&client), 5);
    }

    #[test]
    fn two_per_ten_seconds_scenario() {
        let gate = post_gate(2, 10);
        let clock = clock();
        let start = clock.now();
        let client = ClientKey::from("1.1.1.1");

        let outcomes: Vec<bool> = [0, 3, 6, 9, 12]
            .into_iter()
            .map(|t| gate.admit(&client, start + TimeDelta::seconds(t)).is_ok())
            .collect();

        // t=6 and t=9 still see 0 and 3 in the window; by t=12 only 3 remains
        assert_eq!(outcomes, vec![true, true, false, false, true]);
    }

    #[test]
    fn clients_have_independent_quotas() {
        let gate = post_gate(5, 60);
        let now = clock().now();
        let a = ClientKey::from("10.0.0.1");
        let b = ClientKey::from("10.0.0.2");

        for _ in 0..5 {
            assert!(gate.admit(&a, now).is_ok());
        }
        assert!(gate.admit(&a, now).is_err());
        assert!(gate.admit(&b, now).is_ok());
        assert_eq!(gate.tracked_clients(), 2);
    }

    #[test]
    fn non_mutating_requests_bypass_and_are_not_counted() {
        let gate = post_gate(1, 60);
        let now = clock().now();
        let post = RequestDescriptor::new(Method::POST, "/api/messages", now).with_client("1.1.1.1");
        let get = RequestDescriptor::new(Method::GET, "/api/messages", now).with_client("1.1.1.1");

        assert_eq!(gate.check(&post), Ok(()));
        assert!(gate.check(&post).is_err());

        for _ in 0..3 {
            assert_eq!(gate.check(&get), Ok(()));
        }
        assert_eq!(gate.recorded(&ClientKey::from("1.1.1.1")), 1);
    }

    #[test]
    fn idle_clients_are_kept_after_pruning() {
        let gate = post_gate(1, 10);
        let start = clock().now();
        let client = ClientKey::from("1.1.1.1");

        assert!(gate.admit(&client, start).is_ok());
        assert!(gate.admit(&client, start + TimeDelta::seconds(30)).is_ok());
        assert_eq!(gate.recorded(&client), 1);
        assert_eq!(gate.tracked_clients(), 1);
    }

    #[test]
    fn zero_quota_rejects_every_counted_request() {
        let gate = post_gate(0, 60);
        let client = ClientKey::default();
        assert!(gate.admit(&client, clock().now()).is_err());
        assert_eq!(gate.recorded(&client), 0);
    }

    #[test]
    fn concurrent_requests_never_exceed_quota() {
        let gate = Arc::new(post_gate(5, 60));
        let now = clock().now();

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let gate = Arc::clone(&gate);
                thread::spawn(move || gate.admit(&ClientKey::from("1.1.1.1"), now).is_ok())
            })
            .collect();
        let admitted = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|ok| *ok)
            .count();

        assert_eq!(admitted, 5);
        assert_eq!(gate.recorded(&ClientKey::from("1.1.1.1")), 5);
    }
}
