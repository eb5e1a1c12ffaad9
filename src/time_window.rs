use chrono::NaiveTime;
use tracing::debug;

use crate::error::Rejection;
use crate::gate::Stage;
use crate::models::RequestDescriptor;

// Admits requests inside [allowed_start, allowed_end), wrapping past midnight.
// Stateless: the decision depends only on the arrival time of day.
#[derive(Clone, Debug)]
pub struct TimeWindowGate {
    allowed_start: NaiveTime,
    allowed_end: NaiveTime,
}

impl TimeWindowGate {
    pub fn new(allowed_start: NaiveTime, allowed_end: NaiveTime) -> Self {
        Self {
            allowed_start,
            allowed_end,
        }
    }

    // start == end admits every time of day
    pub fn admits(&self, time: NaiveTime) -> bool {
        time >= self.allowed_start || time < self.allowed_end
    }
}

impl Stage for TimeWindowGate {
    fn name(&self) -> &'static str {
        "time_window"
    }

    fn check(&self, request: &RequestDescriptor) -> Result<(), Rejection> {
        let time = request.received_at.time();
        if self.admits(time) {
            Ok(())
        } else {
            debug!(%time, start = %self.allowed_start, end = %self.allowed_end, "outside allowed window");
            Err(Rejection::OutOfAllowedWindow)
        }
    }
}
