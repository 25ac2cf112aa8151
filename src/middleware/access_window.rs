//! Time-window access gate.
//!
//! Rejects requests whose wall-clock time of day falls outside a configured
//! interval, before any business logic runs. The check is a pure function of
//! (time of day, window): no shared state, no concurrency concerns.
//!
//! # Known Limitation: No Midnight Wraparound
//!
//! The check is `start <= now <= end`, inclusive on both ends. A window with
//! `start > end` (say 22:00 to 02:00) therefore matches nothing, rather than
//! wrapping past midnight. Config validation warns about such a window but
//! keeps it as configured instead of guessing at wraparound semantics.

use chrono::NaiveTime;

use super::context::RequestContext;
use super::gate::{Gate, GateDecision, Rejection};

/// An allowed access interval, fixed at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccessWindow {
    /// Inclusive start of the allowed interval.
    pub start: NaiveTime,
    /// Inclusive end of the allowed interval.
    pub end: NaiveTime,
}

impl AccessWindow {
    /// Create a window from two times of day.
    pub fn new(start: NaiveTime, end: NaiveTime) -> Self {
        Self { start, end }
    }

    /// Whether `now` falls inside the window, inclusive on both ends.
    pub fn contains(&self, now: NaiveTime) -> bool {
        self.start <= now && now <= self.end
    }

    /// Client-facing rejection message for this window, e.g.
    /// "Access to messaging is only allowed between 6PM and 9PM."
    pub fn rejection_message(&self) -> String {
        format!(
            "Access to messaging is only allowed between {} and {}.",
            format_time_of_day(self.start),
            format_time_of_day(self.end)
        )
    }
}

/// Render a time of day the way humans write it: "6PM", or "6:30PM" when the
/// minutes matter.
fn format_time_of_day(t: NaiveTime) -> String {
    use chrono::Timelike;
    if t.minute() == 0 && t.second() == 0 {
        t.format("%-I%p").to_string()
    } else {
        t.format("%-I:%M%p").to_string()
    }
}

/// Gate enforcing the access window.
#[derive(Debug, Clone)]
pub struct TimeWindowGate {
    window: AccessWindow,
    message: String,
}

impl TimeWindowGate {
    /// Build the gate; the rejection message is rendered once here.
    pub fn new(window: AccessWindow) -> Self {
        let message = window.rejection_message();
        Self { window, message }
    }
}

impl Gate for TimeWindowGate {
    fn name(&self) -> &'static str {
        "time_window"
    }

    fn decide(&self, ctx: &RequestContext) -> GateDecision {
        if self.window.contains(ctx.time_of_day()) {
            GateDecision::Allow
        } else {
            GateDecision::Reject(Rejection::OutsideAccessWindow {
                message: self.message.clone(),
            })
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn hms(h: u32, m: u32, s: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, s).unwrap()
    }

    fn evening_window() -> AccessWindow {
        AccessWindow::new(hms(18, 0, 0), hms(21, 0, 0))
    }

    #[test]
    fn test_inside_window_allowed() {
        let w = evening_window();
        assert!(w.contains(hms(19, 30, 0)));
    }

    #[test]
    fn test_boundaries_are_inclusive() {
        let w = evening_window();
        assert!(w.contains(hms(18, 0, 0)));
        assert!(w.contains(hms(21, 0, 0)));
    }

    #[test]
    fn test_just_outside_is_rejected() {
        let w = evening_window();
        assert!(!w.contains(hms(17, 59, 59)));
        assert!(!w.contains(hms(21, 0, 1)));
    }

    #[test]
    fn test_wrapping_window_matches_nothing() {
        // start > end cannot express "overnight"; documented limitation.
        let w = AccessWindow::new(hms(22, 0, 0), hms(2, 0, 0));
        assert!(!w.contains(hms(23, 0, 0)));
        assert!(!w.contains(hms(1, 0, 0)));
        assert!(!w.contains(hms(12, 0, 0)));
    }

    #[test]
    fn test_default_rejection_message_literal() {
        let w = evening_window();
        assert_eq!(
            w.rejection_message(),
            "Access to messaging is only allowed between 6PM and 9PM."
        );
    }

    #[test]
    fn test_rejection_message_with_minutes() {
        let w = AccessWindow::new(hms(8, 30, 0), hms(17, 0, 0));
        assert_eq!(
            w.rejection_message(),
            "Access to messaging is only allowed between 8:30AM and 5PM."
        );
    }

    #[test]
    fn test_gate_decision_matches_window() {
        use crate::middleware::gate::GateDecision;
        use axum::body::Body;
        use axum::http::Request;

        let gate = TimeWindowGate::new(AccessWindow::new(hms(0, 0, 0), hms(23, 59, 59)));
        let req = Request::builder().body(Body::empty()).unwrap();
        let ctx = crate::middleware::context::RequestContext::from_request(&req);

        // A full-day window admits whatever time the test runs at.
        assert_eq!(gate.decide(&ctx), GateDecision::Allow);
    }
}
