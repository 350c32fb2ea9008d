//! Desk clock — wall time in production, a frozen instant in tests.
//!
//! RULE: Workflow code never calls `Utc::now()` directly.
//! Every timestamp (comments, payment references, milestones,
//! session expiry) flows through the desk's clock.

use chrono::{DateTime, Duration, Utc};

#[derive(Debug, Clone, PartialEq)]
pub struct DeskClock {
    frozen: Option<DateTime<Utc>>,
}

impl DeskClock {
    pub fn system() -> Self {
        Self { frozen: None }
    }

    /// A clock pinned to `at` until advanced.
    pub fn frozen(at: DateTime<Utc>) -> Self {
        Self { frozen: Some(at) }
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.frozen.unwrap_or_else(Utc::now)
    }

    /// Move a frozen clock forward. No-op on the system clock.
    pub fn advance(&mut self, by: Duration) {
        if let Some(at) = self.frozen.as_mut() {
            *at += by;
        }
    }
}

impl Default for DeskClock {
    fn default() -> Self {
        Self::system()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn frozen_clock_only_moves_when_advanced() {
        let start = Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap();
        let mut clock = DeskClock::frozen(start);
        assert_eq!(clock.now(), start);
        clock.advance(Duration::days(2));
        assert_eq!(clock.now(), start + Duration::days(2));
    }
}
