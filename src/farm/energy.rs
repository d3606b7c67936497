//! The in-page energy gauge and the tap-or-wait decision.

use std::time::Duration;

/// Portion of capacity that may be depleted before tapping pauses.
pub const DEPLETION_THRESHOLD: f64 = 0.25;

/// Seconds of regeneration per depleted unit (100 units in 30 s).
pub const REPLENISH_SECS_PER_UNIT: f64 = 0.3;

/// A fresh `(current, max)` read of the energy gauge. Never cached across
/// loop iterations; the page rewrites it on its own schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnergyReading {
    pub current: u32,
    pub max: u32,
}

/// What the worker does next given the latest reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NextStep {
    Tap,
    Wait(Duration),
}

impl EnergyReading {
    /// Parse the gauge label, e.g. `"1327 / 2000"`. The label is rewritten
    /// live and can be transiently empty or half-written; any such state
    /// yields `None`.
    pub fn parse(text: &str) -> Option<Self> {
        let (current, max) = text.split_once('/')?;
        let current = current.trim().parse().ok()?;
        let max: u32 = max.trim().parse().ok()?;
        if max == 0 {
            return None;
        }
        Some(Self { current, max })
    }

    pub fn depleted(&self) -> u32 {
        self.max.saturating_sub(self.current)
    }

    /// Tap while less than a quarter of capacity is gone; otherwise wait
    /// out regeneration. Exactly a quarter waits.
    pub fn next_step(&self) -> NextStep {
        if (self.depleted() as f64) < self.max as f64 * DEPLETION_THRESHOLD {
            NextStep::Tap
        } else {
            NextStep::Wait(self.replenish_wait())
        }
    }

    pub fn replenish_wait(&self) -> Duration {
        Duration::from_secs_f64(self.depleted() as f64 * REPLENISH_SECS_PER_UNIT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_label() {
        assert_eq!(
            EnergyReading::parse("1327/2000"),
            Some(EnergyReading { current: 1327, max: 2000 })
        );
    }

    #[test]
    fn parses_label_with_spaces() {
        assert_eq!(
            EnergyReading::parse(" 95 / 100 "),
            Some(EnergyReading { current: 95, max: 100 })
        );
    }

    #[test]
    fn rejects_empty_and_garbage() {
        assert_eq!(EnergyReading::parse(""), None);
        assert_eq!(EnergyReading::parse("1327"), None);
        assert_eq!(EnergyReading::parse("/"), None);
        assert_eq!(EnergyReading::parse("a/b"), None);
        assert_eq!(EnergyReading::parse("10/0"), None);
    }

    #[test]
    fn mostly_depleted_gauge_taps() {
        let reading = EnergyReading { current: 10, max: 100 };
        assert_eq!(reading.next_step(), NextStep::Tap);
    }

    #[test]
    fn nearly_full_gauge_taps() {
        let reading = EnergyReading { current: 76, max: 100 };
        assert_eq!(reading.next_step(), NextStep::Tap);
    }

    #[test]
    fn exact_quarter_depletion_waits() {
        let reading = EnergyReading { current: 75, max: 100 };
        assert!(matches!(reading.next_step(), NextStep::Wait(_)));
    }

    #[test]
    fn wait_is_proportional_to_depletion() {
        let reading = EnergyReading { current: 95, max: 100 };
        assert_eq!(reading.replenish_wait(), Duration::from_secs_f64(1.5));
    }

    #[test]
    fn full_capacity_regenerates_in_thirty_seconds_per_hundred() {
        let reading = EnergyReading { current: 0, max: 100 };
        assert_eq!(reading.replenish_wait(), Duration::from_secs(30));
    }

    #[test]
    fn current_above_max_still_taps() {
        let reading = EnergyReading { current: 120, max: 100 };
        assert_eq!(reading.depleted(), 0);
        assert_eq!(reading.next_step(), NextStep::Tap);
    }
}
