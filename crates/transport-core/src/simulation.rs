//! Capacity scenario simulation.
//!
//! Projects a fleet capacity forward one day at a time from a fixed base,
//! growing by a constant amount per day.

use chrono::{Days, NaiveDate, Utc};
use serde::Serialize;

/// Capacity on the day the scenario starts.
pub const BASE_CAPACITY: f64 = 100.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScenarioPoint {
    /// Serialized as `YYYY-MM-DD`
    pub date: NaiveDate,
    pub capacity: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CapacityScenario {
    pub days: u32,
    pub daily_increment: f64,
}

impl Default for CapacityScenario {
    fn default() -> Self {
        Self {
            days: 5,
            daily_increment: 5.0,
        }
    }
}

impl CapacityScenario {
    pub fn new(days: u32, daily_increment: f64) -> Self {
        Self {
            days,
            daily_increment,
        }
    }

    /// One point per day after `start`: day `i` is dated `start + i` and
    /// holds `BASE_CAPACITY + daily_increment * i`.
    ///
    /// Stops early if a date would fall outside the calendar range.
    pub fn simulate(&self, start: NaiveDate) -> Vec<ScenarioPoint> {
        (1..=self.days)
            .map_while(|day| {
                let date = start.checked_add_days(Days::new(u64::from(day)))?;
                Some(ScenarioPoint {
                    date,
                    capacity: BASE_CAPACITY + self.daily_increment * f64::from(day),
                })
            })
            .collect()
    }

    /// [`simulate`](Self::simulate) starting from today's UTC date.
    pub fn simulate_from_today(&self) -> Vec<ScenarioPoint> {
        self.simulate(Utc::now().date_naive())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_default_scenario_grows_five_per_day() {
        let points = CapacityScenario::default().simulate(date(2024, 3, 1));

        assert_eq!(points.len(), 5);
        assert_eq!(points[0], ScenarioPoint { date: date(2024, 3, 2), capacity: 105.0 });
        assert_eq!(points[4], ScenarioPoint { date: date(2024, 3, 6), capacity: 125.0 });
    }

    #[test]
    fn test_dates_cross_month_end() {
        let points = CapacityScenario::new(3, 10.0).simulate(date(2024, 2, 28));
        let dates: Vec<_> = points.iter().map(|p| p.date).collect();
        assert_eq!(dates, [date(2024, 2, 29), date(2024, 3, 1), date(2024, 3, 2)]);
        assert_eq!(points[2].capacity, 130.0);
    }

    #[test]
    fn test_zero_days_is_empty() {
        assert!(CapacityScenario::new(0, 5.0).simulate(date(2024, 1, 1)).is_empty());
    }

    #[test]
    fn test_negative_increment_shrinks_capacity() {
        let points = CapacityScenario::new(2, -30.0).simulate(date(2024, 1, 1));
        assert_eq!(points[1].capacity, 40.0);
    }

    #[test]
    fn test_point_serializes_iso_date() {
        let point = ScenarioPoint {
            date: date(2024, 12, 31),
            capacity: 105.0,
        };
        let json = serde_json::to_value(point).unwrap();
        assert_eq!(json["date"], "2024-12-31");
        assert_eq!(json["capacity"], 105.0);
    }
}
