//! Free-text (typed or dictated) dashboard queries.

use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;

fn capacity_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(?i)\b(capacity|capacidad)\b").expect("valid regex"))
}

fn days_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(?i)\b(\d+)\s*(days?|d[ií]as?)\b").expect("valid regex"))
}

/// Action recognised in a free-text query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum QueryIntent {
    /// Show the capacity chart over the last `days` days
    ShowCapacityTrend { days: u32 },
    None,
}

impl QueryIntent {
    pub fn parse(text: &str) -> Self {
        if !capacity_pattern().is_match(text) {
            return QueryIntent::None;
        }
        days_pattern()
            .captures(text)
            .and_then(|caps| caps[1].parse::<u32>().ok())
            .filter(|days| *days > 0)
            .map_or(QueryIntent::None, |days| QueryIntent::ShowCapacityTrend { days })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capacity_with_days() {
        assert_eq!(
            QueryIntent::parse("show capacity for the last 7 days"),
            QueryIntent::ShowCapacityTrend { days: 7 }
        );
        assert_eq!(
            QueryIntent::parse("Capacidad de los últimos 30 días"),
            QueryIntent::ShowCapacityTrend { days: 30 }
        );
    }

    #[test]
    fn test_missing_parts_yield_none() {
        assert_eq!(QueryIntent::parse("capacity please"), QueryIntent::None);
        assert_eq!(QueryIntent::parse("last 5 days"), QueryIntent::None);
        assert_eq!(QueryIntent::parse(""), QueryIntent::None);
    }

    #[test]
    fn test_zero_days_is_ignored() {
        assert_eq!(QueryIntent::parse("capacity 0 days"), QueryIntent::None);
    }

    #[test]
    fn test_intent_serializes_with_action_tag() {
        let json = serde_json::to_value(QueryIntent::ShowCapacityTrend { days: 5 }).unwrap();
        assert_eq!(json["action"], "show_capacity_trend");
        assert_eq!(json["days"], 5);
    }
}
