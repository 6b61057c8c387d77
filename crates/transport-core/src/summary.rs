//! Fleet statistics shown on the dashboard cards.

use std::collections::BTreeMap;

use serde::Serialize;
use transport_gateway::{Record, TransportType};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FleetSummary {
    pub total: usize,
    /// Every transport type is present, with zero counts included
    pub by_type: BTreeMap<TransportType, usize>,
    /// Sum of capacities in kilograms
    pub total_capacity: f64,
}

impl FleetSummary {
    pub fn from_records(records: &[Record]) -> Self {
        let mut by_type: BTreeMap<TransportType, usize> =
            TransportType::ALL.into_iter().map(|t| (t, 0)).collect();
        for record in records {
            *by_type.entry(record.kind).or_default() += 1;
        }

        Self {
            total: records.len(),
            by_type,
            total_capacity: records.iter().map(|r| r.capacity).sum(),
        }
    }

    pub fn count(&self, kind: TransportType) -> usize {
        self.by_type.get(&kind).copied().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use transport_gateway::{NewRecord, RecordId};

    #[test]
    fn test_summary_counts_every_type() {
        let records = vec![
            NewRecord::new("Truck", 500.0, TransportType::Land).with_id(RecordId::new("1")),
            NewRecord::new("Van", 250.0, TransportType::Land).with_id(RecordId::new("2")),
            NewRecord::new("Ferry", 12000.0, TransportType::Sea).with_id(RecordId::new("3")),
        ];
        let summary = FleetSummary::from_records(&records);

        assert_eq!(summary.total, 3);
        assert_eq!(summary.count(TransportType::Land), 2);
        assert_eq!(summary.count(TransportType::Air), 0);
        assert_eq!(summary.count(TransportType::Sea), 1);
        assert_eq!(summary.total_capacity, 12750.0);
    }

    #[test]
    fn test_empty_summary() {
        let summary = FleetSummary::from_records(&[]);
        assert_eq!(summary.total, 0);
        assert_eq!(summary.by_type.len(), 3);
        assert_eq!(summary.total_capacity, 0.0);
    }
}
