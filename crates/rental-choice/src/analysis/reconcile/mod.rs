mod history;
mod rules;
mod snapshot;

pub use history::{TransactionHistory, TransactionRecord};
pub use rules::{CanonicalProperty, CoordinateSource, Location};
pub use snapshot::{AmenityFlags, PropertySnapshot};

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{info, warn};

/// Canonical long-term properties plus the preserved advertising history.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Reconciliation {
    pub properties: Vec<CanonicalProperty>,
    pub history: TransactionHistory,
}

impl Reconciliation {
    pub fn property(&self, address_id: &str) -> Option<&CanonicalProperty> {
        self.properties
            .binary_search_by(|property| property.address_id.as_str().cmp(address_id))
            .ok()
            .map(|index| &self.properties[index])
    }
}

/// Groups snapshots by address and reconciles each address independently.
///
/// Output is ordered by address id, one canonical record per address.
pub fn reconcile(snapshots: Vec<PropertySnapshot>) -> Reconciliation {
    let total = snapshots.len();
    let mut by_address: BTreeMap<String, Vec<PropertySnapshot>> = BTreeMap::new();
    let mut missing_address = 0usize;

    for snapshot in snapshots {
        if snapshot.address_id.trim().is_empty() {
            missing_address += 1;
            continue;
        }
        by_address
            .entry(snapshot.address_id.clone())
            .or_default()
            .push(snapshot);
    }

    if missing_address > 0 {
        warn!(missing_address, "dropped snapshots without an address id");
    }

    let groups: Vec<(String, Vec<PropertySnapshot>)> = by_address.into_iter().collect();
    let reconciled: Vec<(CanonicalProperty, Vec<TransactionRecord>)> = groups
        .par_iter()
        .map(|(address_id, group)| rules::reconcile_address(address_id, group))
        .collect();

    let mut result = Reconciliation::default();
    for (canonical, records) in reconciled {
        result.history.insert(canonical.address_id.clone(), records);
        result.properties.push(canonical);
    }

    info!(
        snapshots = total,
        addresses = result.properties.len(),
        transactions = result.history.transaction_count(),
        "reconciled long-term snapshots"
    );
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_record_per_address_with_lookup() {
        let snapshot = |address: &str, transaction: &str, price: f64| PropertySnapshot {
            address_id: address.to_string(),
            transaction_id: transaction.to_string(),
            price: Some(price),
            first_advertised: chrono::NaiveDate::from_ymd_opt(2016, 2, 1),
            ..PropertySnapshot::default()
        };

        let result = reconcile(vec![
            snapshot("B", "t1", 500.0),
            snapshot("A", "t2", 450.0),
            snapshot("B", "t3", 520.0),
            snapshot(" ", "t4", 1.0),
        ]);

        assert_eq!(result.properties.len(), 2);
        assert_eq!(result.properties[0].address_id, "A");
        assert_eq!(result.property("B").map(|p| p.snapshot_count), Some(2));
        assert!(result.property("C").is_none());
        assert_eq!(result.history.for_address("B").len(), 2);
        assert_eq!(
            result.history.current("B").map(|record| record.transaction_id.as_str()),
            Some("t3")
        );
    }
}
