use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One advertising episode for an address.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub transaction_id: String,
    pub date: Option<NaiveDate>,
    pub price: Option<f64>,
    pub first_price: Option<f64>,
    pub last_price: Option<f64>,
    pub days_on_market: Option<i64>,
}

/// Full advertising history keyed by address, each sequence ordered by date.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransactionHistory {
    by_address: BTreeMap<String, Vec<TransactionRecord>>,
}

impl TransactionHistory {
    pub(crate) fn insert(&mut self, address_id: String, records: Vec<TransactionRecord>) {
        self.by_address.insert(address_id, records);
    }

    pub fn for_address(&self, address_id: &str) -> &[TransactionRecord] {
        self.by_address
            .get(address_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Most recent dated transaction that carries a price.
    pub fn current(&self, address_id: &str) -> Option<&TransactionRecord> {
        self.for_address(address_id)
            .iter()
            .rev()
            .find(|record| record.date.is_some() && record.price.is_some())
    }

    pub fn len(&self) -> usize {
        self.by_address.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_address.is_empty()
    }

    pub fn transaction_count(&self) -> usize {
        self.by_address.values().map(Vec::len).sum()
    }
}
