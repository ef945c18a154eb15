mod domain;
mod runs;
mod summary;

pub use domain::{BookingStatus, DailyObservation, ObservationWindow};
pub use summary::{summarize_property, PropertySummary};

use crate::analysis::partition::{parallel_map_merge, partition_by_key};
use tracing::info;

/// Summarises the whole ledger, one record per listing with in-window rows.
///
/// Listings are sharded by id across the rayon pool; the output is ordered by
/// `property_id` whatever the shard count.
pub fn summarize(
    observations: Vec<DailyObservation>,
    window: &ObservationWindow,
    shards: usize,
) -> Vec<PropertySummary> {
    let rows = observations.len();
    let buckets = partition_by_key(observations, shards, |row| row.property_id.as_str());

    let summaries = parallel_map_merge(
        buckets,
        |bucket| summary::summarize_shard(bucket, window),
        |a: &PropertySummary, b: &PropertySummary| a.property_id.cmp(&b.property_id),
    );

    info!(
        rows,
        shards,
        summaries = summaries.len(),
        "summarized booking ledger"
    );
    summaries
}
