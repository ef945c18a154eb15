//! Parallel map over key-sharded work with an order-insensitive merge.
//!
//! Items are assigned to shards by a stable hash of their key, each shard is
//! processed on the rayon pool with no shared mutable state, and the shard
//! outputs are concatenated and re-sorted by key. The final ordering never
//! depends on which shard finished first or on how many shards were used.

use rayon::prelude::*;

/// FNV-1a over the key bytes. Stable across runs and platforms.
pub fn shard_of(key: &str, shards: usize) -> usize {
    const OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0000_0100_0000_01b3;

    let hash = key.bytes().fold(OFFSET, |hash, byte| {
        (hash ^ u64::from(byte)).wrapping_mul(PRIME)
    });
    (hash % shards.max(1) as u64) as usize
}

/// Splits `items` into `shards` buckets by key, preserving relative order within a bucket.
pub fn partition_by_key<T, K>(items: impl IntoIterator<Item = T>, shards: usize, key: K) -> Vec<Vec<T>>
where
    K: Fn(&T) -> &str,
{
    let shards = shards.max(1);
    let mut buckets: Vec<Vec<T>> = (0..shards).map(|_| Vec::new()).collect();
    for item in items {
        let index = shard_of(key(&item), shards);
        buckets[index].push(item);
    }
    buckets
}

/// Runs `work` on every shard in parallel and merges the outputs ordered by `order`.
pub fn parallel_map_merge<T, O, W, S>(shards: Vec<Vec<T>>, work: W, order: S) -> Vec<O>
where
    T: Send,
    O: Send,
    W: Fn(Vec<T>) -> Vec<O> + Sync + Send,
    S: Fn(&O, &O) -> std::cmp::Ordering,
{
    let mut merged: Vec<O> = shards
        .into_par_iter()
        .map(work)
        .collect::<Vec<Vec<O>>>()
        .into_iter()
        .flatten()
        .collect();
    merged.sort_by(order);
    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shard_assignment_is_stable_and_bounded() {
        for shards in 1..6 {
            let first = shard_of("listing-42", shards);
            assert_eq!(first, shard_of("listing-42", shards));
            assert!(first < shards);
        }
        assert_eq!(shard_of("anything", 0), 0);
    }

    #[test]
    fn merge_output_does_not_depend_on_shard_count() {
        let keys: Vec<String> = (0..40).map(|i| format!("p{:02}", (i * 7) % 40)).collect();

        let run = |shards: usize| {
            let buckets = partition_by_key(keys.clone(), shards, |key| key.as_str());
            parallel_map_merge(
                buckets,
                |bucket| bucket.into_iter().map(|key| key.to_uppercase()).collect(),
                |a: &String, b: &String| a.cmp(b),
            )
        };

        let single = run(1);
        assert_eq!(single.len(), 40);
        assert_eq!(single, run(3));
        assert_eq!(single, run(16));
    }

    #[test]
    fn partition_keeps_relative_order_within_a_key() {
        let rows = vec![("a", 1), ("b", 2), ("a", 3), ("a", 4)];
        let buckets = partition_by_key(rows, 4, |row| row.0);
        let bucket = buckets
            .into_iter()
            .find(|bucket| bucket.iter().any(|row| row.0 == "a"))
            .expect("bucket holding key a");
        let a_values: Vec<i32> = bucket
            .iter()
            .filter(|row| row.0 == "a")
            .map(|row| row.1)
            .collect();
        assert_eq!(a_values, vec![1, 3, 4]);
    }
}
