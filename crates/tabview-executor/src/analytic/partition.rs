//! Record partitioning for analytic functions
//!
//! Groups record indices by PARTITION BY key. Partitions come out in the
//! order their key was first seen, and each keeps its records in view order.

use indexmap::IndexMap;

/// Record indices sharing one partition key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Partition {
    pub rows: Vec<usize>,
}

/// Partition record indices by their serialized keys.
///
/// `keys[i]` is the key of record `i`. Without PARTITION BY every key is the
/// empty string, which yields a single partition.
pub fn partition_records(keys: Vec<String>) -> Vec<Partition> {
    let mut buckets: IndexMap<String, Vec<usize>> = IndexMap::new();
    for (i, key) in keys.into_iter().enumerate() {
        buckets.entry(key).or_default().push(i);
    }
    buckets.into_values().map(|rows| Partition { rows }).collect()
}
