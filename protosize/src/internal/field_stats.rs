// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use crate::api::ValueType;

/// Aggregated occurrence statistics for one field path.
///
/// pprof declares sample types and carries per-sample values in two
/// independently ordered arrays whose positions must line up; nothing in
/// the format checks that they do. Every piece of that positional contract
/// lives in this one type: the field order below, [`FieldStats::values`],
/// and [`FieldStats::sample_types`] describe the same five positions.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct FieldStats {
    pub count: u64,
    pub max_size: u64,
    pub min_size: u64,
    pub median: u64,
    pub total_size: u64,
}

impl FieldStats {
    /// The profile's sample type declarations, in value order.
    pub const fn sample_types() -> [ValueType<'static>; 5] {
        [
            ValueType::new("protos", "count"),
            ValueType::new("max_size", "bytes"),
            ValueType::new("min_size", "bytes"),
            ValueType::new("median", "bytes"),
            ValueType::new("total_size", "bytes"),
        ]
    }

    /// Aggregates one path's occurrence sizes.
    ///
    /// Errors when the list is empty. A path with zero occurrences breaks
    /// the walker contract; it is a programming error, not bad input, and
    /// is never recovered.
    pub fn from_sizes(mut sizes: Vec<u64>) -> anyhow::Result<Self> {
        anyhow::ensure!(!sizes.is_empty(), "field path recorded with zero size samples");
        sizes.sort_unstable();
        let count = sizes.len();
        // Upper-middle element for even counts, not an average. Consumers
        // depend on this exact selection.
        let median = sizes[count / 2];
        Ok(Self {
            count: count as u64,
            max_size: sizes[count - 1],
            min_size: sizes[0],
            median,
            total_size: sizes.iter().sum(),
        })
    }

    /// The sample's value tuple, position-matched to
    /// [`FieldStats::sample_types`].
    pub fn values(&self) -> [i64; 5] {
        [
            self.count as i64,
            self.max_size as i64,
            self.min_size as i64,
            self.median as i64,
            self.total_size as i64,
        ]
    }
}
