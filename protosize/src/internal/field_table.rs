// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use crate::collections::{small_non_zero_pprof_id, FxIndexSet};
use std::num::NonZeroU32;

/// Identifies one location record (and, through the deliberate 1:1 mapping,
/// its function record). Ids start at 1; pprof reserves 0 for "no location".
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[repr(transparent)]
pub struct LocationId(NonZeroU32);

impl LocationId {
    pub fn from_offset(offset: usize) -> Self {
        #[allow(clippy::expect_used)]
        Self(small_non_zero_pprof_id(offset).expect("LocationId to fit into a u32"))
    }

    /// The value stored in pprof location-id fields.
    #[inline]
    pub fn to_raw_id(self) -> u64 {
        u64::from(self.0.get())
    }
}

/// Interns bare field names into [`LocationId`]s.
///
/// Keyed by name alone, not by path: every occurrence of a field named
/// "timestamp", anywhere in the schema tree, collapses onto one
/// location/function pair. Nothing is stored beyond the names themselves;
/// the table is iterated exactly once, when the location and function
/// records are emitted.
#[derive(Default)]
pub struct FieldTable {
    names: FxIndexSet<Box<str>>,
}

impl FieldTable {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Returns the id of a known field name, or assigns the next one
    /// (current count + 1, so the first location gets 1, never 0).
    pub fn intern(&mut self, name: &str) -> LocationId {
        match self.names.get_index_of(name) {
            Some(offset) => LocationId::from_offset(offset),
            None => {
                let (offset, _inserted) = self.names.insert_full(Box::from(name));
                debug_assert!(_inserted);
                LocationId::from_offset(offset)
            }
        }
    }

    /// (id, name) pairs in first-interned order.
    pub fn iter(&self) -> impl Iterator<Item = (LocationId, &str)> {
        self.names
            .iter()
            .enumerate()
            .map(|(offset, name)| (LocationId::from_offset(offset), name.as_ref()))
    }
}
