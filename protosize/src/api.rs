// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Boundary types shared with whatever produces the size samples.

use crate::collections::FxIndexMap;

/// Ordered field names from the message root down to one traversal
/// position. Repeated occurrences of a field, and the same field reached
/// through different parent instances, share a single path.
pub type FieldPath = Vec<String>;

/// Per-path occurrence sizes, as handed over by the walker. Insertion
/// ordered, so one input yields the same sample order on every run. Every
/// size list is non-empty by contract; the assembler refuses violations.
pub type SampleSet = FxIndexMap<FieldPath, Vec<u64>>;

/// A (type, unit) pair naming one position of the sample value tuple.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct ValueType<'a> {
    pub r#type: &'a str,
    pub unit: &'a str,
}

impl<'a> ValueType<'a> {
    #[inline]
    pub const fn new(r#type: &'a str, unit: &'a str) -> Self {
        Self { r#type, unit }
    }
}
