// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use super::FxIndexSet;

/// Offset of a string in the profile's string table. Offset 0 is always the
/// empty string, which pprof treats as synonymous with "no string".
///
/// Never interchangeable with [`LocationId`]: one indexes the string table,
/// the other names location/function records.
///
/// [`LocationId`]: crate::internal::LocationId
#[derive(Clone, Copy, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[repr(transparent)]
pub struct StringId(u32);

impl StringId {
    pub const ZERO: Self = Self(0);

    /// Converts an insertion offset into an id, loss-lessly. Interning more
    /// than u32::MAX distinct strings is not representable; by then the
    /// protobuf 2 GiB message limit is long exceeded anyway.
    pub fn from_offset(offset: usize) -> Self {
        #[allow(clippy::expect_used)]
        Self(u32::try_from(offset).expect("StringId to fit into a u32"))
    }

    /// The value stored in pprof string-index fields.
    #[inline]
    pub fn to_raw_id(self) -> i64 {
        i64::from(self.0)
    }

    #[inline]
    pub fn to_offset(self) -> usize {
        self.0 as usize
    }
}

/// Holds unique strings and hands out [`StringId`]s that correspond to the
/// order the strings were first interned.
///
/// The table holds the empty string at id 0 from construction, so the id-0
/// contract can't be broken by a caller forgetting to intern it first.
pub struct StringTable {
    strings: FxIndexSet<Box<str>>,
}

impl Default for StringTable {
    fn default() -> Self {
        Self::new()
    }
}

impl StringTable {
    pub fn new() -> Self {
        let mut strings = FxIndexSet::default();
        // Even a minimal profile holds "", five sample types, two units,
        // and a name per field; skip the tiny first growths.
        strings.reserve(32);
        strings.insert(Box::from(""));
        Self { strings }
    }

    /// Returns the number of strings currently held in the table.
    #[inline]
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize {
        self.strings.len()
    }

    /// Adds the string to the table if it isn't present already, and
    /// returns the [`StringId`] corresponding to the order in which it was
    /// first interned.
    pub fn intern(&mut self, str: &str) -> StringId {
        match self.strings.get_index_of(str) {
            Some(offset) => StringId::from_offset(offset),
            None => {
                let (offset, _inserted) = self.strings.insert_full(Box::from(str));
                debug_assert!(_inserted);
                StringId::from_offset(offset)
            }
        }
    }

    /// The strings in id order. This sequence is exactly the profile's
    /// string table.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.strings.iter().map(AsRef::as_ref)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::HashSet;

    #[test]
    fn test_basics() {
        let mut table = StringTable::new();
        // The empty string should already be present.
        assert_eq!(1, table.len());
        assert_eq!(StringId::ZERO, table.intern(""));

        let id = table.intern("payload");
        assert_eq!(StringId::from_offset(1), id);
        assert_eq!(2, table.len());

        // Re-interning changes nothing.
        assert_eq!(id, table.intern("payload"));
        assert_eq!(2, table.len());
    }

    #[track_caller]
    fn test_from_src(src: &[&str]) {
        let mut table = StringTable::new();
        let n_strings = src.len();
        for string in src {
            table.intern(string);
        }
        assert_eq!(n_strings, table.len());

        // Re-inserting doesn't change the size.
        for string in src {
            table.intern(string);
        }
        assert_eq!(n_strings, table.len());

        // Check that they are ordered correctly when iterating.
        let mut actual_iter = table.iter();
        let mut expected_iter = src.iter();
        while let (Some(expected), Some(actual)) = (expected_iter.next(), actual_iter.next()) {
            assert_eq!(*expected, actual);
        }

        // The iterators should be exhausted at this point.
        assert_eq!(None, expected_iter.next());
        assert_eq!(None, actual_iter.next());
    }

    #[test]
    fn test_small_set_of_strings() {
        let cases: &[_] = &[
            "",
            "protos",
            "count",
            "max_size",
            "bytes",
            "min_size",
            "median",
            "total_size",
            "packet",
            "timestamp_ns",
            "track_event",
            "debug_annotations",
        ];
        test_from_src(cases);
    }

    #[test]
    fn distinct_strings_get_distinct_ids() {
        let mut table = StringTable::new();
        let a = table.intern("a");
        let b = table.intern("b");
        assert_ne!(a, b);
        assert_eq!(a, table.intern("a"));
        assert_eq!(b, table.intern("b"));
    }

    proptest! {
        /// The table must behave like an ordered set: compare against a
        /// golden model built from std collections.
        #[test]
        fn matches_golden_model(strings in proptest::collection::vec(".{0,12}", 0..48)) {
            let mut golden_list = vec![String::new()];
            let mut golden_set = HashSet::from([String::new()]);
            let mut table = StringTable::new();

            for string in &strings {
                prop_assert_eq!(table.len(), golden_list.len());
                if golden_set.insert(string.clone()) {
                    golden_list.push(string.clone());
                }

                let id = table.intern(string);
                prop_assert_eq!(string, &golden_list[id.to_offset()]);
            }
            prop_assert_eq!(table.len(), golden_list.len());

            // Check that the strings remain in order.
            for (expected, actual) in golden_list.iter().zip(table.iter()) {
                prop_assert_eq!(expected, actual);
            }
        }
    }
}
