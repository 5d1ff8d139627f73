// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use crate::api::SampleSet;
use crate::collections::string_table::{StringId, StringTable};
use crate::internal::{FieldStats, FieldTable};
use anyhow::Context;
use prost::Message;
use protosize_pprof as pprof;

/// Assembles one pprof size profile from one walker-produced [`SampleSet`].
///
/// Assembly is a pipeline whose phase order is load-bearing: emitting
/// samples interns location ids, emitting location records interns the
/// function-name strings, and only after that can the string table be
/// snapshotted. The phases are separate methods so the sequence is spelled
/// out in [`SizeProfile::assemble`] instead of hiding in statement order.
pub struct SizeProfile {
    strings: StringTable,
    fields: FieldTable,
    profile: pprof::Profile,
}

impl SizeProfile {
    /// Builds and encodes the complete profile in one shot. Any failure
    /// abandons the whole profile; there is no partial output and no retry.
    pub fn assemble(samples: SampleSet) -> anyhow::Result<Vec<u8>> {
        let mut this = Self::new()?;
        this.add_sample_types();
        this.add_samples(samples)?;
        this.add_locations_and_functions();
        Ok(this.finish())
    }

    fn new() -> anyhow::Result<Self> {
        let mut strings = StringTable::new();
        // Every pprof field that means "no string" relies on id 0 being the
        // empty string. A violation here is a broken contract, never input.
        anyhow::ensure!(
            strings.intern("") == StringId::ZERO,
            "empty string must intern to string id 0"
        );
        Ok(Self {
            strings,
            fields: FieldTable::new(),
            profile: pprof::Profile::default(),
        })
    }

    fn add_sample_types(&mut self) {
        for value_type in FieldStats::sample_types() {
            let item = pprof::ValueType {
                r#type: self.strings.intern(value_type.r#type).to_raw_id(),
                unit: self.strings.intern(value_type.unit).to_raw_id(),
            };
            self.profile.sample_types.push(item);
        }
    }

    fn add_samples(&mut self, samples: SampleSet) -> anyhow::Result<()> {
        for (path, sizes) in samples {
            // Leaf first, the way the innermost frame leads a call stack.
            let location_ids: Vec<u64> = path
                .iter()
                .rev()
                .map(|name| self.fields.intern(name).to_raw_id())
                .collect();
            let stats = FieldStats::from_sizes(sizes)
                .with_context(|| format!("field path '{}'", path.join(".")))?;
            self.profile.samples.push(pprof::Sample {
                location_ids,
                values: stats.values().to_vec(),
                labels: Vec::new(),
            });
        }
        Ok(())
    }

    /// One location and one function per distinct field name, sharing one
    /// id. pprof splits the two so a location can carry inline frames and
    /// per-call-site detail; field names need neither, so the mapping
    /// stays 1:1 with a single synthetic line.
    fn add_locations_and_functions(&mut self) {
        for (id, name) in self.fields.iter() {
            let id = id.to_raw_id();
            self.profile.locations.push(pprof::Location {
                id,
                lines: vec![pprof::Line {
                    function_id: id,
                    line: 0,
                }],
                ..Default::default()
            });
            self.profile.functions.push(pprof::Function {
                id,
                name: self.strings.intern(name).to_raw_id(),
                ..Default::default()
            });
        }
    }

    fn finish(mut self) -> Vec<u8> {
        // Function names were interned while emitting the records above, so
        // the string table can only be snapshotted now, strictly last.
        self.profile.string_table = self.strings.iter().map(String::from).collect();
        self.profile.encode_to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// The fixed strings every profile holds, in interning order: "" first,
    /// then the sample type and unit names with "bytes" deduplicated.
    const FIXED_STRINGS: &[&str] = &[
        "",
        "protos",
        "count",
        "max_size",
        "bytes",
        "min_size",
        "median",
        "total_size",
    ];

    fn sample_set(entries: &[(&[&str], &[u64])]) -> SampleSet {
        entries
            .iter()
            .map(|(path, sizes)| {
                let path = path.iter().map(|s| s.to_string()).collect();
                (path, sizes.to_vec())
            })
            .collect()
    }

    fn assemble(entries: &[(&[&str], &[u64])]) -> pprof::Profile {
        let buffer = SizeProfile::assemble(sample_set(entries)).unwrap();
        pprof::Profile::decode(buffer.as_slice()).unwrap()
    }

    fn string(profile: &pprof::Profile, id: i64) -> &str {
        &profile.string_table[usize::try_from(id).unwrap()]
    }

    /// The function name behind a location id, following the
    /// location -> line -> function indirection.
    fn field_name(profile: &pprof::Profile, location_id: u64) -> &str {
        let location = profile
            .locations
            .iter()
            .find(|l| l.id == location_id)
            .unwrap();
        assert_eq!(1, location.lines.len());
        let function = profile
            .functions
            .iter()
            .find(|f| f.id == location.lines[0].function_id)
            .unwrap();
        string(profile, function.name)
    }

    #[test]
    fn sample_types_are_fixed_and_ordered() {
        let profile = assemble(&[]);
        let declared: Vec<_> = profile
            .sample_types
            .iter()
            .map(|vt| (string(&profile, vt.r#type), string(&profile, vt.unit)))
            .collect();
        assert_eq!(
            vec![
                ("protos", "count"),
                ("max_size", "bytes"),
                ("min_size", "bytes"),
                ("median", "bytes"),
                ("total_size", "bytes"),
            ],
            declared
        );
    }

    #[test]
    fn empty_sample_set_still_yields_a_wellformed_profile() {
        let profile = assemble(&[]);
        assert!(profile.samples.is_empty());
        assert!(profile.locations.is_empty());
        assert!(profile.functions.is_empty());
        assert_eq!(FIXED_STRINGS, profile.string_table.as_slice());
    }

    #[test]
    fn single_path_sample() {
        let profile = assemble(&[(&["a"], &[10, 30, 20])]);

        assert_eq!(1, profile.samples.len());
        let sample = &profile.samples[0];
        assert_eq!(vec![3, 30, 10, 20, 60], sample.values);
        assert_eq!(1, sample.location_ids.len());
        assert_eq!("a", field_name(&profile, sample.location_ids[0]));

        assert_eq!(1, profile.locations.len());
        assert_eq!(1, profile.functions.len());
    }

    #[test]
    fn nested_path_stack_is_leaf_first() {
        let profile = assemble(&[(&["a", "b"], &[5])]);

        let sample = &profile.samples[0];
        assert_eq!(vec![1, 5, 5, 5, 5], sample.values);
        let stack: Vec<_> = sample
            .location_ids
            .iter()
            .map(|&id| field_name(&profile, id))
            .collect();
        assert_eq!(vec!["b", "a"], stack);
    }

    #[test]
    fn location_interning_is_by_field_name_not_by_path() {
        let profile = assemble(&[(&["x"], &[1]), (&["y", "x"], &[2])]);

        // "x" appears leaf-most in both stacks and must reuse one id.
        let x_standalone = profile.samples[0].location_ids[0];
        let x_nested = profile.samples[1].location_ids[0];
        assert_eq!(x_standalone, x_nested);
        assert_eq!("x", field_name(&profile, x_nested));

        // Two distinct names observed, so two location/function records.
        assert_eq!(2, profile.locations.len());
        assert_eq!(2, profile.functions.len());
    }

    #[test]
    fn location_ids_are_dense_from_one() {
        let profile = assemble(&[
            (&["packet", "event", "name"], &[4]),
            (&["packet", "timestamp"], &[9, 9]),
        ]);

        let mut location_ids: Vec<_> = profile.locations.iter().map(|l| l.id).collect();
        location_ids.sort_unstable();
        assert_eq!(vec![1, 2, 3, 4], location_ids);

        let function_ids: Vec<_> = profile.functions.iter().map(|f| f.id).collect();
        assert_eq!(4, function_ids.len());
        for location in &profile.locations {
            assert_eq!(location.id, location.lines[0].function_id);
        }
    }

    #[test]
    fn string_table_is_first_seen_order_and_complete() {
        // "median" doubles as a field name; it must not be re-added.
        let profile = assemble(&[(&["packet", "median"], &[7])]);

        assert_eq!(&profile.string_table[..FIXED_STRINGS.len()], FIXED_STRINGS);

        // Field names intern during location emission, after the fixed
        // strings. "median" was already present; only "packet" is new.
        assert_eq!(
            1,
            profile
                .string_table
                .iter()
                .filter(|s| s.as_str() == "median")
                .count()
        );
        assert!(profile.string_table.contains(&"packet".to_string()));

        // No duplicates anywhere, and every function name resolves.
        let unique: std::collections::HashSet<_> = profile.string_table.iter().collect();
        assert_eq!(unique.len(), profile.string_table.len());
        for function in &profile.functions {
            let name = string(&profile, function.name);
            assert!(!name.is_empty());
        }
    }

    #[test]
    fn empty_size_list_aborts_assembly() {
        let samples = sample_set(&[(&["a"], &[])]);
        assert!(SizeProfile::assemble(samples).is_err());
    }

    #[test]
    fn sample_order_follows_sample_set_order() {
        let profile = assemble(&[(&["b"], &[2]), (&["a"], &[1])]);
        assert_eq!(vec![1, 2, 2, 2, 2], profile.samples[0].values);
        assert_eq!(vec![1, 1, 1, 1, 1], profile.samples[1].values);
        assert_eq!("b", field_name(&profile, profile.samples[0].location_ids[0]));
        assert_eq!("a", field_name(&profile, profile.samples[1].location_ids[0]));
    }
}
