// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

mod field_stats;
mod field_table;
mod profile;

pub use field_stats::*;
pub use field_table::*;
pub use profile::*;
