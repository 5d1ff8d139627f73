// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

#![cfg_attr(not(test), deny(clippy::panic))]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]
#![cfg_attr(not(test), deny(clippy::todo))]
#![cfg_attr(not(test), deny(clippy::unimplemented))]

//! Schema-driven measurement of serialized protobuf payloads.
//!
//! [`schema`] resolves a compiled descriptor set (the artifact of
//! `protoc --descriptor_set_out`) into an index of message types, and
//! [`walk`] traverses raw message bytes against that index, producing the
//! per-field-path size samples the `protosize` core assembles into a
//! profile. No compiled-in type is needed for the payload.

pub mod schema;
pub mod walk;

pub use schema::{MessageSchema, SchemaError, SchemaIndex};
pub use walk::{compute_size_profile, WalkError};
