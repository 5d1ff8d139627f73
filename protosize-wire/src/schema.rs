// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use prost::Message;
use prost_types::field_descriptor_proto::Type;
use prost_types::{DescriptorProto, FileDescriptorSet};
use std::collections::HashMap;

#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    #[error("could not decode descriptor set: {0}")]
    InvalidDescriptorSet(#[from] prost::DecodeError),
    #[error("descriptor set contains no message types")]
    NoMessageTypes,
    #[error("unknown root message type '{0}'")]
    UnknownRootType(String),
}

/// How the walker should treat a field's payload.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum FieldKind {
    /// Scalar, enum, string, or bytes: measure, never descend.
    Scalar,
    /// Message-typed: measure, then descend into the payload. Holds the
    /// fully qualified name of the nested message type.
    Message(String),
}

/// One field of a message type, as the walker sees it.
#[derive(Clone, Debug)]
pub struct FieldSchema {
    pub name: String,
    pub kind: FieldKind,
}

/// One message type: its fields, looked up by field number.
#[derive(Clone, Debug, Default)]
pub struct MessageSchema {
    full_name: String,
    fields: HashMap<i32, FieldSchema>,
}

impl MessageSchema {
    pub fn full_name(&self) -> &str {
        &self.full_name
    }

    pub fn field(&self, number: i32) -> Option<&FieldSchema> {
        self.fields.get(&number)
    }
}

/// Every message type of a compiled descriptor set, nested types included,
/// indexed by fully qualified name ("pkg.Outer.Inner", no leading dot).
#[derive(Debug)]
pub struct SchemaIndex {
    messages: HashMap<String, MessageSchema>,
    /// The first message type of the set's last file. protoc writes the
    /// file it was asked to compile after that file's imports, so this is
    /// the natural default root.
    default_root: Option<String>,
}

impl SchemaIndex {
    pub fn from_descriptor_set_bytes(bytes: &[u8]) -> Result<Self, SchemaError> {
        let set = FileDescriptorSet::decode(bytes)?;
        let mut this = Self {
            messages: HashMap::new(),
            default_root: None,
        };
        for file in &set.file {
            for message in &file.message_type {
                this.index_message(join_name(file.package(), message.name()), message);
            }
            if let Some(first) = file.message_type.first() {
                this.default_root = Some(join_name(file.package(), first.name()));
            }
        }
        if this.messages.is_empty() {
            return Err(SchemaError::NoMessageTypes);
        }
        Ok(this)
    }

    fn index_message(&mut self, full_name: String, descriptor: &DescriptorProto) {
        for nested in &descriptor.nested_type {
            self.index_message(join_name(&full_name, nested.name()), nested);
        }
        let fields = descriptor
            .field
            .iter()
            .map(|field| {
                let kind = match field.r#type() {
                    // type_name is fully qualified with a leading dot when
                    // it comes out of protoc.
                    Type::Message => {
                        FieldKind::Message(field.type_name().trim_start_matches('.').to_string())
                    }
                    _ => FieldKind::Scalar,
                };
                let schema = FieldSchema {
                    name: field.name().to_string(),
                    kind,
                };
                (field.number(), schema)
            })
            .collect();
        self.messages.insert(
            full_name.clone(),
            MessageSchema { full_name, fields },
        );
    }

    pub fn message(&self, full_name: &str) -> Option<&MessageSchema> {
        self.messages.get(full_name)
    }

    /// Resolves the profiling root: the named type when one is given, the
    /// default root otherwise.
    pub fn resolve_root(&self, name: Option<&str>) -> Result<&MessageSchema, SchemaError> {
        let name = match name {
            Some(name) => name.trim_start_matches('.'),
            None => self
                .default_root
                .as_deref()
                .ok_or(SchemaError::NoMessageTypes)?,
        };
        self.messages
            .get(name)
            .ok_or_else(|| SchemaError::UnknownRootType(name.to_string()))
    }
}

fn join_name(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{prefix}.{name}")
    }
}
