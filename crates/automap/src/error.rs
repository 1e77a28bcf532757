// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Mapping errors.
//!
//! Every error is fatal at the point where it occurs. Absent source members
//! and coercible scalar mismatches are recovered locally and never surface
//! here.

use thiserror::Error;

/// Error type returned by custom transformers and value providers.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Result alias for mapper operations.
pub type Result<T> = std::result::Result<T, MapperError>;

/// Mapper errors.
#[derive(Debug, Error)]
pub enum MapperError {
    #[error("Missing required constructor argument '{argument}' for class {class}")]
    MissingRequiredArgument { class: String, argument: String },

    #[error("Unknown discriminator value '{value}' in field '{field}' for {class}")]
    UnknownDiscriminatorValue {
        class: String,
        field: String,
        value: String,
    },

    #[error(
        "Discriminator field '{field}' of {class} is missing from the {source_kind} source"
    )]
    DiscriminatorFieldMissing {
        class: String,
        field: String,
        source_kind: String,
    },

    #[error("No member of union {union} matches a {value_kind} value")]
    NoMatchingUnionMember { union: String, value_kind: String },

    #[error("Cannot modify read-only member {class}::{member} of an existing target")]
    ReadOnlyTargetViolation { class: String, member: String },

    #[error("Member {class}::{member} does not accept null")]
    NullNotAllowed { class: String, member: String },

    #[error("Cannot convert {value_kind} value to {expected}")]
    IncompatibleValue { expected: String, value_kind: String },

    #[error("Unknown class: {0}")]
    UnknownClass(String),

    #[error("Unknown enum: {0}")]
    UnknownEnum(String),

    #[error("Cannot instantiate abstract class {0} without a discriminator match")]
    AbstractClass(String),

    #[error("Circular constructor dependency while building {0}")]
    CircularConstructor(String),

    #[error("Invalid mapping target: {0}")]
    InvalidTarget(String),

    #[error("Unknown transformer: {0}")]
    UnknownTransformer(String),

    #[error("Unknown value provider: {0}")]
    UnknownProvider(String),

    #[error("Transformer '{name}' failed: {source}")]
    Transformer {
        name: String,
        #[source]
        source: BoxError,
    },

    #[error("Value provider '{name}' failed: {source}")]
    Provider {
        name: String,
        #[source]
        source: BoxError,
    },
}

impl MapperError {
    pub(crate) fn incompatible(expected: impl ToString, value: &crate::value::Value) -> Self {
        Self::IncompatibleValue {
            expected: expected.to_string(),
            value_kind: value.kind_name().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;

    #[test]
    fn test_messages() {
        let err = MapperError::MissingRequiredArgument {
            class: "User".into(),
            argument: "id".into(),
        };
        assert_eq!(
            err.to_string(),
            "Missing required constructor argument 'id' for class User"
        );

        let err = MapperError::incompatible("int", &Value::from("abc"));
        assert_eq!(err.to_string(), "Cannot convert string value to int");
    }

    #[test]
    fn test_source_chain() {
        use std::error::Error as _;
        let err = MapperError::Transformer {
            name: "money".into(),
            source: "bad currency".into(),
        };
        assert_eq!(
            err.source().map(|s| s.to_string()),
            Some("bad currency".to_string())
        );
    }
}
