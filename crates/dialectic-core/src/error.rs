//! Error types for query compilation, specification building and rendering.

use thiserror::Error;

/// The stage of the pipeline an [`Error`] was raised from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Compiling a condition into a predicate.
    Compile,
    /// Accumulating clauses into a specification.
    Build,
    /// Emitting SQL text for a dialect.
    Render,
}

/// Errors raised by the engine.
///
/// Every variant is a deterministic failure of the input it was given, so
/// none of them is worth retrying.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// The condition has a shape the compiler does not understand.
    #[error("unsupported expression: {node_kind}")]
    UnsupportedExpression {
        /// Kind of the offending node.
        node_kind: String,
    },

    /// A referenced member does not exist on the entity.
    #[error("unknown member `{name}` on entity `{entity}`")]
    UnknownMember {
        /// Table name of the entity that was searched.
        entity: String,
        /// Name that could not be resolved.
        name: String,
    },

    /// A value or operand does not fit the declared column type.
    #[error("type mismatch on `{column}`: expected {expected}, found {found}")]
    TypeMismatch {
        /// Column (or expression) that was compared.
        column: String,
        /// Declared type family.
        expected: String,
        /// Type family that was supplied.
        found: String,
    },

    /// A negative SKIP or TAKE.
    #[error("invalid pagination: {clause} must be non-negative, got {value}")]
    InvalidPagination {
        /// `skip` or `take`.
        clause: &'static str,
        /// The rejected value.
        value: i64,
    },

    /// The two sides of a set operation have different shapes.
    #[error("incompatible projections for set operation: left is ({left}), right is ({right})")]
    IncompatibleProjection {
        /// Shape of the left side.
        left: String,
        /// Shape of the right side.
        right: String,
    },

    /// The right operand of a set operation carries clauses it cannot have.
    #[error("invalid set operand: {reason}")]
    InvalidSetOperand {
        /// What the operand carried.
        reason: String,
    },

    /// The target dialect cannot express a feature used by the query.
    #[error("{feature} is not supported by the {dialect} dialect")]
    UnsupportedFeature {
        /// Feature name, e.g. `window functions`.
        feature: &'static str,
        /// Dialect name.
        dialect: &'static str,
    },

    /// A runtime value of a type the sanitizer cannot format.
    #[error("unsupported value type: {type_name}")]
    UnsupportedType {
        /// Name of the rejected type.
        type_name: String,
    },
}

impl Error {
    /// Returns the pipeline stage this error belongs to.
    #[must_use]
    pub const fn phase(&self) -> Phase {
        match self {
            Self::UnsupportedExpression { .. }
            | Self::UnknownMember { .. }
            | Self::TypeMismatch { .. } => Phase::Compile,
            Self::InvalidPagination { .. }
            | Self::IncompatibleProjection { .. }
            | Self::InvalidSetOperand { .. } => Phase::Build,
            Self::UnsupportedFeature { .. } | Self::UnsupportedType { .. } => Phase::Render,
        }
    }

    pub(crate) fn unsupported(node_kind: impl Into<String>) -> Self {
        Self::UnsupportedExpression {
            node_kind: node_kind.into(),
        }
    }

    pub(crate) fn unknown_member(entity: &str, name: &str) -> Self {
        Self::UnknownMember {
            entity: entity.to_string(),
            name: name.to_string(),
        }
    }
}

/// Result type alias for engine operations.
pub type Result<T> = std::result::Result<T, Error>;
