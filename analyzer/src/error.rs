// error.rs — Failure taxonomy shared by the resolver, extractor and donation analyzer
//
// Every variant is an immediately-fatal validation failure: the first error
// aborts the analysis and no partial result is returned.

use thiserror::Error;

use crate::diag::{codes, DiagCode};
use crate::id::InstructionId;

/// Error type for sharded shape resolution, program shape extraction and
/// donation analysis.
#[derive(Error, Clone, Debug, PartialEq, Eq)]
pub enum ShardError {
    /// Sharding topology (tuple arity or tuple-vs-array kind) disagrees with the shape.
    #[error("shape mismatch: {message}")]
    ShapeMismatch { message: String },

    /// A sharding descriptor cannot be turned into a concrete tiling for the shape.
    #[error("invalid sharding: {message}")]
    InvalidSharding { message: String },

    /// Out-of-range parameter number or index, or a malformed alias entry.
    #[error("invalid argument: {message}")]
    InvalidArgument { message: String },

    /// Two parameter instructions claim the same parameter number.
    #[error(
        "parameter {parameter_number} is bound more than once (again by instruction {instruction})"
    )]
    DuplicateParameter {
        parameter_number: usize,
        instruction: InstructionId,
    },

    /// More than one instruction carries the computation's root id.
    #[error("found multiple root instructions with id {root_id}")]
    MultipleRoots { root_id: InstructionId },

    /// No instruction binds the given parameter number.
    #[error("couldn't find parameter {0}")]
    MissingParameter(usize),

    /// No instruction carries the computation's root id.
    #[error("couldn't find root instruction {root_id}")]
    MissingRoot { root_id: InstructionId },
}

impl ShardError {
    pub(crate) fn shape_mismatch(message: impl Into<String>) -> Self {
        ShardError::ShapeMismatch {
            message: message.into(),
        }
    }

    pub(crate) fn invalid_sharding(message: impl Into<String>) -> Self {
        ShardError::InvalidSharding {
            message: message.into(),
        }
    }

    pub(crate) fn invalid_argument(message: impl Into<String>) -> Self {
        ShardError::InvalidArgument {
            message: message.into(),
        }
    }

    /// Stable diagnostic code for this failure.
    pub fn code(&self) -> DiagCode {
        match self {
            ShardError::ShapeMismatch { .. } => codes::E0100,
            ShardError::InvalidSharding { .. } => codes::E0101,
            ShardError::InvalidArgument { .. } => codes::E0200,
            ShardError::DuplicateParameter { .. } => codes::E0300,
            ShardError::MultipleRoots { .. } => codes::E0301,
            ShardError::MissingParameter(_) => codes::E0302,
            ShardError::MissingRoot { .. } => codes::E0303,
        }
    }
}
