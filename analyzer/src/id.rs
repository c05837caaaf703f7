// id.rs — Stable identifiers for instructions and computations
//
// Ids are unique within their owning scope (instructions within a
// computation, computations within a module). They are plain non-negative
// integers on the wire and never coerced to a narrower type.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier of an instruction, unique within its computation.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct InstructionId(pub u64);

/// Identifier of a computation, unique within its module.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct ComputationId(pub u64);

impl fmt::Display for InstructionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "%{}", self.0)
    }
}

impl fmt::Display for ComputationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Allocator for ids. Produces monotonically increasing ids in allocation
/// order, so builders assign ids deterministically.
#[derive(Debug, Default)]
pub struct IdAllocator {
    next_instruction: u64,
    next_computation: u64,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alloc_instruction(&mut self) -> InstructionId {
        let id = InstructionId(self.next_instruction);
        self.next_instruction += 1;
        id
    }

    pub fn alloc_computation(&mut self) -> ComputationId {
        let id = ComputationId(self.next_computation);
        self.next_computation += 1;
        id
    }
}
