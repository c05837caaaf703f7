// hlo.rs — Module, computation and instruction records
//
// The flattened graph representation the analyses consume. Records are
// immutable after construction; a module owns its computations, a
// computation owns its instructions. Only the fields the analyses read are
// modelled: opcode semantics beyond "is this a parameter" are out of scope.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::alias::AliasConfig;
use crate::error::ShardError;
use crate::id::{ComputationId, InstructionId};
use crate::program_shape::ProgramShape;
use crate::shape::Shape;
use crate::sharding::ShardingDescriptor;

// ── Opcode ──────────────────────────────────────────────────────────────────

/// Instruction opcode tag. Tags this crate does not model load as `Other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Opcode {
    Parameter,
    Constant,
    Tuple,
    GetTupleElement,
    Add,
    Multiply,
    Dot,
    Reshape,
    Broadcast,
    Call,
    While,
    Other,
}

impl Opcode {
    pub fn as_str(self) -> &'static str {
        match self {
            Opcode::Parameter => "parameter",
            Opcode::Constant => "constant",
            Opcode::Tuple => "tuple",
            Opcode::GetTupleElement => "get-tuple-element",
            Opcode::Add => "add",
            Opcode::Multiply => "multiply",
            Opcode::Dot => "dot",
            Opcode::Reshape => "reshape",
            Opcode::Broadcast => "broadcast",
            Opcode::Call => "call",
            Opcode::While => "while",
            Opcode::Other => "other",
        }
    }
}

impl From<String> for Opcode {
    fn from(tag: String) -> Self {
        match tag.as_str() {
            "parameter" => Opcode::Parameter,
            "constant" => Opcode::Constant,
            "tuple" => Opcode::Tuple,
            "get-tuple-element" => Opcode::GetTupleElement,
            "add" => Opcode::Add,
            "multiply" => Opcode::Multiply,
            "dot" => Opcode::Dot,
            "reshape" => Opcode::Reshape,
            "broadcast" => Opcode::Broadcast,
            "call" => Opcode::Call,
            "while" => Opcode::While,
            _ => Opcode::Other,
        }
    }
}

impl From<Opcode> for String {
    fn from(opcode: Opcode) -> Self {
        opcode.as_str().to_string()
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Instruction ─────────────────────────────────────────────────────────────

/// One instruction of a computation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instruction {
    pub id: InstructionId,
    #[serde(default)]
    pub name: String,
    pub opcode: Opcode,
    /// Declared (unsharded) shape.
    pub shape: Shape,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sharding: Option<ShardingDescriptor>,
    /// Parameter number; only meaningful for `Opcode::Parameter`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameter_number: Option<usize>,
}

impl Instruction {
    pub fn is_parameter(&self) -> bool {
        self.opcode == Opcode::Parameter
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.name.is_empty() {
            write!(f, "{}", self.id)?;
        } else {
            write!(f, "{} ({})", self.name, self.id)?;
        }
        write!(f, " = {} {}", self.shape, self.opcode)?;
        if let Some(p) = self.parameter_number {
            write!(f, "({})", p)?;
        }
        if let Some(sharding) = &self.sharding {
            write!(f, ", sharding={}", sharding)?;
        }
        Ok(())
    }
}

// ── Computation ─────────────────────────────────────────────────────────────

/// An instruction list with a designated root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Computation {
    pub id: ComputationId,
    #[serde(default)]
    pub name: String,
    pub instructions: Vec<Instruction>,
    pub root_id: InstructionId,
}

impl Computation {
    /// Parameter instructions in list order.
    pub fn parameter_instructions(&self) -> impl Iterator<Item = &Instruction> {
        self.instructions.iter().filter(|i| i.is_parameter())
    }

    pub fn num_parameters(&self) -> usize {
        self.parameter_instructions().count()
    }

    /// First instruction carrying the root id, if any.
    pub fn root_instruction(&self) -> Option<&Instruction> {
        self.instructions.iter().find(|i| i.id == self.root_id)
    }

    pub fn instruction(&self, id: InstructionId) -> Option<&Instruction> {
        self.instructions.iter().find(|i| i.id == id)
    }

    /// Name for diagnostics; falls back to the id when unnamed.
    pub fn display_name(&self) -> String {
        if self.name.is_empty() {
            self.id.to_string()
        } else {
            self.name.clone()
        }
    }
}

// ── Module ──────────────────────────────────────────────────────────────────

/// A compiled unit: computations, the entry designation, the entry's
/// declared host program shape, and the input/output alias table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HloModule {
    pub name: String,
    pub entry_computation_id: ComputationId,
    pub computations: Vec<Computation>,
    /// Declared (unsharded) program shape of the entry computation.
    pub program_shape: ProgramShape,
    #[serde(default)]
    pub input_output_alias: AliasConfig,
}

impl HloModule {
    pub fn computation(&self, id: ComputationId) -> Option<&Computation> {
        self.computations.iter().find(|c| c.id == id)
    }

    pub fn entry_computation(&self) -> Result<&Computation, ShardError> {
        self.computation(self.entry_computation_id).ok_or_else(|| {
            ShardError::invalid_argument(format!(
                "module '{}' has no entry computation {}",
                self.name, self.entry_computation_id
            ))
        })
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────
