// program_shape.rs — Sharded program shape extraction
//
// Scans one computation's instruction list and collects the per-shard shape
// of every parameter and of the root, checking that each declared parameter
// is bound exactly once and that exactly one instruction is the root.
//
// Preconditions: `declared_parameter_count` is the parameter count of the
//                computation's declared program shape.
// Postconditions: every argument slot and the result are filled; all shapes
//                 are layout-free per-shard shapes.
// Failure modes: out-of-range or missing parameter numbers
//                (`InvalidArgument`), duplicate bindings
//                (`DuplicateParameter`), repeated root ids
//                (`MultipleRoots`), unbound parameters
//                (`MissingParameter`), no root (`MissingRoot`), and any
//                resolver failure. First failure wins.
// Side effects: none.

use std::fmt;

use log::{debug, trace};
use serde::{Deserialize, Serialize};

use crate::error::ShardError;
use crate::hlo::{Computation, HloModule};
use crate::resolve::instruction_shard_shape;
use crate::shape::Shape;

/// Argument shapes (indexed by parameter number) plus the result shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgramShape {
    pub parameters: Vec<Shape>,
    pub result: Shape,
}

impl fmt::Display for ProgramShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("(")?;
        for (i, p) in self.parameters.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", p)?;
        }
        write!(f, ") -> {}", self.result)
    }
}

/// Extract the sharded program shape of `computation`.
///
/// Only the computation's own instructions are scanned; called
/// computations are not descended into.
pub fn extract_program_shape(
    computation: &Computation,
    declared_parameter_count: usize,
) -> Result<ProgramShape, ShardError> {
    let mut parameters: Vec<Option<Shape>> = vec![None; declared_parameter_count];
    let mut result: Option<Shape> = None;

    for instruction in &computation.instructions {
        if instruction.is_parameter() {
            let number = instruction.parameter_number.ok_or_else(|| {
                ShardError::invalid_argument(format!(
                    "parameter instruction {} has no parameter number",
                    instruction.id
                ))
            })?;
            if number >= declared_parameter_count {
                return Err(ShardError::invalid_argument(format!(
                    "got invalid parameter number {}, expected {} parameters",
                    number, declared_parameter_count
                )));
            }
            let shape = instruction_shard_shape(instruction)?;
            let slot = &mut parameters[number];
            if slot.is_some() {
                return Err(ShardError::DuplicateParameter {
                    parameter_number: number,
                    instruction: instruction.id,
                });
            }
            trace!(
                "parameter {} bound by {}: {}",
                number,
                instruction.id,
                shape
            );
            *slot = Some(shape);
        }
        if instruction.id == computation.root_id {
            if result.is_some() {
                return Err(ShardError::MultipleRoots {
                    root_id: computation.root_id,
                });
            }
            result = Some(instruction_shard_shape(instruction)?);
        }
    }

    let parameters = parameters
        .into_iter()
        .enumerate()
        .map(|(i, slot)| slot.ok_or(ShardError::MissingParameter(i)))
        .collect::<Result<Vec<_>, _>>()?;
    let result = result.ok_or(ShardError::MissingRoot {
        root_id: computation.root_id,
    })?;

    debug!(
        "extracted program shape of '{}': {} parameter(s)",
        computation.display_name(),
        parameters.len()
    );
    Ok(ProgramShape { parameters, result })
}

/// Sharded program shape of a module's entry computation. The parameter
/// count comes from the module's declared program shape; other computations
/// are ignored.
pub fn sharded_program_shapes(module: &HloModule) -> Result<ProgramShape, ShardError> {
    let entry = module.entry_computation()?;
    extract_program_shape(entry, module.program_shape.parameters.len())
}

// ── Tests ──────────────────────────────────────────────────────────────────
