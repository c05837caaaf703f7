// builder.rs — Programmatic construction of computations and modules
//
// Assigns instruction ids deterministically in insertion order. The builder
// does not validate: it can produce ill-formed computations (duplicate
// parameter numbers, dangling roots) so that analyses can be exercised on
// them.

use crate::alias::AliasConfig;
use crate::hlo::{Computation, HloModule, Instruction, Opcode};
use crate::id::{ComputationId, IdAllocator, InstructionId};
use crate::program_shape::ProgramShape;
use crate::shape::Shape;
use crate::sharding::ShardingDescriptor;

/// Incrementally builds one computation.
#[derive(Debug)]
pub struct ComputationBuilder {
    ids: IdAllocator,
    id: ComputationId,
    name: String,
    instructions: Vec<Instruction>,
}

impl ComputationBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        let mut ids = IdAllocator::new();
        let id = ids.alloc_computation();
        Self {
            ids,
            id,
            name: name.into(),
            instructions: Vec::new(),
        }
    }

    fn push(
        &mut self,
        name: String,
        opcode: Opcode,
        shape: Shape,
        sharding: Option<ShardingDescriptor>,
        parameter_number: Option<usize>,
    ) -> InstructionId {
        let id = self.ids.alloc_instruction();
        self.instructions.push(Instruction {
            id,
            name,
            opcode,
            shape,
            sharding,
            parameter_number,
        });
        id
    }

    pub fn parameter(&mut self, number: usize, shape: Shape) -> InstructionId {
        self.push(
            format!("p{}", number),
            Opcode::Parameter,
            shape,
            None,
            Some(number),
        )
    }

    pub fn sharded_parameter(
        &mut self,
        number: usize,
        shape: Shape,
        sharding: ShardingDescriptor,
    ) -> InstructionId {
        self.push(
            format!("p{}", number),
            Opcode::Parameter,
            shape,
            Some(sharding),
            Some(number),
        )
    }

    pub fn op(&mut self, opcode: Opcode, shape: Shape) -> InstructionId {
        let name = format!("{}.{}", opcode, self.instructions.len());
        self.push(name, opcode, shape, None, None)
    }

    pub fn sharded_op(
        &mut self,
        opcode: Opcode,
        shape: Shape,
        sharding: ShardingDescriptor,
    ) -> InstructionId {
        let name = format!("{}.{}", opcode, self.instructions.len());
        self.push(name, opcode, shape, Some(sharding), None)
    }

    /// Finish the computation with `root` as its root id. The root need not
    /// exist among the instructions.
    pub fn build(self, root: InstructionId) -> Computation {
        Computation {
            id: self.id,
            name: self.name,
            instructions: self.instructions,
            root_id: root,
        }
    }
}

/// Declared (unsharded) program shape implied by a computation: parameter
/// shapes in parameter-number order and the root's declared shape. An
/// absent root yields an empty tuple result.
pub fn declared_program_shape(computation: &Computation) -> ProgramShape {
    let mut parameters: Vec<&Instruction> = computation.parameter_instructions().collect();
    parameters.sort_by_key(|i| i.parameter_number);
    ProgramShape {
        parameters: parameters.iter().map(|i| i.shape.clone()).collect(),
        result: computation
            .root_instruction()
            .map(|i| i.shape.clone())
            .unwrap_or_else(|| Shape::tuple(Vec::new())),
    }
}

/// Wrap `entry` into a single-computation module whose declared program
/// shape is derived from the entry itself.
pub fn entry_module(
    name: impl Into<String>,
    entry: Computation,
    input_output_alias: AliasConfig,
) -> HloModule {
    let program_shape = declared_program_shape(&entry);
    HloModule {
        name: name.into(),
        entry_computation_id: entry.id,
        computations: vec![entry],
        program_shape,
        input_output_alias,
    }
}
