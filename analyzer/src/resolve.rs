// resolve.rs — Per-shard shape resolution
//
// Computes the shape one shard instance physically holds, given a value's
// logical (unsharded) shape and its sharding descriptor.
//
// Preconditions: none.
// Postconditions: returned shapes carry no layout, at any nesting depth.
// Failure modes: tuple sharding vs shape topology disagreement
//                (`ShapeMismatch`), descriptors without a valid tiling for
//                the array rank (`InvalidSharding`). First failure wins.
// Side effects: none.

use log::trace;

use crate::error::ShardError;
use crate::hlo::Instruction;
use crate::shape::Shape;
use crate::sharding::ShardingDescriptor;

/// Resolve the per-shard shape of `shape` under `sharding`.
pub fn sharded_shape(shape: &Shape, sharding: &ShardingDescriptor) -> Result<Shape, ShardError> {
    let mut resolved = resolve_recursive(shape, sharding)?;
    resolved.clear_layout();
    Ok(resolved)
}

fn resolve_recursive(shape: &Shape, sharding: &ShardingDescriptor) -> Result<Shape, ShardError> {
    match (sharding, shape) {
        (
            ShardingDescriptor::Tuple {
                elements: shardings,
            },
            Shape::Tuple { elements },
        ) => {
            if shardings.len() != elements.len() {
                return Err(ShardError::shape_mismatch(format!(
                    "tuple sharding has {} element(s) but shape {} has {}",
                    shardings.len(),
                    shape,
                    elements.len()
                )));
            }
            let sub_shapes = elements
                .iter()
                .zip(shardings)
                .map(|(element, sharding)| resolve_recursive(element, sharding))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Shape::tuple(sub_shapes))
        }
        (ShardingDescriptor::Tuple { .. }, Shape::Array { .. }) => {
            Err(ShardError::shape_mismatch(format!(
                "got tuple sharding {} for non-tuple shape {}",
                sharding, shape
            )))
        }
        (
            ShardingDescriptor::Replicated | ShardingDescriptor::Maximal { .. },
            Shape::Tuple { .. },
        ) => {
            // Replication applies to every leaf unchanged.
            Ok(shape.clone())
        }
        (ShardingDescriptor::Tiled(_), Shape::Tuple { .. }) => {
            Err(ShardError::shape_mismatch(format!(
                "got tiled sharding {} for tuple shape {}",
                sharding, shape
            )))
        }
        (
            _,
            Shape::Array {
                element_type,
                dimensions,
                ..
            },
        ) => {
            let tiling = sharding.to_tiling(dimensions.len())?;
            let tile = tiling.tile_dimensions(dimensions);
            trace!("resolved {} under {} to tile {:?}", shape, tiling, tile);
            Ok(Shape::array(*element_type, tile))
        }
    }
}

/// Per-shard shape of an instruction's value: its declared shape resolved
/// under its sharding when it has one, the declared shape otherwise. Layout
/// is always stripped.
pub fn instruction_shard_shape(instruction: &Instruction) -> Result<Shape, ShardError> {
    match &instruction.sharding {
        Some(sharding) => sharded_shape(&instruction.shape, sharding),
        None => Ok(instruction.shape.clone().without_layout()),
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────
