// Property-based tests for the analysis invariants.
//
// Three categories:
// 1. Resolver: replication is the identity, tuples resolve element-wise,
//    tiled dimensions are ceil-divided
// 2. Extractor: result independent of instruction order, any dropped
//    parameter binding is reported
// 3. Donation: the donated set is exactly the set of aliased parameters
//
// Uses proptest with explicit configuration to prevent CI flakiness.

use proptest::prelude::*;

use shardcheck::alias::{Alias, AliasConfig, AliasKind, ShapeIndex};
use shardcheck::donation::parameters_to_donate;
use shardcheck::error::ShardError;
use shardcheck::hlo::{Computation, Instruction, Opcode};
use shardcheck::id::{ComputationId, InstructionId};
use shardcheck::program_shape::extract_program_shape;
use shardcheck::resolve::sharded_shape;
use shardcheck::shape::{Layout, PrimitiveType, Shape};
use shardcheck::sharding::ShardingDescriptor;

// ── Generators ──────────────────────────────────────────────────────────────

fn arb_element_type() -> impl Strategy<Value = PrimitiveType> {
    prop_oneof![
        Just(PrimitiveType::F32),
        Just(PrimitiveType::Bf16),
        Just(PrimitiveType::S32),
        Just(PrimitiveType::Pred),
    ]
}

fn arb_array() -> impl Strategy<Value = Shape> {
    (
        arb_element_type(),
        prop::collection::vec(0u64..64, 0..4),
        prop::bool::ANY,
    )
        .prop_map(|(ty, dims, with_layout)| {
            let rank = dims.len();
            let shape = Shape::array(ty, dims);
            if with_layout {
                shape.with_layout(Layout::row_major(rank))
            } else {
                shape
            }
        })
}

fn arb_shape() -> impl Strategy<Value = Shape> {
    arb_array().prop_recursive(3, 24, 4, |inner| {
        prop::collection::vec(inner, 0..4).prop_map(Shape::tuple)
    })
}

/// Array dimensions paired with a tile factor for each.
fn arb_tiled_array() -> impl Strategy<Value = (Vec<u64>, Vec<u64>)> {
    prop::collection::vec((0u64..100, 1u64..8), 1..4)
        .prop_map(|pairs| pairs.into_iter().unzip())
}

fn parameter(id: u64, number: usize, shape: Shape) -> Instruction {
    Instruction {
        id: InstructionId(id),
        name: format!("p{}", number),
        opcode: Opcode::Parameter,
        shape,
        sharding: None,
        parameter_number: Some(number),
    }
}

/// Instruction list binding each shape as parameter `i` (id `i`), followed by
/// a root instruction with id `shapes.len()`.
fn instructions_for(shapes: &[Shape]) -> Vec<Instruction> {
    let mut instructions: Vec<Instruction> = shapes
        .iter()
        .enumerate()
        .map(|(i, s)| parameter(i as u64, i, s.clone()))
        .collect();
    instructions.push(Instruction {
        id: InstructionId(shapes.len() as u64),
        name: "root".into(),
        opcode: Opcode::Tuple,
        shape: Shape::tuple(shapes.to_vec()),
        sharding: None,
        parameter_number: None,
    });
    instructions
}

fn computation(instructions: Vec<Instruction>, root: u64) -> Computation {
    Computation {
        id: ComputationId(0),
        name: "main".into(),
        instructions,
        root_id: InstructionId(root),
    }
}

// ── 1. Resolver ─────────────────────────────────────────────────────────────

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 200,
        max_shrink_iters: 200,
        .. ProptestConfig::default()
    })]

    #[test]
    fn replicated_is_identity(shape in arb_shape()) {
        let resolved = sharded_shape(&shape, &ShardingDescriptor::Replicated).unwrap();
        prop_assert_eq!(resolved, shape.without_layout());
    }

    #[test]
    fn tiled_dimensions_are_ceil_divided((dims, factors) in arb_tiled_array()) {
        let shape = Shape::array(PrimitiveType::F32, dims.clone());
        let resolved = sharded_shape(&shape, &ShardingDescriptor::tiled(factors.clone())).unwrap();
        let expected: Vec<u64> = dims
            .iter()
            .zip(&factors)
            .map(|(d, f)| (d + f - 1) / f)
            .collect();
        prop_assert_eq!(resolved, Shape::array(PrimitiveType::F32, expected));
    }

    #[test]
    fn tuples_resolve_element_wise(elements in prop::collection::vec(arb_tiled_array(), 0..5)) {
        let shapes: Vec<Shape> = elements
            .iter()
            .map(|(dims, _)| Shape::array(PrimitiveType::S32, dims.clone()))
            .collect();
        let shardings: Vec<ShardingDescriptor> = elements
            .iter()
            .map(|(_, factors)| ShardingDescriptor::tiled(factors.clone()))
            .collect();
        let tuple = Shape::tuple(shapes.clone());
        let resolved = sharded_shape(&tuple, &ShardingDescriptor::tuple(shardings.clone())).unwrap();
        let sub_shapes = resolved.tuple_shapes().unwrap();
        prop_assert_eq!(sub_shapes.len(), shapes.len());
        for ((sub, shape), sharding) in sub_shapes.iter().zip(&shapes).zip(&shardings) {
            prop_assert_eq!(sub, &sharded_shape(shape, sharding).unwrap());
        }
    }

    #[test]
    fn tuple_arity_mismatch_always_fails(
        shapes in prop::collection::vec(arb_array(), 0..5),
        extra in 1usize..3,
    ) {
        let tuple = Shape::tuple(shapes.clone());
        let sharding = ShardingDescriptor::tuple(
            vec![ShardingDescriptor::Replicated; shapes.len() + extra],
        );
        let is_shape_mismatch = matches!(
            sharded_shape(&tuple, &sharding),
            Err(ShardError::ShapeMismatch { .. })
        );
        prop_assert!(is_shape_mismatch);
    }
}

// ── 2. Extractor ────────────────────────────────────────────────────────────

fn arb_parameters_and_order() -> impl Strategy<Value = (Vec<Shape>, Vec<usize>)> {
    prop::collection::vec(arb_array(), 0..6).prop_flat_map(|shapes| {
        let order: Vec<usize> = (0..=shapes.len()).collect();
        (Just(shapes), Just(order).prop_shuffle())
    })
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 100,
        max_shrink_iters: 200,
        .. ProptestConfig::default()
    })]

    #[test]
    fn extraction_is_order_invariant((shapes, order) in arb_parameters_and_order()) {
        let instructions = instructions_for(&shapes);
        let root = shapes.len() as u64;
        let permuted: Vec<Instruction> = order.iter().map(|&i| instructions[i].clone()).collect();

        let in_order = extract_program_shape(&computation(instructions, root), shapes.len()).unwrap();
        let shuffled = extract_program_shape(&computation(permuted, root), shapes.len()).unwrap();
        prop_assert_eq!(&in_order, &shuffled);
        prop_assert_eq!(in_order.parameters.len(), shapes.len());
    }

    #[test]
    fn dropped_binding_is_missing(
        (shapes, drop) in prop::collection::vec(arb_array(), 1..6)
            .prop_flat_map(|shapes| {
                let n = shapes.len();
                (Just(shapes), 0..n)
            })
    ) {
        let mut instructions = instructions_for(&shapes);
        instructions.remove(drop);
        let root = shapes.len() as u64;
        let err = extract_program_shape(&computation(instructions, root), shapes.len()).unwrap_err();
        prop_assert_eq!(err, ShardError::MissingParameter(drop));
    }

    #[test]
    fn duplicate_binding_is_detected_anywhere(
        (shapes, order, dup) in prop::collection::vec(arb_array(), 1..6)
            .prop_flat_map(|shapes| {
                let n = shapes.len();
                let order: Vec<usize> = (0..=n + 1).collect();
                (Just(shapes), Just(order).prop_shuffle(), 0..n)
            })
    ) {
        let mut instructions = instructions_for(&shapes);
        let root = shapes.len() as u64;
        instructions.push(parameter(root + 1, dup, shapes[dup].clone()));
        let permuted: Vec<Instruction> = order.iter().map(|&i| instructions[i].clone()).collect();
        let err = extract_program_shape(&computation(permuted, root), shapes.len()).unwrap_err();
        let is_duplicate = matches!(
            err,
            ShardError::DuplicateParameter { parameter_number, .. } if parameter_number == dup
        );
        prop_assert!(is_duplicate);
    }
}

// ── 3. Donation ─────────────────────────────────────────────────────────────

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 200,
        max_shrink_iters: 200,
        .. ProptestConfig::default()
    })]

    #[test]
    fn flat_donation_is_set_of_aliased_parameters(
        parameters in prop::collection::vec(0usize..6, 0..12)
    ) {
        let entries: Vec<Alias> = parameters
            .iter()
            .enumerate()
            .map(|(output, &p)| Alias {
                output_index: ShapeIndex::new(vec![output]),
                parameter_number: p,
                parameter_index: ShapeIndex::root(),
                kind: AliasKind::MayAlias,
            })
            .collect();
        let donated = parameters_to_donate(&AliasConfig::new(entries), 6, false).unwrap();
        let expected: std::collections::BTreeSet<usize> = parameters.iter().copied().collect();
        prop_assert_eq!(donated, expected);
    }

    #[test]
    fn tupled_donation_uses_first_path_component(
        paths in prop::collection::vec(prop::collection::vec(0usize..4, 0..3), 0..8)
    ) {
        let entries: Vec<Alias> = paths
            .iter()
            .enumerate()
            .map(|(output, path)| Alias {
                output_index: ShapeIndex::new(vec![output]),
                parameter_number: 0,
                parameter_index: ShapeIndex::new(path.clone()),
                kind: AliasKind::MustAlias,
            })
            .collect();
        let donated = parameters_to_donate(&AliasConfig::new(entries), 4, true).unwrap();
        let expected: std::collections::BTreeSet<usize> =
            paths.iter().filter_map(|p| p.first().copied()).collect();
        prop_assert_eq!(donated, expected);
    }
}
