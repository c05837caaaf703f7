// Snapshot tests: lock the text rendering of buffer plans and diagnostics.
//
// Uses the library API (builder → run_pipeline) and snapshots the Display
// output inline with `insta`.
//
// Run `cargo insta review` after intentional output changes to update baselines.

use shardcheck::alias::{Alias, AliasConfig, AliasKind, ShapeIndex};
use shardcheck::builder::{entry_module, ComputationBuilder};
use shardcheck::hlo::{HloModule, Opcode};
use shardcheck::pipeline::{run_pipeline, PipelineOptions, PipelineResult};
use shardcheck::shape::{Layout, PrimitiveType, Shape};
use shardcheck::sharding::{ShardingDescriptor, TileAssignment};

fn f32(dims: &[u64]) -> Shape {
    Shape::array(PrimitiveType::F32, dims.to_vec())
}

fn s32(dims: &[u64]) -> Shape {
    Shape::array(PrimitiveType::S32, dims.to_vec())
}

fn alias(output: usize, parameter_number: usize, path: &[usize], kind: AliasKind) -> Alias {
    Alias {
        output_index: ShapeIndex::new(vec![output]),
        parameter_number,
        parameter_index: ShapeIndex::new(path.to_vec()),
        kind,
    }
}

fn run(module: &HloModule, tuple_inputs: bool) -> PipelineResult {
    run_pipeline(module, &PipelineOptions { tuple_inputs })
}

fn diagnostics_text(result: &PipelineResult) -> String {
    result
        .diagnostics
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}

#[test]
fn snapshot_flat_plan() {
    let mut b = ComputationBuilder::new("main");
    b.sharded_parameter(
        0,
        f32(&[8, 4]).with_layout(Layout::row_major(2)),
        ShardingDescriptor::tiled(vec![4, 1]),
    );
    b.sharded_parameter(1, f32(&[4]), ShardingDescriptor::Maximal { device: 2 });
    b.parameter(2, s32(&[]));
    let root = b.sharded_op(
        Opcode::Dot,
        f32(&[8, 4]),
        ShardingDescriptor::tiled(vec![1, 2]),
    );
    let module = entry_module(
        "axpy",
        b.build(root),
        AliasConfig::new(vec![
            alias(0, 0, &[], AliasKind::MustAlias),
            alias(1, 2, &[], AliasKind::MayAlias),
        ]),
    );

    let result = run(&module, false);
    assert!(
        result.diagnostics.is_empty(),
        "{}",
        diagnostics_text(&result)
    );
    insta::assert_snapshot!(result.plan.unwrap().to_string(), @r"
module axpy (flat inputs)
arguments:
  0: f32[2,4]
  1: f32[4]
  2: s32[]
result: f32[8,2]
donated parameters: {0, 2}
");
}

#[test]
fn snapshot_tupled_plan() {
    let mut b = ComputationBuilder::new("main");
    b.sharded_parameter(
        0,
        Shape::tuple(vec![f32(&[8, 4]), s32(&[16])]),
        ShardingDescriptor::tuple(vec![
            ShardingDescriptor::tiled(vec![2, 1]),
            ShardingDescriptor::Tiled(TileAssignment::new(vec![4]).with_devices(vec![3, 2, 1, 0])),
        ]),
    );
    let root = b.sharded_op(
        Opcode::Tuple,
        Shape::tuple(vec![f32(&[8, 4]), s32(&[16])]),
        ShardingDescriptor::tuple(vec![
            ShardingDescriptor::Replicated,
            ShardingDescriptor::Maximal { device: 0 },
        ]),
    );
    let module = entry_module(
        "train_step",
        b.build(root),
        AliasConfig::new(vec![
            alias(0, 0, &[0], AliasKind::MayAlias),
            alias(1, 0, &[1], AliasKind::MayAlias),
        ]),
    );

    let result = run(&module, true);
    assert!(
        result.diagnostics.is_empty(),
        "{}",
        diagnostics_text(&result)
    );
    insta::assert_snapshot!(result.plan.unwrap().to_string(), @r"
module train_step (tupled inputs)
arguments:
  0: (f32[4,4], s32[4])
result: (f32[8,4], s32[16])
donated parameters: {0, 1}
");
}

#[test]
fn snapshot_duplicate_parameter_diagnostic() {
    let mut b = ComputationBuilder::new("main");
    b.parameter(0, f32(&[4]));
    b.parameter(0, f32(&[4]));
    let root = b.op(Opcode::Add, f32(&[4]));
    let module = entry_module("dup", b.build(root), AliasConfig::default());

    let result = run(&module, false);
    assert!(result.plan.is_none());
    insta::assert_snapshot!(diagnostics_text(&result), @r"
error[E0300]: parameter 0 is bound more than once (again by instruction %1)
  --> main/%1
  note: instruction p0 (%1) = f32[4] parameter(0)
");
}

#[test]
fn snapshot_shape_mismatch_diagnostic() {
    let mut b = ComputationBuilder::new("main");
    b.sharded_parameter(
        0,
        Shape::tuple(vec![f32(&[4]), f32(&[4])]),
        ShardingDescriptor::tuple(vec![ShardingDescriptor::Replicated; 3]),
    );
    let root = b.op(Opcode::Add, f32(&[4]));
    let module = entry_module("mismatch", b.build(root), AliasConfig::default());

    let result = run(&module, false);
    assert!(result.has_errors());
    insta::assert_snapshot!(diagnostics_text(&result), @r"
error[E0100]: shape mismatch: tuple sharding has 3 element(s) but shape (f32[4], f32[4]) has 2
  --> main/%0
  note: instruction p0 (%0) = (f32[4], f32[4]) parameter(0), sharding={{replicated}, {replicated}, {replicated}}
  hint: tuple shardings must mirror the shape's tuple structure element by element
");
}

#[test]
fn snapshot_whole_tuple_alias_warning() {
    let mut b = ComputationBuilder::new("main");
    let p = b.parameter(0, Shape::tuple(vec![f32(&[4]), f32(&[4])]));
    let module = entry_module(
        "whole",
        b.build(p),
        AliasConfig::new(vec![alias(0, 0, &[], AliasKind::MayAlias)]),
    );

    let result = run(&module, true);
    assert!(!result.has_errors());
    insta::assert_snapshot!(diagnostics_text(&result), @r"
warning[W0400]: output {0} aliases the whole input tuple; no parameter is donated for it
  --> main
  hint: alias a tuple element (parameter index {k, ...}) to donate it
");
}
