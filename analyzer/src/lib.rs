// shardcheck — sharded program shapes and buffer donation analysis
//
// Library root. `resolve`, `program_shape` and `donation` are the analyses;
// the remaining modules hold the data model and the driver plumbing.

pub mod alias;
pub mod builder;
pub mod diag;
pub mod donation;
pub mod error;
pub mod hlo;
pub mod id;
pub mod loader;
pub mod pipeline;
pub mod program_shape;
pub mod resolve;
pub mod shape;
pub mod sharding;
