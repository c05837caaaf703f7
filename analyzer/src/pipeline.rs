// pipeline.rs — Buffer plan construction for a module's entry computation
//
// Runs the sharded program shape extraction and the donation analysis and
// combines their results into the `BufferPlan` an executor consumes. Failures
// become diagnostics; the first failing analysis ends the run.
//
// Preconditions: none.
// Postconditions: `plan` is set iff no error-level diagnostic was produced.
// Failure modes: any `ShardError` from either analysis.
// Side effects: none (logging only).

use std::fmt;

use log::debug;
use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::diag::{codes, DiagLevel, Diagnostic};
use crate::donation::{parameters_that_must_be_donated, whole_tuple_aliases, DonationSet};
use crate::error::ShardError;
use crate::hlo::{Computation, HloModule};
use crate::id::InstructionId;
use crate::program_shape::{sharded_program_shapes, ProgramShape};
use crate::resolve::instruction_shard_shape;

// ── Options and results ────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PipelineOptions {
    /// All logical parameters are packed into the entry's single tuple parameter.
    pub tuple_inputs: bool,
}

/// Per-shard argument/result shapes plus the parameters to donate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BufferPlan {
    pub module: String,
    pub tuple_inputs: bool,
    pub program_shape: ProgramShape,
    pub donated_parameters: DonationSet,
}

impl fmt::Display for BufferPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let convention = if self.tuple_inputs { "tupled" } else { "flat" };
        writeln!(f, "module {} ({} inputs)", self.module, convention)?;
        writeln!(f, "arguments:")?;
        for (i, shape) in self.program_shape.parameters.iter().enumerate() {
            writeln!(f, "  {}: {}", i, shape)?;
        }
        writeln!(f, "result: {}", self.program_shape.result)?;
        f.write_str("donated parameters: {")?;
        for (i, p) in self.donated_parameters.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", p)?;
        }
        f.write_str("}")
    }
}

#[derive(Debug)]
pub struct PipelineResult {
    pub plan: Option<BufferPlan>,
    pub diagnostics: Vec<Diagnostic>,
}

impl PipelineResult {
    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }
}

// ── Provenance ─────────────────────────────────────────────────────────────

/// Fingerprint of the analysed input, for cache keys and reproducibility.
///
/// `module_hash`: SHA-256 of the raw module text.
/// `analyzer_version`: crate version from `Cargo.toml`.
#[derive(Debug, Clone)]
pub struct Provenance {
    pub module_hash: [u8; 32],
    pub analyzer_version: &'static str,
}

impl Provenance {
    /// Hex string of the module hash (64 characters).
    pub fn module_hash_hex(&self) -> String {
        let mut s = String::with_capacity(64);
        for b in &self.module_hash {
            use std::fmt::Write;
            let _ = write!(s, "{:02x}", b);
        }
        s
    }

    pub fn to_json_value(&self) -> serde_json::Value {
        serde_json::json!({
            "module_hash": self.module_hash_hex(),
            "analyzer_version": self.analyzer_version,
        })
    }
}

pub fn compute_provenance(source: &str) -> Provenance {
    let mut hasher = Sha256::new();
    hasher.update(source.as_bytes());
    let mut module_hash = [0u8; 32];
    module_hash.copy_from_slice(&hasher.finalize());
    Provenance {
        module_hash,
        analyzer_version: env!("CARGO_PKG_VERSION"),
    }
}

// ── Runner ─────────────────────────────────────────────────────────────────

/// Build the buffer plan for `module`'s entry computation.
pub fn run_pipeline(module: &HloModule, options: &PipelineOptions) -> PipelineResult {
    let mut diagnostics = Vec::new();
    let entry_name = module
        .entry_computation()
        .map(|c| c.display_name())
        .unwrap_or_else(|_| module.entry_computation_id.to_string());

    debug!("pipeline: extracting program shapes of '{}'", module.name);
    let program_shape = match sharded_program_shapes(module) {
        Ok(ps) => ps,
        Err(err) => {
            diagnostics.push(error_diagnostic(&err, module, &entry_name));
            return PipelineResult {
                plan: None,
                diagnostics,
            };
        }
    };

    debug!(
        "pipeline: analysing donation (tuple_inputs = {})",
        options.tuple_inputs
    );
    let donated_parameters = match parameters_that_must_be_donated(module, options.tuple_inputs) {
        Ok(set) => set,
        Err(err) => {
            diagnostics.push(error_diagnostic(&err, module, &entry_name));
            return PipelineResult {
                plan: None,
                diagnostics,
            };
        }
    };

    if options.tuple_inputs {
        for alias in whole_tuple_aliases(&module.input_output_alias) {
            diagnostics.push(
                Diagnostic::new(
                    DiagLevel::Warning,
                    format!(
                        "output {} aliases the whole input tuple; no parameter is donated for it",
                        alias.output_index
                    ),
                )
                .with_code(codes::W0400)
                .with_location(entry_name.clone(), None)
                .with_hint(
                    "alias a tuple element (parameter index {k, ...}) to donate it",
                ),
            );
        }
    }

    PipelineResult {
        plan: Some(BufferPlan {
            module: module.name.clone(),
            tuple_inputs: options.tuple_inputs,
            program_shape,
            donated_parameters,
        }),
        diagnostics,
    }
}

/// Error diagnostic located at the entry instruction that caused `err`, when
/// one can be identified.
fn error_diagnostic(err: &ShardError, module: &HloModule, entry_name: &str) -> Diagnostic {
    let entry = module.entry_computation().ok();
    let culprit = entry.and_then(|entry| match err {
        ShardError::DuplicateParameter { instruction, .. } => Some(*instruction),
        ShardError::MultipleRoots { root_id } => Some(*root_id),
        ShardError::ShapeMismatch { .. } | ShardError::InvalidSharding { .. } => {
            failed_resolution(entry, err)
        }
        ShardError::InvalidArgument { .. } => {
            misnumbered_parameter(entry, module.program_shape.parameters.len())
        }
        ShardError::MissingParameter(_) | ShardError::MissingRoot { .. } => None,
    });
    let diag = Diagnostic::from(err).with_location(entry_name, culprit);
    match culprit.and_then(|id| entry?.instruction(id)) {
        Some(instruction) => diag.with_note(format!("instruction {}", instruction)),
        None => diag,
    }
}

/// First parameter or root instruction whose shard shape fails to resolve
/// with exactly `err`. Extraction stops at the first such instruction, so
/// scan order picks the same one.
fn failed_resolution(entry: &Computation, err: &ShardError) -> Option<InstructionId> {
    entry
        .instructions
        .iter()
        .filter(|i| i.is_parameter() || i.id == entry.root_id)
        .find(|i| instruction_shard_shape(i).as_ref().err() == Some(err))
        .map(|i| i.id)
}

/// First parameter instruction with no parameter number or one outside the
/// declared parameter count.
fn misnumbered_parameter(entry: &Computation, declared: usize) -> Option<InstructionId> {
    entry
        .parameter_instructions()
        .find(|i| i.parameter_number.map_or(true, |n| n >= declared))
        .map(|i| i.id)
}

// ── Tests ──────────────────────────────────────────────────────────────────
