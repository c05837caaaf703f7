// donation.rs — Parameters that must be donated to the runtime
//
// Walks a module's alias table and collects every input parameter whose
// buffer an output reuses. If any buffer inside a parameter is aliased, the
// whole parameter is donated.
//
// Preconditions: `number_of_parameters` is the flat parameter count, or the
//                arity of the single input tuple when inputs are tupled.
// Postconditions: every returned index is `< number_of_parameters`.
// Failure modes: aliases naming an out-of-range parameter, or a parameter
//                other than 0 under tupled inputs (`InvalidArgument`). The
//                first offending alias in configured order is reported.
// Side effects: none.

use std::collections::BTreeSet;

use log::{debug, trace};

use crate::alias::{Alias, AliasConfig};
use crate::error::ShardError;
use crate::hlo::HloModule;

/// Parameter indices whose buffers must be handed over to the runtime.
pub type DonationSet = BTreeSet<usize>;

/// Compute the set of parameters that must be donated for `config`.
pub fn parameters_to_donate(
    config: &AliasConfig,
    number_of_parameters: usize,
    tuple_inputs: bool,
) -> Result<DonationSet, ShardError> {
    config
        .aliases()
        .try_fold(DonationSet::new(), |mut donated, alias| -> Result<_, ShardError> {
            if let Some(parameter) = donated_parameter(alias, number_of_parameters, tuple_inputs)? {
                trace!("alias {} donates parameter {}", alias, parameter);
                donated.insert(parameter);
            }
            Ok(donated)
        })
}

/// Parameter donated by a single alias, if any.
fn donated_parameter(
    alias: &Alias,
    number_of_parameters: usize,
    tuple_inputs: bool,
) -> Result<Option<usize>, ShardError> {
    if tuple_inputs {
        if alias.parameter_number != 0 {
            return Err(ShardError::invalid_argument(format!(
                "unexpected parameter number {} in alias config with tupled inputs",
                alias.parameter_number
            )));
        }
        // An alias of the whole input tuple names no particular element.
        let Some(parameter) = alias.parameter_index.first() else {
            return Ok(None);
        };
        if parameter >= number_of_parameters {
            return Err(ShardError::invalid_argument(format!(
                "unexpected parameter index {} in alias config with tupled inputs and {} parameters",
                alias.parameter_index, number_of_parameters
            )));
        }
        Ok(Some(parameter))
    } else {
        if alias.parameter_number >= number_of_parameters {
            return Err(ShardError::invalid_argument(format!(
                "unexpected parameter number {} in alias config without tupled inputs and {} parameters",
                alias.parameter_number, number_of_parameters
            )));
        }
        Ok(Some(alias.parameter_number))
    }
}

/// Aliases that target the whole input tuple (empty parameter index). Under
/// tupled inputs these donate nothing.
pub fn whole_tuple_aliases(config: &AliasConfig) -> Vec<&Alias> {
    config
        .aliases()
        .filter(|a| a.parameter_index.is_empty())
        .collect()
}

/// Number of parameters the donation analysis indexes into for the module's
/// entry computation: the tuple arity of its single parameter under tupled
/// inputs, its parameter count otherwise.
pub fn entry_parameter_count(module: &HloModule, tuple_inputs: bool) -> Result<usize, ShardError> {
    let entry = module.entry_computation()?;
    if !tuple_inputs {
        return Ok(entry.num_parameters());
    }
    let mut parameters = entry.parameter_instructions();
    let (Some(parameter), None) = (parameters.next(), parameters.next()) else {
        return Err(ShardError::invalid_argument(format!(
            "tupled inputs require exactly one entry parameter, '{}' has {}",
            entry.display_name(),
            entry.num_parameters()
        )));
    };
    parameter
        .shape
        .tuple_shapes()
        .map(<[_]>::len)
        .ok_or_else(|| {
            ShardError::invalid_argument(format!(
                "tupled inputs require a tuple-shaped entry parameter, got {}",
                parameter.shape
            ))
        })
}

/// Parameters of the module's entry computation that must be donated.
pub fn parameters_that_must_be_donated(
    module: &HloModule,
    tuple_inputs: bool,
) -> Result<DonationSet, ShardError> {
    let number_of_parameters = entry_parameter_count(module, tuple_inputs)?;
    let donated = parameters_to_donate(
        &module.input_output_alias,
        number_of_parameters,
        tuple_inputs,
    )?;
    debug!(
        "module '{}': {} of {} parameter(s) donated",
        module.name,
        donated.len(),
        number_of_parameters
    );
    Ok(donated)
}

// ── Tests ──────────────────────────────────────────────────────────────────
