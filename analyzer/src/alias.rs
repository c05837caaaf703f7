// alias.rs — Input/output buffer alias configuration
//
// Declares which output positions may share storage with which input
// parameters. Entries keep their configured order so that analyses walking
// the table report failures reproducibly.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ShardError;

// ── Shape index ─────────────────────────────────────────────────────────────

/// Path into a (possibly nested) tuple shape. Empty means the whole value.
#[derive(
    Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct ShapeIndex(pub Vec<usize>);

impl ShapeIndex {
    pub fn new(path: Vec<usize>) -> Self {
        Self(path)
    }

    /// Index of the whole value.
    pub fn root() -> Self {
        Self(Vec::new())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn first(&self) -> Option<usize> {
        self.0.first().copied()
    }
}

impl fmt::Display for ShapeIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, component) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{}", component)?;
        }
        f.write_str("}")
    }
}

// ── Alias entries ───────────────────────────────────────────────────────────

/// Whether the runtime may or must reuse the parameter buffer for the output.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum AliasKind {
    #[default]
    MayAlias,
    MustAlias,
}

/// Output at `output_index` shares storage with parameter
/// `parameter_number` at `parameter_index`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Alias {
    pub output_index: ShapeIndex,
    pub parameter_number: usize,
    #[serde(default)]
    pub parameter_index: ShapeIndex,
    #[serde(default)]
    pub kind: AliasKind,
}

impl fmt::Display for Alias {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.kind {
            AliasKind::MayAlias => "may-alias",
            AliasKind::MustAlias => "must-alias",
        };
        write!(
            f,
            "{}: ({}, {}, {})",
            self.output_index, self.parameter_number, self.parameter_index, kind
        )
    }
}

// ── Configuration ───────────────────────────────────────────────────────────

/// Ordered alias table of a module.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AliasConfig {
    #[serde(default)]
    entries: Vec<Alias>,
}

impl AliasConfig {
    /// Build a table from entries in their configured order. Entries are taken
    /// as given; use `set_up_alias` to build a table with validation.
    pub fn new(entries: Vec<Alias>) -> Self {
        Self { entries }
    }

    /// Append an alias, rejecting a second alias for the same output index.
    pub fn set_up_alias(
        &mut self,
        output_index: ShapeIndex,
        parameter_number: usize,
        parameter_index: ShapeIndex,
        kind: AliasKind,
    ) -> Result<(), ShardError> {
        if let Some(existing) = self.output_alias(&output_index) {
            return Err(ShardError::invalid_argument(format!(
                "output index {} already aliases parameter {} at {}",
                output_index, existing.parameter_number, existing.parameter_index
            )));
        }
        self.entries.push(Alias {
            output_index,
            parameter_number,
            parameter_index,
            kind,
        });
        Ok(())
    }

    /// Entries in configured order.
    pub fn aliases(&self) -> std::slice::Iter<'_, Alias> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn output_alias(&self, output_index: &ShapeIndex) -> Option<&Alias> {
        self.entries.iter().find(|a| &a.output_index == output_index)
    }

    pub fn output_has_alias(&self, output_index: &ShapeIndex) -> bool {
        self.output_alias(output_index).is_some()
    }

    pub fn parameter_has_alias(
        &self,
        parameter_number: usize,
        parameter_index: &ShapeIndex,
    ) -> bool {
        self.aliased_output(parameter_number, parameter_index).is_some()
    }

    /// Output index aliased to the given parameter buffer, if any.
    pub fn aliased_output(
        &self,
        parameter_number: usize,
        parameter_index: &ShapeIndex,
    ) -> Option<&ShapeIndex> {
        self.entries
            .iter()
            .find(|a| {
                a.parameter_number == parameter_number && &a.parameter_index == parameter_index
            })
            .map(|a| &a.output_index)
    }
}

impl<'a> IntoIterator for &'a AliasConfig {
    type Item = &'a Alias;
    type IntoIter = std::slice::Iter<'a, Alias>;

    fn into_iter(self) -> Self::IntoIter {
        self.aliases()
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────
