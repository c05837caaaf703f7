// diag.rs — Unified diagnostics model
//
// User-facing rendering of analysis failures and warnings. Analyses return
// `ShardError`; the pipeline and CLI convert them into `Diagnostic`s.
//
// Preconditions: none (types only).
// Postconditions: none (types only).
// Failure modes: none.
// Side effects: none.

use std::fmt;

use crate::error::ShardError;
use crate::id::InstructionId;

// ── Diagnostic code ──────────────────────────────────────────────────────

/// A stable diagnostic code (e.g., `E0100`, `W0400`).
///
/// Once assigned, a code must never be reassigned to a different meaning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DiagCode(pub &'static str);

impl fmt::Display for DiagCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

pub mod codes {
    use super::DiagCode;

    // E01xx: sharding resolution
    pub const E0100: DiagCode = DiagCode("E0100"); // shape mismatch
    pub const E0101: DiagCode = DiagCode("E0101"); // invalid sharding

    // E02xx: argument validation
    pub const E0200: DiagCode = DiagCode("E0200"); // invalid argument

    // E03xx: computation well-formedness
    pub const E0300: DiagCode = DiagCode("E0300"); // duplicate parameter
    pub const E0301: DiagCode = DiagCode("E0301"); // multiple roots
    pub const E0302: DiagCode = DiagCode("E0302"); // missing parameter
    pub const E0303: DiagCode = DiagCode("E0303"); // missing root

    // W04xx: donation
    pub const W0400: DiagCode = DiagCode("W0400"); // whole-tuple alias donates nothing
}

// ── Severity level ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagLevel {
    Error,
    Warning,
}

// ── Location ─────────────────────────────────────────────────────────────

/// Where in the module a diagnostic applies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    pub computation: String,
    pub instruction: Option<InstructionId>,
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.instruction {
            Some(id) => write!(f, "{}/{}", self.computation, id),
            None => write!(f, "{}", self.computation),
        }
    }
}

// ── Diagnostic ───────────────────────────────────────────────────────────

/// A diagnostic emitted by any analysis.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub code: Option<DiagCode>,
    pub level: DiagLevel,
    pub location: Option<Location>,
    pub message: String,
    pub hint: Option<String>,
    pub notes: Vec<String>,
}

impl Diagnostic {
    /// Create a new diagnostic with no code, location, hint, or notes.
    pub fn new(level: DiagLevel, message: impl Into<String>) -> Self {
        Self {
            code: None,
            level,
            location: None,
            message: message.into(),
            hint: None,
            notes: Vec::new(),
        }
    }

    /// Attach a stable diagnostic code.
    pub fn with_code(mut self, code: DiagCode) -> Self {
        self.code = Some(code);
        self
    }

    /// Attach the computation (and optionally instruction) the diagnostic refers to.
    pub fn with_location(
        mut self,
        computation: impl Into<String>,
        instruction: Option<InstructionId>,
    ) -> Self {
        self.location = Some(Location {
            computation: computation.into(),
            instruction,
        });
        self
    }

    /// Attach a remediation hint.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    /// Attach a free-form note.
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    pub fn is_error(&self) -> bool {
        self.level == DiagLevel::Error
    }
}

impl From<&ShardError> for Diagnostic {
    fn from(err: &ShardError) -> Self {
        let diag = Diagnostic::new(DiagLevel::Error, err.to_string()).with_code(err.code());
        match err {
            ShardError::ShapeMismatch { .. } => diag.with_hint(
                "tuple shardings must mirror the shape's tuple structure element by element",
            ),
            ShardError::MissingParameter(_) => diag.with_hint(
                "every declared parameter needs exactly one parameter instruction",
            ),
            _ => diag,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let level = match self.level {
            DiagLevel::Error => "error",
            DiagLevel::Warning => "warning",
        };
        if let Some(code) = &self.code {
            write!(f, "{}[{}]: {}", level, code, self.message)?;
        } else {
            write!(f, "{}: {}", level, self.message)?;
        }
        if let Some(location) = &self.location {
            write!(f, "\n  --> {}", location)?;
        }
        for note in &self.notes {
            write!(f, "\n  note: {}", note)?;
        }
        if let Some(hint) = &self.hint {
            write!(f, "\n  hint: {}", hint)?;
        }
        Ok(())
    }
}
