use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Severity
// ---------------------------------------------------------------------------

/// How serious a validation finding is.
///
/// Only `Error` findings make a spec invalid; `Warning` and `Info` are
/// surfaced to the user but never block generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Spec is invalid, generation would fail or produce a broken project.
    Error,
    /// Generation will proceed but the result likely misbehaves at runtime.
    Warning,
    /// Stylistic or cost/operability suggestion with no correctness impact.
    Info,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Severity::Error => "ERROR",
            Severity::Warning => "WARNING",
            Severity::Info => "INFO",
        };
        f.write_str(s)
    }
}

// ---------------------------------------------------------------------------
// Diagnostic
// ---------------------------------------------------------------------------

/// A single validation finding, located by a dotted/bracketed path into the
/// spec (e.g. `agents.flight_agent.tools`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub path: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

impl Diagnostic {
    pub fn new(
        severity: Severity,
        path: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            severity,
            path: path.into(),
            message: message.into(),
            suggestion: None,
        }
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.severity, self.path, self.message)?;
        if let Some(s) = &self.suggestion {
            write!(f, "\n  Suggestion: {s}")?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// ValidationOutcome
// ---------------------------------------------------------------------------

/// The result of one validation pass: an ordered diagnostic sequence plus
/// the overall verdict. Ordering is checker-registration order, not severity
/// order; callers needing severity grouping filter themselves.
#[derive(Debug, Clone, Serialize)]
pub struct ValidationOutcome {
    pub is_valid: bool,
    pub diagnostics: Vec<Diagnostic>,
}

impl ValidationOutcome {
    pub fn new(diagnostics: Vec<Diagnostic>) -> Self {
        let is_valid = !diagnostics
            .iter()
            .any(|d| d.severity == Severity::Error);
        Self {
            is_valid,
            diagnostics,
        }
    }

    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.by_severity(Severity::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.by_severity(Severity::Warning)
    }

    pub fn infos(&self) -> impl Iterator<Item = &Diagnostic> {
        self.by_severity(Severity::Info)
    }

    pub fn error_count(&self) -> usize {
        self.errors().count()
    }

    fn by_severity(&self, severity: Severity) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics
            .iter()
            .filter(move |d| d.severity == severity)
    }
}
