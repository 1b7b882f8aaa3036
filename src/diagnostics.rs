use std::fmt;

use thiserror::Error;

/// Which part of the native bridge raised a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticKind {
    Config,
    Plugin,
    Registry,
    Runtime,
}

/// Rich diagnostic information surfaced to end users.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub message: String,
    pub notes: Vec<String>,
}

impl Diagnostic {
    pub fn new(kind: DiagnosticKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            notes: Vec::new(),
        }
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)?;
        for note in &self.notes {
            write!(f, "\n  note: {note}")?;
        }
        Ok(())
    }
}

impl std::error::Error for Diagnostic {}

/// Unified error type for the native bridge.
#[derive(Debug, Error)]
pub enum KilateError {
    #[error("{0}")]
    Diagnostic(#[from] Diagnostic),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid configuration: {0}")]
    Config(#[from] toml::de::Error),
}

impl KilateError {
    pub fn runtime(message: impl Into<String>) -> Self {
        Self::from(Diagnostic::new(DiagnosticKind::Runtime, message))
    }

    /// Kind of the underlying diagnostic, if this error carries one.
    pub fn kind(&self) -> Option<DiagnosticKind> {
        match self {
            KilateError::Diagnostic(diag) => Some(diag.kind),
            KilateError::Config(_) => Some(DiagnosticKind::Config),
            KilateError::Io(_) => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, KilateError>;
