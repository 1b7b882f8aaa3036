//! Ordered table of native functions callable from interpreted code.
//!
//! Entries are appended and never mutated. Lookups scan from the oldest entry,
//! so when two entries share a name the first registration wins.

use std::fmt;

use tracing::debug;

use crate::{
    diagnostics::{Diagnostic, DiagnosticKind, KilateError, Result},
    value::{CallData, Value},
};

/// Signature every native callable implements, built-in or plugin-provided.
///
/// `Ok(None)` means the call produced no value.
pub type NativeFn = fn(CallData<'_>) -> Result<Option<Value>>;

/// A named native callable plus its informational parameter signature.
pub struct NativeFunctionEntry {
    name: String,
    required_params: Vec<String>,
    callable: NativeFn,
}

impl NativeFunctionEntry {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Type names of the expected params. Not enforced at call time.
    pub fn required_params(&self) -> &[String] {
        &self.required_params
    }

    pub fn call(&self, data: CallData<'_>) -> Result<Option<Value>> {
        (self.callable)(data)
    }
}

impl fmt::Debug for NativeFunctionEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeFunctionEntry")
            .field("name", &self.name)
            .field("required_params", &self.required_params)
            .finish_non_exhaustive()
    }
}

impl fmt::Display for NativeFunctionEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.name, self.required_params.join(", "))
    }
}

#[derive(Debug, Default)]
pub struct Registry {
    entries: Vec<NativeFunctionEntry>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an entry. Duplicate names are accepted; the earlier one keeps
    /// winning lookups.
    pub fn register(&mut self, name: &str, required_params: Vec<String>, callable: NativeFn) {
        debug!(name, params = ?required_params, "registering native function");
        self.entries.push(NativeFunctionEntry {
            name: name.to_owned(),
            required_params,
            callable,
        });
    }

    pub fn find(&self, name: &str) -> Option<&NativeFunctionEntry> {
        self.entries.iter().find(|entry| entry.name == name)
    }

    pub fn invoke(&self, name: &str, data: CallData<'_>) -> Result<Option<Value>> {
        match self.find(name) {
            Some(entry) => entry.call(data),
            None => Err(KilateError::from(Diagnostic::new(
                DiagnosticKind::Registry,
                format!("unknown native function `{name}`"),
            ))),
        }
    }

    /// Entries in registration order.
    pub fn entries(&self) -> impl Iterator<Item = &NativeFunctionEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Releases every entry. A new registry has to be created afterwards.
    pub fn teardown(self) {
        debug!(entries = self.entries.len(), "tearing down native registry");
        drop(self);
    }
}
