use std::{cell::RefCell, rc::Rc};

use indexmap::IndexMap;

use crate::{
    diagnostics::{Diagnostic, DiagnosticKind, KilateError, Result},
    value::Value,
};

/// Name-to-value lookup that native functions use for variable parameters.
pub trait VariableResolver {
    fn resolve(&self, name: &str) -> Result<Value>;
}

pub type EnvironmentRef = Rc<RefCell<Environment>>;

/// Scoped variable bindings with an optional enclosing scope.
#[derive(Debug, Default)]
pub struct Environment {
    parent: Option<EnvironmentRef>,
    bindings: IndexMap<String, Value>,
}

impl Environment {
    pub fn new() -> EnvironmentRef {
        Rc::new(RefCell::new(Self::default()))
    }

    pub fn with_parent(parent: EnvironmentRef) -> EnvironmentRef {
        Rc::new(RefCell::new(Self {
            parent: Some(parent),
            bindings: IndexMap::new(),
        }))
    }

    pub fn define(&mut self, name: impl Into<String>, value: Value) {
        self.bindings.insert(name.into(), value);
    }

    pub fn get(env: &EnvironmentRef, name: &str) -> Result<Value> {
        env.borrow().lookup(name)
    }

    fn lookup(&self, name: &str) -> Result<Value> {
        if let Some(value) = self.bindings.get(name) {
            return Ok(value.clone());
        }
        match &self.parent {
            Some(parent) => parent.borrow().lookup(name),
            None => Err(undefined(name)),
        }
    }
}

impl VariableResolver for Environment {
    fn resolve(&self, name: &str) -> Result<Value> {
        self.lookup(name)
    }
}

impl VariableResolver for EnvironmentRef {
    fn resolve(&self, name: &str) -> Result<Value> {
        Environment::get(self, name)
    }
}

fn undefined(name: &str) -> KilateError {
    KilateError::from(Diagnostic::new(
        DiagnosticKind::Runtime,
        format!("undefined variable `{name}`"),
    ))
}
