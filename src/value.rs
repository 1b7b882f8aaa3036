use std::fmt;

use crate::environment::VariableResolver;

/// A typed interpreter value as seen by native functions.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int(i32),
    Long(i64),
    Float(f32),
    String(String),
    Bool(bool),
    /// A callable defined by interpreted code, referenced by name.
    Function(String),
    /// A binding that refers to another variable by name.
    Var(String),
}

impl Value {
    pub fn string(value: impl Into<String>) -> Self {
        Self::String(value.into())
    }

    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Int(_) => ValueKind::Int,
            Value::Long(_) => ValueKind::Long,
            Value::Float(_) => ValueKind::Float,
            Value::String(_) => ValueKind::String,
            Value::Bool(_) => ValueKind::Bool,
            Value::Function(_) => ValueKind::Function,
            Value::Var(_) => ValueKind::Var,
        }
    }

    pub fn type_name(&self) -> &'static str {
        self.kind().type_name()
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(n) => write!(f, "{n}"),
            Value::Long(n) => write!(f, "{n}"),
            Value::Float(n) => write!(f, "{n:.6}"),
            Value::String(s) => write!(f, "{s}"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Function(name) => write!(f, "<fn {name}>"),
            Value::Var(name) => write!(f, "<var {name}>"),
        }
    }
}

/// Tag of a [`Value`], without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Int,
    Long,
    Float,
    String,
    Bool,
    Function,
    Var,
}

impl ValueKind {
    /// Name used in native function signatures.
    pub const fn type_name(self) -> &'static str {
        match self {
            ValueKind::Int => "int",
            ValueKind::Long => "long",
            ValueKind::Float => "float",
            ValueKind::String => "string",
            ValueKind::Bool => "bool",
            ValueKind::Function => "function",
            ValueKind::Var => "var",
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name())
    }
}

/// One argument of a native call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallParam {
    /// Raw text written at the call site.
    Literal(String),
    /// Name of a variable to resolve through the environment.
    Variable(String),
}

impl CallParam {
    pub fn literal(text: impl Into<String>) -> Self {
        Self::Literal(text.into())
    }

    pub fn variable(name: impl Into<String>) -> Self {
        Self::Variable(name.into())
    }

    /// The unresolved text of the parameter.
    pub fn payload(&self) -> &str {
        match self {
            CallParam::Literal(text) | CallParam::Variable(text) => text,
        }
    }
}

/// Arguments handed to a native callable for a single call.
///
/// The params are owned by the call; the environment is borrowed from the
/// interpreter for the duration of the call only.
pub struct CallData<'env> {
    pub params: Vec<CallParam>,
    pub env: &'env dyn VariableResolver,
}

impl<'env> CallData<'env> {
    pub fn new(params: Vec<CallParam>, env: &'env dyn VariableResolver) -> Self {
        Self { params, env }
    }
}

impl fmt::Debug for CallData<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallData")
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}
