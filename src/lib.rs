//! Native-function bridge for the Kilate interpreter: the registry of
//! host-implemented functions, the plugin loader that extends it at startup,
//! and the built-in `print`, `system` and `sleep` natives.

pub mod builtins;
pub mod config;
pub mod diagnostics;
pub mod environment;
pub mod loader;
pub mod registry;
pub mod runtime;
pub mod value;

pub use config::Config;
pub use diagnostics::{Diagnostic, DiagnosticKind, KilateError};
pub use environment::{Environment, VariableResolver};
pub use loader::{LoadReport, PluginLoader};
pub use registry::{NativeFn, NativeFunctionEntry, Registry};
pub use runtime::Runtime;
pub use value::{CallData, CallParam, Value, ValueKind};
