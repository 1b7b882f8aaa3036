use tracing::debug;

use crate::{
    builtins,
    config::Config,
    diagnostics::Result,
    environment::VariableResolver,
    loader::{LibraryOpener, LoadReport, PluginLoader},
    registry::{NativeFunctionEntry, Registry},
    value::{CallData, CallParam, Value},
};

/// Native-function state for one interpreter instance.
///
/// Startup registers the built-ins, then lets plugins register theirs. After
/// that the registry is only read until [`Runtime::shutdown`].
pub struct Runtime {
    registry: Registry,
    plugins: LoadReport,
}

impl Runtime {
    /// A runtime with the built-ins only.
    pub fn new() -> Self {
        let mut registry = Registry::new();
        builtins::install(&mut registry);
        Self {
            registry,
            plugins: LoadReport::default(),
        }
    }

    /// Built-ins plus every plugin found in the configured directories.
    pub fn with_config(config: &Config) -> Self {
        Self::with_loader(config, &PluginLoader::new())
    }

    pub fn with_loader<O: LibraryOpener>(config: &Config, loader: &PluginLoader<O>) -> Self {
        let mut runtime = Self::new();
        runtime.plugins = loader.load(config.plugin_directories(), &mut runtime.registry);
        debug!(
            natives = runtime.registry.len(),
            plugins = runtime.plugins.loaded.len(),
            skipped = runtime.plugins.skipped.len(),
            "native runtime ready"
        );
        runtime
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn plugins(&self) -> &LoadReport {
        &self.plugins
    }

    pub fn find(&self, name: &str) -> Option<&NativeFunctionEntry> {
        self.registry.find(name)
    }

    pub fn invoke(
        &self,
        name: &str,
        params: Vec<CallParam>,
        env: &dyn VariableResolver,
    ) -> Result<Option<Value>> {
        self.registry.invoke(name, CallData::new(params, env))
    }

    /// Tears down the registry. Plugin libraries stay loaded until exit.
    pub fn shutdown(self) {
        self.registry.teardown();
    }
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new()
    }
}
