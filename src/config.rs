use std::{
    env, fs,
    path::{Path, PathBuf},
    str::FromStr,
};

use serde::Deserialize;

use crate::diagnostics::{Diagnostic, DiagnosticKind, KilateError, Result};

/// Environment variable holding extra plugin directories, in `PATH` syntax.
pub const NATIVE_PATH_VAR: &str = "KILATE_NATIVE_PATH";

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub natives: NativesConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct NativesConfig {
    /// Directories scanned for plugins, in order.
    pub directories: Vec<PathBuf>,
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|err| {
            KilateError::from(
                Diagnostic::new(
                    DiagnosticKind::Config,
                    format!("cannot read `{}`: {err}", path.display()),
                )
                .with_note("pass --config with a readable TOML file"),
            )
        })?;
        text.parse()
    }

    /// Appends directories listed in [`NATIVE_PATH_VAR`], if set.
    pub fn with_env_directories(mut self) -> Self {
        if let Some(paths) = env::var_os(NATIVE_PATH_VAR) {
            self.natives
                .directories
                .extend(env::split_paths(&paths).filter(|p| !p.as_os_str().is_empty()));
        }
        self
    }

    pub fn plugin_directories(&self) -> &[PathBuf] {
        &self.natives.directories
    }
}

impl FromStr for Config {
    type Err = KilateError;

    fn from_str(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }
}
