//! Discovers native plugins in configured directories and lets each one
//! register its functions.
//!
//! A plugin is a dynamic library whose file name contains the platform
//! library suffix (`.so` on Linux). It must export a no-argument entry point
//! named [`ENTRY_POINT_SYMBOL`]. While that entry point runs, the loader
//! activates the target [`Registry`] on the current thread and the plugin
//! calls back into the host through `kilate_native_register_fn`:
//!
//! ```ignore
//! use std::ffi::c_char;
//! use kilate::{CallData, KilateError, NativeFn, Value};
//!
//! unsafe extern "C" {
//!     fn kilate_native_register_fn(
//!         name: *const c_char,
//!         params: *const *const c_char,
//!         param_count: usize,
//!         callable: NativeFn,
//!     );
//! }
//!
//! // Return the text instead of printing it: the plugin links its own copy
//! // of std, whose stdout buffer the host never flushes.
//! fn shout(data: CallData<'_>) -> Result<Option<Value>, KilateError> {
//!     let loud: String = data
//!         .params
//!         .iter()
//!         .map(|param| format!("{}!", param.payload().to_uppercase()))
//!         .collect();
//!     Ok(Some(Value::string(loud)))
//! }
//!
//! #[unsafe(no_mangle)]
//! pub extern "C" fn KILATE_NATIVE_REGISTER() {
//!     let params = [c"string".as_ptr()];
//!     unsafe { kilate_native_register_fn(c"shout".as_ptr(), params.as_ptr(), 1, shout) };
//! }
//! ```
//!
//! Plugins must be built against the same `kilate` version as the host.

use std::{
    cell::Cell,
    ffi::{CStr, c_char},
    fmt, fs,
    path::{Path, PathBuf},
    ptr::NonNull,
};

use tracing::{debug, warn};

use crate::{
    diagnostics::{Diagnostic, DiagnosticKind, KilateError, Result},
    registry::{NativeFn, Registry},
};

/// Exported symbol every plugin must provide.
pub const ENTRY_POINT_SYMBOL: &str = "KILATE_NATIVE_REGISTER";

/// Substring a file name must contain to be tried as a plugin.
pub const LIBRARY_SUFFIX: &str = std::env::consts::DLL_SUFFIX;

pub type EntryPoint = unsafe extern "C" fn();

/// A library opened by a [`LibraryOpener`]. The loader never drops an opened
/// library, so code it maps stays valid for the rest of the process.
pub trait NativeLibrary {
    fn entry_point(&self) -> Option<EntryPoint>;
}

pub trait LibraryOpener {
    fn open(&self, path: &Path) -> Result<Box<dyn NativeLibrary>>;
}

/// Opens plugins with the host's dynamic loader.
#[derive(Debug, Default, Clone, Copy)]
pub struct DylibOpener;

struct Dylib {
    library: libloading::Library,
}

impl NativeLibrary for Dylib {
    fn entry_point(&self) -> Option<EntryPoint> {
        // SAFETY: the plugin contract fixes the symbol's type to `extern "C" fn()`.
        // The copied pointer stays valid while `self.library` is loaded, and
        // the loader leaks every library it opens.
        let symbol = unsafe {
            self.library
                .get::<EntryPoint>(ENTRY_POINT_SYMBOL.as_bytes())
                .ok()?
        };
        Some(*symbol)
    }
}

impl LibraryOpener for DylibOpener {
    fn open(&self, path: &Path) -> Result<Box<dyn NativeLibrary>> {
        // SAFETY: loading runs the library's initializers. Plugins are trusted
        // native code; no sandboxing is attempted.
        #[cfg(unix)]
        let library = unsafe {
            use libloading::os::unix::{Library, RTLD_NOW};
            Library::open(Some(path), RTLD_NOW).map(libloading::Library::from)
        };
        #[cfg(not(unix))]
        let library = unsafe { libloading::Library::new(path) };

        let library = library.map_err(|err| {
            KilateError::from(Diagnostic::new(
                DiagnosticKind::Plugin,
                format!("failed to load `{}`: {err}", path.display()),
            ))
        })?;
        Ok(Box::new(Dylib { library }))
    }
}

/// A plugin whose entry point ran.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginRecord {
    pub path: PathBuf,
    /// Number of entries the plugin added to the registry.
    pub registered: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    OpenFailed(String),
    MissingEntryPoint,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::OpenFailed(message) => write!(f, "{message}"),
            SkipReason::MissingEntryPoint => {
                write!(f, "function {ENTRY_POINT_SYMBOL} not found")
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedCandidate {
    pub path: PathBuf,
    pub reason: SkipReason,
}

/// Outcome of a plugin scan.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub loaded: Vec<PluginRecord>,
    pub skipped: Vec<SkippedCandidate>,
    /// Directory that could not be listed; the scan stopped there.
    pub aborted: Option<PathBuf>,
    opened: usize,
}

impl LoadReport {
    pub fn registered(&self) -> usize {
        self.loaded.iter().map(|plugin| plugin.registered).sum()
    }

    /// Number of libraries that were opened, with or without an entry point.
    pub fn library_count(&self) -> usize {
        self.opened
    }
}

pub struct PluginLoader<O = DylibOpener> {
    opener: O,
    suffix: String,
}

impl PluginLoader {
    pub fn new() -> Self {
        Self::with_opener(DylibOpener)
    }
}

impl Default for PluginLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl<O: LibraryOpener> PluginLoader<O> {
    pub fn with_opener(opener: O) -> Self {
        Self {
            opener,
            suffix: LIBRARY_SUFFIX.to_owned(),
        }
    }

    pub fn with_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.suffix = suffix.into();
        self
    }

    /// Scans `directories` in order and initializes every plugin found.
    ///
    /// Candidates that fail to open or lack the entry point are logged and
    /// skipped. A directory that cannot be listed stops the whole scan.
    /// Opened libraries are never unloaded, so the registry's entries stay
    /// callable for the life of the process.
    pub fn load<P: AsRef<Path>>(&self, directories: &[P], registry: &mut Registry) -> LoadReport {
        let mut report = LoadReport::default();
        for dir in directories {
            let dir = dir.as_ref();
            let entries = match fs::read_dir(dir) {
                Ok(entries) => entries,
                Err(err) => {
                    warn!(dir = %dir.display(), %err, "cannot open native directory, stopping plugin scan");
                    report.aborted = Some(dir.to_path_buf());
                    return report;
                }
            };

            for entry in entries {
                let entry = match entry {
                    Ok(entry) => entry,
                    Err(err) => {
                        warn!(dir = %dir.display(), %err, "failed to read directory entry");
                        continue;
                    }
                };
                if !entry.file_name().to_string_lossy().contains(&self.suffix) {
                    continue;
                }
                self.load_candidate(&dir.join(entry.file_name()), registry, &mut report);
            }
        }
        report
    }

    fn load_candidate(&self, path: &Path, registry: &mut Registry, report: &mut LoadReport) {
        let library = match self.opener.open(path) {
            Ok(library) => library,
            Err(err) => {
                warn!("Error loading {}: {err}", path.display());
                report.skipped.push(SkippedCandidate {
                    path: path.to_path_buf(),
                    reason: SkipReason::OpenFailed(err.to_string()),
                });
                return;
            }
        };

        // Registry entries point into the library's code: keep it mapped.
        let library: &'static dyn NativeLibrary = Box::leak(library);
        report.opened += 1;
        let Some(entry_point) = library.entry_point() else {
            warn!("Function {ENTRY_POINT_SYMBOL} not found in {}", path.display());
            report.skipped.push(SkippedCandidate {
                path: path.to_path_buf(),
                reason: SkipReason::MissingEntryPoint,
            });
            return;
        };

        let before = registry.len();
        // SAFETY: the plugin contract requires a no-argument, no-return entry
        // point, and its library was leaked above so its code stays mapped.
        with_active(registry, || unsafe { entry_point() });
        let registered = registry.len() - before;
        debug!(path = %path.display(), registered, "initialized native plugin");
        report.loaded.push(PluginRecord {
            path: path.to_path_buf(),
            registered,
        });
    }
}

thread_local! {
    static ACTIVE: Cell<Option<NonNull<Registry>>> = const { Cell::new(None) };
}

struct RestoreActive(Option<NonNull<Registry>>);

impl Drop for RestoreActive {
    fn drop(&mut self) {
        ACTIVE.with(|active| active.set(self.0));
    }
}

/// Runs `f` with `registry` as the target of [`register_active`].
pub fn with_active<R>(registry: &mut Registry, f: impl FnOnce() -> R) -> R {
    let previous = ACTIVE.with(|active| active.replace(Some(NonNull::from(registry))));
    let _restore = RestoreActive(previous);
    f()
}

/// Registers into the registry activated on this thread by [`with_active`].
///
/// Returns `false` when no registry is active.
pub fn register_active(name: &str, required_params: Vec<String>, callable: NativeFn) -> bool {
    ACTIVE.with(|active| match active.get() {
        Some(mut registry) => {
            // SAFETY: the pointer comes from the `&mut Registry` held by
            // `with_active`, which outlives the activation and is not touched
            // by anything else until `f` returns.
            unsafe { registry.as_mut() }.register(name, required_params, callable);
            true
        }
        None => {
            warn!(name, "native registration outside plugin initialization ignored");
            false
        }
    })
}

/// Host callback plugins use to register a native function.
///
/// # Safety
///
/// `name` must be a valid NUL-terminated string. `params` must point to
/// `param_count` valid NUL-terminated strings, or be null when `param_count`
/// is zero.
#[allow(improper_ctypes_definitions)]
#[unsafe(no_mangle)]
pub unsafe extern "C" fn kilate_native_register_fn(
    name: *const c_char,
    params: *const *const c_char,
    param_count: usize,
    callable: NativeFn,
) {
    if name.is_null() {
        warn!("plugin passed a null native function name");
        return;
    }
    // SAFETY: guaranteed by the caller.
    let name = unsafe { CStr::from_ptr(name) }.to_string_lossy();
    let required_params = if params.is_null() || param_count == 0 {
        Vec::new()
    } else {
        // SAFETY: guaranteed by the caller.
        unsafe { std::slice::from_raw_parts(params, param_count) }
            .iter()
            .filter(|param| !param.is_null())
            .map(|&param| unsafe { CStr::from_ptr(param) }.to_string_lossy().into_owned())
            .collect()
    };
    register_active(&name, required_params, callable);
}
