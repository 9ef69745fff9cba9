use std::collections::BTreeSet;
use std::ffi::{c_char, c_void};
use std::fmt;
use std::path::{Component, Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use libloading::Library;
use tracing::{info, warn};

use crate::engine::{BindConfig, BindError, RawValue, Result, Session, SymbolNames, ValueLayout, VmHandle};

/// `make()` entry point.
pub(crate) type MakeFn = unsafe extern "C" fn() -> *mut c_void;
/// `interpret(source)` entry point, cdecl.
pub(crate) type InterpretFn = unsafe extern "C" fn(*const c_char) -> RawValue;
/// Optional VM teardown entry point.
pub(crate) type DestroyFn = unsafe extern "C" fn(*mut c_void);

/// Registry keys of engine modules currently held by a live [`Engine`].
static LOADED: Mutex<BTreeSet<PathBuf>> = Mutex::new(BTreeSet::new());

/// Resolved entry points. Valid while the owning [`Engine`] keeps its library loaded.
#[derive(Clone, Copy)]
pub(crate) struct EntryPoints {
	pub(crate) make: MakeFn,
	pub(crate) interpret: InterpretFn,
	pub(crate) destroy: Option<DestroyFn>,
}

/// A loaded engine module.
///
/// Process-wide: one live `Engine` per module path. Sessions hold an `Arc` to their
/// engine, so the module stays mapped until the last handle derived from it drops.
/// All entry-point calls against one engine are serialized by a single lock.
pub struct Engine {
	path: PathBuf,
	symbols: SymbolNames,
	timeout: Option<Duration>,
	pub(crate) entry: EntryPoints,
	calls: Mutex<()>,
	teardown_gap_reported: AtomicBool,
	_library: Library,
	_registration: Registration,
}

impl Engine {
	/// Load the module described by `config`.
	///
	/// A path with directory components is keyed by its canonical form; a bare file
	/// name is left to the loader's search path and keyed as given. The two forms are
	/// not reconciled, so loading one module once by name and once by path is not
	/// detected as a duplicate.
	pub fn load(config: &BindConfig) -> Result<Arc<Self>> {
		config.validate()?;
		ValueLayout::host().check_against(&ValueLayout::expected())?;

		let registration = Registration::acquire(&config.library)?;
		// SAFETY: loading runs the module's initializers; the engine module is trusted
		// to be a plain C library exporting the configured entry points.
		let library = unsafe { Library::new(&config.library) }.map_err(|source| BindError::LinkLoad {
			path: config.library.clone(),
			source,
		})?;

		let entry = resolve_entry_points(&library, &config.library, &config.symbols)?;
		info!(
			path = %config.library.display(),
			make = %config.symbols.make,
			interpret = %config.symbols.interpret,
			teardown = entry.destroy.is_some(),
			"engine library loaded"
		);

		Ok(Arc::new(Self {
			path: config.library.clone(),
			symbols: config.symbols.clone(),
			timeout: config.timeout(),
			entry,
			calls: Mutex::new(()),
			teardown_gap_reported: AtomicBool::new(false),
			_library: library,
			_registration: registration,
		}))
	}

	/// Load a module with default entry-point names.
	pub fn load_path(path: impl AsRef<Path>) -> Result<Arc<Self>> {
		Self::load(&BindConfig::new(path.as_ref()))
	}

	/// Create a new interpreter session.
	pub fn create_session(self: &Arc<Self>) -> Result<Session> {
		let raw = {
			let _guard = self.lock_calls();
			// SAFETY: `make` was resolved from the loaded library with the declared signature.
			unsafe { (self.entry.make)() }
		};

		let handle = VmHandle::from_raw(raw).ok_or_else(|| BindError::NullHandle {
			symbol: self.symbols.make.clone(),
		})?;
		info!(path = %self.path.display(), "interpreter session created");
		Ok(Session::new(Arc::clone(self), handle))
	}

	/// Library path as configured.
	pub fn path(&self) -> &Path {
		&self.path
	}

	/// Entry-point names in use.
	pub fn symbols(&self) -> &SymbolNames {
		&self.symbols
	}

	/// Per-call timeout applied by a [`Worker`](crate::engine::Worker) spawned on this engine's sessions.
	pub fn timeout(&self) -> Option<Duration> {
		self.timeout
	}

	/// Return `true` when the engine exports a VM teardown entry point.
	pub fn has_teardown(&self) -> bool {
		self.entry.destroy.is_some()
	}

	pub(crate) fn lock_calls(&self) -> MutexGuard<'_, ()> {
		self.calls.lock().unwrap_or_else(PoisonError::into_inner)
	}

	pub(crate) fn report_teardown_gap(&self) {
		if !self.teardown_gap_reported.swap(true, Ordering::Relaxed) {
			warn!(
				path = %self.path.display(),
				"engine exports no teardown entry point; VM handles are released with the library"
			);
		}
	}
}

impl fmt::Debug for Engine {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Engine")
			.field("path", &self.path)
			.field("symbols", &self.symbols)
			.field("timeout", &self.timeout)
			.field("has_teardown", &self.has_teardown())
			.finish_non_exhaustive()
	}
}

fn resolve_entry_points(library: &Library, path: &Path, symbols: &SymbolNames) -> Result<EntryPoints> {
	// SAFETY: the declared function types match the engine's exported C signatures.
	let make = unsafe { resolve::<MakeFn>(library, path, &symbols.make)? };
	let interpret = unsafe { resolve::<InterpretFn>(library, path, &symbols.interpret)? };
	let destroy = match &symbols.destroy {
		Some(name) => Some(unsafe { resolve::<DestroyFn>(library, path, name)? }),
		None => None,
	};

	Ok(EntryPoints { make, interpret, destroy })
}

/// # Safety
///
/// `F` must be the exact function-pointer type of the exported symbol.
unsafe fn resolve<F: Copy>(library: &Library, path: &Path, name: &str) -> Result<F> {
	let symbol = unsafe { library.get::<F>(name.as_bytes()) }.map_err(|source| BindError::MissingSymbol {
		symbol: name.to_owned(),
		path: path.to_path_buf(),
		source,
	})?;
	Ok(*symbol)
}

/// Entry in the process-wide load registry, released on drop.
#[derive(Debug)]
struct Registration {
	key: PathBuf,
}

impl Registration {
	fn acquire(path: &Path) -> Result<Self> {
		let key = registry_key(path);
		let mut loaded = LOADED.lock().unwrap_or_else(PoisonError::into_inner);
		if !loaded.insert(key.clone()) {
			return Err(BindError::AlreadyLoaded { path: key });
		}
		Ok(Self { key })
	}
}

impl Drop for Registration {
	fn drop(&mut self) {
		LOADED.lock().unwrap_or_else(PoisonError::into_inner).remove(&self.key);
	}
}

/// Bare names are resolved by the loader, not against the working directory.
fn registry_key(path: &Path) -> PathBuf {
	let mut components = path.components();
	if let (Some(Component::Normal(_)), None) = (components.next(), components.next()) {
		return path.to_path_buf();
	}
	std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}
