use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::engine::ConfigError;

/// Crate-local result type.
pub type Result<T> = std::result::Result<T, BindError>;

/// Host-level failures while loading or talking to the engine.
///
/// Script-level conditions (runtime errors, unknown discriminants, undecodable
/// text) are not errors here; they come back as [`crate::engine::Outcome`] data.
#[derive(Debug, Error)]
pub enum BindError {
	/// Filesystem or thread-spawn failure.
	#[error("io: {0}")]
	Io(#[from] std::io::Error),
	/// Native module could not be opened.
	#[error("failed to load engine library {}: {source}", path.display())]
	LinkLoad {
		/// Library path as requested.
		path: PathBuf,
		/// Loader diagnostic.
		source: libloading::Error,
	},
	/// Native module is missing a required entry point.
	#[error("engine library {} does not export `{symbol}`: {source}", path.display())]
	MissingSymbol {
		/// Entry-point name that failed to resolve.
		symbol: String,
		/// Library path as requested.
		path: PathBuf,
		/// Loader diagnostic.
		source: libloading::Error,
	},
	/// Module is already loaded by a live [`crate::engine::Engine`].
	#[error("engine library already loaded: {}", path.display())]
	AlreadyLoaded {
		/// Canonical library path.
		path: PathBuf,
	},
	/// Constructor entry point returned a null handle.
	#[error("`{symbol}` returned a null VM handle")]
	NullHandle {
		/// Constructor entry-point name.
		symbol: String,
	},
	/// Host value layout disagrees with the engine's declared layout.
	#[error("value layout mismatch for {field}: expected {expected}, host has {actual}")]
	LayoutMismatch {
		/// Field or aggregate property being compared.
		field: &'static str,
		/// Declared engine value.
		expected: usize,
		/// Host value.
		actual: usize,
	},
	/// Script source cannot be passed as a null-terminated string.
	#[error("script source contains a NUL byte at offset {position}")]
	InteriorNul {
		/// Byte offset of the first NUL.
		position: usize,
	},
	/// Engine call did not return within the host timeout.
	#[error("engine call exceeded timeout of {timeout:?}")]
	Timeout {
		/// Timeout that elapsed.
		timeout: Duration,
	},
	/// Interpreter worker was abandoned or has exited.
	#[error("interpreter worker is unavailable")]
	WorkerUnavailable,
	/// Configuration could not be read or is invalid.
	#[error("config: {0}")]
	Config(#[from] ConfigError),
}

impl BindError {
	/// Return `true` for failures that mean the engine module is unusable.
	pub fn is_link_load(&self) -> bool {
		matches!(self, Self::LinkLoad { .. } | Self::MissingSymbol { .. })
	}
}
