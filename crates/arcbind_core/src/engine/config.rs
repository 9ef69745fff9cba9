use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

/// Environment variable overriding [`BindConfig::library`].
pub const LIBRARY_ENV: &str = "ARCBIND_LIBRARY";
/// Environment variable overriding [`BindConfig::timeout_ms`].
pub const TIMEOUT_ENV: &str = "ARCBIND_TIMEOUT_MS";

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
	/// Config file could not be read.
	#[error("read {}: {source}", path.display())]
	Read {
		/// Config file path.
		path: PathBuf,
		/// Underlying IO failure.
		source: std::io::Error,
	},
	/// Config text is not valid TOML for [`BindConfig`].
	#[error("parse: {0}")]
	Parse(#[from] toml::de::Error),
	/// A setting has an unusable value.
	#[error("invalid {key}: {reason}")]
	Invalid {
		/// Setting name.
		key: &'static str,
		/// What is wrong with it.
		reason: String,
	},
}

/// Config-local result type.
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Where the engine lives and how to reach it.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BindConfig {
	/// Path or loader-searchable name of the native engine module.
	pub library: PathBuf,
	/// Exported entry-point names.
	#[serde(default)]
	pub symbols: SymbolNames,
	/// Host-side timeout for a single interpret call, in milliseconds.
	#[serde(default)]
	pub timeout_ms: Option<u64>,
}

/// Names of the engine's exported entry points.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SymbolNames {
	/// Zero-argument VM constructor.
	pub make: String,
	/// Single-argument evaluation entry point.
	pub interpret: String,
	/// VM teardown entry point, when the engine exports one.
	pub destroy: Option<String>,
}

impl Default for SymbolNames {
	fn default() -> Self {
		Self {
			make: "make".to_owned(),
			interpret: "interpret".to_owned(),
			destroy: None,
		}
	}
}

impl BindConfig {
	/// Build a config for `library` with default entry points and no timeout.
	pub fn new(library: impl Into<PathBuf>) -> Self {
		Self {
			library: library.into(),
			symbols: SymbolNames::default(),
			timeout_ms: None,
		}
	}

	/// Parse config from TOML text.
	pub fn from_toml_str(content: &str) -> ConfigResult<Self> {
		Ok(toml::from_str(content)?)
	}

	/// Read and parse a TOML config file.
	pub fn from_toml_file(path: impl AsRef<Path>) -> ConfigResult<Self> {
		let path = path.as_ref();
		let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
			path: path.to_path_buf(),
			source,
		})?;
		Self::from_toml_str(&content)
	}

	/// Apply `ARCBIND_LIBRARY` and `ARCBIND_TIMEOUT_MS` from the process environment.
	pub fn apply_env_overrides(&mut self) -> ConfigResult<()> {
		self.apply_overrides_with(|key| env::var(key).ok())
	}

	/// Apply overrides from an arbitrary key lookup.
	pub fn apply_overrides_with(&mut self, lookup: impl Fn(&str) -> Option<String>) -> ConfigResult<()> {
		if let Some(library) = lookup(LIBRARY_ENV) {
			self.library = PathBuf::from(library);
		}

		if let Some(raw) = lookup(TIMEOUT_ENV) {
			let timeout_ms = raw.trim().parse::<u64>().map_err(|err| ConfigError::Invalid {
				key: TIMEOUT_ENV,
				reason: format!("{raw:?}: {err}"),
			})?;
			self.timeout_ms = Some(timeout_ms);
		}

		Ok(())
	}

	/// Reject settings the binding cannot act on.
	pub fn validate(&self) -> ConfigResult<()> {
		if self.library.as_os_str().is_empty() {
			return Err(invalid("library", "path is empty"));
		}
		if self.symbols.make.is_empty() {
			return Err(invalid("symbols.make", "name is empty"));
		}
		if self.symbols.interpret.is_empty() {
			return Err(invalid("symbols.interpret", "name is empty"));
		}
		if self.symbols.destroy.as_deref() == Some("") {
			return Err(invalid("symbols.destroy", "name is empty"));
		}
		if self.timeout_ms == Some(0) {
			return Err(invalid("timeout_ms", "must be greater than zero"));
		}
		Ok(())
	}

	/// Configured per-call timeout.
	pub fn timeout(&self) -> Option<Duration> {
		self.timeout_ms.map(Duration::from_millis)
	}
}

fn invalid(key: &'static str, reason: &str) -> ConfigError {
	ConfigError::Invalid {
		key,
		reason: reason.to_owned(),
	}
}
