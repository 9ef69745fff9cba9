//! Shared test helpers for workspace crates.

use std::env::consts::{DLL_PREFIX, DLL_SUFFIX};
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::OnceLock;

use tracing_subscriber::EnvFilter;

/// Package name of the native stand-in engine.
pub const FIXTURE_ENGINE_PACKAGE: &str = "arcbind_fixture_engine";

static FIXTURE_ENGINE: OnceLock<PathBuf> = OnceLock::new();

/// Resolve the workspace root path.
pub fn workspace_root() -> PathBuf {
	let manifest_dir = Path::new(env!("CARGO_MANIFEST_DIR"));
	manifest_dir
		.join("..")
		.join("..")
		.canonicalize()
		.unwrap_or_else(|_| manifest_dir.join("..").join(".."))
}

/// Resolve the workspace target directory.
pub fn target_dir() -> PathBuf {
	std::env::var_os("CARGO_TARGET_DIR")
		.map(PathBuf::from)
		.unwrap_or_else(|| workspace_root().join("target"))
}

/// Platform file name for a dynamic library built from crate `stem`.
pub fn dylib_file_name(stem: &str) -> String {
	format!("{DLL_PREFIX}{stem}{DLL_SUFFIX}")
}

/// Build the fixture engine once per test process and return its library path.
pub fn fixture_engine_path() -> &'static Path {
	FIXTURE_ENGINE.get_or_init(build_fixture_engine)
}

/// Install a test-writer `tracing` subscriber filtered by `ARCBIND_LOG` (default `warn`).
pub fn init_test_logging() {
	let filter = EnvFilter::try_from_env("ARCBIND_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
	let _ = tracing_subscriber::fmt().with_env_filter(filter).with_test_writer().try_init();
}

fn build_fixture_engine() -> PathBuf {
	let cargo = std::env::var_os("CARGO").unwrap_or_else(|| "cargo".into());
	let status = Command::new(cargo)
		.current_dir(workspace_root())
		.args(["build", "--quiet", "-p", FIXTURE_ENGINE_PACKAGE])
		.status()
		.expect("cargo build executes");
	assert!(status.success(), "failed to build {FIXTURE_ENGINE_PACKAGE}");

	let path = target_dir().join("debug").join(dylib_file_name(FIXTURE_ENGINE_PACKAGE));
	assert!(path.exists(), "fixture engine missing at {}", path.display());
	path
}
