#![allow(dead_code)]

use std::sync::{Arc, OnceLock};

use arcbind::engine::{BindConfig, Engine};
use arcbind_testkit::{fixture_engine_path, init_test_logging};

static ENGINE: OnceLock<Arc<Engine>> = OnceLock::new();

/// Config pointing at the fixture engine with default entry points.
pub fn fixture_config() -> BindConfig {
	init_test_logging();
	BindConfig::new(fixture_engine_path())
}

/// Fixture engine shared by every test in one test binary.
pub fn shared_engine() -> Arc<Engine> {
	Arc::clone(ENGINE.get_or_init(|| Engine::load(&fixture_config()).expect("fixture engine loads")))
}
