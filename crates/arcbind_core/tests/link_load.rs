#![allow(missing_docs)]

mod support;

use arcbind::engine::{BindConfig, BindError, Engine, Outcome};

use support::fixture_config;

#[test]
fn missing_library_is_reported_as_link_load() {
	let err = Engine::load_path("/nonexistent/libarcane.so").expect_err("missing library should fail");
	assert!(err.is_link_load());
}

#[test]
fn module_lifecycle_covers_missing_symbols_duplicates_and_reload() {
	let mut broken = fixture_config();
	broken.symbols.interpret = "no_such_entry".to_owned();
	let err = Engine::load(&broken).expect_err("missing entry point should fail");
	assert!(err.is_link_load());
	match &err {
		BindError::MissingSymbol { symbol, .. } => assert_eq!(symbol, "no_such_entry"),
		other => panic!("unexpected error: {other}"),
	}

	let mut no_teardown = fixture_config();
	no_teardown.symbols.destroy = Some("arcane_destroy".to_owned());
	let err = Engine::load(&no_teardown).expect_err("configured teardown must exist");
	assert!(matches!(err, BindError::MissingSymbol { .. }));

	let engine = Engine::load(&fixture_config()).expect("fixture engine loads");
	let session = engine.create_session().expect("session");
	assert!(matches!(
		Engine::load(&fixture_config()),
		Err(BindError::AlreadyLoaded { .. })
	));

	// A live session keeps the module loaded even after the caller's engine handle is gone.
	drop(engine);
	assert!(matches!(
		Engine::load(&fixture_config()),
		Err(BindError::AlreadyLoaded { .. })
	));
	assert_eq!(session.interpret("5").expect("interpret"), Outcome::Integer(5));

	drop(session);
	let reloaded = Engine::load(&fixture_config()).expect("reload after last handle drops");
	let session = reloaded.create_session().expect("session");
	assert_eq!(session.interpret("6").expect("interpret"), Outcome::Integer(6));
}

#[test]
fn config_from_toml_reports_missing_library() {
	let toml = format!("library = {:?}\ntimeout_ms = 500\n", "/nonexistent/arcbind-config/libarcane.so");
	let config = BindConfig::from_toml_str(&toml).expect("config parses");
	assert_eq!(config.timeout_ms, Some(500));

	let err = Engine::load(&config).expect_err("configured path does not exist");
	assert!(matches!(err, BindError::LinkLoad { .. }));
}
