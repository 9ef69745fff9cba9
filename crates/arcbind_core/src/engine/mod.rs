mod config;
mod dispatch;
mod error;
mod layout;
mod library;
mod outcome;
mod session;
mod value;
mod worker;

/// Binding configuration and entry-point names.
pub use config::{BindConfig, ConfigError, ConfigResult, SymbolNames};
/// Value classification entry point.
pub use dispatch::classify;
/// Error and result aliases.
pub use error::{BindError, Result};
/// Cross-boundary value layout descriptions.
pub use layout::{FieldLayout, ValueLayout};
/// Loaded engine module.
pub use library::Engine;
/// Host-owned classification results.
pub use outcome::{EncodingError, Outcome, ScriptText};
/// Interpreter sessions and their opaque handles.
pub use session::{Session, VmHandle};
/// Wire-level value types.
pub use value::{Payload, RawValue, ValueRef, ValueType};
/// Timeout-bounded interpreter worker.
pub use worker::Worker;
