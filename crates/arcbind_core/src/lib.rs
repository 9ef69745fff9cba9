//! Host-side binding for the Arcane script engine's native interpreter library.

/// Engine loading, the cross-boundary value protocol, sessions, and dispatch.
pub mod engine;
