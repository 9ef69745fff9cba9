use std::ffi::{CString, c_void};
use std::fmt;
use std::ptr::NonNull;
use std::sync::Arc;

use tracing::debug;

use crate::engine::{BindError, Engine, Outcome, Result, ValueRef, classify};

/// Opaque interpreter handle returned by the engine's constructor.
///
/// Never inspected; only handed back to the engine that produced it.
pub struct VmHandle(NonNull<c_void>);

impl VmHandle {
	pub(crate) fn from_raw(raw: *mut c_void) -> Option<Self> {
		NonNull::new(raw).map(Self)
	}

	pub(crate) fn as_ptr(&self) -> *mut c_void {
		self.0.as_ptr()
	}
}

impl fmt::Debug for VmHandle {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str("VmHandle(..)")
	}
}

/// One interpreter session: an exclusively owned VM handle plus its engine.
///
/// Dropping the session releases the handle through the engine's teardown entry
/// point when one is exported.
#[derive(Debug)]
pub struct Session {
	engine: Arc<Engine>,
	handle: VmHandle,
}

// SAFETY: the handle is exclusively owned by this session and every engine call
// made with it is serialized through the engine's call lock.
unsafe impl Send for Session {}

impl Session {
	pub(crate) fn new(engine: Arc<Engine>, handle: VmHandle) -> Self {
		Self { engine, handle }
	}

	/// Engine this session belongs to.
	pub fn engine(&self) -> &Arc<Engine> {
		&self.engine
	}

	/// Opaque handle owned by this session.
	pub fn handle(&self) -> &VmHandle {
		&self.handle
	}

	/// Evaluate `source` and classify the returned value.
	///
	/// Runs on the calling thread and is not bounded by [`Engine::timeout`]; move the
	/// session into a [`Worker`](crate::engine::Worker) for that.
	pub fn interpret(&self, source: &str) -> Result<Outcome> {
		self.evaluate(source, |value| classify(&value))
	}

	/// Evaluate `source` and hand the borrowed engine value to `consume`.
	///
	/// The engine lock is held while `consume` runs, so the value's text cannot be
	/// invalidated by another call until it returns. Nothing borrowed from the value
	/// can escape the closure.
	///
	/// The lock is not reentrant: `consume` must not call back into the same engine.
	/// Any engine call made from inside `consume` deadlocks, including the teardown
	/// call run when a session of the same engine is dropped there.
	pub fn evaluate<R>(&self, source: &str, consume: impl FnOnce(ValueRef<'_>) -> R) -> Result<R> {
		let source = encode_source(source)?;

		let _guard = self.engine.lock_calls();
		// SAFETY: `interpret` was resolved with the declared signature and `source` is
		// a live null-terminated string for the duration of the call.
		let raw = unsafe { (self.engine.entry.interpret)(source.as_ptr()) };
		debug!(tag = raw.tag, source_len = source.as_bytes().len(), "engine interpret returned");

		// SAFETY: engine text stays valid until the next engine call, which `_guard`
		// excludes until `consume` has returned.
		let value = unsafe { ValueRef::new(raw) };
		Ok(consume(value))
	}
}

impl Drop for Session {
	fn drop(&mut self) {
		match self.engine.entry.destroy {
			Some(destroy) => {
				let _guard = self.engine.lock_calls();
				// SAFETY: the handle came from this engine's `make` and is released exactly once.
				unsafe { destroy(self.handle.as_ptr()) };
				debug!("interpreter session destroyed");
			}
			None => self.engine.report_teardown_gap(),
		}
	}
}

/// Encode script source as the binding's fixed narrow encoding: UTF-8, null-terminated.
pub(crate) fn encode_source(source: &str) -> Result<CString> {
	CString::new(source).map_err(|err| BindError::InteriorNul {
		position: err.nul_position(),
	})
}

#[cfg(test)]
mod tests;
