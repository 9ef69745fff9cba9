use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use tracing::{debug, warn};

use crate::engine::{BindError, Outcome, Result, Session};

struct Request {
	source: String,
	reply: Sender<Result<Outcome>>,
}

/// A session moved onto a dedicated thread so callers can bound each call.
///
/// [`Worker::interpret`] applies the engine's configured timeout;
/// [`Worker::interpret_within`] overrides it per call.
///
/// Engine calls cannot be cancelled. When a call overruns its timeout the worker
/// is abandoned: its thread is detached, finishes the native call on its own, and
/// every later request fails with [`BindError::WorkerUnavailable`].
pub struct Worker {
	requests: Option<Sender<Request>>,
	thread: Option<JoinHandle<()>>,
	timeout: Option<Duration>,
}

impl Worker {
	/// Move `session` onto a new interpreter thread.
	pub fn spawn(session: Session) -> Result<Self> {
		let timeout = session.engine().timeout();
		let (requests, incoming) = crossbeam_channel::unbounded();
		let thread = thread::Builder::new()
			.name("arcbind-interpreter".to_owned())
			.spawn(move || serve(session, incoming))?;

		Ok(Self {
			requests: Some(requests),
			thread: Some(thread),
			timeout,
		})
	}

	/// Timeout applied by [`Worker::interpret`], taken from the engine config.
	pub fn timeout(&self) -> Option<Duration> {
		self.timeout
	}

	/// Evaluate `source` on the worker thread within the configured timeout.
	///
	/// Without a configured timeout this waits for the engine call to return.
	pub fn interpret(&mut self, source: &str) -> Result<Outcome> {
		match self.timeout {
			Some(timeout) => self.interpret_within(source, timeout),
			None => {
				let response = self.submit(source)?;
				response.recv().unwrap_or_else(|_| {
					self.abandon();
					Err(BindError::WorkerUnavailable)
				})
			}
		}
	}

	/// Evaluate `source` on the worker thread, waiting at most `timeout`.
	pub fn interpret_within(&mut self, source: &str, timeout: Duration) -> Result<Outcome> {
		let response = self.submit(source)?;
		match response.recv_timeout(timeout) {
			Ok(result) => result,
			Err(RecvTimeoutError::Timeout) => {
				warn!(?timeout, "engine call timed out; abandoning interpreter worker");
				self.abandon();
				Err(BindError::Timeout { timeout })
			}
			Err(RecvTimeoutError::Disconnected) => {
				self.abandon();
				Err(BindError::WorkerUnavailable)
			}
		}
	}

	/// Return `true` once the worker no longer accepts requests.
	pub fn is_abandoned(&self) -> bool {
		self.requests.is_none()
	}

	fn submit(&self, source: &str) -> Result<Receiver<Result<Outcome>>> {
		let requests = self.requests.as_ref().ok_or(BindError::WorkerUnavailable)?;
		let (reply, response) = crossbeam_channel::bounded(1);
		requests
			.send(Request {
				source: source.to_owned(),
				reply,
			})
			.map_err(|_| BindError::WorkerUnavailable)?;
		Ok(response)
	}

	fn abandon(&mut self) {
		self.requests = None;
		self.thread = None;
	}
}

impl Drop for Worker {
	fn drop(&mut self) {
		self.requests = None;
		if let Some(thread) = self.thread.take() {
			let _ = thread.join();
		}
	}
}

fn serve(session: Session, incoming: Receiver<Request>) {
	for request in incoming {
		let result = session.interpret(&request.source);
		if request.reply.send(result).is_err() {
			debug!("worker reply dropped; caller stopped waiting");
		}
	}
}
