use std::fmt;

use thiserror::Error;

use crate::engine::ValueType;

/// Text payload could not be decoded as UTF-8.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("text payload is not valid utf-8 (valid up to byte {valid_up_to} of {len})")]
pub struct EncodingError {
	/// Length of the longest valid UTF-8 prefix.
	pub valid_up_to: usize,
	/// Total payload length in bytes.
	pub len: usize,
}

/// Host-owned copy of an engine text payload.
///
/// Bytes are kept as copied so undecodable text is reported, not lost.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptText {
	bytes: Vec<u8>,
}

impl ScriptText {
	/// Copy `bytes` into host storage.
	pub fn from_bytes(bytes: &[u8]) -> Self {
		Self { bytes: bytes.to_vec() }
	}

	/// Raw copied bytes, without terminator.
	pub fn bytes(&self) -> &[u8] {
		&self.bytes
	}

	/// Decode as UTF-8.
	pub fn as_str(&self) -> Result<&str, EncodingError> {
		std::str::from_utf8(&self.bytes).map_err(|err| EncodingError {
			valid_up_to: err.valid_up_to(),
			len: self.bytes.len(),
		})
	}

	/// Return `true` when no bytes preceded the terminator.
	pub fn is_empty(&self) -> bool {
		self.bytes.is_empty()
	}
}

impl fmt::Display for ScriptText {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self.as_str() {
			Ok(text) => f.write_str(text),
			Err(err) => write!(
				f,
				"{} <invalid utf-8 at byte {}>",
				String::from_utf8_lossy(&self.bytes),
				err.valid_up_to
			),
		}
	}
}

impl From<&str> for ScriptText {
	fn from(text: &str) -> Self {
		Self::from_bytes(text.as_bytes())
	}
}

/// Typed, host-owned result of classifying one engine value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
	/// `Int` value.
	Integer(i32),
	/// `Bool` value.
	Boolean(bool),
	/// `String` value.
	Text(ScriptText),
	/// `Error` value carrying the engine's message.
	Error(ScriptText),
	/// `Null` value.
	Null,
	/// Discriminant outside the known variants.
	Unknown(i32),
	/// `String` or `Error` value whose text pointer was null.
	NullText(ValueType),
}

impl Outcome {
	/// Stable lowercase label.
	pub fn kind(&self) -> &'static str {
		match self {
			Self::Integer(_) => "int",
			Self::Boolean(_) => "bool",
			Self::Text(_) => "string",
			Self::Error(_) => "error",
			Self::Null => "null",
			Self::Unknown(_) => "unknown",
			Self::NullText(_) => "null_text",
		}
	}

	/// Return `true` for a script runtime error.
	pub fn is_error(&self) -> bool {
		matches!(self, Self::Error(_))
	}

	/// Text of a `Text` or `Error` outcome.
	pub fn text(&self) -> Option<&ScriptText> {
		match self {
			Self::Text(text) | Self::Error(text) => Some(text),
			_ => None,
		}
	}
}

impl fmt::Display for Outcome {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Integer(value) => write!(f, "{value}"),
			Self::Boolean(value) => write!(f, "{value}"),
			Self::Text(text) => write!(f, "{text}"),
			Self::Error(text) => write!(f, "error: {text}"),
			Self::Null => f.write_str("null"),
			Self::Unknown(tag) => write!(f, "unknown value type {tag}"),
			Self::NullText(kind) => write!(f, "{} value without text", kind.as_str()),
		}
	}
}
