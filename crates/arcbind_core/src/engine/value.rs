use std::ffi::{CStr, c_char, c_int};
use std::marker::PhantomData;

/// Discriminant values understood by the binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueType {
	/// Integer result in `int_val`.
	Int,
	/// Text result behind `text`.
	String,
	/// Boolean result in `int_val` (non-zero is true).
	Bool,
	/// No result; no payload field is meaningful.
	Null,
	/// Script error message behind `text`.
	Error,
}

impl ValueType {
	/// Every known variant in discriminant order.
	pub const ALL: [Self; 5] = [Self::Int, Self::String, Self::Bool, Self::Null, Self::Error];

	/// Map a raw wire discriminant to a known variant.
	pub fn from_raw(tag: i32) -> Option<Self> {
		match tag {
			0 => Some(Self::Int),
			1 => Some(Self::String),
			2 => Some(Self::Bool),
			3 => Some(Self::Null),
			4 => Some(Self::Error),
			_ => None,
		}
	}

	/// Wire discriminant for this variant.
	pub fn raw(self) -> i32 {
		match self {
			Self::Int => 0,
			Self::String => 1,
			Self::Bool => 2,
			Self::Null => 3,
			Self::Error => 4,
		}
	}

	/// Stable lowercase label.
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Int => "int",
			Self::String => "string",
			Self::Bool => "bool",
			Self::Null => "null",
			Self::Error => "error",
		}
	}

	/// Return `true` when `int_val` is the meaningful payload.
	pub fn uses_int(self) -> bool {
		matches!(self, Self::Int | Self::Bool)
	}

	/// Return `true` when `text` is the meaningful payload.
	pub fn uses_text(self) -> bool {
		matches!(self, Self::String | Self::Error)
	}
}

/// Value struct exactly as the engine returns it.
///
/// The discriminant stays a raw integer so out-of-range tags from the engine are
/// representable without undefined behavior.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct RawValue {
	/// Raw discriminant, see [`ValueType::from_raw`].
	pub tag: c_int,
	/// Auxiliary engine field; preserved, never interpreted.
	pub flag: c_int,
	/// Integer payload for `Int` and `Bool`.
	pub int_val: c_int,
	/// Engine-owned, null-terminated text for `String` and `Error`.
	pub text: *const c_char,
}

impl RawValue {
	/// Build a value from its four wire fields.
	pub fn new(tag: i32, flag: i32, int_val: i32, text: *const c_char) -> Self {
		Self {
			tag,
			flag,
			int_val,
			text,
		}
	}
}

/// Field access used by the dispatcher.
///
/// Every read the dispatcher performs goes through one of these methods, which
/// keeps the "discriminant first, then one payload field" rule checkable.
pub trait Payload {
	/// Raw discriminant.
	fn discriminant(&self) -> i32;
	/// Auxiliary flag field.
	fn flag(&self) -> i32;
	/// Integer payload.
	fn int_val(&self) -> i32;
	/// Text payload bytes up to (not including) the first terminator, `None` when null.
	fn text_bytes(&self) -> Option<&[u8]>;
}

/// A [`RawValue`] borrowed for the duration of the engine call that produced it.
#[derive(Debug, Clone, Copy)]
pub struct ValueRef<'call> {
	raw: RawValue,
	_call: PhantomData<&'call ()>,
}

impl<'call> ValueRef<'call> {
	/// Wrap a value returned by the engine.
	///
	/// # Safety
	///
	/// If the discriminant is `String` or `Error` and `text` is non-null, `text` must
	/// point to a null-terminated byte string that stays valid and unmodified for
	/// `'call`.
	pub unsafe fn new(raw: RawValue) -> Self {
		Self { raw, _call: PhantomData }
	}

	/// Copy of the underlying wire struct.
	pub fn raw(&self) -> RawValue {
		self.raw
	}
}

impl Payload for ValueRef<'_> {
	fn discriminant(&self) -> i32 {
		self.raw.tag
	}

	fn flag(&self) -> i32 {
		self.raw.flag
	}

	fn int_val(&self) -> i32 {
		self.raw.int_val
	}

	fn text_bytes(&self) -> Option<&[u8]> {
		if self.raw.text.is_null() {
			return None;
		}
		// SAFETY: guaranteed by the contract of `ValueRef::new`.
		Some(unsafe { CStr::from_ptr(self.raw.text) }.to_bytes())
	}
}
