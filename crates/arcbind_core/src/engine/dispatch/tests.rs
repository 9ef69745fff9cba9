use std::cell::Cell;
use std::ffi::c_char;
use std::ptr::{self, NonNull};

use proptest::prelude::*;

use crate::engine::{Outcome, Payload, RawValue, ScriptText, ValueRef, ValueType, classify};

/// Payload double that counts every field read.
struct Probe {
	tag: i32,
	int_val: i32,
	text: Option<Vec<u8>>,
	flag_reads: Cell<u32>,
	int_reads: Cell<u32>,
	text_reads: Cell<u32>,
}

impl Probe {
	fn new(tag: i32, int_val: i32, text: Option<Vec<u8>>) -> Self {
		Self {
			tag,
			int_val,
			text,
			flag_reads: Cell::new(0),
			int_reads: Cell::new(0),
			text_reads: Cell::new(0),
		}
	}
}

impl Payload for Probe {
	fn discriminant(&self) -> i32 {
		self.tag
	}

	fn flag(&self) -> i32 {
		self.flag_reads.set(self.flag_reads.get() + 1);
		0
	}

	fn int_val(&self) -> i32 {
		self.int_reads.set(self.int_reads.get() + 1);
		self.int_val
	}

	fn text_bytes(&self) -> Option<&[u8]> {
		self.text_reads.set(self.text_reads.get() + 1);
		self.text.as_deref()
	}
}

fn classify_raw(tag: i32, int_val: i32, text: &[u8]) -> Outcome {
	let raw = RawValue::new(tag, 1, int_val, text.as_ptr().cast());
	// SAFETY: every caller passes a null-terminated buffer that outlives the call.
	let value = unsafe { ValueRef::new(raw) };
	classify(&value)
}

proptest! {
	#[test]
	fn reads_exactly_the_payload_selected_by_discriminant(
		tag in prop_oneof![0..5_i32, any::<i32>()],
		int_val in any::<i32>(),
		text in proptest::option::of(proptest::collection::vec(1_u8..=255, 0..32)),
	) {
		let probe = Probe::new(tag, int_val, text);
		let _ = classify(&probe);

		let kind = ValueType::from_raw(tag);
		let expect_int = kind.is_some_and(ValueType::uses_int);
		let expect_text = kind.is_some_and(ValueType::uses_text);
		prop_assert_eq!(probe.int_reads.get(), u32::from(expect_int));
		prop_assert_eq!(probe.text_reads.get(), u32::from(expect_text));
		prop_assert_eq!(probe.flag_reads.get(), 0);
	}

	#[test]
	fn out_of_range_discriminant_routes_to_unknown(
		tag in prop_oneof![5..=i32::MAX, i32::MIN..0],
		int_val in any::<i32>(),
	) {
		let probe = Probe::new(tag, int_val, Some(b"never read".to_vec()));
		prop_assert_eq!(classify(&probe), Outcome::Unknown(tag));
		prop_assert_eq!(probe.int_reads.get(), 0);
		prop_assert_eq!(probe.text_reads.get(), 0);
	}

	#[test]
	fn bool_is_any_nonzero_int(int_val in any::<i32>()) {
		let probe = Probe::new(ValueType::Bool.raw(), int_val, None);
		prop_assert_eq!(classify(&probe), Outcome::Boolean(int_val != 0));
	}
}

#[test]
fn integer_value_yields_integer_outcome() {
	assert_eq!(classify_raw(ValueType::Int.raw(), 42, b"\0"), Outcome::Integer(42));
}

#[test]
fn string_value_is_copied_up_to_terminator() {
	let buffer = b"Hello, ArcaneScript World!\0stale bytes from a previous call\0";
	let outcome = classify_raw(ValueType::String.raw(), 0, buffer);
	assert_eq!(outcome, Outcome::Text(ScriptText::from("Hello, ArcaneScript World!")));
}

#[test]
fn copied_text_survives_buffer_reuse() {
	let mut buffer = *b"first\0";
	let outcome = classify_raw(ValueType::String.raw(), 0, &buffer);
	buffer.copy_from_slice(b"xxxxx\0");

	assert_eq!(buffer, *b"xxxxx\0");
	assert_eq!(outcome.text().map(ScriptText::bytes), Some(&b"first"[..]));
}

#[test]
fn error_value_keeps_message() {
	let outcome = classify_raw(ValueType::Error.raw(), 0, b"unexpected token ')'\0");
	assert!(outcome.is_error());
	assert_eq!(outcome.to_string(), "error: unexpected token ')'");
}

#[test]
fn null_value_ignores_payload_fields() {
	let probe = Probe::new(ValueType::Null.raw(), 123, Some(b"junk".to_vec()));
	assert_eq!(classify(&probe), Outcome::Null);
	assert_eq!(probe.int_reads.get() + probe.text_reads.get(), 0);
}

#[test]
fn text_value_with_null_pointer_is_recovered() {
	let raw = RawValue::new(ValueType::Error.raw(), 0, 0, ptr::null());
	// SAFETY: null text is never dereferenced.
	let value = unsafe { ValueRef::new(raw) };
	assert_eq!(classify(&value), Outcome::NullText(ValueType::Error));
}

#[test]
fn undecodable_text_is_reported_not_truncated() {
	let outcome = classify_raw(ValueType::String.raw(), 0, b"caf\xe9 noir\0");
	let text = outcome.text().expect("text outcome");
	assert_eq!(text.bytes(), b"caf\xe9 noir");
	assert!(text.as_str().is_err());
	assert!(text.to_string().ends_with("<invalid utf-8 at byte 3>"));
}

#[test]
fn fault_injected_discriminants_never_read_payload() {
	for tag in [5, 6, 42, 0x7fff_ffff, -1] {
		let raw = RawValue::new(tag, 0, 0, NonNull::<c_char>::dangling().as_ptr());
		// SAFETY: the dangling pointer is never dereferenced for unknown tags.
		let value = unsafe { ValueRef::new(raw) };
		assert_eq!(classify(&value), Outcome::Unknown(tag));
	}
}
