use std::ptr;

use super::{VmHandle, encode_source};
use crate::engine::BindError;

#[test]
fn source_is_encoded_as_null_terminated_utf8() {
	let encoded = encode_source("print(\"héllo\");").expect("source encodes");
	assert_eq!(encoded.as_bytes_with_nul(), "print(\"héllo\");\0".as_bytes());
}

#[test]
fn empty_source_encodes_to_lone_terminator() {
	let encoded = encode_source("").expect("empty source encodes");
	assert_eq!(encoded.as_bytes_with_nul(), b"\0");
}

#[test]
fn interior_nul_is_rejected_with_position() {
	let err = encode_source("a = 1;\0b = 2;").expect_err("interior NUL should fail");
	assert!(matches!(err, BindError::InteriorNul { position: 6 }));
}

#[test]
fn null_handle_is_not_a_handle() {
	assert!(VmHandle::from_raw(ptr::null_mut()).is_none());
}

#[test]
fn handle_debug_hides_bits() {
	let mut slot = 0_u8;
	let handle = VmHandle::from_raw((&raw mut slot).cast()).expect("non-null handle");
	assert_eq!(format!("{handle:?}"), "VmHandle(..)");
	assert_eq!(handle.as_ptr().cast::<u8>(), &raw mut slot);
}
