use std::ffi::{c_char, c_int};
use std::mem::{align_of, offset_of, size_of};

use crate::engine::{BindError, RawValue, Result};

const INT_SIZE: usize = 4;
const PTR_SIZE: usize = size_of::<*const c_char>();
const PTR_ALIGN: usize = align_of::<*const c_char>();

const TAG_OFFSET: usize = 0;
const FLAG_OFFSET: usize = 4;
const INT_VAL_OFFSET: usize = 8;
const TEXT_OFFSET: usize = align_up(INT_VAL_OFFSET + INT_SIZE, PTR_ALIGN);
const VALUE_SIZE: usize = align_up(TEXT_OFFSET + PTR_SIZE, PTR_ALIGN);

const _: () = {
	assert!(size_of::<c_int>() == INT_SIZE);
	assert!(offset_of!(RawValue, tag) == TAG_OFFSET);
	assert!(offset_of!(RawValue, flag) == FLAG_OFFSET);
	assert!(offset_of!(RawValue, int_val) == INT_VAL_OFFSET);
	assert!(offset_of!(RawValue, text) == TEXT_OFFSET);
	assert!(size_of::<RawValue>() == VALUE_SIZE);
	assert!(align_of::<RawValue>() == PTR_ALIGN);
};

const fn align_up(offset: usize, align: usize) -> usize {
	(offset + align - 1) & !(align - 1)
}

/// Offset and size of one value field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldLayout {
	/// Field name as declared by the engine.
	pub name: &'static str,
	/// Byte offset from the start of the struct.
	pub offset: usize,
	/// Field size in bytes.
	pub size: usize,
}

/// Size, alignment, and field placement of the cross-boundary value struct.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValueLayout {
	/// Total struct size including trailing padding.
	pub size: usize,
	/// Struct alignment.
	pub align: usize,
	/// Fields in declaration order.
	pub fields: [FieldLayout; 4],
}

impl ValueLayout {
	/// Layout the engine declares for the current pointer width.
	pub fn expected() -> Self {
		Self {
			size: VALUE_SIZE,
			align: PTR_ALIGN,
			fields: [
				field("type", TAG_OFFSET, INT_SIZE),
				field("flag", FLAG_OFFSET, INT_SIZE),
				field("int_val", INT_VAL_OFFSET, INT_SIZE),
				field("text", TEXT_OFFSET, PTR_SIZE),
			],
		}
	}

	/// Layout the host compiler actually produced for [`RawValue`].
	pub fn host() -> Self {
		Self {
			size: size_of::<RawValue>(),
			align: align_of::<RawValue>(),
			fields: [
				field("type", offset_of!(RawValue, tag), size_of::<c_int>()),
				field("flag", offset_of!(RawValue, flag), size_of::<c_int>()),
				field("int_val", offset_of!(RawValue, int_val), size_of::<c_int>()),
				field("text", offset_of!(RawValue, text), size_of::<*const c_char>()),
			],
		}
	}

	/// Compare this (host) layout against `expected`, reporting the first difference.
	pub fn check_against(&self, expected: &Self) -> Result<()> {
		ensure("size", expected.size, self.size)?;
		ensure("align", expected.align, self.align)?;
		for (actual, declared) in self.fields.iter().zip(expected.fields.iter()) {
			ensure(declared.name, declared.offset, actual.offset)?;
			ensure(declared.name, declared.size, actual.size)?;
		}
		Ok(())
	}
}

fn field(name: &'static str, offset: usize, size: usize) -> FieldLayout {
	FieldLayout { name, offset, size }
}

fn ensure(field: &'static str, expected: usize, actual: usize) -> Result<()> {
	if expected == actual {
		return Ok(());
	}
	Err(BindError::LayoutMismatch { field, expected, actual })
}
