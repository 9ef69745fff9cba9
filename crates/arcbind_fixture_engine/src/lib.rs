//! Stand-in for the Arcane engine's native surface.
//!
//! Exports `make`, `interpret`, and `destroy` with the engine's C layout so the
//! binding can be exercised against a real dynamic library. The value struct is
//! declared here independently of the binding on purpose: a layout drift between
//! the two shows up as wrong results in the integration tests.
//!
//! Accepted single-statement scripts (a trailing `;` and a leading `return` are
//! ignored):
//!
//! - `42` → int, `true` / `false` → bool, `null` or empty → null
//! - `"text"` and `print("text")` → string
//! - `fault(n)` → raw discriminant `n` with garbage payload fields
//! - `latin1()` → string payload that is not UTF-8
//! - `sleep(ms)` → null after blocking the calling thread
//! - anything else → error with a syntax message

use std::ffi::{CStr, c_char, c_int, c_void};
use std::sync::Mutex;
use std::sync::atomic::{AtomicI32, Ordering};
use std::thread;
use std::time::Duration;

const VAL_INT: c_int = 0;
const VAL_STRING: c_int = 1;
const VAL_BOOL: c_int = 2;
const VAL_NULL: c_int = 3;
const VAL_ERROR: c_int = 4;

/// Engine value as laid out by the C header.
#[repr(C)]
pub struct Value {
	kind: c_int,
	temp: c_int,
	int_val: c_int,
	str_val: *const c_char,
}

struct Vm {
	_calls: u64,
}

/// Text returned by the last call. Overwritten by the next one.
static TEXT: Mutex<Vec<u8>> = Mutex::new(Vec::new());
static LIVE_HANDLES: AtomicI32 = AtomicI32::new(0);

/// Create a VM handle.
#[unsafe(no_mangle)]
pub extern "C" fn make() -> *mut c_void {
	LIVE_HANDLES.fetch_add(1, Ordering::SeqCst);
	Box::into_raw(Box::new(Vm { _calls: 0 })).cast()
}

/// Release a VM handle created by [`make`].
///
/// # Safety
///
/// `vm` must come from [`make`] and not have been destroyed already.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn destroy(vm: *mut c_void) {
	if vm.is_null() {
		return;
	}
	drop(unsafe { Box::from_raw(vm.cast::<Vm>()) });
	LIVE_HANDLES.fetch_sub(1, Ordering::SeqCst);
}

/// Number of handles created and not yet destroyed.
#[unsafe(no_mangle)]
pub extern "C" fn live_handles() -> c_int {
	LIVE_HANDLES.load(Ordering::SeqCst)
}

/// Evaluate one statement.
///
/// # Safety
///
/// `src` must be null or point to a null-terminated string.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn interpret(src: *const c_char) -> Value {
	if src.is_null() {
		return text_value(VAL_ERROR, b"null source");
	}

	let bytes = unsafe { CStr::from_ptr(src) }.to_bytes();
	let Ok(source) = std::str::from_utf8(bytes) else {
		return text_value(VAL_ERROR, b"source is not utf-8");
	};

	match evaluate(source) {
		Reply::Int(value) => scalar(VAL_INT, value),
		Reply::Bool(value) => scalar(VAL_BOOL, c_int::from(value)),
		Reply::Null => scalar(VAL_NULL, 0),
		Reply::Text(bytes) => text_value(VAL_STRING, &bytes),
		Reply::Error(message) => text_value(VAL_ERROR, message.as_bytes()),
		Reply::Raw(kind) => Value {
			kind,
			temp: 1,
			int_val: 0x0BAD_F00D,
			str_val: std::ptr::null(),
		},
	}
}

enum Reply {
	Int(c_int),
	Bool(bool),
	Null,
	Text(Vec<u8>),
	Error(String),
	Raw(c_int),
}

fn evaluate(source: &str) -> Reply {
	let statement = source.trim();
	let statement = statement.strip_suffix(';').unwrap_or(statement).trim();
	let statement = statement.strip_prefix("return ").map(str::trim).unwrap_or(statement);

	match statement {
		"" | "null" => return Reply::Null,
		"true" => return Reply::Bool(true),
		"false" => return Reply::Bool(false),
		"latin1()" => return Reply::Text(b"caf\xe9".to_vec()),
		_ => {}
	}

	if let Ok(value) = statement.parse::<c_int>() {
		return Reply::Int(value);
	}
	if let Some(text) = string_literal(statement) {
		return Reply::Text(text.as_bytes().to_vec());
	}
	if let Some(arg) = call_arg(statement, "print") {
		if let Some(text) = string_literal(arg) {
			return Reply::Text(text.as_bytes().to_vec());
		}
	}
	if let Some(kind) = call_arg(statement, "fault").and_then(|arg| arg.parse::<c_int>().ok()) {
		return Reply::Raw(kind);
	}
	if let Some(ms) = call_arg(statement, "sleep").and_then(|arg| arg.parse::<u64>().ok()) {
		thread::sleep(Duration::from_millis(ms));
		return Reply::Null;
	}

	Reply::Error(format!("syntax error: unexpected input `{statement}`"))
}

fn string_literal(text: &str) -> Option<&str> {
	let inner = text.strip_prefix('"')?.strip_suffix('"')?;
	(!inner.contains('"')).then_some(inner)
}

fn call_arg<'a>(statement: &'a str, name: &str) -> Option<&'a str> {
	let rest = statement.strip_prefix(name)?.trim_start();
	Some(rest.strip_prefix('(')?.strip_suffix(')')?.trim())
}

fn scalar(kind: c_int, int_val: c_int) -> Value {
	Value {
		kind,
		temp: 1,
		int_val,
		str_val: std::ptr::null(),
	}
}

fn text_value(kind: c_int, bytes: &[u8]) -> Value {
	let mut text = TEXT.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
	text.clear();
	text.extend_from_slice(bytes);
	text.push(0);
	Value {
		kind,
		temp: 0,
		int_val: 0,
		str_val: text.as_ptr().cast(),
	}
}
