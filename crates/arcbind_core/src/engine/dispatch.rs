use tracing::warn;

use crate::engine::{Outcome, Payload, ScriptText, ValueType};

/// Classify an engine value into a host-owned [`Outcome`].
///
/// The discriminant is read first and alone decides which single payload field
/// is read next. `flag` is never consulted. Text is copied before returning, so
/// the outcome stays valid after the next engine call.
pub fn classify<P: Payload + ?Sized>(value: &P) -> Outcome {
	let tag = value.discriminant();
	let Some(kind) = ValueType::from_raw(tag) else {
		warn!(tag, "engine returned unknown value type");
		return Outcome::Unknown(tag);
	};

	match kind {
		ValueType::Int => Outcome::Integer(value.int_val()),
		ValueType::Bool => Outcome::Boolean(value.int_val() != 0),
		ValueType::Null => Outcome::Null,
		ValueType::String => copy_text(value, kind).map_or(Outcome::NullText(kind), Outcome::Text),
		ValueType::Error => copy_text(value, kind).map_or(Outcome::NullText(kind), Outcome::Error),
	}
}

fn copy_text<P: Payload + ?Sized>(value: &P, kind: ValueType) -> Option<ScriptText> {
	let Some(bytes) = value.text_bytes() else {
		warn!(kind = kind.as_str(), "engine returned text value with null pointer");
		return None;
	};

	let text = ScriptText::from_bytes(bytes);
	if let Err(err) = text.as_str() {
		warn!(kind = kind.as_str(), %err, "engine text payload is not utf-8");
	}
	Some(text)
}

#[cfg(test)]
mod tests;
