//! Stateless encode/decode pairs, one per field kind.
//!
//! Encoders return `None` (or an empty list) when the field is unset so the key never reaches the
//! arguments. Decoders never fail on persisted data: anything they cannot read is treated as unset.

use std::{
	collections::{BTreeMap, BTreeSet},
	sync::LazyLock,
};

use regex::Regex;
use serde_json::Value;

use sift_config::{RangePairSpec, TagListSpec};

use crate::{ArgValue, ArgsMap, Error, Result};

/// Code the remote schema uses where the UI shows a tag-list sentinel.
pub const ZERO_CODE: &str = "0";
pub const MAX_DIGITS: usize = 10;

const DIGITS_PATTERN: &str = r"^[0-9]{1,10}$";

static DIGITS: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(DIGITS_PATTERN).ok());

/// Parses one numeric input. Blank input and zero both mean "no filter".
pub fn encode_scalar(label: &str, raw: &str) -> Result<Option<u64>> {
	let trimmed = raw.trim();

	if trimmed.is_empty() {
		return Ok(None);
	}
	if !is_digits(trimmed) {
		return Err(Error::Format { label: label.to_string() });
	}

	let value: u64 = trimmed.parse().map_err(|_| Error::Format { label: label.to_string() })?;

	Ok(Some(value).filter(|value| *value > 0))
}

pub fn decode_scalar(args: &ArgsMap, key: &str) -> Option<u64> {
	args.get(key).and_then(ArgValue::as_u64).filter(|value| *value > 0)
}

pub fn encode_tags(spec: &TagListSpec, codes: &BTreeSet<String>) -> Option<ArgValue> {
	let sentinel = spec.sentinel.as_deref();
	let encoded: BTreeSet<&str> = codes
		.iter()
		.map(|code| code.trim())
		.filter(|code| !code.is_empty())
		.map(|code| if Some(code) == sentinel { ZERO_CODE } else { code })
		.collect();

	if encoded.is_empty() {
		return None;
	}

	Some(ArgValue::Text(encoded.into_iter().collect::<Vec<_>>().join(&spec.separator)))
}

pub fn decode_tags(spec: &TagListSpec, value: &ArgValue) -> BTreeSet<String> {
	let raw = value.to_string();

	raw.split(spec.separator.as_str())
		.map(str::trim)
		.filter(|code| !code.is_empty())
		.map(|code| match spec.sentinel.as_deref() {
			Some(sentinel) if code == ZERO_CODE => sentinel.to_string(),
			_ => code.to_string(),
		})
		.collect()
}

/// Encodes both sides of a range. Selecting exactly the full span clears the range.
pub fn encode_range(
	spec: &RangePairSpec,
	min: Option<u64>,
	max: Option<u64>,
) -> Vec<(String, ArgValue)> {
	if let Some([lo, hi]) = spec.full_span
		&& min.unwrap_or(0) == lo
		&& max.unwrap_or(0) == hi
	{
		return Vec::new();
	}

	spec.keys
		.iter()
		.zip([min, max])
		.filter_map(|(key, value)| value.map(|value| (key.clone(), ArgValue::Int(value))))
		.collect()
}

pub fn decode_range(spec: &RangePairSpec, args: &ArgsMap) -> (Option<u64>, Option<u64>) {
	(decode_scalar(args, &spec.keys[0]), decode_scalar(args, &spec.keys[1]))
}

/// A match flag is only meaningful next to a non-empty selection.
pub fn encode_flag(set: bool, paired_emitted: bool) -> Option<ArgValue> {
	(set && paired_emitted).then_some(ArgValue::Int(1))
}

pub fn decode_flag(args: &ArgsMap, key: &str) -> bool {
	decode_scalar(args, key).is_some()
}

/// Merges `entries` into the structured value already stored for the slot.
pub fn encode_nested(
	existing: Option<&ArgValue>,
	entries: &BTreeMap<String, u64>,
) -> Option<ArgValue> {
	let mut merged = existing.map(decode_nested).unwrap_or_default();

	merged.extend(entries.iter().map(|(key, value)| (key.clone(), *value)));

	if merged.is_empty() {
		return None;
	}

	serde_json::to_string(&merged).ok().map(ArgValue::Text)
}

/// Reads a structured slot value. Malformed input yields an empty map.
pub fn decode_nested(value: &ArgValue) -> BTreeMap<String, u64> {
	let ArgValue::Text(raw) = value else {
		return BTreeMap::new();
	};
	let Ok(Value::Object(object)) = serde_json::from_str::<Value>(raw) else {
		return BTreeMap::new();
	};

	object
		.into_iter()
		.filter_map(|(key, value)| {
			let number = match value {
				Value::Number(number) => number.as_u64(),
				Value::String(text) => text.trim().parse().ok(),
				_ => None,
			};

			number.filter(|number| *number > 0).map(|number| (key, number))
		})
		.collect()
}

fn is_digits(raw: &str) -> bool {
	raw.len() <= MAX_DIGITS && DIGITS.as_ref().map(|re| re.is_match(raw)).unwrap_or(false)
}
