use std::{
	collections::{BTreeMap, BTreeSet, btree_map},
	fmt::{Display, Formatter},
};

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// A primitive stored in an [`ArgsMap`].
///
/// Decoding never fails: values that are neither an unsigned integer nor a string are kept as
/// their JSON text, which no numeric reader accepts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ArgValue {
	Int(u64),
	Text(String),
}
impl ArgValue {
	/// Numeric view of the value. Persisted maps may carry numbers as digit strings.
	pub fn as_u64(&self) -> Option<u64> {
		match self {
			Self::Int(value) => Some(*value),
			Self::Text(raw) => raw.trim().parse().ok(),
		}
	}
}
impl Display for ArgValue {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		match self {
			Self::Int(value) => write!(f, "{value}"),
			Self::Text(raw) => f.write_str(raw),
		}
	}
}
impl<'de> Deserialize<'de> for ArgValue {
	fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
	where
		D: Deserializer<'de>,
	{
		let value = match Value::deserialize(deserializer)? {
			Value::String(raw) => Self::Text(raw),
			other => match other.as_u64() {
				Some(value) => Self::Int(value),
				None => Self::Text(other.to_string()),
			},
		};

		Ok(value)
	}
}
impl From<u64> for ArgValue {
	fn from(value: u64) -> Self {
		Self::Int(value)
	}
}
impl From<String> for ArgValue {
	fn from(value: String) -> Self {
		Self::Text(value)
	}
}
impl From<&str> for ArgValue {
	fn from(value: &str) -> Self {
		Self::Text(value.to_string())
	}
}

/// Flat filter arguments exchanged with the remote service and the profile store.
///
/// A key is present only when its field is set. Values are never mutated once a build returns.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ArgsMap(BTreeMap<String, ArgValue>);
impl ArgsMap {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn get(&self, key: &str) -> Option<&ArgValue> {
		self.0.get(key)
	}

	pub fn contains_key(&self, key: &str) -> bool {
		self.0.contains_key(key)
	}

	pub fn insert(&mut self, key: impl Into<String>, value: impl Into<ArgValue>) {
		self.0.insert(key.into(), value.into());
	}

	pub fn len(&self) -> usize {
		self.0.len()
	}

	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	pub fn iter(&self) -> btree_map::Iter<'_, String, ArgValue> {
		self.0.iter()
	}
}
impl FromIterator<(String, ArgValue)> for ArgsMap {
	fn from_iter<I: IntoIterator<Item = (String, ArgValue)>>(iter: I) -> Self {
		Self(iter.into_iter().collect())
	}
}
impl<'a> IntoIterator for &'a ArgsMap {
	type IntoIter = btree_map::Iter<'a, String, ArgValue>;
	type Item = (&'a String, &'a ArgValue);

	fn into_iter(self) -> Self::IntoIter {
		self.0.iter()
	}
}

/// Raw value of one widget.
///
/// JSON form: a boolean for a match flag, a string for a numeric input, an array of codes for a
/// tag list and an object of sub-key inputs for a nested map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WidgetValue {
	Flag(bool),
	Text(String),
	Tags(BTreeSet<String>),
	Nested(BTreeMap<String, String>),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WidgetState(BTreeMap<String, WidgetValue>);
impl WidgetState {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn set(&mut self, key: impl Into<String>, value: WidgetValue) {
		self.0.insert(key.into(), value);
	}

	pub fn set_text(&mut self, key: impl Into<String>, raw: impl Into<String>) {
		self.set(key, WidgetValue::Text(raw.into()));
	}

	pub fn get(&self, key: &str) -> Option<&WidgetValue> {
		self.0.get(key)
	}

	/// Text input for `key`; missing or non-text widgets read as blank.
	pub fn text(&self, key: &str) -> &str {
		match self.0.get(key) {
			Some(WidgetValue::Text(raw)) => raw,
			_ => "",
		}
	}

	pub fn tags(&self, key: &str) -> Option<&BTreeSet<String>> {
		match self.0.get(key) {
			Some(WidgetValue::Tags(tags)) => Some(tags),
			_ => None,
		}
	}

	pub fn flag(&self, key: &str) -> bool {
		matches!(self.0.get(key), Some(WidgetValue::Flag(true)))
	}

	pub fn nested(&self, key: &str) -> Option<&BTreeMap<String, String>> {
		match self.0.get(key) {
			Some(WidgetValue::Nested(entries)) => Some(entries),
			_ => None,
		}
	}

	pub fn len(&self) -> usize {
		self.0.len()
	}

	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	pub fn iter(&self) -> btree_map::Iter<'_, String, WidgetValue> {
		self.0.iter()
	}
}
impl FromIterator<(String, WidgetValue)> for WidgetState {
	fn from_iter<I: IntoIterator<Item = (String, WidgetValue)>>(iter: I) -> Self {
		Self(iter.into_iter().collect())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn widget_state_reads_json_shapes() {
		let state: WidgetState = serde_json::from_value(serde_json::json!({
			"level_min": "10",
			"school": ["1", "3"],
			"equip_effect_match_all": true,
			"summon_combat": { "gongji": "800" }
		}))
		.expect("Failed to parse widget state.");

		assert_eq!(state.text("level_min"), "10");
		assert_eq!(state.tags("school").map(BTreeSet::len), Some(2));
		assert!(state.flag("equip_effect_match_all"));
		assert_eq!(
			state.nested("summon_combat").and_then(|entries| entries.get("gongji")),
			Some(&"800".to_string())
		);
		assert_eq!(state.text("school"), "");
	}

	#[test]
	fn arg_value_reads_digit_strings() {
		assert_eq!(ArgValue::from("42").as_u64(), Some(42));
		assert_eq!(ArgValue::from(7_u64).as_u64(), Some(7));
		assert_eq!(ArgValue::from("1,2").as_u64(), None);
	}

	#[test]
	fn args_map_keeps_foreign_primitives_as_text() {
		let args: ArgsMap = serde_json::from_value(serde_json::json!({
			"level_min": -5,
			"price_min": 1.5,
			"school": true,
			"sum_exp": null,
			"zhuan_min": 2
		}))
		.expect("Failed to parse args map.");

		assert_eq!(args.len(), 5);
		assert_eq!(args.get("level_min"), Some(&ArgValue::from("-5")));
		assert_eq!(args.get("sum_exp"), Some(&ArgValue::from("null")));
		assert_eq!(args.get("zhuan_min"), Some(&ArgValue::Int(2)));

		for key in ["level_min", "price_min", "school", "sum_exp"] {
			assert_eq!(args.get(key).and_then(ArgValue::as_u64), None, "{key}");
		}
	}
}
