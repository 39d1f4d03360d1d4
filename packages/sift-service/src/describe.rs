use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use sift_config::{FieldSpec, NestedMapSpec, RangePairSpec, TagListSpec, ThresholdGroupSpec};
use sift_domain::{ArgsMap, FieldTable, WidgetState, WidgetValue, codec};

/// Human-readable texts keyed by field name plus the widget state that rebuilds the same map.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Description {
	pub texts: BTreeMap<String, String>,
	pub widget_state: WidgetState,
}
impl Description {
	/// One line summary in declaration order.
	pub fn summary(&self, table: &FieldTable) -> String {
		table
			.specs()
			.iter()
			.filter_map(|spec| self.texts.get(spec.name()))
			.map(String::as_str)
			.collect::<Vec<_>>()
			.join("; ")
	}
}

pub struct Describer<'a> {
	table: &'a FieldTable,
}
impl<'a> Describer<'a> {
	pub fn new(table: &'a FieldTable) -> Self {
		Self { table }
	}

	/// Inverse of the builder. Unreadable values are skipped, never reported.
	pub fn describe(&self, args: &ArgsMap) -> Description {
		let mut out = Description::default();

		for spec in self.table.specs() {
			let text = match spec {
				FieldSpec::ScalarInt(scalar) => {
					let value = codec::decode_scalar(args, &scalar.key);

					value.map(|value| {
						out.widget_state.set_text(scalar.key.clone(), value.to_string());

						format!("{}: {value}", scalar.label)
					})
				},
				FieldSpec::TagList(tags) => describe_tags(tags, args, &mut out.widget_state),
				FieldSpec::RangePair(range) => describe_range(range, args, &mut out.widget_state),
				FieldSpec::ThresholdGroup(group) =>
					describe_group(group, args, &mut out.widget_state),
				FieldSpec::MatchFlag(flag) => codec::decode_flag(args, &flag.key).then(|| {
					out.widget_state.set(flag.key.clone(), WidgetValue::Flag(true));

					flag.label.clone()
				}),
				FieldSpec::NestedMap(nested) =>
					describe_nested(nested, args, &mut out.widget_state),
			};

			if let Some(text) = text {
				out.texts.insert(spec.name().to_string(), text);
			}
		}

		out
	}
}

fn describe_tags(spec: &TagListSpec, args: &ArgsMap, state: &mut WidgetState) -> Option<String> {
	let codes = codec::decode_tags(spec, args.get(&spec.key)?);

	if codes.is_empty() {
		return None;
	}

	let labels: Vec<&str> = codes
		.iter()
		.map(|code| spec.options.get(code).map(String::as_str).unwrap_or(code))
		.collect();
	let text = format!("{}: {}", spec.label, labels.join(", "));

	state.set(spec.key.clone(), WidgetValue::Tags(codes));

	Some(text)
}

fn describe_range(
	spec: &RangePairSpec,
	args: &ArgsMap,
	state: &mut WidgetState,
) -> Option<String> {
	let (min, max) = codec::decode_range(spec, args);
	let [min_key, max_key] = &spec.keys;

	for (key, value) in [(min_key, min), (max_key, max)] {
		if let Some(value) = value {
			state.set_text(key.clone(), value.to_string());
		}
	}

	let span = match (min, max) {
		(Some(min), Some(max)) => format!("{min} to {max}"),
		(Some(min), None) => format!("≥ {min}"),
		(None, Some(max)) => format!("≤ {max}"),
		(None, None) => return None,
	};

	Some(format!("{}: {span}", spec.label))
}

fn describe_group(
	spec: &ThresholdGroupSpec,
	args: &ArgsMap,
	state: &mut WidgetState,
) -> Option<String> {
	let mut parts = Vec::new();

	for member in &spec.members {
		if let Some(value) = codec::decode_scalar(args, &member.key) {
			state.set_text(member.key.clone(), value.to_string());
			parts.push(format!("{} ≥ {value}", member.label));
		}
	}

	(!parts.is_empty()).then(|| format!("{}: {}", spec.label, parts.join(", ")))
}

fn describe_nested(
	spec: &NestedMapSpec,
	args: &ArgsMap,
	state: &mut WidgetState,
) -> Option<String> {
	let stored = codec::decode_nested(args.get(&spec.slot)?);
	let mut restored = BTreeMap::new();
	let mut parts = Vec::new();

	for member in &spec.members {
		if let Some(value) = stored.get(&member.key) {
			restored.insert(member.key.clone(), value.to_string());
			parts.push(format!("{} ≥ {value}", member.label));
		}
	}

	if restored.is_empty() {
		return None;
	}

	state.set(spec.name.clone(), WidgetValue::Nested(restored));

	Some(format!("{}: {}", spec.label, parts.join(", ")))
}
