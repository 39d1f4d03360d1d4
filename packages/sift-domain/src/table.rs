use std::collections::{HashMap, HashSet};

use sift_config::{Bounds, FieldSpec};

use crate::{Error, Result, codec};

/// Two scalar keys whose values must satisfy `min <= max` when both are set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderedPair {
	pub label: String,
	pub min_key: String,
	pub max_key: String,
}
impl OrderedPair {
	fn involves(&self, key: &str) -> bool {
		self.min_key == key || self.max_key == key
	}
}

/// The validated, immutable list of filter fields in declaration order.
#[derive(Debug, Clone)]
pub struct FieldTable {
	specs: Vec<FieldSpec>,
	pairs: Vec<OrderedPair>,
}
impl FieldTable {
	pub fn new(specs: Vec<FieldSpec>) -> Result<Self> {
		let pairs = validate_specs(&specs)?;

		Ok(Self { specs, pairs })
	}

	pub fn specs(&self) -> &[FieldSpec] {
		&self.specs
	}

	pub fn get(&self, name: &str) -> Option<&FieldSpec> {
		self.specs.iter().find(|spec| spec.name() == name)
	}

	pub fn len(&self) -> usize {
		self.specs.len()
	}

	pub fn is_empty(&self) -> bool {
		self.specs.is_empty()
	}

	/// Declared ordered pairs that include `key`.
	pub fn pairs_with(&self, key: &str) -> impl Iterator<Item = &OrderedPair> {
		self.pairs.iter().filter(move |pair| pair.involves(key))
	}
}

/// Checks the table invariants and returns the declared ordered pairs.
fn validate_specs(specs: &[FieldSpec]) -> Result<Vec<OrderedPair>> {
	if specs.is_empty() {
		return Err(Error::table("at least one field is required."));
	}

	let mut names = HashSet::new();
	let mut keys: HashMap<&str, &str> = HashMap::new();
	let mut widgets: HashMap<&str, &str> = HashMap::new();
	let mut slots: HashMap<&str, HashSet<&str>> = HashMap::new();
	let mut pairs = Vec::new();

	for (index, spec) in specs.iter().enumerate() {
		let name = spec.name();

		if name.trim().is_empty() || spec.label().trim().is_empty() {
			return Err(Error::table(format!("field #{index} must have a name and a label.")));
		}
		if !names.insert(name) {
			return Err(Error::table(format!("field name '{name}' is declared twice.")));
		}

		validate_kind(spec, &specs[..index])?;

		if let FieldSpec::NestedMap(nested) = spec {
			let sub_keys = slots.entry(nested.slot.as_str()).or_default();

			for member in &nested.members {
				if !sub_keys.insert(member.key.as_str()) {
					return Err(Error::table(format!(
						"sub-key '{}' is declared twice in slot '{}'.",
						member.key, nested.slot
					)));
				}
			}
		}

		for key in spec.storage_keys() {
			if key.trim().is_empty() {
				return Err(Error::table(format!("field '{name}' has a blank key.")));
			}

			match keys.get(key) {
				Some(owner) if is_shared_slot(specs, owner, spec) => {},
				Some(owner) => {
					return Err(Error::table(format!(
						"key '{key}' is used by both '{owner}' and '{name}'."
					)));
				},
				None => {
					keys.insert(key, name);
				},
			}
		}
		for key in spec.widget_keys() {
			if let Some(owner) = widgets.insert(key, name) {
				return Err(Error::table(format!(
					"widget key '{key}' is used by both '{owner}' and '{name}'."
				)));
			}
		}

		match spec {
			FieldSpec::ScalarInt(scalar) =>
				if let Some(max_key) = scalar.paired_max_key.as_ref() {
					pairs.push(OrderedPair {
						label: scalar.label.clone(),
						min_key: scalar.key.clone(),
						max_key: max_key.clone(),
					});
				},
			FieldSpec::RangePair(range) => pairs.push(OrderedPair {
				label: range.label.clone(),
				min_key: range.keys[0].clone(),
				max_key: range.keys[1].clone(),
			}),
			_ => {},
		}
	}

	for spec in specs {
		let FieldSpec::ScalarInt(scalar) = spec else {
			continue;
		};
		let Some(max_key) = scalar.paired_max_key.as_deref() else {
			continue;
		};
		let paired_with_scalar = specs
			.iter()
			.any(|other| matches!(other, FieldSpec::ScalarInt(o) if o.key == max_key));

		if max_key == scalar.key || !paired_with_scalar {
			return Err(Error::table(format!(
				"field '{}' pairs with '{max_key}', which is not another scalar_int field.",
				scalar.key
			)));
		}
	}

	Ok(pairs)
}

fn is_shared_slot(specs: &[FieldSpec], owner: &str, spec: &FieldSpec) -> bool {
	let owner_is_nested =
		specs.iter().any(|other| other.name() == owner && matches!(other, FieldSpec::NestedMap(_)));

	owner_is_nested && matches!(spec, FieldSpec::NestedMap(_))
}

fn validate_kind(spec: &FieldSpec, earlier: &[FieldSpec]) -> Result<()> {
	let name = spec.name();

	match spec {
		FieldSpec::ScalarInt(scalar) => validate_bounds(name, &scalar.bounds),
		FieldSpec::TagList(tags) => {
			if tags.separator.is_empty() {
				return Err(Error::table(format!("tag list '{name}' needs a separator.")));
			}
			if let Some(sentinel) = tags.sentinel.as_deref() {
				if sentinel == codec::ZERO_CODE {
					return Err(Error::table(format!(
						"tag list '{name}' cannot use the zero code as its sentinel."
					)));
				}
				if tags.options.contains_key(codec::ZERO_CODE) {
					return Err(Error::table(format!(
						"tag list '{name}' has a sentinel, so '0' cannot be a regular option."
					)));
				}
			}

			Ok(())
		},
		FieldSpec::RangePair(range) => {
			validate_bounds(name, &range.bounds)?;

			if range.keys[0] == range.keys[1] {
				return Err(Error::table(format!("range '{name}' needs two distinct keys.")));
			}
			if let Some([lo, hi]) = range.full_span
				&& lo > hi
			{
				return Err(Error::table(format!("range '{name}' has an inverted full_span.")));
			}

			Ok(())
		},
		FieldSpec::ThresholdGroup(group) => {
			validate_bounds(name, &group.bounds)?;

			if group.members.is_empty() {
				return Err(Error::table(format!("group '{name}' needs at least one member.")));
			}

			Ok(())
		},
		FieldSpec::MatchFlag(flag) => {
			let paired = earlier.iter().find(|other| other.name() == flag.paired);

			match paired {
				Some(FieldSpec::TagList(_)) | Some(FieldSpec::ThresholdGroup(_)) => Ok(()),
				_ => Err(Error::table(format!(
					"match flag '{name}' must follow the tag list or threshold group '{}'.",
					flag.paired
				))),
			}
		},
		FieldSpec::NestedMap(nested) => {
			validate_bounds(name, &nested.bounds)?;

			if nested.members.is_empty() {
				return Err(Error::table(format!("nested map '{name}' needs at least one member.")));
			}

			Ok(())
		},
	}
}

fn validate_bounds(name: &str, bounds: &Bounds) -> Result<()> {
	if let (Some(min), Some(max)) = (bounds.min, bounds.max)
		&& min > max
	{
		return Err(Error::table(format!("field '{name}' has min greater than max.")));
	}

	Ok(())
}
