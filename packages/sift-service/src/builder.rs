use std::collections::{BTreeMap, HashSet};

use sift_config::{FieldSpec, NestedMapSpec, RangePairSpec, ThresholdGroupSpec};
use sift_domain::{
	ArgsMap, BuildContext, FieldTable, NumericField, Result, ValidationPipeline, WidgetState, codec,
};
use sift_storage::ProfileStore;

/// Turns a widget snapshot into the canonical argument map.
pub struct ArgsBuilder<'a> {
	table: &'a FieldTable,
	ctx: &'a BuildContext,
	store: Option<&'a dyn ProfileStore>,
}
impl<'a> ArgsBuilder<'a> {
	pub fn new(table: &'a FieldTable, ctx: &'a BuildContext) -> Self {
		Self { table, ctx, store: None }
	}

	pub fn with_store(mut self, store: &'a dyn ProfileStore) -> Self {
		self.store = Some(store);

		self
	}

	/// Builds the map in declaration order, stopping at the first violation.
	///
	/// A successful map is saved under `profile` when a store is attached. Save failures are
	/// logged and never fail the build.
	pub fn build(&self, state: &WidgetState, profile: Option<&str>) -> Result<ArgsMap> {
		let mut pipeline = ValidationPipeline::new(self.table, self.ctx);
		let mut args = ArgsMap::new();
		let mut emitted = HashSet::new();

		for spec in self.table.specs() {
			let set = match spec {
				FieldSpec::ScalarInt(scalar) => {
					let field = NumericField::scalar(scalar);
					let value = pipeline.check(field, state.text(&scalar.key))?;

					value.map(|value| args.insert(scalar.key.clone(), value)).is_some()
				},
				FieldSpec::TagList(tags) => state
					.tags(&tags.key)
					.and_then(|codes| codec::encode_tags(tags, codes))
					.map(|value| args.insert(tags.key.clone(), value))
					.is_some(),
				FieldSpec::RangePair(range) =>
					build_range(range, state, &mut pipeline, &mut args)?,
				FieldSpec::ThresholdGroup(group) =>
					build_group(group, state, &mut pipeline, &mut args)?,
				FieldSpec::MatchFlag(flag) => {
					let paired = emitted.contains(flag.paired.as_str());

					codec::encode_flag(state.flag(&flag.key), paired)
						.map(|value| args.insert(flag.key.clone(), value))
						.is_some()
				},
				FieldSpec::NestedMap(nested) =>
					build_nested(nested, state, &mut pipeline, &mut args)?,
			};

			if set {
				emitted.insert(spec.name());
			}
		}

		let args = pipeline.finish(args)?;

		if let (Some(store), Some(profile)) = (self.store, profile) {
			match store.save(profile, &args) {
				Ok(()) => tracing::debug!(profile, keys = args.len(), "Search profile saved."),
				Err(err) => {
					tracing::warn!(profile, error = %err, "Failed to save search profile.")
				},
			}
		}

		Ok(args)
	}
}

fn build_range(
	range: &RangePairSpec,
	state: &WidgetState,
	pipeline: &mut ValidationPipeline<'_>,
	args: &mut ArgsMap,
) -> Result<bool> {
	let [min_key, max_key] = &range.keys;
	let min = pipeline
		.check(NumericField::plain(min_key, &range.label, &range.bounds), state.text(min_key))?;
	let max = pipeline
		.check(NumericField::plain(max_key, &range.label, &range.bounds), state.text(max_key))?;
	let entries = codec::encode_range(range, min, max);
	let set = !entries.is_empty();

	for (key, value) in entries {
		args.insert(key, value);
	}

	Ok(set)
}

fn build_group(
	group: &ThresholdGroupSpec,
	state: &WidgetState,
	pipeline: &mut ValidationPipeline<'_>,
	args: &mut ArgsMap,
) -> Result<bool> {
	let mut set = false;

	for member in &group.members {
		let label = format!("{} {}", group.label, member.label);
		let field = NumericField::plain(&member.key, &label, &group.bounds);

		if let Some(value) = pipeline.check(field, state.text(&member.key))? {
			args.insert(member.key.clone(), value);

			set = true;
		}
	}

	Ok(set)
}

fn build_nested(
	nested: &NestedMapSpec,
	state: &WidgetState,
	pipeline: &mut ValidationPipeline<'_>,
	args: &mut ArgsMap,
) -> Result<bool> {
	let raw = state.nested(&nested.name);
	let mut entries = BTreeMap::new();

	for member in &nested.members {
		let input = raw.and_then(|raw| raw.get(&member.key)).map(String::as_str).unwrap_or("");
		let key = format!("{}.{}", nested.slot, member.key);
		let label = format!("{} {}", nested.label, member.label);

		if let Some(value) =
			pipeline.check(NumericField::plain(&key, &label, &nested.bounds), input)?
		{
			entries.insert(member.key.clone(), value);
		}
	}

	if entries.is_empty() {
		return Ok(false);
	}

	let Some(value) = codec::encode_nested(args.get(&nested.slot), &entries) else {
		return Ok(false);
	};

	args.insert(nested.slot.clone(), value);

	Ok(true)
}
