use std::collections::{BTreeMap, HashMap};

use sift_config::{Bounds, ScalarIntSpec};

use crate::{ArgsMap, Bound, Error, FieldTable, Result, codec};

/// Values supplied by the caller at build time, such as the current server level cap.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildContext {
	ceilings: BTreeMap<String, u64>,
}
impl BuildContext {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn from_limits(limits: &BTreeMap<String, u64>) -> Self {
		Self { ceilings: limits.clone() }
	}

	pub fn with_ceiling(mut self, name: impl Into<String>, value: u64) -> Self {
		self.ceilings.insert(name.into(), value);

		self
	}

	pub fn ceiling(&self, name: &str) -> Option<u64> {
		self.ceilings.get(name).copied()
	}
}

/// One numeric input as seen by the pipeline.
#[derive(Debug, Clone, Copy)]
pub struct NumericField<'a> {
	pub key: &'a str,
	pub label: &'a str,
	pub bounds: &'a Bounds,
	pub ceiling: Option<u64>,
	pub dynamic_ceiling: Option<&'a str>,
}
impl<'a> NumericField<'a> {
	pub fn scalar(spec: &'a ScalarIntSpec) -> Self {
		Self {
			key: &spec.key,
			label: &spec.label,
			bounds: &spec.bounds,
			ceiling: spec.ceiling,
			dynamic_ceiling: spec.dynamic_ceiling.as_deref(),
		}
	}

	pub fn plain(key: &'a str, label: &'a str, bounds: &'a Bounds) -> Self {
		Self { key, label, bounds, ceiling: None, dynamic_ceiling: None }
	}
}

/// Applies the numeric rules to raw input, one field at a time, stopping at the first violation.
///
/// Per input the order is format, bounds, declared pair ordering, then ceilings. `finish` applies
/// the whole-map rule.
pub struct ValidationPipeline<'a> {
	table: &'a FieldTable,
	ctx: &'a BuildContext,
	seen: HashMap<String, u64>,
}
impl<'a> ValidationPipeline<'a> {
	pub fn new(table: &'a FieldTable, ctx: &'a BuildContext) -> Self {
		Self { table, ctx, seen: HashMap::new() }
	}

	/// Returns the parsed value, or `None` when the input is unset.
	pub fn check(&mut self, field: NumericField<'_>, raw: &str) -> Result<Option<u64>> {
		let Some(value) = codec::encode_scalar(field.label, raw)? else {
			return Ok(None);
		};

		check_bounds(&field, value)?;

		self.seen.insert(field.key.to_string(), value);
		self.check_pairs(field.key)?;

		if let Some(ceiling) = field.ceiling
			&& value > ceiling
		{
			return Err(out_of_range(field.label, Bound::Max(ceiling)));
		}
		if let Some(name) = field.dynamic_ceiling
			&& let Some(ceiling) = self.ctx.ceiling(name)
			&& value > ceiling
		{
			return Err(out_of_range(field.label, Bound::Max(ceiling)));
		}

		Ok(Some(value))
	}

	/// Rejects a map that carries no filter at all.
	pub fn finish(self, args: ArgsMap) -> Result<ArgsMap> {
		if args.is_empty() {
			return Err(Error::EmptyFilter);
		}

		Ok(args)
	}

	fn check_pairs(&self, key: &str) -> Result<()> {
		for pair in self.table.pairs_with(key) {
			let min = self.seen.get(&pair.min_key);
			let max = self.seen.get(&pair.max_key);
			let (Some(min), Some(max)) = (min, max) else {
				continue;
			};

			if min > max {
				return Err(Error::Ordering { label: pair.label.clone() });
			}
		}

		Ok(())
	}
}

fn check_bounds(field: &NumericField<'_>, value: u64) -> Result<()> {
	if let Some(min) = field.bounds.min
		&& value < min
	{
		return Err(out_of_range(field.label, Bound::Min(min)));
	}
	if let Some(max) = field.bounds.max
		&& value > max
	{
		return Err(out_of_range(field.label, Bound::Max(max)));
	}

	Ok(())
}

fn out_of_range(label: &str, bound: Bound) -> Error {
	Error::Range { label: label.to_string(), bound }
}
