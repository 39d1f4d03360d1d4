use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Deserialize)]
pub struct Config {
	pub service: Service,
	pub remote: Remote,
	pub storage: Storage,
	/// Default values for `dynamic_ceiling` rules, keyed by ceiling name. Callers may override
	/// them per build.
	#[serde(default)]
	pub limits: BTreeMap<String, u64>,
	pub fields: Vec<FieldSpec>,
}

#[derive(Debug, Deserialize)]
pub struct Service {
	pub log_level: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Remote {
	pub endpoint: String,
	pub timeout_ms: u64,
	#[serde(default = "default_page_key")]
	pub page_key: String,
	#[serde(default = "default_order_key")]
	pub order_key: String,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
pub struct Storage {
	pub profiles_path: String,
	#[serde(default = "default_profile")]
	pub default_profile: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Bounds {
	pub min: Option<u64>,
	pub max: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct GroupMember {
	pub key: String,
	pub label: String,
}

/// One filterable field. The `kind` tag selects the codec.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FieldSpec {
	ScalarInt(ScalarIntSpec),
	TagList(TagListSpec),
	RangePair(RangePairSpec),
	ThresholdGroup(ThresholdGroupSpec),
	MatchFlag(MatchFlagSpec),
	NestedMap(NestedMapSpec),
}
impl FieldSpec {
	/// Unique identifier of the field inside its table.
	pub fn name(&self) -> &str {
		match self {
			Self::ScalarInt(spec) => &spec.key,
			Self::TagList(spec) => &spec.key,
			Self::RangePair(spec) => &spec.name,
			Self::ThresholdGroup(spec) => &spec.name,
			Self::MatchFlag(spec) => &spec.key,
			Self::NestedMap(spec) => &spec.name,
		}
	}

	pub fn label(&self) -> &str {
		match self {
			Self::ScalarInt(spec) => &spec.label,
			Self::TagList(spec) => &spec.label,
			Self::RangePair(spec) => &spec.label,
			Self::ThresholdGroup(spec) => &spec.label,
			Self::MatchFlag(spec) => &spec.label,
			Self::NestedMap(spec) => &spec.label,
		}
	}

	/// WidgetState keys read by this field.
	pub fn widget_keys(&self) -> Vec<&str> {
		match self {
			Self::NestedMap(spec) => vec![spec.name.as_str()],
			_ => self.storage_keys(),
		}
	}

	/// ArgsMap keys written by this field.
	pub fn storage_keys(&self) -> Vec<&str> {
		match self {
			Self::ScalarInt(spec) => vec![spec.key.as_str()],
			Self::TagList(spec) => vec![spec.key.as_str()],
			Self::RangePair(spec) => spec.keys.iter().map(String::as_str).collect(),
			Self::ThresholdGroup(spec) => spec.members.iter().map(|m| m.key.as_str()).collect(),
			Self::MatchFlag(spec) => vec![spec.key.as_str()],
			Self::NestedMap(spec) => vec![spec.slot.as_str()],
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ScalarIntSpec {
	pub key: String,
	pub label: String,
	#[serde(default)]
	pub bounds: Bounds,
	/// Declares `key` as the lower side of an ordered pair whose upper side is this key.
	pub paired_max_key: Option<String>,
	/// Absolute ceiling checked after the declared bounds.
	pub ceiling: Option<u64>,
	/// Name of a ceiling supplied at build time.
	pub dynamic_ceiling: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct TagListSpec {
	pub key: String,
	pub label: String,
	#[serde(default)]
	pub options: BTreeMap<String, String>,
	#[serde(default = "default_separator")]
	pub separator: String,
	/// UI-only placeholder code sent to the remote service as `"0"`.
	pub sentinel: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct RangePairSpec {
	pub name: String,
	pub label: String,
	/// `[min_key, max_key]`.
	pub keys: [String; 2],
	#[serde(default)]
	pub bounds: Bounds,
	/// The untouched slider selection. Selecting exactly this span means no filter.
	pub full_span: Option<[u64; 2]>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ThresholdGroupSpec {
	pub name: String,
	pub label: String,
	#[serde(default)]
	pub bounds: Bounds,
	pub members: Vec<GroupMember>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct MatchFlagSpec {
	pub key: String,
	pub label: String,
	/// Name of the tag list or threshold group this flag qualifies.
	pub paired: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct NestedMapSpec {
	pub name: String,
	pub label: String,
	/// ArgsMap key holding the structured value. Several nested fields may share it.
	pub slot: String,
	#[serde(default)]
	pub bounds: Bounds,
	pub members: Vec<GroupMember>,
}

fn default_page_key() -> String {
	"page".to_string()
}

fn default_order_key() -> String {
	"order_by".to_string()
}

fn default_profile() -> String {
	"default".to_string()
}

fn default_separator() -> String {
	",".to_string()
}
