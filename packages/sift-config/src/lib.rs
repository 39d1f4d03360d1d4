mod error;
mod types;

pub use error::{Error, Result};
pub use types::{
	Bounds, Config, FieldSpec, GroupMember, MatchFlagSpec, NestedMapSpec, RangePairSpec, Remote,
	ScalarIntSpec, Service, Storage, TagListSpec, ThresholdGroupSpec,
};

use std::{fs, path::Path};

pub fn load(path: &Path) -> Result<Config> {
	let raw = fs::read_to_string(path)
		.map_err(|err| Error::ReadConfig { path: path.to_path_buf(), source: err })?;

	let mut cfg: Config = toml::from_str(&raw)
		.map_err(|err| Error::ParseConfig { path: path.to_path_buf(), source: err })?;

	normalize(&mut cfg);

	validate(&cfg)?;

	Ok(cfg)
}

pub fn validate(cfg: &Config) -> Result<()> {
	if cfg.service.log_level.trim().is_empty() {
		return Err(Error::Validation {
			message: "service.log_level must be non-empty.".to_string(),
		});
	}
	if !(cfg.remote.endpoint.starts_with("http://") || cfg.remote.endpoint.starts_with("https://"))
	{
		return Err(Error::Validation {
			message: "remote.endpoint must be an http or https URL.".to_string(),
		});
	}
	if cfg.remote.timeout_ms == 0 {
		return Err(Error::Validation {
			message: "remote.timeout_ms must be greater than zero.".to_string(),
		});
	}

	for (label, value) in
		[("remote.page_key", &cfg.remote.page_key), ("remote.order_key", &cfg.remote.order_key)]
	{
		if value.trim().is_empty() {
			return Err(Error::Validation { message: format!("{label} must be non-empty.") });
		}
	}

	if cfg.remote.page_key == cfg.remote.order_key {
		return Err(Error::Validation {
			message: "remote.page_key and remote.order_key must differ.".to_string(),
		});
	}
	if cfg.remote.default_headers.values().any(|value| !value.is_string()) {
		return Err(Error::Validation {
			message: "remote.default_headers values must be strings.".to_string(),
		});
	}

	for (label, value) in [
		("storage.profiles_path", &cfg.storage.profiles_path),
		("storage.default_profile", &cfg.storage.default_profile),
	] {
		if value.trim().is_empty() {
			return Err(Error::Validation { message: format!("{label} must be non-empty.") });
		}
	}

	if cfg.fields.is_empty() {
		return Err(Error::Validation {
			message: "fields must declare at least one filter field.".to_string(),
		});
	}

	for field in &cfg.fields {
		for key in field.storage_keys() {
			if key == cfg.remote.page_key || key == cfg.remote.order_key {
				return Err(Error::Validation {
					message: format!(
						"fields.{} uses key '{key}', which is reserved by the remote section.",
						field.name()
					),
				});
			}
		}
	}

	Ok(())
}

fn normalize(cfg: &mut Config) {
	cfg.service.log_level = cfg.service.log_level.trim().to_string();
	cfg.remote.endpoint = cfg.remote.endpoint.trim().to_string();
	cfg.storage.default_profile = cfg.storage.default_profile.trim().to_string();

	for field in &mut cfg.fields {
		if let FieldSpec::TagList(spec) = field
			&& spec.sentinel.as_deref().map(|code| code.trim().is_empty()).unwrap_or(false)
		{
			spec.sentinel = None;
		}
	}
}
