use std::{
	collections::BTreeMap,
	fs, io,
	path::{Path, PathBuf},
	sync::Mutex,
};

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use sift_domain::ArgsMap;

use crate::{Error, Result};

/// A saved search. Each save replaces the whole entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedSearch {
	pub profile: String,
	pub args: ArgsMap,
	#[serde(with = "crate::time_serde")]
	pub saved_at: OffsetDateTime,
}

/// Read/write contract of the saved-search store. Writers are last-writer-wins.
pub trait ProfileStore
where
	Self: Send + Sync,
{
	fn save(&self, profile: &str, args: &ArgsMap) -> Result<()>;

	fn load(&self, profile: &str) -> Result<Option<ArgsMap>>;

	/// Every saved search, newest first.
	fn list(&self) -> Result<Vec<SavedSearch>>;
}

#[derive(Debug, Default)]
pub struct MemoryProfileStore {
	entries: Mutex<BTreeMap<String, SavedSearch>>,
}
impl MemoryProfileStore {
	pub fn new() -> Self {
		Self::default()
	}
}
impl ProfileStore for MemoryProfileStore {
	fn save(&self, profile: &str, args: &ArgsMap) -> Result<()> {
		let entry = saved_search(profile, args)?;
		let mut entries = self.entries.lock().unwrap_or_else(|err| err.into_inner());

		entries.insert(entry.profile.clone(), entry);

		Ok(())
	}

	fn load(&self, profile: &str) -> Result<Option<ArgsMap>> {
		let profile = profile_name(profile)?;
		let entries = self.entries.lock().unwrap_or_else(|err| err.into_inner());

		Ok(entries.get(profile).map(|entry| entry.args.clone()))
	}

	fn list(&self) -> Result<Vec<SavedSearch>> {
		let entries = self.entries.lock().unwrap_or_else(|err| err.into_inner());

		Ok(newest_first(entries.values().cloned().collect()))
	}
}

/// Keeps every profile in one JSON document. A missing file is an empty store.
#[derive(Debug)]
pub struct FileProfileStore {
	path: PathBuf,
	write_lock: Mutex<()>,
}
impl FileProfileStore {
	pub fn new(path: impl Into<PathBuf>) -> Self {
		Self { path: path.into(), write_lock: Mutex::new(()) }
	}

	pub fn path(&self) -> &Path {
		&self.path
	}

	fn read_all(&self) -> Result<BTreeMap<String, SavedSearch>> {
		let raw = match fs::read(&self.path) {
			Ok(raw) => raw,
			Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
			Err(err) => return Err(self.io_error(err)),
		};

		Ok(serde_json::from_slice(&raw)?)
	}

	fn write_all(&self, entries: &BTreeMap<String, SavedSearch>) -> Result<()> {
		let payload = serde_json::to_vec_pretty(entries)?;
		let mut tmp = self.path.clone().into_os_string();

		tmp.push(".tmp");

		let tmp = PathBuf::from(tmp);

		fs::write(&tmp, payload).map_err(|err| self.io_error(err))?;
		fs::rename(&tmp, &self.path).map_err(|err| self.io_error(err))?;

		Ok(())
	}

	fn io_error(&self, source: io::Error) -> Error {
		Error::Io { path: self.path.clone(), source }
	}
}
impl ProfileStore for FileProfileStore {
	fn save(&self, profile: &str, args: &ArgsMap) -> Result<()> {
		let entry = saved_search(profile, args)?;
		let _guard = self.write_lock.lock().unwrap_or_else(|err| err.into_inner());
		let mut entries = self.read_all()?;

		entries.insert(entry.profile.clone(), entry);

		self.write_all(&entries)?;

		tracing::debug!(
			path = %self.path.display(),
			profiles = entries.len(),
			"Profile store written."
		);

		Ok(())
	}

	fn load(&self, profile: &str) -> Result<Option<ArgsMap>> {
		let profile = profile_name(profile)?;

		Ok(self.read_all()?.remove(profile).map(|entry| entry.args))
	}

	fn list(&self) -> Result<Vec<SavedSearch>> {
		Ok(newest_first(self.read_all()?.into_values().collect()))
	}
}

fn profile_name(profile: &str) -> Result<&str> {
	let trimmed = profile.trim();

	if trimmed.is_empty() {
		return Err(Error::InvalidArgument("profile name must be non-empty.".to_string()));
	}

	Ok(trimmed)
}

fn saved_search(profile: &str, args: &ArgsMap) -> Result<SavedSearch> {
	Ok(SavedSearch {
		profile: profile_name(profile)?.to_string(),
		args: args.clone(),
		saved_at: OffsetDateTime::now_utc(),
	})
}

fn newest_first(mut entries: Vec<SavedSearch>) -> Vec<SavedSearch> {
	entries.sort_by(|a, b| b.saved_at.cmp(&a.saved_at).then_with(|| a.profile.cmp(&b.profile)));

	entries
}
