mod error;

pub use error::{Error, Result};

use std::{
	collections::VecDeque,
	sync::{Arc, Mutex},
};

use color_eyre::eyre;
use serde_json::Value;
use tokio::sync::oneshot;

use sift_config::Config;
use sift_domain::{ArgsMap, FieldTable};
use sift_service::{Backends, BoxFuture, QueryTransport};
use sift_storage::{MemoryProfileStore, ProfileStore, SavedSearch};

pub const SAMPLE_CONFIG_TOML: &str = include_str!("../../../sift.example.toml");

pub fn sample_config() -> Result<Config> {
	Ok(toml::from_str(SAMPLE_CONFIG_TOML)?)
}

pub fn sample_table() -> Result<FieldTable> {
	Ok(FieldTable::new(sample_config()?.fields)?)
}

/// Backends wired to in-memory test doubles.
pub fn test_backends(store: Arc<RecordingStore>, transport: Arc<ScriptedTransport>) -> Backends {
	Backends::new(store, transport)
}

/// A successful query envelope with `items`.
pub fn ok_response(items: Vec<Value>) -> Value {
	let total = items.len();

	serde_json::json!({
		"status": 0,
		"items": items,
		"pagination": { "page": 1, "total_pages": 1, "total_items": total },
	})
}

type Reply = color_eyre::Result<Value>;

/// Transport that answers calls in issue order from scripted replies.
///
/// A gated reply stays pending until the test sends through the returned channel.
#[derive(Default)]
pub struct ScriptedTransport {
	calls: Mutex<Vec<Value>>,
	replies: Mutex<VecDeque<oneshot::Receiver<Reply>>>,
}
impl ScriptedTransport {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn push_reply(&self, reply: Reply) {
		let (tx, rx) = oneshot::channel();
		let _ = tx.send(reply);

		self.replies.lock().unwrap_or_else(|err| err.into_inner()).push_back(rx);
	}

	pub fn push_gate(&self) -> oneshot::Sender<Reply> {
		let (tx, rx) = oneshot::channel();

		self.replies.lock().unwrap_or_else(|err| err.into_inner()).push_back(rx);

		tx
	}

	/// Request bodies seen so far, in issue order.
	pub fn calls(&self) -> Vec<Value> {
		self.calls.lock().unwrap_or_else(|err| err.into_inner()).clone()
	}
}
impl QueryTransport for ScriptedTransport {
	fn execute<'a>(&'a self, body: &'a Value) -> BoxFuture<'a, color_eyre::Result<Value>> {
		self.calls.lock().unwrap_or_else(|err| err.into_inner()).push(body.clone());

		let reply = self.replies.lock().unwrap_or_else(|err| err.into_inner()).pop_front();

		Box::pin(async move {
			let Some(reply) = reply else {
				return Err(eyre::eyre!("No scripted reply left."));
			};

			reply.await.unwrap_or_else(|_| Err(eyre::eyre!("Scripted reply was dropped.")))
		})
	}
}

/// Profile store that records every save and can be told to fail.
#[derive(Debug, Default)]
pub struct RecordingStore {
	inner: MemoryProfileStore,
	saves: Mutex<Vec<(String, ArgsMap)>>,
	fail: bool,
}
impl RecordingStore {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn failing() -> Self {
		Self { fail: true, ..Self::default() }
	}

	pub fn saves(&self) -> Vec<(String, ArgsMap)> {
		self.saves.lock().unwrap_or_else(|err| err.into_inner()).clone()
	}
}
impl ProfileStore for RecordingStore {
	fn save(&self, profile: &str, args: &ArgsMap) -> sift_storage::Result<()> {
		self.saves
			.lock()
			.unwrap_or_else(|err| err.into_inner())
			.push((profile.to_string(), args.clone()));

		if self.fail {
			return Err(sift_storage::Error::Io {
				path: "unwritable.json".into(),
				source: std::io::Error::other("disk full"),
			});
		}

		self.inner.save(profile, args)
	}

	fn load(&self, profile: &str) -> sift_storage::Result<Option<ArgsMap>> {
		self.inner.load(profile)
	}

	fn list(&self) -> sift_storage::Result<Vec<SavedSearch>> {
		self.inner.list()
	}
}
