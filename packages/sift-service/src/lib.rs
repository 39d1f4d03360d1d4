pub mod builder;
pub mod describe;
pub mod dispatch;

mod error;

pub use builder::ArgsBuilder;
pub use describe::{Describer, Description};
pub use dispatch::{
	DefaultTransport, DispatchGuard, GuardStatus, Pagination, PendingSubmission, QueryRequest,
	QueryResponse, QueryTransport,
};
pub use error::{Error, Result};

use std::{future::Future, pin::Pin, sync::Arc};

use serde::Serialize;
use time::OffsetDateTime;

use sift_config::Config;
use sift_domain::{ArgsMap, BuildContext, FieldTable, WidgetState};
use sift_storage::{FileProfileStore, ProfileStore};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

#[derive(Clone)]
pub struct Backends {
	pub store: Arc<dyn ProfileStore>,
	pub transport: Arc<dyn QueryTransport>,
}
impl Backends {
	pub fn new(store: Arc<dyn ProfileStore>, transport: Arc<dyn QueryTransport>) -> Self {
		Self { store, transport }
	}

	/// File-backed profiles and the HTTP transport, as configured.
	pub fn from_config(cfg: &Config) -> Self {
		Self {
			store: Arc::new(FileProfileStore::new(&cfg.storage.profiles_path)),
			transport: Arc::new(DefaultTransport::new(cfg.remote.clone())),
		}
	}
}

/// A saved profile with its rendered filter summary.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecentSearch {
	pub profile: String,
	#[serde(with = "sift_storage::time_serde")]
	pub saved_at: OffsetDateTime,
	pub summary: String,
	pub args: ArgsMap,
}

pub struct SiftService {
	table: FieldTable,
	ctx: BuildContext,
	default_profile: String,
	store: Arc<dyn ProfileStore>,
	guard: DispatchGuard,
}
impl SiftService {
	pub fn new(cfg: &Config) -> Result<Self> {
		Self::with_backends(cfg, Backends::from_config(cfg))
	}

	pub fn with_backends(cfg: &Config, backends: Backends) -> Result<Self> {
		let table = FieldTable::new(cfg.fields.clone())?;

		tracing::debug!(fields = table.len(), "Field table loaded.");

		Ok(Self {
			table,
			ctx: BuildContext::from_limits(&cfg.limits),
			default_profile: cfg.storage.default_profile.clone(),
			store: backends.store,
			guard: DispatchGuard::from_remote(backends.transport, &cfg.remote),
		})
	}

	/// Replaces the configured limits, for example with the live server level cap.
	pub fn with_context(mut self, ctx: BuildContext) -> Self {
		self.ctx = ctx;

		self
	}

	pub fn table(&self) -> &FieldTable {
		&self.table
	}

	pub fn context(&self) -> &BuildContext {
		&self.ctx
	}

	pub fn default_profile(&self) -> &str {
		&self.default_profile
	}

	pub fn guard(&self) -> &DispatchGuard {
		&self.guard
	}

	/// Builds the argument map and, when `profile` is given, saves it there.
	pub fn build(&self, state: &WidgetState, profile: Option<&str>) -> Result<ArgsMap> {
		let builder = ArgsBuilder::new(&self.table, &self.ctx).with_store(self.store.as_ref());

		Ok(builder.build(state, profile)?)
	}

	pub fn describe(&self, args: &ArgsMap) -> Description {
		Describer::new(&self.table).describe(args)
	}

	/// Loads a saved profile and turns it back into widget state.
	pub fn restore(&self, profile: &str) -> Result<Option<Description>> {
		Ok(self.store.load(profile)?.map(|args| self.describe(&args)))
	}

	/// Saved profiles, newest first.
	pub fn recent(&self) -> Result<Vec<RecentSearch>> {
		let entries = self.store.list()?;

		Ok(entries
			.into_iter()
			.map(|entry| RecentSearch {
				summary: self.describe(&entry.args).summary(&self.table),
				profile: entry.profile,
				saved_at: entry.saved_at,
				args: entry.args,
			})
			.collect())
	}

	/// Builds from widget state and submits page 1 through the guard.
	pub async fn search(
		&self,
		state: &WidgetState,
		profile: Option<&str>,
	) -> Result<(ArgsMap, QueryResponse)> {
		let args = self.build(state, profile)?;
		let response = self.guard.submit(args.clone()).await?;

		Ok((args, response))
	}
}
