use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use sift_config::Remote;
use sift_domain::ArgsMap;

use crate::{BoxFuture, Error, Result};

pub trait QueryTransport
where
	Self: Send + Sync,
{
	fn execute<'a>(&'a self, body: &'a Value) -> BoxFuture<'a, color_eyre::Result<Value>>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryRequest {
	pub args: ArgsMap,
	pub page: u32,
	pub order: Option<String>,
}
impl QueryRequest {
	/// Flattens the request into the body the remote service reads.
	pub fn to_wire(&self, page_key: &str, order_key: &str) -> Value {
		let mut body = Map::new();

		for (key, value) in &self.args {
			let value = serde_json::to_value(value).unwrap_or(Value::Null);

			body.insert(key.clone(), value);
		}

		body.insert(page_key.to_string(), Value::from(self.page));

		if let Some(order) = self.order.as_ref() {
			body.insert(order_key.to_string(), Value::from(order.as_str()));
		}

		Value::Object(body)
	}
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
	#[serde(default)]
	pub page: u32,
	#[serde(default)]
	pub total_pages: u32,
	#[serde(default)]
	pub total_items: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryResponse {
	pub status: i64,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub message: Option<String>,
	#[serde(default)]
	pub items: Vec<Value>,
	#[serde(default)]
	pub pagination: Pagination,
}

/// The most recently issued request. Only this one can be retried.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingSubmission {
	pub id: Uuid,
	pub request: QueryRequest,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardStatus {
	Idle,
	Pending(Uuid),
}

#[derive(Debug, Default)]
struct Session {
	pending: Option<PendingSubmission>,
	last_success: Option<QueryRequest>,
	order: Option<String>,
}

/// Single-slot, latest-wins coordinator for remote queries.
///
/// Every issue replaces the slot. A response is always handed back to the caller that issued
/// it, but only the submission still holding the slot clears it and becomes the page source.
pub struct DispatchGuard {
	transport: Arc<dyn QueryTransport>,
	page_key: String,
	order_key: String,
	session: Mutex<Session>,
}
impl DispatchGuard {
	pub fn new(
		transport: Arc<dyn QueryTransport>,
		page_key: impl Into<String>,
		order_key: impl Into<String>,
	) -> Self {
		Self {
			transport,
			page_key: page_key.into(),
			order_key: order_key.into(),
			session: Mutex::new(Session::default()),
		}
	}

	pub fn from_remote(transport: Arc<dyn QueryTransport>, remote: &Remote) -> Self {
		Self::new(transport, remote.page_key.as_str(), remote.order_key.as_str())
	}

	/// Issues page 1 of `args` under the current order.
	pub async fn submit(&self, args: ArgsMap) -> Result<QueryResponse> {
		let order = self.lock().order.clone();

		self.issue(QueryRequest { args, page: 1, order }).await
	}

	/// Re-issues the last successful request at another page.
	pub async fn page(&self, page: u32) -> Result<QueryResponse> {
		if page == 0 {
			return Err(Error::InvalidRequest { message: "page numbers start at 1.".to_string() });
		}

		let Some(mut request) = self.lock().last_success.clone() else {
			return Err(Error::InvalidRequest {
				message: "there is no successful query to page through.".to_string(),
			});
		};

		request.page = page;

		self.issue(request).await
	}

	pub fn set_order(&self, order: Option<String>) {
		self.lock().order = order.filter(|order| !order.trim().is_empty());
	}

	pub fn order(&self) -> Option<String> {
		self.lock().order.clone()
	}

	/// Re-issues the pending request under a fresh id. Returns `None` when idle.
	pub async fn retry(&self) -> Option<Result<QueryResponse>> {
		let request = self.lock().pending.as_ref().map(|pending| pending.request.clone())?;

		Some(self.issue(request).await)
	}

	pub fn status(&self) -> GuardStatus {
		match self.lock().pending.as_ref() {
			Some(pending) => GuardStatus::Pending(pending.id),
			None => GuardStatus::Idle,
		}
	}

	pub fn pending(&self) -> Option<PendingSubmission> {
		self.lock().pending.clone()
	}

	async fn issue(&self, request: QueryRequest) -> Result<QueryResponse> {
		let id = Uuid::new_v4();
		let body = request.to_wire(&self.page_key, &self.order_key);

		{
			let mut session = self.lock();
			let submission = PendingSubmission { id, request: request.clone() };

			if let Some(superseded) = session.pending.replace(submission) {
				tracing::debug!(superseded = %superseded.id, by = %id, "Pending query superseded.");
			}
		}

		let outcome = self.transport.execute(&body).await;
		let owned = {
			let mut session = self.lock();
			let owned = session.pending.as_ref().is_some_and(|pending| pending.id == id);

			if owned {
				session.pending = None;
			}

			owned
		};
		let response: QueryResponse = serde_json::from_value(outcome?).map_err(|err| {
			Error::Transport { message: format!("Malformed query response: {err}.") }
		})?;

		if response.status != 0 {
			return Err(Error::Status {
				status: response.status,
				message: response.message.unwrap_or_default(),
			});
		}
		if owned {
			self.lock().last_success = Some(request.clone());
		}

		tracing::info!(
			%id,
			page = request.page,
			items = response.items.len(),
			owned,
			"Query completed."
		);

		Ok(response)
	}

	fn lock(&self) -> std::sync::MutexGuard<'_, Session> {
		self.session.lock().unwrap_or_else(|err| err.into_inner())
	}
}

/// Sends queries through the HTTP adapter.
pub struct DefaultTransport {
	remote: Remote,
}
impl DefaultTransport {
	pub fn new(remote: Remote) -> Self {
		Self { remote }
	}
}
impl QueryTransport for DefaultTransport {
	fn execute<'a>(&'a self, body: &'a Value) -> BoxFuture<'a, color_eyre::Result<Value>> {
		Box::pin(sift_providers::query::execute(&self.remote, body))
	}
}
