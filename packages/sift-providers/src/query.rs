use std::time::Duration;

use color_eyre::{Result, eyre};
use reqwest::Client;
use serde_json::Value;

/// POSTs one flat query body to the remote endpoint and returns the decoded JSON envelope.
pub async fn execute(cfg: &sift_config::Remote, body: &Value) -> Result<Value> {
	let client = Client::builder().timeout(Duration::from_millis(cfg.timeout_ms)).build()?;
	let res = client
		.post(&cfg.endpoint)
		.headers(crate::default_headers(&cfg.default_headers)?)
		.json(body)
		.send()
		.await?;
	let json: Value = res.error_for_status()?.json().await?;

	parse_query_envelope(json)
}

fn parse_query_envelope(json: Value) -> Result<Value> {
	let status = json
		.get("status")
		.ok_or_else(|| eyre::eyre!("Query response is missing status."))?;

	if !status.is_i64() && !status.is_u64() {
		return Err(eyre::eyre!("Query response status must be an integer."));
	}

	Ok(json)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn accepts_integer_status() {
		let json = serde_json::json!({ "status": 0, "items": [] });

		assert_eq!(parse_query_envelope(json.clone()).expect("parse failed"), json);
	}

	#[test]
	fn rejects_missing_or_textual_status() {
		assert!(parse_query_envelope(serde_json::json!({ "items": [] })).is_err());
		assert!(parse_query_envelope(serde_json::json!({ "status": "ok" })).is_err());
	}
}
