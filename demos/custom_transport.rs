//! Demonstrates plugging a non-reqwest HTTP stack into the facade.
//!
//! 1. Implement [`HttpTransport`] and return a [`RawResponse`] for every status code.
//! 2. Report failures with the matching [`TransportFailure`] variant so the classifier can tell
//!    network errors from client-side ones.
//! 3. Pass the transport to [`ApiClient::builder`] and call the facade as usual.

// std
use std::sync::Arc;
// crates.io
use color_eyre::Result;
use serde_json::{Map, json};
// self
use request_facade::{
	ApiClient, RequestOptions,
	config::ClientConfig,
	error::TransportFailure,
	http::{HttpTransport, PreparedRequest, RawResponse, TransportFuture},
};

/// Canned responses keyed by path; unknown paths behave like a dropped connection.
struct CannedTransport;
impl HttpTransport for CannedTransport {
	fn execute(&self, request: PreparedRequest) -> TransportFuture<'_, RawResponse> {
		Box::pin(async move {
			println!(
				"{} {} (authorization: {:?})",
				request.method,
				request.url,
				request.headers.get("authorization")
			);

			let (status, body) = match request.url.path() {
				"/api/users" => (200, json!({ "data": [{ "id": 1, "name": "张三" }] })),
				"/api/orders" => (404, json!({})),
				"/api/stock" => (500, json!({ "msg": "库存不足" })),
				_ =>
					return Err(TransportFailure::no_response(
						std::io::Error::other("connection reset by peer"),
						false,
					)),
			};

			let body = serde_json::to_vec(&body).map_err(TransportFailure::client_from)?;

			Ok(RawResponse { status, body, ..Default::default() })
		})
	}
}

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let config = ClientConfig::default().with_base_url("https://intranet.example.com/api/")?;
	let client =
		ApiClient::builder(config).http_transport(Arc::new(CannedTransport)).build()?;

	client.set_token("demo-session-token");

	let users = client.get("users", Map::new(), RequestOptions::default()).await?;

	println!("Users: {users:?}.");

	for path in ["orders", "stock", "offline"] {
		match client.get(path, Map::new(), RequestOptions::default()).await {
			Ok(payload) => println!("Unexpected success for {path}: {payload:?}."),
			Err(e) => println!(
				"{path}: kind={} status={:?} message={}.",
				e.kind(),
				e.status,
				e.message
			),
		}
	}

	Ok(())
}
