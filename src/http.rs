//! Transport primitives for facade requests.
//!
//! [`HttpTransport`] is the facade's only dependency on an HTTP stack. The transport instance
//! hands it a fully prepared request (absolute URL, final headers, encoded body, timeout) after
//! the outbound interception stage has run, and receives a [`RawResponse`] for any status code.
//! Status validation and body decoding stay in the transport instance so custom transports only
//! need to move bytes.

// std
use std::ops::Deref;
// self
use crate::{_prelude::*, error::TransportFailure};

/// Boxed future returned by [`HttpTransport::execute`].
pub type TransportFuture<'a, T> =
	Pin<Box<dyn Future<Output = Result<T, TransportFailure>> + 'a + Send>>;

/// Abstraction over HTTP stacks capable of executing prepared facade requests.
///
/// Implementations must report failures with the right [`TransportFailure`] variant:
/// [`TransportFailure::Client`] when the request never left,
/// [`TransportFailure::NoResponse`] when it left but nothing came back. Responses with any
/// status code are returned as `Ok`.
pub trait HttpTransport
where
	Self: 'static + Send + Sync,
{
	/// Sends `request` and returns the raw response.
	fn execute(&self, request: PreparedRequest) -> TransportFuture<'_, RawResponse>;
}

/// Request produced by the outbound interception stage.
#[derive(Clone, Debug)]
pub struct PreparedRequest {
	/// HTTP method.
	pub method: reqwest::Method,
	/// Absolute URL including the encoded query string.
	pub url: Url,
	/// Final header set, including `Authorization`.
	pub headers: HeaderMap,
	/// Encoded request body, if any.
	pub body: Option<Vec<u8>>,
	/// Timeout applied to this request.
	pub timeout: std::time::Duration,
}

/// Undecoded response returned by an [`HttpTransport`].
#[derive(Clone, Debug, Default)]
pub struct RawResponse {
	/// HTTP status code.
	pub status: u16,
	/// Response headers.
	pub headers: HeaderMap,
	/// Raw body bytes.
	pub body: Vec<u8>,
}

/// Thin wrapper around [`ReqwestClient`] so shared HTTP behavior lives in one place.
#[derive(Clone, Debug, Default)]
pub struct ReqwestTransport(pub ReqwestClient);
impl ReqwestTransport {
	/// Wraps an existing reqwest [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}

	/// Builds a client whose default timeout matches the facade configuration.
	pub fn with_timeout(timeout: std::time::Duration) -> Result<Self, ReqwestError> {
		Ok(Self(ReqwestClient::builder().timeout(timeout).build()?))
	}
}
impl AsRef<ReqwestClient> for ReqwestTransport {
	fn as_ref(&self) -> &ReqwestClient {
		&self.0
	}
}
impl Deref for ReqwestTransport {
	type Target = ReqwestClient;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}
impl HttpTransport for ReqwestTransport {
	fn execute(&self, request: PreparedRequest) -> TransportFuture<'_, RawResponse> {
		let client = self.0.clone();

		Box::pin(async move {
			let PreparedRequest { method, url, headers, body, timeout } = request;
			let mut builder = client.request(method, url).headers(headers).timeout(timeout);

			if let Some(body) = body {
				builder = builder.body(body);
			}

			let response = builder.send().await?;
			let status = response.status().as_u16();
			let headers = response.headers().to_owned();
			let body = response.bytes().await?.to_vec();

			Ok(RawResponse { status, headers, body })
		})
	}
}
