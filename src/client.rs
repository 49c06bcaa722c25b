//! Request facade: the public entry point used by UI code.
//!
//! [`ApiClient`] owns the shared [`Transport`] and a [`Notifier`]. Each call destructures its
//! [`RequestOptions`], forwards the transport-relevant parts, and classifies the outcome:
//! HTTP 200 returns the decoded body, anything else becomes a [`NormalizedError`]. The
//! `silent` and `show_error` flags only gate user-facing notices; errors always reach the caller.

// self
use crate::{
	_prelude::*,
	classify,
	config::ClientConfig,
	download::{DirectorySaver, FileSaver},
	error::{ConfigError, NormalizedError},
	http::{HttpTransport, ReqwestTransport},
	loading::LoadingSignal,
	notify::{Notice, Notifier, TracingNotifier},
	obs::{self, RequestOutcome, RequestSpan},
	token::{MemorySessionStorage, SessionStorage, TokenStore},
	transport::{Payload, ResponseType, Transport, TransportCall, TransportOptions},
};

/// HTTP methods exposed by the facade.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Method {
	/// `GET`
	Get,
	/// `POST`
	Post,
	/// `PUT`
	Put,
	/// `DELETE`
	Delete,
	/// `PATCH`
	Patch,
}
impl Method {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			Method::Get => "get",
			Method::Post => "post",
			Method::Put => "put",
			Method::Delete => "delete",
			Method::Patch => "patch",
		}
	}
}
impl Display for Method {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
impl From<Method> for reqwest::Method {
	fn from(method: Method) -> Self {
		match method {
			Method::Get => reqwest::Method::GET,
			Method::Post => reqwest::Method::POST,
			Method::Put => reqwest::Method::PUT,
			Method::Delete => reqwest::Method::DELETE,
			Method::Patch => reqwest::Method::PATCH,
		}
	}
}

/// Per-call options with documented defaults.
///
/// | field           | default          |
/// |-----------------|------------------|
/// | `data`          | `{}`             |
/// | `params`        | `{}`             |
/// | `headers`       | empty            |
/// | `silent`        | `true`           |
/// | `show_loading`  | `true`           |
/// | `show_error`    | `true`           |
/// | `response_type` | [`ResponseType::Json`] |
#[derive(Clone, Debug, PartialEq)]
pub struct RequestOptions {
	/// JSON request body.
	pub data: Value,
	/// Query parameters.
	pub params: Map<String, Value>,
	/// Extra request headers. `Authorization` is always replaced by the current token.
	pub headers: BTreeMap<String, String>,
	/// Suppresses the success notice and, together with `show_error`, the error notice.
	pub silent: bool,
	/// Whether the call participates in the loading signal.
	pub show_loading: bool,
	/// Allows the error notice when `silent` is also off.
	pub show_error: bool,
	/// Expected response body shape.
	pub response_type: ResponseType,
	/// Passthrough transport overrides.
	pub transport: TransportOptions,
}
impl RequestOptions {
	/// Creates options with every default applied.
	pub fn new() -> Self {
		Self::default()
	}

	/// Sets the JSON body.
	pub fn data(mut self, data: Value) -> Self {
		self.data = data;

		self
	}

	/// Sets the query parameters.
	pub fn params(mut self, params: Map<String, Value>) -> Self {
		self.params = params;

		self
	}

	/// Adds a single query parameter.
	pub fn param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
		self.params.insert(key.into(), value.into());

		self
	}

	/// Adds a request header.
	pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
		self.headers.insert(name.into(), value.into());

		self
	}

	/// Overrides the `silent` flag.
	pub fn silent(mut self, silent: bool) -> Self {
		self.silent = silent;

		self
	}

	/// Overrides the `show_loading` flag.
	pub fn show_loading(mut self, show_loading: bool) -> Self {
		self.show_loading = show_loading;

		self
	}

	/// Overrides the `show_error` flag.
	pub fn show_error(mut self, show_error: bool) -> Self {
		self.show_error = show_error;

		self
	}

	/// Overrides the response type.
	pub fn response_type(mut self, response_type: ResponseType) -> Self {
		self.response_type = response_type;

		self
	}

	/// Overrides the timeout for this call; a non-positive value fails the call before dispatch.
	pub fn timeout(mut self, timeout: Duration) -> Self {
		self.transport.timeout = Some(timeout);

		self
	}

	/// Overrides the base URL for this call.
	pub fn base_url(mut self, base_url: Url) -> Self {
		self.transport.base_url = Some(base_url);

		self
	}
}
impl Default for RequestOptions {
	fn default() -> Self {
		Self {
			data: Value::Object(Map::new()),
			params: Map::new(),
			headers: BTreeMap::new(),
			silent: true,
			show_loading: true,
			show_error: true,
			response_type: ResponseType::Json,
			transport: TransportOptions::default(),
		}
	}
}

/// Request facade plus the service operations exposed to the UI layer.
#[derive(Clone)]
pub struct ApiClient {
	pub(crate) transport: Arc<Transport>,
	pub(crate) notifier: Arc<dyn Notifier>,
	pub(crate) saver: Arc<dyn FileSaver>,
}
impl ApiClient {
	/// Builds a client with the reqwest transport, in-memory session storage, a fresh loading
	/// signal, and the tracing notifier.
	pub fn new(config: ClientConfig) -> Result<Self, ConfigError> {
		Self::builder(config).build()
	}

	/// Starts a builder for injecting collaborators.
	pub fn builder(config: ClientConfig) -> ApiClientBuilder {
		ApiClientBuilder::new(config)
	}

	/// Issues a request and classifies the outcome.
	pub async fn request(
		&self,
		method: Method,
		url: &str,
		options: RequestOptions,
	) -> Result<Payload, NormalizedError> {
		let span = RequestSpan::new(method, url);

		span.instrument(self.request_inner(method, url, options)).await
	}

	async fn request_inner(
		&self,
		method: Method,
		url: &str,
		options: RequestOptions,
	) -> Result<Payload, NormalizedError> {
		let RequestOptions {
			data,
			params,
			headers,
			silent,
			show_loading,
			show_error,
			response_type,
			transport,
		} = options;
		let call = TransportCall {
			method: method.into(),
			url: url.to_owned(),
			data,
			params,
			headers,
			response_type,
			show_loading,
			options: transport,
		};

		obs::record_request_outcome(method, RequestOutcome::Attempt);

		match self.transport.dispatch(call).await {
			Ok(response) => {
				obs::record_request_outcome(method, RequestOutcome::Success);

				if let Some(message) = response.body.message().filter(|_| !silent) {
					self.notifier.notify(Notice::success(message));
				}

				Ok(response.body)
			},
			Err(failure) => {
				obs::record_request_outcome(method, RequestOutcome::Failure);

				let error = classify::classify(failure);

				obs::log_request_failure(url, &error);

				if show_error && !silent {
					self.notifier.notify(Notice::error(error.message.clone()));
				}

				Err(error)
			},
		}
	}

	/// `GET` with `params` as the query string.
	pub async fn get(
		&self,
		url: &str,
		params: Map<String, Value>,
		options: RequestOptions,
	) -> Result<Payload, NormalizedError> {
		self.request(Method::Get, url, options.params(params)).await
	}

	/// `POST` with `data` as the body.
	pub async fn post(
		&self,
		url: &str,
		data: Value,
		options: RequestOptions,
	) -> Result<Payload, NormalizedError> {
		self.request(Method::Post, url, options.data(data)).await
	}

	/// `PUT` with `data` as the body.
	pub async fn put(
		&self,
		url: &str,
		data: Value,
		options: RequestOptions,
	) -> Result<Payload, NormalizedError> {
		self.request(Method::Put, url, options.data(data)).await
	}

	/// `DELETE` with `params` as the query string.
	pub async fn del(
		&self,
		url: &str,
		params: Map<String, Value>,
		options: RequestOptions,
	) -> Result<Payload, NormalizedError> {
		self.request(Method::Delete, url, options.params(params)).await
	}

	/// `PATCH` with `data` as the body.
	pub async fn patch(
		&self,
		url: &str,
		data: Value,
		options: RequestOptions,
	) -> Result<Payload, NormalizedError> {
		self.request(Method::Patch, url, options.data(data)).await
	}

	/// Replaces the base URL used for relative paths.
	pub fn set_base_url(&self, url: &str) -> Result<(), ConfigError> {
		self.transport.set_base_url(url)
	}

	/// Stores the session credential sent on every later request.
	pub fn set_token(&self, token: impl Into<String>) {
		self.transport.tokens().set_token(token);
	}

	/// Forces the loading signal back to idle.
	pub fn reset(&self) {
		self.transport.loading().reset();
	}

	/// Returns whether any tracked call is in flight.
	pub fn loading_status(&self) -> bool {
		self.transport.loading().is_loading()
	}

	/// Returns the loading signal for UI subscriptions.
	pub fn loading(&self) -> &Arc<LoadingSignal> {
		self.transport.loading()
	}

	/// Returns the shared transport instance.
	pub fn transport(&self) -> &Arc<Transport> {
		&self.transport
	}
}
impl Debug for ApiClient {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ApiClient").field("transport", &self.transport).finish()
	}
}

/// Builder that wires [`ApiClient`] collaborators.
pub struct ApiClientBuilder {
	config: ClientConfig,
	http: Option<Arc<dyn HttpTransport>>,
	loading: Option<Arc<LoadingSignal>>,
	storage: Option<Arc<dyn SessionStorage>>,
	notifier: Option<Arc<dyn Notifier>>,
	saver: Option<Arc<dyn FileSaver>>,
}
impl ApiClientBuilder {
	fn new(config: ClientConfig) -> Self {
		Self { config, http: None, loading: None, storage: None, notifier: None, saver: None }
	}

	/// Uses a custom HTTP stack instead of reqwest.
	pub fn http_transport(mut self, http: Arc<dyn HttpTransport>) -> Self {
		self.http = Some(http);

		self
	}

	/// Shares an application-owned loading signal.
	pub fn loading(mut self, loading: Arc<LoadingSignal>) -> Self {
		self.loading = Some(loading);

		self
	}

	/// Uses the platform session storage for the token.
	pub fn session_storage(mut self, storage: Arc<dyn SessionStorage>) -> Self {
		self.storage = Some(storage);

		self
	}

	/// Routes user-facing notices to `notifier`.
	pub fn notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
		self.notifier = Some(notifier);

		self
	}

	/// Uses a custom save target for downloads.
	pub fn file_saver(mut self, saver: Arc<dyn FileSaver>) -> Self {
		self.saver = Some(saver);

		self
	}

	/// Finishes the client.
	pub fn build(self) -> Result<ApiClient, ConfigError> {
		let Self { config, http, loading, storage, notifier, saver } = self;
		let http = match http {
			Some(http) => http,
			None => Arc::new(ReqwestTransport::with_timeout(config.request_timeout()?)?),
		};
		let storage = storage.unwrap_or_else(|| Arc::new(MemorySessionStorage::default()));
		let mut tokens = TokenStore::new(storage);

		if let Some(fallback) = &config.default_token {
			tokens = tokens.with_fallback(fallback.clone());
		}

		let loading = loading.unwrap_or_default();
		let saver =
			saver.unwrap_or_else(|| Arc::new(DirectorySaver::new(config.download_dir.clone())));
		let transport = Transport::new(&config, http, loading, Arc::new(tokens))?;

		Ok(ApiClient {
			transport: Arc::new(transport),
			notifier: notifier.unwrap_or_else(|| Arc::new(TracingNotifier)),
			saver,
		})
	}
}
impl Debug for ApiClientBuilder {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ApiClientBuilder").field("config", &self.config).finish()
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use serde_json::json;
	// self
	use super::*;

	#[test]
	fn options_defaults_match_the_documented_table() {
		let options = RequestOptions::default();

		assert_eq!(options.data, json!({}));
		assert!(options.params.is_empty());
		assert!(options.headers.is_empty());
		assert!(options.silent);
		assert!(options.show_loading);
		assert!(options.show_error);
		assert_eq!(options.response_type, ResponseType::Json);
		assert_eq!(options.transport, TransportOptions::default());
	}

	#[test]
	fn builder_methods_override_single_fields() {
		let options = RequestOptions::new()
			.param("page", 2)
			.header("X-Trace", "abc")
			.silent(false)
			.show_loading(false)
			.timeout(Duration::seconds(5));

		assert_eq!(options.params.get("page"), Some(&json!(2)));
		assert_eq!(options.headers.get("X-Trace").map(String::as_str), Some("abc"));
		assert!(!options.silent);
		assert!(!options.show_loading);
		assert!(options.show_error);
		assert_eq!(options.transport.timeout, Some(Duration::seconds(5)));
	}

	#[test]
	fn methods_map_onto_reqwest() {
		assert_eq!(reqwest::Method::from(Method::Delete), reqwest::Method::DELETE);
		assert_eq!(Method::Patch.to_string(), "patch");
	}

	#[test]
	fn new_client_rejects_bad_content_type() {
		let config =
			ClientConfig { content_type: "application/json\n".into(), ..ClientConfig::default() };
		let err = ApiClient::new(config).expect_err("Control characters should be rejected.");

		assert!(matches!(err, ConfigError::InvalidContentType { .. }));
	}

	#[test]
	fn new_client_rejects_non_positive_timeout() {
		let config = ClientConfig::default().with_timeout(Duration::milliseconds(-1));
		let err = ApiClient::new(config).expect_err("Negative timeouts should be rejected.");

		assert!(matches!(err, ConfigError::InvalidTimeout { .. }));
	}

	#[test]
	fn service_operations_update_shared_state() {
		let client = ApiClient::new(ClientConfig::default()).expect("Default client should build.");

		client.set_token("abc");

		assert_eq!(client.transport().tokens().get_token().expose(), "abc");

		client.loading().increment();

		assert!(client.loading_status());

		client.reset();

		assert!(!client.loading_status());
		client
			.set_base_url("https://api.example.com/")
			.expect("Valid base URLs should be accepted.");
		assert_eq!(
			client.transport().base_url().as_ref().map(Url::as_str),
			Some("https://api.example.com/")
		);
	}
}
