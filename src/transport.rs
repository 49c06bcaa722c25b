//! Shared transport instance with its outbound and inbound interception stages.
//!
//! Every facade call flows through [`Transport::dispatch`]:
//!
//! 1. **Outbound**: when the call opts into loading tracking, a [`LoadingGuard`] is taken from the
//!    shared [`LoadingSignal`]. The URL is resolved against the base URL, query params are
//!    encoded, caller headers are merged over the default `Content-Type`, and `Authorization` is
//!    overwritten with the current token. Any construction failure drops the guard and returns a
//!    [`TransportFailure::Client`].
//! 2. The prepared request is handed to the [`HttpTransport`].
//! 3. **Inbound**: the guard is dropped for every outcome, then any status other than 200 is
//!    turned into a [`TransportFailure::Response`] carrying the decoded body.

// self
use crate::{
	_prelude::*,
	config::{ClientConfig, parse_base_url, positive_timeout},
	error::{ConfigError, TransportFailure},
	http::{HttpTransport, PreparedRequest, RawResponse},
	loading::{LoadingGuard, LoadingSignal},
	token::TokenStore,
};

/// Body field carrying a server-supplied, user-facing message.
pub const MESSAGE_FIELD: &str = "msg";

/// Expected shape of the response body.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ResponseType {
	/// Parse the body as JSON, falling back to text when it is not valid JSON.
	#[default]
	Json,
	/// Decode the body as UTF-8 text.
	Text,
	/// Keep the raw bytes.
	Binary,
}

/// Decoded response body.
#[derive(Clone, Debug, PartialEq)]
pub enum Payload {
	/// JSON document.
	Json(Value),
	/// UTF-8 text.
	Text(String),
	/// Raw bytes.
	Binary(Vec<u8>),
}
impl Payload {
	/// Decodes `body` according to the requested response type.
	///
	/// A binary request answered with a JSON content type is decoded as JSON, since servers
	/// report export failures that way.
	pub fn decode(body: Vec<u8>, response_type: ResponseType, headers: &HeaderMap) -> Self {
		match response_type {
			ResponseType::Binary if !is_json_content(headers) => Self::Binary(body),
			ResponseType::Json | ResponseType::Binary => match serde_json::from_slice(&body) {
				Ok(value) => Self::Json(value),
				Err(_) => Self::text(body),
			},
			ResponseType::Text => Self::text(body),
		}
	}

	fn text(body: Vec<u8>) -> Self {
		Self::Text(String::from_utf8(body).unwrap_or_else(|e| {
			String::from_utf8_lossy(e.as_bytes()).into_owned()
		}))
	}

	/// Returns the server-supplied message field, when present.
	pub fn message(&self) -> Option<&str> {
		match self {
			Self::Json(value) => value.get(MESSAGE_FIELD)?.as_str().filter(|msg| !msg.is_empty()),
			_ => None,
		}
	}

	/// Returns the JSON document, if any.
	pub fn as_json(&self) -> Option<&Value> {
		match self {
			Self::Json(value) => Some(value),
			_ => None,
		}
	}

	/// Returns the raw bytes, if any.
	pub fn as_bytes(&self) -> Option<&[u8]> {
		match self {
			Self::Binary(bytes) => Some(bytes),
			_ => None,
		}
	}

	/// Returns a stable label describing the payload kind.
	pub const fn kind(&self) -> &'static str {
		match self {
			Self::Json(_) => "json",
			Self::Text(_) => "text",
			Self::Binary(_) => "binary",
		}
	}

	/// Deserializes the payload into `T`, reporting the failing JSON path on error.
	pub fn into_json<T>(self) -> Result<T>
	where
		T: DeserializeOwned,
	{
		let decoded = match self {
			Self::Json(value) => serde_path_to_error::deserialize(value),
			Self::Text(text) =>
				serde_path_to_error::deserialize(&mut serde_json::Deserializer::from_str(&text)),
			Self::Binary(bytes) =>
				serde_path_to_error::deserialize(&mut serde_json::Deserializer::from_slice(&bytes)),
		};

		decoded.map_err(|source| Error::Decode { source })
	}
}

fn is_json_content(headers: &HeaderMap) -> bool {
	headers
		.get(reqwest::header::CONTENT_TYPE)
		.and_then(|value| value.to_str().ok())
		.and_then(|value| value.split(';').next())
		.map(|mime| {
			let mime = mime.trim().to_ascii_lowercase();

			mime == "application/json" || mime.ends_with("+json")
		})
		.unwrap_or(false)
}

/// Per-call overrides forwarded verbatim to the transport.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TransportOptions {
	/// Timeout for this call only.
	pub timeout: Option<Duration>,
	/// Base URL for this call only.
	pub base_url: Option<Url>,
}

/// Everything the transport instance needs to run one call.
#[derive(Clone, Debug)]
pub struct TransportCall {
	/// HTTP method.
	pub method: reqwest::Method,
	/// Absolute URL or path relative to the base URL.
	pub url: String,
	/// JSON body.
	pub data: Value,
	/// Query parameters.
	pub params: Map<String, Value>,
	/// Caller-supplied headers.
	pub headers: BTreeMap<String, String>,
	/// Expected response body shape.
	pub response_type: ResponseType,
	/// Whether the call participates in the loading signal.
	pub show_loading: bool,
	/// Passthrough transport overrides.
	pub options: TransportOptions,
}

/// Successful (HTTP 200) response after the inbound stage.
#[derive(Clone, Debug)]
pub struct TransportResponse {
	/// HTTP status code (always 200).
	pub status: u16,
	/// Response headers.
	pub headers: HeaderMap,
	/// Decoded body.
	pub body: Payload,
}

/// Configured HTTP client shared by every facade call.
pub struct Transport {
	http: Arc<dyn HttpTransport>,
	base_url: RwLock<Option<Url>>,
	timeout: std::time::Duration,
	content_type: HeaderValue,
	loading: Arc<LoadingSignal>,
	tokens: Arc<TokenStore>,
}
impl Transport {
	/// Builds a transport instance from configuration and its collaborators.
	pub fn new(
		config: &ClientConfig,
		http: Arc<dyn HttpTransport>,
		loading: Arc<LoadingSignal>,
		tokens: Arc<TokenStore>,
	) -> Result<Self, ConfigError> {
		let content_type = HeaderValue::from_str(&config.content_type)
			.map_err(|_| ConfigError::InvalidContentType { value: config.content_type.clone() })?;

		Ok(Self {
			http,
			base_url: RwLock::new(config.base_url.clone()),
			timeout: config.request_timeout()?,
			content_type,
			loading,
			tokens,
		})
	}

	/// Replaces the base URL used for relative paths.
	pub fn set_base_url(&self, value: &str) -> Result<(), ConfigError> {
		*self.base_url.write() = Some(parse_base_url(value)?);

		Ok(())
	}

	/// Returns the current base URL.
	pub fn base_url(&self) -> Option<Url> {
		self.base_url.read().clone()
	}

	/// Returns the loading signal this transport reports to.
	pub fn loading(&self) -> &Arc<LoadingSignal> {
		&self.loading
	}

	/// Returns the token store consulted by the outbound stage.
	pub fn tokens(&self) -> &Arc<TokenStore> {
		&self.tokens
	}

	/// Runs one call through both interception stages.
	pub async fn dispatch(
		&self,
		call: TransportCall,
	) -> Result<TransportResponse, TransportFailure> {
		let response_type = call.response_type;
		let guard = call.show_loading.then(|| self.loading.track());
		let prepared = self.outbound(call)?;
		let result = self.http.execute(prepared).await;

		Self::inbound(guard, result, response_type)
	}

	/// Outbound stage: builds the final request.
	fn outbound(&self, call: TransportCall) -> Result<PreparedRequest, TransportFailure> {
		let TransportCall { method, url, data, params, headers: extra, options, .. } = call;
		let base = options.base_url.or_else(|| self.base_url());
		let mut url = resolve_url(base.as_ref(), &url)?;

		append_params(&mut url, &params);

		let mut headers = HeaderMap::new();

		headers.insert(reqwest::header::CONTENT_TYPE, self.content_type.clone());

		for (name, value) in extra {
			let name =
				HeaderName::from_bytes(name.as_bytes()).map_err(TransportFailure::client_from)?;
			let value = HeaderValue::from_str(&value).map_err(TransportFailure::client_from)?;

			headers.insert(name, value);
		}

		let authorization =
			self.tokens.get_token().header_value().map_err(TransportFailure::client_from)?;

		headers.insert(reqwest::header::AUTHORIZATION, authorization);

		let body = encode_body(&method, &data)?;
		let timeout = match options.timeout {
			Some(timeout) => positive_timeout(timeout).ok_or_else(|| {
				TransportFailure::client(format!(
					"Timeout of {} ms is not positive.",
					timeout.whole_milliseconds()
				))
			})?,
			None => self.timeout,
		};

		Ok(PreparedRequest { method, url, headers, body, timeout })
	}

	/// Inbound stage: releases the loading guard and validates the status.
	fn inbound(
		guard: Option<LoadingGuard>,
		result: Result<RawResponse, TransportFailure>,
		response_type: ResponseType,
	) -> Result<TransportResponse, TransportFailure> {
		drop(guard);

		let RawResponse { status, headers, body } = result?;
		let body = Payload::decode(body, response_type, &headers);

		if status != 200 {
			return Err(TransportFailure::Response { status, body });
		}

		Ok(TransportResponse { status, headers, body })
	}
}
impl Debug for Transport {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Transport")
			.field("base_url", &self.base_url.read().as_ref().map(Url::as_str))
			.field("timeout", &self.timeout)
			.field("loading", &self.loading)
			.finish()
	}
}

/// Joins `path` onto `base` unless it is already absolute.
pub(crate) fn resolve_url(base: Option<&Url>, path: &str) -> Result<Url, TransportFailure> {
	match Url::parse(path) {
		Ok(url) if !url.cannot_be_a_base() => return Ok(url),
		Ok(_) | Err(url::ParseError::RelativeUrlWithoutBase) => {},
		Err(e) => return Err(TransportFailure::client_from(e)),
	}

	let Some(base) = base else {
		return Err(TransportFailure::client(format!(
			"Relative URL `{path}` requires a base URL."
		)));
	};

	if base.query().is_some() || base.fragment().is_some() {
		return Err(TransportFailure::client(format!(
			"Base URL `{base}` must not carry a query or fragment."
		)));
	}

	let joined = if path.is_empty() {
		base.as_str().to_owned()
	} else {
		format!("{}/{}", base.as_str().trim_end_matches('/'), path.trim_start_matches('/'))
	};

	Url::parse(&joined).map_err(TransportFailure::client_from)
}

/// Appends query params; arrays repeat their key and `null` values are skipped.
pub(crate) fn append_params(url: &mut Url, params: &Map<String, Value>) {
	let pairs = params
		.iter()
		.flat_map(|(key, value)| match value {
			Value::Array(items) => items.iter().map(|item| (key, item)).collect::<Vec<_>>(),
			other => vec![(key, other)],
		})
		.filter(|(_, value)| !value.is_null())
		.collect::<Vec<_>>();

	if pairs.is_empty() {
		return;
	}

	let mut serializer = url.query_pairs_mut();

	for (key, value) in pairs {
		serializer.append_pair(key, &param_text(value));
	}
}

fn param_text(value: &Value) -> String {
	match value {
		Value::String(text) => text.clone(),
		other => other.to_string(),
	}
}

fn encode_body(
	method: &reqwest::Method,
	data: &Value,
) -> Result<Option<Vec<u8>>, TransportFailure> {
	let carries_body = matches!(
		*method,
		reqwest::Method::POST | reqwest::Method::PUT | reqwest::Method::PATCH
	);
	let is_empty = match data {
		Value::Null => true,
		Value::Object(map) => map.is_empty(),
		_ => false,
	};

	if !carries_body && is_empty {
		return Ok(None);
	}

	serde_json::to_vec(data).map(Some).map_err(TransportFailure::client_from)
}

#[cfg(test)]
mod tests {
	// crates.io
	use serde_json::json;
	// self
	use super::*;

	fn base() -> Url {
		Url::parse("https://api.example.com/v1/").expect("Base URL fixture should parse.")
	}

	#[test]
	fn relative_paths_join_the_base_url() {
		let base = base();

		for path in ["users", "/users", "users/"] {
			let url = resolve_url(Some(&base), path).expect("Relative paths should resolve.");

			assert!(url.as_str().starts_with("https://api.example.com/v1/users"), "{url}");
		}
	}

	#[test]
	fn absolute_urls_ignore_the_base_url() {
		let url = resolve_url(Some(&base()), "http://other.example.com/ping")
			.expect("Absolute URLs should parse.");

		assert_eq!(url.as_str(), "http://other.example.com/ping");
	}

	#[test]
	fn relative_paths_without_base_are_client_failures() {
		let failure = resolve_url(None, "/users").expect_err("Missing base URL should fail.");

		assert!(matches!(failure, TransportFailure::Client { .. }));
		assert_eq!(failure.to_string(), "Relative URL `/users` requires a base URL.");
	}

	#[test]
	fn params_encode_scalars_and_arrays() {
		let mut url = base().join("search").expect("Join should succeed.");
		let params = json!({ "q": "rust lang", "page": 2, "tag": ["a", "b"], "skip": null });

		append_params(&mut url, params.as_object().expect("Fixture should be an object."));

		assert_eq!(url.query(), Some("page=2&q=rust+lang&tag=a&tag=b"));
	}

	#[test]
	fn all_null_params_leave_the_url_untouched() {
		let mut url = base().join("search").expect("Join should succeed.");
		let params = json!({ "skip": null, "tags": [null] });

		append_params(&mut url, params.as_object().expect("Fixture should be an object."));

		assert_eq!(url.as_str(), "https://api.example.com/v1/search");
		assert_eq!(url.query(), None);
	}

	#[test]
	fn override_base_with_query_is_a_client_failure() {
		let base =
			Url::parse("https://api.example.com/api?tenant=7").expect("Fixture URL should parse.");
		let failure = resolve_url(Some(&base), "/users")
			.expect_err("Paths must not be appended to a query string.");

		assert!(matches!(failure, TransportFailure::Client { .. }));
	}

	#[test]
	fn bodies_follow_the_method() {
		let empty = json!({});

		assert_eq!(
			encode_body(&reqwest::Method::POST, &empty).expect("Encoding should succeed."),
			Some(b"{}".to_vec())
		);
		assert_eq!(
			encode_body(&reqwest::Method::GET, &empty).expect("Encoding should succeed."),
			None
		);
		assert_eq!(
			encode_body(&reqwest::Method::DELETE, &json!({ "id": 1 }))
				.expect("Encoding should succeed."),
			Some(br#"{"id":1}"#.to_vec())
		);
	}

	#[test]
	fn payload_decoding_respects_response_type() {
		let mut json_headers = HeaderMap::new();

		json_headers.insert(
			reqwest::header::CONTENT_TYPE,
			HeaderValue::from_static("application/json; charset=utf-8"),
		);

		let body = br#"{"msg":"ok"}"#.to_vec();

		assert_eq!(
			Payload::decode(body.clone(), ResponseType::Json, &HeaderMap::new()),
			Payload::Json(json!({ "msg": "ok" }))
		);
		assert_eq!(
			Payload::decode(body.clone(), ResponseType::Binary, &HeaderMap::new()),
			Payload::Binary(body.clone())
		);
		assert_eq!(
			Payload::decode(body.clone(), ResponseType::Binary, &json_headers),
			Payload::Json(json!({ "msg": "ok" }))
		);
		assert_eq!(
			Payload::decode(b"plain".to_vec(), ResponseType::Json, &HeaderMap::new()),
			Payload::Text("plain".into())
		);
	}

	#[test]
	fn message_field_is_read_from_json_objects_only() {
		assert_eq!(Payload::Json(json!({ "msg": "saved" })).message(), Some("saved"));
		assert_eq!(Payload::Json(json!({ "msg": "" })).message(), None);
		assert_eq!(Payload::Json(json!({ "msg": 1 })).message(), None);
		assert_eq!(Payload::Text("msg".into()).message(), None);
	}

	#[test]
	fn into_json_reports_the_failing_path() {
		#[derive(Debug, Deserialize)]
		#[allow(dead_code)]
		struct Page {
			items: Vec<u32>,
		}

		let err = Payload::Json(json!({ "items": [1, "two"] }))
			.into_json::<Page>()
			.expect_err("Mistyped items should fail.");

		assert!(matches!(
			err,
			Error::Decode { ref source } if source.path().to_string() == "items[1]"
		));

		let page: Page = Payload::Text(r#"{"items":[3]}"#.into())
			.into_json()
			.expect("Text payloads should decode.");

		assert_eq!(page.items, vec![3]);
	}
}
