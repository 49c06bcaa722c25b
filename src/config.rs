//! Startup configuration for the shared transport instance.

// self
use crate::{_prelude::*, error::ConfigError};

/// Environment variable holding the API base URL.
pub const ENV_BASE_URL: &str = "API_BASE_URL";
/// Environment variable holding the default timeout in milliseconds.
pub const ENV_TIMEOUT_MS: &str = "API_TIMEOUT_MS";
/// Environment variable overriding the default `Content-Type`.
pub const ENV_CONTENT_TYPE: &str = "API_CONTENT_TYPE";
/// Environment variable holding the fallback credential.
pub const ENV_TEST_TOKEN: &str = "API_TEST_TOKEN";
/// Environment variable selecting the download directory.
pub const ENV_DOWNLOAD_DIR: &str = "API_DOWNLOAD_DIR";

/// Settings consumed by [`ApiClient`](crate::ApiClient) when it builds its transport.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClientConfig {
	/// Base URL prefixed to relative request paths.
	pub base_url: Option<Url>,
	/// Default per-request timeout.
	pub timeout: Duration,
	/// Default `Content-Type` header.
	pub content_type: String,
	/// Credential used when the session holds none.
	pub default_token: Option<String>,
	/// Directory where downloads are saved.
	pub download_dir: PathBuf,
}
impl ClientConfig {
	/// Default request timeout (60 seconds).
	pub const DEFAULT_TIMEOUT: Duration = Duration::milliseconds(60_000);
	/// Default `Content-Type` header value.
	pub const DEFAULT_CONTENT_TYPE: &'static str = "application/json";

	/// Reads the configuration from process environment variables.
	///
	/// `API_TEST_TOKEN` falls back to the value captured at compile time, if any.
	pub fn from_env() -> Result<Self, ConfigError> {
		Self::from_lookup(|key| std::env::var(key).ok())
	}

	/// Builds the configuration from an arbitrary key lookup.
	pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
		let read = |key: &str| lookup(key).map(|v| v.trim().to_owned()).filter(|v| !v.is_empty());
		let mut config = Self::default();

		if let Some(value) = read(ENV_BASE_URL) {
			config = config.with_base_url(&value)?;
		}
		if let Some(value) = read(ENV_TIMEOUT_MS) {
			let millis = value
				.parse::<u32>()
				.map_err(|_| ConfigError::InvalidTimeout { value: value.clone() })?;

			// Zero means "not configured" and keeps the default.
			if millis > 0 {
				config.timeout = Duration::milliseconds(millis.into());
			}
		}
		if let Some(value) = read(ENV_CONTENT_TYPE) {
			config.content_type = value;
		}
		if let Some(value) = read(ENV_DOWNLOAD_DIR) {
			config.download_dir = PathBuf::from(value);
		}

		config.default_token =
			read(ENV_TEST_TOKEN).or_else(|| option_env!("API_TEST_TOKEN").map(str::to_owned));

		Ok(config)
	}

	/// Parses and sets the base URL.
	pub fn with_base_url(mut self, value: &str) -> Result<Self, ConfigError> {
		self.base_url = Some(parse_base_url(value)?);

		Ok(self)
	}

	/// Overrides the default timeout.
	///
	/// Non-positive values are rejected when the client is built.
	pub fn with_timeout(mut self, timeout: Duration) -> Self {
		self.timeout = timeout;

		self
	}

	/// Sets the fallback credential.
	pub fn with_default_token(mut self, token: impl Into<String>) -> Self {
		self.default_token = Some(token.into());

		self
	}

	/// Overrides the download directory.
	pub fn with_download_dir(mut self, dir: impl Into<PathBuf>) -> Self {
		self.download_dir = dir.into();

		self
	}

	/// Returns the default timeout as a wall-clock duration, rejecting non-positive values.
	pub fn request_timeout(&self) -> Result<std::time::Duration, ConfigError> {
		positive_timeout(self.timeout).ok_or_else(|| ConfigError::InvalidTimeout {
			value: self.timeout.whole_milliseconds().to_string(),
		})
	}
}
impl Default for ClientConfig {
	fn default() -> Self {
		Self {
			base_url: None,
			timeout: Self::DEFAULT_TIMEOUT,
			content_type: Self::DEFAULT_CONTENT_TYPE.into(),
			default_token: None,
			download_dir: PathBuf::from("."),
		}
	}
}

/// Converts a timeout into a wall-clock duration; `None` for zero or negative values.
pub(crate) fn positive_timeout(timeout: Duration) -> Option<std::time::Duration> {
	(timeout > Duration::ZERO).then(|| timeout.unsigned_abs())
}

/// Parses a base URL, rejecting inputs that cannot anchor relative paths.
pub(crate) fn parse_base_url(value: &str) -> Result<Url, ConfigError> {
	let url = Url::parse(value)
		.map_err(|source| ConfigError::InvalidBaseUrl { value: value.to_owned(), source })?;

	if url.cannot_be_a_base() {
		return Err(ConfigError::InvalidBaseUrl {
			value: value.to_owned(),
			source: url::ParseError::RelativeUrlWithCannotBeABaseBase,
		});
	}
	if url.query().is_some() || url.fragment().is_some() {
		return Err(ConfigError::BaseUrlWithQuery { value: value.to_owned() });
	}

	Ok(url)
}
