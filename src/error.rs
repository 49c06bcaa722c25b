//! Facade-level error types shared across the transport, classifier, and download helper.

// self
use crate::{_prelude::*, transport::Payload};

/// Crate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical error exposed by public APIs that go beyond a single request.
#[derive(Debug, ThisError)]
pub enum Error {
	/// A request failed and was normalized by the classifier.
	#[error(transparent)]
	Request(#[from] NormalizedError),
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Download validation or save failure.
	#[error(transparent)]
	Download(#[from] DownloadError),
	/// Session storage failure.
	#[error(transparent)]
	Storage(#[from] StorageError),
	/// Response payload could not be decoded into the requested type.
	#[error("Response payload could not be decoded at `{}`.", .source.path())]
	Decode {
		/// Structured decoding failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
	},
}

/// Configuration and validation failures raised while building a client.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// Base URL cannot be parsed.
	#[error("Base URL `{value}` is invalid.")]
	InvalidBaseUrl {
		/// Rejected input.
		value: String,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Base URL carries a query or fragment that relative paths would be appended to.
	#[error("Base URL `{value}` must not carry a query or fragment.")]
	BaseUrlWithQuery {
		/// Rejected input.
		value: String,
	},
	/// Timeout value is not a positive whole number of milliseconds.
	#[error("Timeout `{value}` is not a positive whole number of milliseconds.")]
	InvalidTimeout {
		/// Rejected input.
		value: String,
	},
	/// Default content type is not a valid header value.
	#[error("Content type `{value}` is not a valid header value.")]
	InvalidContentType {
		/// Rejected input.
		value: String,
	},
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Failures raised by the download helper after the request itself succeeded.
#[derive(Debug, ThisError)]
pub enum DownloadError {
	/// The response body was not binary data.
	#[error("下载响应不是有效的二进制数据 (received {received}).")]
	NotBinary {
		/// Payload kind that was received instead.
		received: &'static str,
	},
	/// The file name resolves to nothing usable.
	#[error("Download file name `{name}` is empty after sanitizing.")]
	InvalidFileName {
		/// Rejected file name.
		name: String,
	},
	/// Writing the file to disk failed.
	#[error("Failed to save download to {}.", .path.display())]
	Save {
		/// Destination that could not be written.
		path: PathBuf,
		/// Underlying IO failure.
		#[source]
		source: std::io::Error,
	},
}

/// Session storage failures.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum StorageError {
	/// Value could not be encoded or decoded.
	#[error("Serialization error: {message}.")]
	Serialization {
		/// Human-readable error payload.
		message: String,
	},
}

/// Raw failure produced by the transport before classification.
///
/// The three variants are mutually exclusive and mirror where the call stopped: the server
/// answered with a non-200 status, the request left but nothing came back, or the request was
/// never dispatched.
#[derive(Debug, ThisError)]
pub enum TransportFailure {
	/// Server answered with a status other than 200.
	#[error("Server responded with HTTP {status}.")]
	Response {
		/// HTTP status code.
		status: u16,
		/// Decoded response body.
		body: Payload,
	},
	/// Request was dispatched but no response arrived (connect failure, timeout, reset).
	#[error("No response received.")]
	NoResponse {
		/// Whether the transport timeout elapsed.
		timed_out: bool,
		/// Transport-specific failure.
		#[source]
		source: BoxError,
	},
	/// Request could not be built or dispatched.
	#[error("{}", .message.as_deref().unwrap_or("Request could not be dispatched."))]
	Client {
		/// Human-readable description, when the failure carries one.
		message: Option<String>,
		/// Underlying failure, if any.
		#[source]
		source: Option<BoxError>,
	},
}
impl TransportFailure {
	/// Wraps a transport error raised after dispatch.
	pub fn no_response(
		src: impl 'static + Send + Sync + std::error::Error,
		timed_out: bool,
	) -> Self {
		Self::NoResponse { timed_out, source: Box::new(src) }
	}

	/// Builds a client-side failure from a message.
	pub fn client(message: impl Into<String>) -> Self {
		Self::Client { message: Some(message.into()), source: None }
	}

	/// Builds a client-side failure from an underlying error, reusing its message.
	pub fn client_from(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		let message = src.to_string();

		Self::Client {
			message: (!message.is_empty()).then_some(message),
			source: Some(Box::new(src)),
		}
	}

	/// Returns the classification bucket for this failure.
	pub fn kind(&self) -> ErrorKind {
		match self {
			Self::Response { .. } => ErrorKind::Server,
			Self::NoResponse { .. } => ErrorKind::Network,
			Self::Client { .. } => ErrorKind::Client,
		}
	}
}
impl From<ReqwestError> for TransportFailure {
	fn from(e: ReqwestError) -> Self {
		if e.is_builder() {
			Self::client_from(e)
		} else {
			let timed_out = e.is_timeout();

			Self::no_response(e, timed_out)
		}
	}
}

/// Error categories surfaced on [`NormalizedError`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
	/// Server answered with a non-200 status.
	Server,
	/// Request was sent but no response arrived.
	Network,
	/// Failure occurred before dispatch.
	Client,
}
impl ErrorKind {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Server => "server",
			Self::Network => "network",
			Self::Client => "client",
		}
	}
}
impl Display for ErrorKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Uniform error returned for every failed request.
#[derive(Debug, ThisError)]
#[error("{message}")]
pub struct NormalizedError {
	/// Human-readable, localized message.
	pub message: String,
	/// HTTP status code when the server answered.
	pub status: Option<u16>,
	/// Underlying transport failure.
	#[source]
	pub original: TransportFailure,
}
impl NormalizedError {
	/// Returns the classification bucket of the underlying failure.
	pub fn kind(&self) -> ErrorKind {
		self.original.kind()
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn normalized_error_exposes_original_failure_as_source() {
		let err = NormalizedError {
			message: "请求资源不存在".into(),
			status: Some(404),
			original: TransportFailure::Response {
				status: 404,
				body: Payload::Text(String::new()),
			},
		};
		let source = StdError::source(&err).expect("Normalized error should expose its origin.");

		assert_eq!(err.to_string(), "请求资源不存在");
		assert_eq!(source.to_string(), "Server responded with HTTP 404.");
		assert_eq!(err.kind(), ErrorKind::Server);
	}

	#[test]
	fn client_failure_reuses_source_message() {
		let failure = TransportFailure::client_from(std::io::Error::other("boom"));

		assert_eq!(failure.to_string(), "boom");
		assert_eq!(failure.kind(), ErrorKind::Client);

		let bare = TransportFailure::Client { message: None, source: None };

		assert_eq!(bare.to_string(), "Request could not be dispatched.");
	}

	#[test]
	fn request_errors_convert_into_crate_error() {
		let err: Error = NormalizedError {
			message: "网络连接失败，请检查网络设置".into(),
			status: None,
			original: TransportFailure::no_response(std::io::Error::other("reset"), false),
		}
		.into();

		assert!(matches!(err, Error::Request(ref inner) if inner.kind() == ErrorKind::Network));
		assert_eq!(err.to_string(), "网络连接失败，请检查网络设置");
	}
}
