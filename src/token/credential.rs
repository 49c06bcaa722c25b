//! Session credential injected into the `Authorization` header of every outbound call.

// crates.io
use reqwest::header::InvalidHeaderValue;
// self
use crate::_prelude::*;

/// Raw session token as read from storage; formatters never print it.
///
/// The value is sent verbatim, without a `Bearer` prefix. An empty credential still produces an
/// (empty) header so every call carries `Authorization`.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credential(String);
impl Credential {
	/// Wraps a token string.
	pub fn new(value: impl Into<String>) -> Self {
		Self(value.into())
	}

	/// Returns the raw token. Callers must avoid logging this string.
	pub fn expose(&self) -> &str {
		&self.0
	}

	/// Returns `true` when no token is available.
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	/// Builds the `Authorization` header value, flagged sensitive so HTTP stacks redact it.
	pub fn header_value(&self) -> Result<HeaderValue, InvalidHeaderValue> {
		let mut value = HeaderValue::from_str(&self.0)?;

		value.set_sensitive(true);

		Ok(value)
	}
}
impl Debug for Credential {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		if self.is_empty() {
			f.write_str("Credential(<empty>)")
		} else {
			f.write_str("Credential(<redacted>)")
		}
	}
}
