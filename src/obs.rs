//! Optional observability helpers for facade requests.
//!
//! # Feature Flags
//!
//! - Enable `tracing` to run every request inside a span named `request_facade.request` with the
//!   `method` and `url` fields, and to log classified failures.
//! - Enable `metrics` to increment the `request_facade_request_total` counter for every
//!   attempt/success/failure, labeled by `method` + `outcome`, and the
//!   `request_facade_download_total` counter labeled by `ext` + `outcome`.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// Outcome labels recorded for each request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RequestOutcome {
	/// Entry to the facade.
	Attempt,
	/// HTTP 200 response.
	Success,
	/// Failure returned to the caller.
	Failure,
}
impl RequestOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			RequestOutcome::Attempt => "attempt",
			RequestOutcome::Success => "success",
			RequestOutcome::Failure => "failure",
		}
	}
}
impl Display for RequestOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
