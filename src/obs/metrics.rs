// self
use crate::{client::Method, obs::RequestOutcome};

/// Records a facade request outcome, labeled by method.
pub fn record_request_outcome(method: Method, outcome: RequestOutcome) {
	#[cfg(feature = "metrics")]
	metrics::counter!(
		"request_facade_request_total",
		"method" => method.as_str(),
		"outcome" => outcome.as_str()
	)
	.increment(1);
	#[cfg(not(feature = "metrics"))]
	{
		let _ = (method, outcome);
	}
}

/// Records a download outcome, labeled by file extension.
///
/// Downloads also pass through [`record_request_outcome`]; this counter additionally captures
/// failures that happen after the response arrived (non-binary payloads, save errors).
pub fn record_download_outcome(ext: &str, outcome: RequestOutcome) {
	#[cfg(feature = "metrics")]
	metrics::counter!(
		"request_facade_download_total",
		"ext" => ext.to_ascii_lowercase(),
		"outcome" => outcome.as_str()
	)
	.increment(1);
	#[cfg(not(feature = "metrics"))]
	{
		let _ = (ext, outcome);
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn counters_are_noops_without_a_recorder() {
		record_request_outcome(Method::Get, RequestOutcome::Failure);
		record_download_outcome("XLSX", RequestOutcome::Success);
	}
}
