// self
use crate::{_prelude::*, client::Method, error::NormalizedError};

/// Type alias that resolves to an instrumented future when tracing is enabled.
#[cfg(feature = "tracing")]
pub type InstrumentedRequest<F> = tracing::instrument::Instrumented<F>;
/// Passthrough future type when tracing is disabled.
#[cfg(not(feature = "tracing"))]
pub type InstrumentedRequest<F> = F;

/// A span builder used by facade requests.
#[derive(Clone, Debug)]
pub struct RequestSpan {
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl RequestSpan {
	/// Creates a new span tagged with the request method + URL.
	pub fn new(method: Method, url: &str) -> Self {
		#[cfg(feature = "tracing")]
		{
			let span = tracing::info_span!("request_facade.request", method = method.as_str(), url);

			Self { span }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = (method, url);

			Self {}
		}
	}

	/// Instruments an async block without holding a guard across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> InstrumentedRequest<Fut>
	where
		Fut: Future,
	{
		#[cfg(feature = "tracing")]
		{
			use tracing::Instrument;

			fut.instrument(self.span.clone())
		}
		#[cfg(not(feature = "tracing"))]
		{
			fut
		}
	}
}

/// Logs a classified request failure with its URL and status.
pub fn log_request_failure(url: &str, error: &NormalizedError) {
	#[cfg(feature = "tracing")]
	tracing::error!(
		url,
		status = error.status,
		kind = error.kind().as_str(),
		error = %error.original,
		"请求失败: {}",
		error.message
	);
	#[cfg(not(feature = "tracing"))]
	{
		let _ = (url, error);
	}
}

/// Logs a failed download, including failures raised before or after the request itself.
pub fn log_download_failure(url: &str, error: &Error) {
	#[cfg(feature = "tracing")]
	tracing::error!(url, error = %error, "文件下载失败");
	#[cfg(not(feature = "tracing"))]
	{
		let _ = (url, error);
	}
}
