//! Error classifier that turns raw transport failures into [`NormalizedError`] values.

// self
use crate::error::{NormalizedError, TransportFailure};

/// Fallback when the server answered with an unmapped status and no message.
pub const DEFAULT_ERROR_MESSAGE: &str = "请求失败，请稍后重试";
/// Message used when the request left but no response arrived.
pub const NETWORK_ERROR_MESSAGE: &str = "网络连接失败，请检查网络设置";
/// Fallback for client-side failures that carry no message.
pub const CLIENT_ERROR_MESSAGE: &str = "请求处理发生错误";

const STATUS_MESSAGES: [(u16, &str); 10] = [
	(400, "请求参数错误"),
	(401, "身份验证失败"),
	(403, "无权访问该资源"),
	(404, "请求资源不存在"),
	(405, "请求方法不被允许"),
	(408, "请求超时"),
	(500, "服务器内部错误"),
	(502, "网关错误"),
	(503, "服务不可用"),
	(504, "网关超时"),
];

/// Returns the localized message for `status`, if the table covers it.
pub fn status_message(status: u16) -> Option<&'static str> {
	STATUS_MESSAGES.iter().find(|(code, _)| *code == status).map(|(_, message)| *message)
}

/// Maps a transport failure onto the uniform error shape.
///
/// Server responses prefer the body's message field, then the status table, then
/// [`DEFAULT_ERROR_MESSAGE`]. Failures without a response carry no status.
pub fn classify(failure: TransportFailure) -> NormalizedError {
	let (message, status) = match &failure {
		TransportFailure::Response { status, body } => {
			let message = body
				.message()
				.map(str::to_owned)
				.or_else(|| status_message(*status).map(str::to_owned))
				.unwrap_or_else(|| DEFAULT_ERROR_MESSAGE.to_owned());

			(message, Some(*status))
		},
		TransportFailure::NoResponse { .. } => (NETWORK_ERROR_MESSAGE.to_owned(), None),
		TransportFailure::Client { message, .. } => (
			message
				.as_deref()
				.filter(|text| !text.is_empty())
				.unwrap_or(CLIENT_ERROR_MESSAGE)
				.to_owned(),
			None,
		),
	};

	NormalizedError { message, status, original: failure }
}

#[cfg(test)]
mod tests {
	// crates.io
	use serde_json::json;
	// self
	use super::*;
	use crate::{error::ErrorKind, transport::Payload};

	fn response(status: u16, body: Payload) -> TransportFailure {
		TransportFailure::Response { status, body }
	}

	#[test]
	fn status_table_covers_the_documented_codes() {
		for code in [400, 401, 403, 404, 405, 408, 500, 502, 503, 504] {
			assert!(status_message(code).is_some(), "HTTP {code} should be mapped.");
		}

		assert_eq!(status_message(418), None);
		assert_eq!(status_message(200), None);
	}

	#[test]
	fn missing_body_message_uses_the_status_table() {
		let err = classify(response(404, Payload::Text(String::new())));

		assert_eq!(err.status, Some(404));
		assert_eq!(err.message, "请求资源不存在");
		assert_eq!(err.kind(), ErrorKind::Server);
	}

	#[test]
	fn body_message_takes_precedence() {
		let err = classify(response(500, Payload::Json(json!({ "msg": "库存不足" }))));

		assert_eq!(err.status, Some(500));
		assert_eq!(err.message, "库存不足");
	}

	#[test]
	fn unmapped_status_uses_the_generic_fallback() {
		let err = classify(response(418, Payload::Json(json!({ "code": 1 }))));

		assert_eq!(err.status, Some(418));
		assert_eq!(err.message, DEFAULT_ERROR_MESSAGE);

		let err = classify(response(201, Payload::Json(json!({}))));

		assert_eq!(err.status, Some(201));
		assert_eq!(err.message, DEFAULT_ERROR_MESSAGE);
	}

	#[test]
	fn network_failures_have_no_status() {
		let err = classify(TransportFailure::no_response(std::io::Error::other("reset"), true));

		assert_eq!(err.status, None);
		assert_eq!(err.message, NETWORK_ERROR_MESSAGE);
		assert_eq!(err.kind(), ErrorKind::Network);
	}

	#[test]
	fn client_failures_keep_their_own_message() {
		let err = classify(TransportFailure::client("boom"));

		assert_eq!(err.status, None);
		assert_eq!(err.message, "boom");
		assert_eq!(err.kind(), ErrorKind::Client);

		let err = classify(TransportFailure::Client { message: None, source: None });

		assert_eq!(err.message, CLIENT_ERROR_MESSAGE);
	}
}
