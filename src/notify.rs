//! User-facing notification sinks (toast-style success and error messages).

// self
use crate::_prelude::*;

/// Severity of a user-facing notice.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NoticeLevel {
	/// Non-blocking success message.
	Success,
	/// Error message.
	Error,
}

/// A single message the UI layer should surface.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notice {
	/// Severity.
	pub level: NoticeLevel,
	/// Localized message text.
	pub message: String,
	/// Instant the notice was raised.
	pub raised_at: OffsetDateTime,
}
impl Notice {
	/// Creates a success notice.
	pub fn success(message: impl Into<String>) -> Self {
		Self::new(NoticeLevel::Success, message)
	}

	/// Creates an error notice.
	pub fn error(message: impl Into<String>) -> Self {
		Self::new(NoticeLevel::Error, message)
	}

	fn new(level: NoticeLevel, message: impl Into<String>) -> Self {
		Self { level, message: message.into(), raised_at: OffsetDateTime::now_utc() }
	}
}

/// Sink that displays notices to the user.
///
/// The facade calls [`notify`](Notifier::notify) synchronously from the request task, so
/// implementations should hand the notice off rather than block.
pub trait Notifier
where
	Self: Send + Sync,
{
	/// Surfaces `notice` to the user.
	fn notify(&self, notice: Notice);
}

/// Default sink that writes notices to the `tracing` pipeline.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingNotifier;
impl Notifier for TracingNotifier {
	fn notify(&self, notice: Notice) {
		#[cfg(feature = "tracing")]
		match notice.level {
			NoticeLevel::Success => tracing::info!(text = %notice.message, "success notice"),
			NoticeLevel::Error => tracing::warn!(text = %notice.message, "error notice"),
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = notice;
		}
	}
}

/// Sink that records notices in memory for inspection.
#[derive(Clone, Debug, Default)]
pub struct MemoryNotifier(Arc<Mutex<Vec<Notice>>>);
impl MemoryNotifier {
	/// Returns every notice recorded so far.
	pub fn notices(&self) -> Vec<Notice> {
		self.0.lock().clone()
	}

	/// Returns the messages recorded at `level`, in order.
	pub fn messages(&self, level: NoticeLevel) -> Vec<String> {
		self.0
			.lock()
			.iter()
			.filter(|notice| notice.level == level)
			.map(|notice| notice.message.clone())
			.collect()
	}

	/// Drops every recorded notice.
	pub fn clear(&self) {
		self.0.lock().clear();
	}
}
impl Notifier for MemoryNotifier {
	fn notify(&self, notice: Notice) {
		self.0.lock().push(notice);
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn memory_notifier_filters_by_level() {
		let notifier = MemoryNotifier::default();

		notifier.notify(Notice::success("保存成功"));
		notifier.notify(Notice::error("服务器内部错误"));

		assert_eq!(notifier.messages(NoticeLevel::Success), vec!["保存成功".to_owned()]);
		assert_eq!(notifier.messages(NoticeLevel::Error), vec!["服务器内部错误".to_owned()]);

		notifier.clear();

		assert!(notifier.notices().is_empty());
	}

	#[test]
	fn tracing_notifier_accepts_both_levels() {
		TracingNotifier.notify(Notice::success("ok"));
		TracingNotifier.notify(Notice::error("failed"));
	}
}
