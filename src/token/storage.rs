//! Session-scoped key/value storage used to persist the auth token.

// self
use crate::{_prelude::*, error::StorageError};

/// Platform storage service scoped to the current session.
///
/// Implementations are expected to be cheap, synchronous, and process-local; the facade reads
/// the token on every outbound call.
pub trait SessionStorage
where
	Self: Send + Sync,
{
	/// Returns the stored value for `key`, if present.
	fn get_item(&self, key: &str) -> Option<String>;

	/// Stores or replaces the value for `key`.
	fn set_item(&self, key: &str, value: String);

	/// Removes the value for `key`.
	fn remove_item(&self, key: &str);
}

/// Typed helpers layered over any [`SessionStorage`].
pub trait SessionStorageExt: SessionStorage {
	/// Stores a value, keeping strings verbatim and JSON-encoding everything else.
	///
	/// Empty keys are ignored.
	fn set_value<T>(&self, key: &str, value: &T) -> Result<()>
	where
		T: ?Sized + Serialize,
	{
		if key.is_empty() {
			return Ok(());
		}

		let encoded = serde_json::to_value(value)
			.map_err(|e| StorageError::Serialization { message: e.to_string() })?;
		let raw = match encoded {
			Value::String(text) => text,
			other => other.to_string(),
		};

		self.set_item(key, raw);

		Ok(())
	}

	/// Reads a value previously written with [`set_value`](Self::set_value).
	///
	/// Stored strings that are not valid JSON are decoded as JSON strings, so plain text
	/// round-trips into `String`.
	fn get_value<T>(&self, key: &str) -> Result<Option<T>>
	where
		T: DeserializeOwned,
	{
		if key.is_empty() {
			return Ok(None);
		}

		let Some(raw) = self.get_item(key) else {
			return Ok(None);
		};
		let value = serde_json::from_str::<T>(&raw)
			.or_else(|_| serde_json::from_value::<T>(Value::String(raw)))
			.map_err(|e| StorageError::Serialization { message: e.to_string() })?;

		Ok(Some(value))
	}
}
impl<S> SessionStorageExt for S where S: ?Sized + SessionStorage {}

/// Thread-safe in-process storage that lives as long as the owning application.
#[derive(Clone, Debug, Default)]
pub struct MemorySessionStorage(Arc<RwLock<HashMap<String, String>>>);
impl SessionStorage for MemorySessionStorage {
	fn get_item(&self, key: &str) -> Option<String> {
		self.0.read().get(key).cloned()
	}

	fn set_item(&self, key: &str, value: String) {
		self.0.write().insert(key.to_owned(), value);
	}

	fn remove_item(&self, key: &str) {
		self.0.write().remove(key);
	}
}
