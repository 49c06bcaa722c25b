//! Token store that feeds the `Authorization` header of every outbound call.

pub mod credential;
pub mod storage;

pub use credential::Credential;
pub use storage::{MemorySessionStorage, SessionStorage, SessionStorageExt};

// self
use crate::_prelude::*;

/// Session storage key holding the current credential.
///
/// Shared with the web login page, which writes the token under the same key.
pub const TOKEN_STORAGE_KEY: &str = "newToken";

/// Reads and writes the session credential, falling back to a configured default.
///
/// The store never validates, expires, or refreshes tokens; their lifecycle is driven entirely
/// by the caller.
#[derive(Clone)]
pub struct TokenStore {
	storage: Arc<dyn SessionStorage>,
	fallback: Option<Credential>,
}
impl TokenStore {
	/// Creates a store backed by `storage` with no fallback credential.
	pub fn new(storage: Arc<dyn SessionStorage>) -> Self {
		Self { storage, fallback: None }
	}

	/// Sets the credential returned when the session holds none.
	pub fn with_fallback(mut self, fallback: impl Into<String>) -> Self {
		let fallback = Credential::new(fallback);

		self.fallback = (!fallback.is_empty()).then_some(fallback);

		self
	}

	/// Returns the session credential, else the fallback, else an empty credential.
	pub fn get_token(&self) -> Credential {
		self.storage
			.get_item(TOKEN_STORAGE_KEY)
			.filter(|value| !value.is_empty())
			.map(Credential::new)
			.or_else(|| self.fallback.clone())
			.unwrap_or_default()
	}

	/// Persists `token` to session storage.
	pub fn set_token(&self, token: impl Into<String>) {
		self.storage.set_item(TOKEN_STORAGE_KEY, token.into());
	}

	/// Returns the backing session storage.
	pub fn storage(&self) -> &Arc<dyn SessionStorage> {
		&self.storage
	}
}
impl Default for TokenStore {
	fn default() -> Self {
		Self::new(Arc::new(MemorySessionStorage::default()))
	}
}
impl Debug for TokenStore {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TokenStore").field("fallback_set", &self.fallback.is_some()).finish()
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn empty_store_yields_empty_credential() {
		let store = TokenStore::default();

		assert!(store.get_token().is_empty());
	}

	#[test]
	fn fallback_applies_until_a_session_token_is_set() {
		let store = TokenStore::default().with_fallback("env-token");

		assert_eq!(store.get_token().expose(), "env-token");

		store.set_token("session-token");

		assert_eq!(store.get_token().expose(), "session-token");
	}

	#[test]
	fn empty_session_value_falls_back() {
		let store = TokenStore::default().with_fallback("env-token");

		store.set_token("");

		assert_eq!(store.get_token().expose(), "env-token");
		assert_eq!(store.storage().get_item(TOKEN_STORAGE_KEY).as_deref(), Some(""));
	}

	#[test]
	fn token_written_by_the_login_page_is_read() {
		let storage = Arc::new(MemorySessionStorage::default());
		let store = TokenStore::new(storage.clone()).with_fallback("env-token");

		storage.set_item("newToken", "login-token".into());

		assert_eq!(store.get_token().expose(), "login-token");
	}

	#[test]
	fn empty_fallback_is_ignored() {
		let store = TokenStore::default().with_fallback("");

		assert!(store.get_token().is_empty());
		assert_eq!(format!("{store:?}"), "TokenStore { fallback_set: false }");
	}
}
