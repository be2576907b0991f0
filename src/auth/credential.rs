//! The credential store: one immutable refresh triple, one mutable access-token slot.

// self
use crate::{_prelude::*, auth::SecretString, config::RelayConfig};

/// Shared credential state for a single upstream integration.
///
/// The client identifier, client secret, refresh token, and token endpoint are fixed
/// for the lifetime of the credential. Only the access-token slot mutates, and every
/// write replaces the previous value wholesale. The store never performs network calls
/// and never inspects the token—it is an opaque string whose validity only the
/// upstream API can judge, by rejecting it with a 401.
///
/// No expiry timestamp is tracked. The token endpoint's `expires_in` hint is ignored
/// on purpose: expiry detection is strictly reactive, so the stored token stays in use
/// until the API rejects it.
pub struct Credential {
	client_id: String,
	client_secret: SecretString,
	refresh_token: SecretString,
	token_url: Url,
	access_token: RwLock<Option<SecretString>>,
}
impl Credential {
	/// Creates a credential with an unset access-token slot.
	pub fn new(
		client_id: impl Into<String>,
		client_secret: SecretString,
		refresh_token: SecretString,
		token_url: Url,
	) -> Self {
		Self {
			client_id: client_id.into(),
			client_secret,
			refresh_token,
			token_url,
			access_token: RwLock::new(None),
		}
	}

	/// Returns the last stored access token, or `None` when never fetched.
	pub fn current_token(&self) -> Option<SecretString> {
		self.access_token.read().clone()
	}

	/// Atomically replaces the stored access token. Last writer wins.
	pub fn set_token(&self, token: SecretString) {
		*self.access_token.write() = Some(token);
	}

	/// Returns the OAuth client identifier.
	pub fn client_id(&self) -> &str {
		&self.client_id
	}

	/// Returns the OAuth client secret.
	pub fn client_secret(&self) -> &SecretString {
		&self.client_secret
	}

	/// Returns the long-lived refresh token.
	pub fn refresh_token(&self) -> &SecretString {
		&self.refresh_token
	}

	/// Returns the token endpoint URL used for refresh exchanges.
	pub fn token_url(&self) -> &Url {
		&self.token_url
	}
}
impl From<&RelayConfig> for Credential {
	fn from(config: &RelayConfig) -> Self {
		Self::new(
			config.client_id.clone(),
			config.client_secret.clone(),
			config.refresh_token.clone(),
			config.token_url.clone(),
		)
	}
}
impl Debug for Credential {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Credential")
			.field("client_id", &self.client_id)
			.field("token_url", &self.token_url.as_str())
			.field("access_token_set", &self.access_token.read().is_some())
			.finish()
	}
}
