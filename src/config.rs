//! Environment-sourced relay configuration, resolved once at construction.

// std
use std::env;
// self
use crate::{_prelude::*, auth::SecretString, error::ConfigError};

/// Immutable configuration for one upstream integration.
///
/// Every value is required. Construction fails with [`ConfigError`] before any network
/// call when a value is absent, empty, or unparseable—a relay is never built with a
/// partial credential.
#[derive(Clone, Debug)]
pub struct RelayConfig {
	/// OAuth client identifier.
	pub client_id: String,
	/// OAuth client secret.
	pub client_secret: SecretString,
	/// Long-lived refresh token exchanged for access tokens.
	pub refresh_token: SecretString,
	/// Base URL of the upstream API; descriptor paths are appended to it.
	pub api_url: Url,
	/// Full URL of the OAuth token endpoint.
	pub token_url: Url,
}
impl RelayConfig {
	/// Builds a configuration from explicit values.
	pub fn new(
		client_id: impl Into<String>,
		client_secret: SecretString,
		refresh_token: SecretString,
		api_url: Url,
		token_url: Url,
	) -> Self {
		Self { client_id: client_id.into(), client_secret, refresh_token, api_url, token_url }
	}

	/// Reads `{PREFIX}_CLIENT_ID`, `{PREFIX}_CLIENT_SECRET`, `{PREFIX}_REFRESH_TOKEN`,
	/// `{PREFIX}_API_URL`, and `{PREFIX}_TOKEN_URL` from the process environment.
	pub fn from_env(prefix: &str) -> Result<Self, ConfigError> {
		Self::from_lookup(prefix, |name| env::var(name).ok())
	}

	/// Resolves the same variable set through an injected lookup.
	///
	/// `from_env` delegates here; tests supply a closure over a fixture map instead of
	/// mutating the process environment.
	pub fn from_lookup(
		prefix: &str,
		lookup: impl Fn(&str) -> Option<String>,
	) -> Result<Self, ConfigError> {
		let client_id = require(&lookup, prefix, "CLIENT_ID")?;
		let client_secret = SecretString::new(require(&lookup, prefix, "CLIENT_SECRET")?);
		let refresh_token = SecretString::new(require(&lookup, prefix, "REFRESH_TOKEN")?);
		let api_url = require_url(&lookup, prefix, "API_URL")?;
		let token_url = require_url(&lookup, prefix, "TOKEN_URL")?;

		Ok(Self { client_id, client_secret, refresh_token, api_url, token_url })
	}
}

fn require(
	lookup: &impl Fn(&str) -> Option<String>,
	prefix: &str,
	key: &str,
) -> Result<String, ConfigError> {
	let name = format!("{prefix}_{key}");

	match lookup(&name) {
		Some(value) if !value.trim().is_empty() => Ok(value),
		_ => Err(ConfigError::MissingValue { name }),
	}
}

fn require_url(
	lookup: &impl Fn(&str) -> Option<String>,
	prefix: &str,
	key: &str,
) -> Result<Url, ConfigError> {
	let name = format!("{prefix}_{key}");
	let raw = require(lookup, prefix, key)?;

	Url::parse(&raw).map_err(|source| ConfigError::InvalidUrl { name, source })
}
