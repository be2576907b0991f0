//! Refresh-token exchange: one form POST, no retries, no store writes.

// self
use crate::{
	_prelude::*,
	auth::{Credential, SecretString},
	error::AuthError,
	http::{RawRequest, RelayTransport},
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
	relay::Relay,
	request::Method,
};

/// Fields the relay consumes from a successful token-endpoint answer.
///
/// Anything else the endpoint returns—`expires_in` included—is ignored: expiry
/// detection is reactive by design, so no TTL is tracked client-side.
#[derive(Debug, Deserialize)]
struct TokenGrant {
	access_token: String,
}

impl<C> Relay<C>
where
	C: ?Sized + RelayTransport,
{
	/// Exchanges the refresh token for a new access token.
	///
	/// The exchange is pure with respect to the credential store: the token is
	/// returned to the caller (the dispatcher owns the write-back) and a failed
	/// exchange leaves the stored token untouched. A non-200 answer means the
	/// refresh token itself is bad—fatal, surfaced, never retried.
	pub async fn refresh_access_token(&self) -> Result<SecretString> {
		const KIND: FlowKind = FlowKind::Refresh;

		let span = FlowSpan::new(KIND, "refresh_access_token");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span
			.instrument(async move {
				self.refresh_metrics.record_attempt();

				let request = RawRequest {
					method: Method::Post,
					url: self.credential.token_url().clone(),
					headers: vec![(
						"content-type",
						"application/x-www-form-urlencoded".into(),
					)],
					body: Some(refresh_form(&self.credential)),
				};
				let response = self.transport.send(request).await.inspect_err(|_| {
					self.refresh_metrics.record_failure();
				})?;

				if response.status != 200 {
					self.refresh_metrics.record_failure();

					return Err(AuthError::RefreshRejected {
						status: response.status,
						body: response.text(),
					}
					.into());
				}

				let mut deserializer = serde_json::Deserializer::from_slice(&response.body);
				let grant: TokenGrant = serde_path_to_error::deserialize(&mut deserializer)
					.map_err(|source| {
						self.refresh_metrics.record_failure();

						Error::from(AuthError::MalformedResponse { source })
					})?;

				if grant.access_token.is_empty() {
					self.refresh_metrics.record_failure();

					return Err(AuthError::EmptyAccessToken.into());
				}

				self.refresh_metrics.record_success();

				Ok(SecretString::new(grant.access_token))
			})
			.await;

		match &result {
			Ok(_) => obs::record_flow_outcome(KIND, FlowOutcome::Success),
			Err(_) => obs::record_flow_outcome(KIND, FlowOutcome::Failure),
		}

		result
	}
}

fn refresh_form(credential: &Credential) -> Vec<u8> {
	url::form_urlencoded::Serializer::new(String::new())
		.append_pair("grant_type", "refresh_token")
		.append_pair("client_id", credential.client_id())
		.append_pair("client_secret", credential.client_secret().expose())
		.append_pair("refresh_token", credential.refresh_token().expose())
		.finish()
		.into_bytes()
}
