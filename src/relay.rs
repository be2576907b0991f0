//! The authenticated-request dispatcher.
//!
//! [`Relay::execute`] runs a two-phase state machine over a single call: attach the
//! current bearer token and issue the request; on a 401 answer to the initial attempt,
//! refresh the token and replay the same descriptor exactly once, returning whatever
//! the replay yields. The replay bound is structural—the state carrying the replay
//! marker has no transition back to refreshing—so no descriptor is ever sent a third
//! time.
//!
//! Replay safety is a documented dependency on the upstream API: an unauthenticated
//! request, any method included, is rejected before a server-side mutation is applied,
//! so replaying a POST/PUT/DELETE after a pure authorization failure cannot duplicate
//! work. Callers integrating an API without that guarantee must not reuse this
//! dispatcher for side-effecting methods.

pub mod metrics;

mod refresh;

pub use metrics::{DispatchMetrics, RefreshMetrics};

// std
use std::borrow::Cow;
// self
use crate::{
	_prelude::*,
	auth::{Credential, SecretString},
	config::RelayConfig,
	http::{RawRequest, RelayTransport},
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
	request::{RequestDescriptor, ResponseEnvelope},
};
#[cfg(feature = "reqwest")] use crate::http::ReqwestTransport;

#[cfg(feature = "reqwest")]
/// Relay specialized for the crate's default reqwest transport.
pub type ReqwestRelay = Relay<ReqwestTransport>;

const DEFAULT_AUTH_SCHEME: &str = "Bearer";

/// Dispatches authenticated requests against one upstream integration.
///
/// The relay owns the transport, the shared [`Credential`], the API base URL, and the
/// authorization scheme token fixed for the integration. It is safe to share across
/// concurrent callers; simultaneous 401s may trigger racing refreshes, which the
/// credential store resolves last-writer-wins—each caller still converges to a valid
/// token or a correctly propagated fatal error.
pub struct Relay<C>
where
	C: ?Sized + RelayTransport,
{
	/// Transport used for every outbound request, refresh exchanges included.
	pub transport: Arc<C>,
	/// Shared credential store; only the dispatcher writes its token slot.
	pub credential: Arc<Credential>,
	/// Counters for dispatch outcomes.
	pub dispatch_metrics: Arc<DispatchMetrics>,
	/// Counters for refresh-exchange outcomes.
	pub refresh_metrics: Arc<RefreshMetrics>,
	api_url: Url,
	auth_scheme: Cow<'static, str>,
}
impl<C> Relay<C>
where
	C: ?Sized + RelayTransport,
{
	/// Creates a relay that reuses the caller-provided transport.
	pub fn with_transport(config: &RelayConfig, transport: impl Into<Arc<C>>) -> Self {
		Self {
			transport: transport.into(),
			credential: Arc::new(Credential::from(config)),
			dispatch_metrics: Default::default(),
			refresh_metrics: Default::default(),
			api_url: config.api_url.clone(),
			auth_scheme: Cow::Borrowed(DEFAULT_AUTH_SCHEME),
		}
	}

	/// Overrides the authorization scheme token (defaults to `Bearer`).
	pub fn with_auth_scheme(mut self, scheme: impl Into<Cow<'static, str>>) -> Self {
		self.auth_scheme = scheme.into();

		self
	}

	/// Returns the API base URL requests are dispatched against.
	pub fn api_url(&self) -> &Url {
		&self.api_url
	}

	/// Returns the authorization scheme token attached to every request.
	pub fn auth_scheme(&self) -> &str {
		&self.auth_scheme
	}

	/// Dispatches one descriptor with retry-once replay on authorization failure.
	///
	/// Any status except a 401 on the initial attempt is returned as-is: business
	/// errors (404, 429, 5xx) are envelope values for the caller to interpret, not
	/// dispatch failures. Transport errors and refresh failures surface as [`Error`]
	/// and are never retried here.
	pub async fn execute(&self, descriptor: &RequestDescriptor) -> Result<ResponseEnvelope> {
		const KIND: FlowKind = FlowKind::Dispatch;

		let span = FlowSpan::new(KIND, "execute");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span
			.instrument(async move {
				self.dispatch_metrics.record_attempt();

				let outcome = self.drive(descriptor).await;

				match &outcome {
					Ok(_) => self.dispatch_metrics.record_success(),
					Err(_) => self.dispatch_metrics.record_failure(),
				}

				outcome
			})
			.await;

		match &result {
			Ok(_) => obs::record_flow_outcome(KIND, FlowOutcome::Success),
			Err(_) => obs::record_flow_outcome(KIND, FlowOutcome::Failure),
		}

		result
	}

	async fn drive(&self, descriptor: &RequestDescriptor) -> Result<ResponseEnvelope> {
		let mut state = match self.credential.current_token() {
			Some(token) => DispatchState::Authenticated { token, attempt: Attempt::Initial },
			// Never waste the primary call on an absent Authorization header.
			None => DispatchState::Refreshing { attempt: Attempt::Initial },
		};

		loop {
			match state {
				DispatchState::Refreshing { attempt } => {
					// A failed exchange propagates here and leaves the stored token
					// untouched; only a successful one is written back.
					let token = self.refresh_access_token().await?;

					self.credential.set_token(token.clone());

					state = DispatchState::Authenticated { token, attempt };
				},
				DispatchState::Authenticated { token, attempt } => {
					let request = self.assemble(descriptor, &token);
					let response = self.transport.send(request).await?;

					if response.is_unauthorized() && matches!(attempt, Attempt::Initial) {
						self.dispatch_metrics.record_replay();

						state = DispatchState::Refreshing { attempt: Attempt::Replay };
					} else {
						return Ok(response);
					}
				},
			}
		}
	}

	fn assemble(&self, descriptor: &RequestDescriptor, token: &SecretString) -> RawRequest {
		let mut url = self.api_url.clone();

		// http(s) base URLs always expose path segments; other schemes are rejected
		// long before a descriptor reaches the transport.
		if let Ok(mut segments) = url.path_segments_mut() {
			segments.pop_if_empty().extend(descriptor.path.split('/'));
		}
		if !descriptor.query.is_empty() {
			url.query_pairs_mut().extend_pairs(&descriptor.query);
		}

		let mut headers =
			vec![("authorization", format!("{} {}", self.auth_scheme, token.expose()))];
		let body = descriptor.body.as_ref().map(|body| body.to_string().into_bytes());

		if body.is_some() {
			headers.push(("content-type", "application/json".into()));
		}

		RawRequest { method: descriptor.method, url, headers, body }
	}
}
#[cfg(feature = "reqwest")]
impl Relay<ReqwestTransport> {
	/// Creates a relay with its own reqwest-backed transport.
	pub fn new(config: &RelayConfig) -> Self {
		Self::with_transport(config, ReqwestTransport::default())
	}
}
impl<C> Clone for Relay<C>
where
	C: ?Sized + RelayTransport,
{
	fn clone(&self) -> Self {
		Self {
			transport: self.transport.clone(),
			credential: self.credential.clone(),
			dispatch_metrics: self.dispatch_metrics.clone(),
			refresh_metrics: self.refresh_metrics.clone(),
			api_url: self.api_url.clone(),
			auth_scheme: self.auth_scheme.clone(),
		}
	}
}
impl<C> Debug for Relay<C>
where
	C: ?Sized + RelayTransport,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Relay")
			.field("api_url", &self.api_url.as_str())
			.field("auth_scheme", &self.auth_scheme)
			.field("credential", &self.credential)
			.finish()
	}
}

/// Phases of a single dispatched call.
///
/// The replay marker travels with the state: a 401 answered to
/// `Authenticated { attempt: Replay }` has no transition left except returning the
/// envelope, which is what bounds the dispatcher to exactly one replay.
enum DispatchState {
	/// Exchange the refresh token before (re-)issuing the call.
	Refreshing { attempt: Attempt },
	/// Issue the call with the provided token attached.
	Authenticated { token: SecretString, attempt: Attempt },
}

#[derive(Clone, Copy)]
enum Attempt {
	Initial,
	Replay,
}
