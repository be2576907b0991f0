//! Relay-level error types shared across configuration, refresh, and dispatch.

// self
use crate::_prelude::*;

/// Relay-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical relay error exposed by public APIs.
///
/// Business-level non-2xx responses are never mapped here; the dispatcher returns them
/// as plain [`ResponseEnvelope`](crate::request::ResponseEnvelope) values for the
/// domain caller to interpret.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Local configuration problem raised before any network call.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Refresh-token exchange failure.
	#[error(transparent)]
	Auth(#[from] AuthError),
	/// Transport failure (DNS, TCP, TLS).
	#[error(transparent)]
	Transport(#[from] TransportError),
	/// A domain caller omitted a required business field.
	#[error(transparent)]
	Validation(#[from] crate::crm::ValidationError),
	/// A response body did not match the JSON shape the caller asked for.
	#[error(transparent)]
	Decode(#[from] crate::request::DecodeError),
}

/// Configuration and construction failures raised by the relay.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// A required configuration value is absent or empty.
	#[error("Required configuration value `{name}` is missing.")]
	MissingValue {
		/// Name of the absent environment variable.
		name: String,
	},
	/// A configured endpoint could not be parsed as a URL.
	#[error("Configuration value `{name}` is not a valid URL.")]
	InvalidUrl {
		/// Name of the offending environment variable.
		name: String,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Refresh-token exchange failures.
///
/// None of these are retried automatically: a rejected refresh token is a fatal
/// credential problem surfaced to the caller, and the single refresh-and-replay cycle
/// allowed by the dispatcher is the only corrective action taken.
#[derive(Debug, ThisError)]
pub enum AuthError {
	/// Token endpoint answered the refresh exchange with a non-200 status.
	#[error("Token endpoint rejected the refresh exchange with status {status}.")]
	RefreshRejected {
		/// HTTP status returned by the token endpoint.
		status: u16,
		/// Response body, lossily decoded for diagnostics.
		body: String,
	},
	/// Token endpoint answered 200 but the payload lacked a usable `access_token`.
	#[error("Token endpoint response is missing a usable access_token field.")]
	MalformedResponse {
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
	},
	/// Token endpoint answered 200 with an empty `access_token` value.
	#[error("Token endpoint returned an empty access token.")]
	EmptyAccessToken,
}

/// Transport-level failures (network, IO).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while dispatching the request.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred while dispatching the request.")]
	Io(#[from] std::io::Error),
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		Self::network(e)
	}
}
