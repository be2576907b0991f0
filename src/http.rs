//! Transport seam between the dispatcher and an HTTP stack.
//!
//! [`RelayTransport`] is the relay's only dependency on an HTTP client. The dispatcher
//! hands it a fully assembled [`RawRequest`]—URL, headers, and encoded body—and expects
//! back either a [`ResponseEnvelope`] carrying whatever status the upstream produced,
//! or a [`TransportError`] for network-level failures. Transports never retry and never
//! interpret statuses; both concerns belong to the dispatcher and its callers.

// self
use crate::{_prelude::*, error::TransportError, request::{Method, ResponseEnvelope}};

/// Boxed future returned by [`RelayTransport::send`].
pub type TransportFuture<'a> =
	Pin<Box<dyn Future<Output = Result<ResponseEnvelope, TransportError>> + 'a + Send>>;

/// Abstraction over HTTP stacks capable of executing relay requests.
///
/// Implementations must be `Send + Sync + 'static` so one transport can be shared
/// across relays (typically behind `Arc<T>`) without additional wrappers, and the
/// futures they return must be `Send` for the lifetime of the in-flight request.
pub trait RelayTransport
where
	Self: 'static + Send + Sync,
{
	/// Executes one HTTP request and collects the full response body.
	fn send(&self, request: RawRequest) -> TransportFuture<'_>;
}

/// One fully assembled outbound HTTP request.
#[derive(Clone, Debug)]
pub struct RawRequest {
	/// HTTP method.
	pub method: Method,
	/// Absolute request URL, query included.
	pub url: Url,
	/// Header name/value pairs. Names are lowercase statics owned by the relay.
	pub headers: Vec<(&'static str, String)>,
	/// Encoded request body, when present.
	pub body: Option<Vec<u8>>,
}

/// Thin wrapper around [`ReqwestClient`] so shared HTTP behavior lives in one place.
#[cfg(feature = "reqwest")]
#[derive(Clone, Default)]
pub struct ReqwestTransport(pub ReqwestClient);
#[cfg(feature = "reqwest")]
impl ReqwestTransport {
	/// Wraps an existing reqwest [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}
}
#[cfg(feature = "reqwest")]
impl AsRef<ReqwestClient> for ReqwestTransport {
	fn as_ref(&self) -> &ReqwestClient {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl RelayTransport for ReqwestTransport {
	fn send(&self, request: RawRequest) -> TransportFuture<'_> {
		let client = self.0.clone();

		Box::pin(async move {
			let mut builder = client.request(request.method.into(), request.url);

			for (name, value) in &request.headers {
				builder = builder.header(*name, value);
			}
			if let Some(body) = request.body {
				builder = builder.body(body);
			}

			let response = builder.send().await.map_err(TransportError::from)?;
			let status = response.status().as_u16();
			let body = response.bytes().await.map_err(TransportError::from)?.to_vec();

			Ok(ResponseEnvelope { status, body })
		})
	}
}
