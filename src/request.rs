//! Request descriptors and response envelopes exchanged with the dispatcher.

// self
use crate::_prelude::*;

/// HTTP methods the relay dispatches.
///
/// Kept as a closed enum so an unhandled method is an exhaustiveness error instead of
/// a silently ignored string tag.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
	/// HTTP GET.
	Get,
	/// HTTP POST.
	Post,
	/// HTTP PUT.
	Put,
	/// HTTP DELETE.
	Delete,
}
impl Method {
	/// Returns the canonical wire spelling.
	pub const fn as_str(self) -> &'static str {
		match self {
			Method::Get => "GET",
			Method::Post => "POST",
			Method::Put => "PUT",
			Method::Delete => "DELETE",
		}
	}
}
impl Display for Method {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
#[cfg(feature = "reqwest")]
impl From<Method> for reqwest::Method {
	fn from(method: Method) -> Self {
		match method {
			Method::Get => reqwest::Method::GET,
			Method::Post => reqwest::Method::POST,
			Method::Put => reqwest::Method::PUT,
			Method::Delete => reqwest::Method::DELETE,
		}
	}
}

/// Immutable description of one outbound call, prior to authorization attachment.
///
/// A descriptor is built once per call site and may be sent twice only under the
/// dispatcher's retry-once rule; nothing mutates it between the two attempts.
#[derive(Clone, Debug)]
pub struct RequestDescriptor {
	/// Method used for the call.
	pub method: Method,
	/// Path relative to the relay's API base URL.
	pub path: String,
	/// Optional JSON payload, encoded for non-GET calls.
	pub body: Option<serde_json::Value>,
	/// Query parameters, URL-encoded in key order.
	pub query: BTreeMap<String, String>,
}
impl RequestDescriptor {
	/// Creates a descriptor for the provided method and path.
	pub fn new(method: Method, path: impl Into<String>) -> Self {
		Self { method, path: path.into(), body: None, query: BTreeMap::new() }
	}

	/// Creates a GET descriptor.
	pub fn get(path: impl Into<String>) -> Self {
		Self::new(Method::Get, path)
	}

	/// Creates a POST descriptor.
	pub fn post(path: impl Into<String>) -> Self {
		Self::new(Method::Post, path)
	}

	/// Creates a PUT descriptor.
	pub fn put(path: impl Into<String>) -> Self {
		Self::new(Method::Put, path)
	}

	/// Creates a DELETE descriptor.
	pub fn delete(path: impl Into<String>) -> Self {
		Self::new(Method::Delete, path)
	}

	/// Attaches a JSON payload.
	pub fn with_body(mut self, body: serde_json::Value) -> Self {
		self.body = Some(body);

		self
	}

	/// Adds one query parameter.
	pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
		self.query.insert(key.into(), value.into());

		self
	}
}

/// Raw outcome of one HTTP attempt: status code plus body bytes.
///
/// Every status the upstream API produces—success, not-found, rate-limited, even a 401
/// on the replay attempt—is a valid envelope. The dispatcher interprets nothing beyond
/// the authorization-failure status it retries on.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResponseEnvelope {
	/// HTTP status code.
	pub status: u16,
	/// Raw response body.
	pub body: Vec<u8>,
}
impl ResponseEnvelope {
	const UNAUTHORIZED: u16 = 401;

	/// Checks whether the status is in the 2xx range.
	pub fn is_success(&self) -> bool {
		(200..300).contains(&self.status)
	}

	/// Checks whether the status signals an authorization failure.
	pub fn is_unauthorized(&self) -> bool {
		self.status == Self::UNAUTHORIZED
	}

	/// Decodes the body into the requested JSON shape.
	pub fn json<T>(&self) -> Result<T, DecodeError>
	where
		T: serde::de::DeserializeOwned,
	{
		let mut deserializer = serde_json::Deserializer::from_slice(&self.body);

		serde_path_to_error::deserialize(&mut deserializer)
			.map_err(|source| DecodeError { status: self.status, source })
	}

	/// Returns the body lossily decoded as text, for diagnostics.
	pub fn text(&self) -> String {
		String::from_utf8_lossy(&self.body).into_owned()
	}
}

/// Decode failure raised when a response body does not match the expected JSON shape.
#[derive(Debug, ThisError)]
#[error("Response body did not match the expected JSON shape (status {status}).")]
pub struct DecodeError {
	/// HTTP status code carried by the offending envelope.
	pub status: u16,
	/// Structured parsing failure, including the path that failed.
	#[source]
	pub source: serde_path_to_error::Error<serde_json::Error>,
}
