//! Bearer-credential request relay—dispatch authenticated HTTP calls with reactive
//! refresh-token rotation and retry-once replay.
//!
//! The relay owns a single bearer credential, attaches it to every outbound request,
//! refreshes it through the OAuth 2.0 refresh-token grant when the upstream API answers
//! 401, and replays the rejected request exactly once. Everything else—business
//! payloads, pagination, response interpretation—belongs to the domain callers built on
//! top, such as the bundled [`crm`] client.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod auth;
pub mod config;
pub mod crm;
pub mod error;
pub mod http;
pub mod obs;
pub mod relay;
pub mod request;

mod _prelude {
	pub use std::{
		collections::BTreeMap,
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		sync::Arc,
	};

	pub use parking_lot::RwLock;
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
#[cfg(all(test, feature = "reqwest"))] use httpmock as _;
