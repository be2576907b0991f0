//! Credential primitives: redacted secrets and the shared credential store.

pub mod credential;
pub mod secret;

pub use credential::Credential;
pub use secret::SecretString;
