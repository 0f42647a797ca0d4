//! Client credential pair and the fallback source consulted when values are omitted.

// std
use std::env;
// self
use crate::{auth::token::TokenSecret, error::ConfigError};

/// Immutable client-credentials pair used for every token acquisition.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Credentials {
	/// OAuth 2.0 client identifier.
	pub client_id: String,
	/// Confidential client secret; redacted in formatted output.
	pub client_secret: TokenSecret,
}
impl Credentials {
	/// Validates and builds a credential pair; both halves must be non-empty.
	pub fn new(
		client_id: impl Into<String>,
		client_secret: impl Into<String>,
	) -> Result<Self, ConfigError> {
		let client_id = client_id.into();
		let client_secret = client_secret.into();

		if client_id.is_empty() {
			return Err(ConfigError::MissingClientId);
		}
		if client_secret.is_empty() {
			return Err(ConfigError::MissingClientSecret);
		}

		Ok(Self { client_id, client_secret: TokenSecret::new(client_secret) })
	}
}

/// Source consulted when credentials are neither supplied explicitly nor already stored.
pub trait CredentialSource
where
	Self: Send + Sync,
{
	/// Returns the client identifier, if the source knows one.
	fn client_id(&self) -> Option<String>;

	/// Returns the client secret, if the source knows one.
	fn client_secret(&self) -> Option<String>;
}

/// Environment-backed [`CredentialSource`] with API-key fallback names.
#[derive(Clone, Debug, Default)]
pub struct EnvCredentials;
impl EnvCredentials {
	/// Primary environment variable for the client identifier.
	pub const CLIENT_ID: &'static str = "CLIENT_ID";
	/// Primary environment variable for the client secret.
	pub const CLIENT_SECRET: &'static str = "CLIENT_SECRET";
	/// Fallback variable consulted when [`Self::CLIENT_ID`] is unset.
	pub const API_KEY: &'static str = "API_KEY";
	/// Fallback variable consulted when [`Self::CLIENT_SECRET`] is unset.
	pub const API_SECRET: &'static str = "API_SECRET";

	fn non_empty(name: &str) -> Option<String> {
		env::var(name).ok().filter(|value| !value.is_empty())
	}
}
impl CredentialSource for EnvCredentials {
	fn client_id(&self) -> Option<String> {
		Self::non_empty(Self::CLIENT_ID).or_else(|| Self::non_empty(Self::API_KEY))
	}

	fn client_secret(&self) -> Option<String> {
		Self::non_empty(Self::CLIENT_SECRET).or_else(|| Self::non_empty(Self::API_SECRET))
	}
}
