//! Relay-level error types shared by the token manager and the API client.

// self
use crate::{_prelude::*, auth::TokenSecret};

/// Crate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;
type JsonParseError = serde_path_to_error::Error<serde_json::Error>;

/// Canonical relay error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Token endpoint did not produce a usable access token.
	#[error(transparent)]
	Authentication(#[from] AuthenticationError),
	/// Wrapped API rejected an authenticated POST.
	#[error(transparent)]
	Api(#[from] ApiError),
	/// Transport failure or unusable response on the GET path.
	#[error(transparent)]
	Transport(#[from] TransportError),
}

/// Configuration and validation failures raised by the relay.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// Client identifier absent after applying the fallback precedence.
	#[error("Client id is missing after applying argument, stored, and source fallbacks.")]
	MissingClientId,
	/// Client secret absent after applying the fallback precedence.
	#[error("Client secret is missing after applying argument, stored, and source fallbacks.")]
	MissingClientSecret,
	/// Environment variable required by the config loader is unset.
	#[error("Environment variable `{name}` is missing.")]
	MissingEnv {
		/// Name of the missing variable.
		name: &'static str,
	},
	/// Endpoint, base, or assembled route URL failed to parse.
	#[error("`{value}` is not a valid URL.")]
	InvalidUrl {
		/// The offending URL text.
		value: String,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
}
impl ConfigError {
	pub(crate) fn invalid_url(value: impl Into<String>, source: url::ParseError) -> Self {
		Self::InvalidUrl { value: value.into(), source }
	}
}

/// Token acquisition failures raised by [`TokenManager`](crate::manager::TokenManager).
#[derive(Debug, ThisError)]
pub enum AuthenticationError {
	/// Token endpoint never returned success within the configured attempt budget.
	///
	/// Fatal for the in-flight call only; the manager retries acquisition from scratch on the
	/// next freshness check.
	#[error(
		"Token endpoint refused the client-credentials grant after {attempts} attempt(s); last status: {status:?}, body: `{body}`."
	)]
	Exhausted {
		/// Number of attempts performed before giving up.
		attempts: u32,
		/// HTTP status of the last attempt; absent when the transport itself failed.
		status: Option<u16>,
		/// Response body (or transport error text) of the last attempt.
		body: String,
	},
	/// Token endpoint answered 200 with a body that does not carry the grant fields.
	#[error("Token endpoint returned malformed JSON.")]
	MalformedResponse {
		/// Structured parsing failure.
		#[source]
		source: JsonParseError,
	},
}

/// Classified rejection from the wrapped API on an authenticated POST.
///
/// Raised only for statuses in `[400, 500]`; everything else passes through to the caller
/// unclassified.
#[derive(Debug, ThisError)]
#[error("Wrapped API rejected POST {url}: status {status}, body `{body}`.")]
pub struct ApiError {
	/// Full request URL.
	pub url: String,
	/// HTTP status returned by the wrapped API.
	pub status: u16,
	/// Response body text.
	pub body: String,
	/// Snapshot of the bearer token in use when the call failed; redacted in formatted output.
	pub token: TokenSecret,
}

/// Transport-level failures (network, decode) and non-success GET responses.
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling `{url}`.")]
	Network {
		/// Request URL.
		url: String,
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Wrapped API returned a non-success status on a GET.
	#[error("GET {url} returned status {status}, body: `{body}`.")]
	Status {
		/// Full request URL.
		url: String,
		/// HTTP status returned by the wrapped API.
		status: u16,
		/// Response body text.
		body: String,
	},
	/// Response body could not be decoded as JSON.
	#[error("Response from `{url}` is not valid JSON.")]
	Decode {
		/// Full request URL.
		url: String,
		/// Structured parsing failure.
		#[source]
		source: JsonParseError,
	},
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(
		url: impl Into<String>,
		src: impl 'static + Send + Sync + std::error::Error,
	) -> Self {
		Self::Network { url: url.into(), source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		let url = e.url().map(|value| value.to_string()).unwrap_or_default();

		Self::network(url, e)
	}
}
