//! Access token state: redacted secret wrapper, validity window, endpoint grant payload.

// self
use crate::_prelude::*;

/// Redacted token secret wrapper keeping sensitive material out of logs.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenSecret(String);
impl TokenSecret {
	/// Wraps a new secret string.
	pub fn new(value: impl Into<String>) -> Self {
		Self(value.into())
	}

	/// Returns the inner token value. Callers must avoid logging this string.
	pub fn expose(&self) -> &str {
		&self.0
	}
}
impl AsRef<str> for TokenSecret {
	fn as_ref(&self) -> &str {
		self.expose()
	}
}
impl Debug for TokenSecret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_tuple("TokenSecret").field(&"<redacted>").finish()
	}
}
impl Display for TokenSecret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("<redacted>")
	}
}

/// Access token plus its validity window.
///
/// Owned exclusively by the token manager and replaced only by a successful acquisition;
/// `issued_at` and `expires_in` always travel together with the token value.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenRecord {
	/// Access token secret; callers must avoid logging it.
	pub access_token: TokenSecret,
	/// Instant the grant was stamped by the manager.
	pub issued_at: OffsetDateTime,
	/// Validity window reported by the token endpoint.
	pub expires_in: Duration,
}
impl TokenRecord {
	/// Expiry instant derived from `issued_at` plus `expires_in`.
	pub fn expires_at(&self) -> OffsetDateTime {
		self.issued_at + self.expires_in
	}

	/// Returns `true` while `instant` falls inside the half-open window
	/// `[issued_at, issued_at + expires_in)`.
	pub fn is_fresh_at(&self, instant: OffsetDateTime) -> bool {
		instant - self.issued_at < self.expires_in
	}

	/// Returns `true` once the validity window has elapsed (the renewal trigger).
	pub fn is_expired_at(&self, instant: OffsetDateTime) -> bool {
		!self.is_fresh_at(instant)
	}

	/// Convenience helper that checks freshness against the current UTC instant.
	pub fn is_fresh(&self) -> bool {
		self.is_fresh_at(OffsetDateTime::now_utc())
	}
}

/// Success payload returned by the token endpoint for the client-credentials grant.
#[derive(Clone, Debug, Deserialize)]
pub struct TokenGrant {
	/// Opaque access token value.
	pub access_token: String,
	/// Validity window in seconds.
	pub expires_in: i64,
}
impl TokenGrant {
	/// Parses a token endpoint body, keeping the JSON path of any failure.
	pub fn from_slice(
		bytes: &[u8],
	) -> Result<Self, serde_path_to_error::Error<serde_json::Error>> {
		let mut de = serde_json::Deserializer::from_slice(bytes);

		serde_path_to_error::deserialize(&mut de)
	}

	/// Stamps the grant into a [`TokenRecord`] issued at `instant`.
	pub fn into_record(self, instant: OffsetDateTime) -> TokenRecord {
		TokenRecord {
			access_token: TokenSecret::new(self.access_token),
			issued_at: instant,
			expires_in: Duration::seconds(self.expires_in),
		}
	}
}
