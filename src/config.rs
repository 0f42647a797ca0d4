//! Relay configuration surface: fixed endpoints and the acquisition retry policy.

// std
use std::env;
// self
use crate::{_prelude::*, error::ConfigError};

/// Bounded-retry knobs for token acquisition.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
	/// Attempts per acquisition sequence; always at least one.
	pub attempts: u32,
	/// Fixed delay between attempts.
	pub delay: Duration,
}
impl RetryPolicy {
	/// Default attempt budget.
	pub const DEFAULT_ATTEMPTS: u32 = 3;
	/// Default fixed backoff between attempts.
	pub const DEFAULT_DELAY: Duration = Duration::seconds(5);

	/// Overrides the attempt budget, clamping to at least one attempt.
	pub fn with_attempts(mut self, attempts: u32) -> Self {
		self.attempts = attempts.max(1);

		self
	}

	/// Overrides the fixed backoff; negative durations collapse to zero.
	pub fn with_delay(mut self, delay: Duration) -> Self {
		self.delay = if delay.is_negative() { Duration::ZERO } else { delay };

		self
	}
}
impl Default for RetryPolicy {
	fn default() -> Self {
		Self { attempts: Self::DEFAULT_ATTEMPTS, delay: Self::DEFAULT_DELAY }
	}
}

/// Immutable configuration consumed by the relay at construction time.
#[derive(Clone, Debug)]
pub struct RelayConfig {
	/// Fixed token endpoint URL.
	pub token_endpoint: Url,
	/// Fixed base URL of the wrapped API.
	pub api_base: Url,
	/// Acquisition retry policy.
	pub retry: RetryPolicy,
}
impl RelayConfig {
	/// Environment variable holding the token endpoint URL.
	pub const TOKEN_ENDPOINT_VAR: &'static str = "TOKEN_ENDPOINT_URL";
	/// Environment variable holding the wrapped API base URL.
	pub const API_BASE_VAR: &'static str = "API_BASE_URL";

	/// Builds a config with the default retry policy.
	pub fn new(token_endpoint: Url, api_base: Url) -> Self {
		Self { token_endpoint, api_base, retry: RetryPolicy::default() }
	}

	/// Overrides the retry policy.
	pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
		self.retry = retry;

		self
	}

	/// Reads both endpoint URLs from the environment.
	pub fn from_env() -> Result<Self, ConfigError> {
		let token_endpoint = Self::env_url(Self::TOKEN_ENDPOINT_VAR)?;
		let api_base = Self::env_url(Self::API_BASE_VAR)?;

		Ok(Self::new(token_endpoint, api_base))
	}

	fn env_url(name: &'static str) -> Result<Url, ConfigError> {
		let value = env::var(name).map_err(|_| ConfigError::MissingEnv { name })?;

		Url::parse(&value).map_err(|source| ConfigError::invalid_url(value, source))
	}
}
