//! Single-identity OAuth 2.0 bearer relay—lazily renewed client-credentials tokens and
//! authenticated request dispatch against one wrapped API.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod manager;
pub mod obs;
#[cfg(feature = "reqwest")]
pub mod _preludet {
	//! Convenience re-exports and helpers shared by integration tests and demos.

	pub use crate::_prelude::*;

	// self
	use crate::{
		auth::Credentials,
		client::ApiClient,
		config::{RelayConfig, RetryPolicy},
		http::ReqwestTransport,
		manager::TokenManager,
	};

	/// Client type alias used by reqwest-backed integration tests.
	pub type ReqwestTestClient = ApiClient<ReqwestTransport>;
	/// Manager type alias used by reqwest-backed integration tests.
	pub type ReqwestTestManager = TokenManager<ReqwestTransport>;

	/// Retry policy with the default attempt count and no backoff so tests run flat out.
	pub fn test_retry_policy() -> RetryPolicy {
		RetryPolicy::default().with_delay(Duration::ZERO)
	}

	/// Builds a relay config pointing at mock endpoints with the zero-delay retry policy.
	pub fn test_relay_config(token_endpoint: &str, api_base: &str) -> RelayConfig {
		let token_endpoint =
			Url::parse(token_endpoint).expect("Test token endpoint URL should parse successfully.");
		let api_base = Url::parse(api_base).expect("Test API base URL should parse successfully.");

		RelayConfig::new(token_endpoint, api_base).with_retry(test_retry_policy())
	}

	/// Credentials fixture shared across integration tests.
	pub fn test_credentials() -> Credentials {
		Credentials::new("relay-client", "relay-secret").expect("Test credentials should be valid.")
	}

	/// Constructs an [`ApiClient`] backed by the crate's default reqwest transport.
	pub fn build_reqwest_test_client(
		config: RelayConfig,
		credentials: Credentials,
	) -> ReqwestTestClient {
		ApiClient::new(config, credentials)
	}

	/// Constructs a standalone [`TokenManager`] backed by the default reqwest transport.
	pub fn build_reqwest_test_manager(
		config: &RelayConfig,
		credentials: Credentials,
	) -> ReqwestTestManager {
		TokenManager::new(config.token_endpoint.clone(), config.retry.clone())
			.with_credentials(credentials)
	}
}

mod _prelude {
	pub use std::{
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		sync::Arc,
	};

	pub use async_lock::Mutex as AsyncMutex;
	pub use parking_lot::RwLock;
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
#[cfg(all(test, feature = "reqwest"))] use {color_eyre as _, httpmock as _};
