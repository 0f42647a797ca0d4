//! Authenticated request dispatch against the wrapped API.
//!
//! [`ApiClient`] pairs a [`TokenManager`] with the wrapped API's base URL. Every operation
//! checks token freshness first (one policy across `call`, `get`, and `ping`), attaches the
//! bearer header, and classifies the response: POSTs returning a status in `[400, 500]` raise
//! [`ApiError`]; anything else passes through to the caller untouched. API calls are never
//! retried here; retry is local to token acquisition.

// self
use crate::{
	_prelude::*,
	auth::Credentials,
	config::RelayConfig,
	error::{ApiError, ConfigError, TransportError},
	http::{HttpTransport, TransportRequest, TransportResponse},
	manager::TokenManager,
	obs::{self, OpOutcome, OpSpan, RelayOp},
};
#[cfg(feature = "reqwest")] use crate::http::ReqwestTransport;

/// Authenticated client for one wrapped API, relaying requests with a lazily renewed token.
pub struct ApiClient<T>
where
	T: ?Sized + HttpTransport,
{
	transport: Arc<T>,
	api_base: Url,
	manager: TokenManager<T>,
}
impl<T> ApiClient<T>
where
	T: ?Sized + HttpTransport,
{
	/// Creates a client that shares the caller-provided transport between token acquisition and
	/// request dispatch.
	pub fn with_transport(
		config: RelayConfig,
		credentials: Credentials,
		transport: impl Into<Arc<T>>,
	) -> Self {
		let manager =
			TokenManager::with_transport(config.token_endpoint, config.retry, transport)
				.with_credentials(credentials);
		let transport = manager.transport();

		Self { transport, api_base: config.api_base, manager }
	}

	/// The underlying token manager, for credential replacement and token snapshots.
	pub fn manager(&self) -> &TokenManager<T> {
		&self.manager
	}

	/// Relays a JSON POST to `{base}/{route}`.
	///
	/// A missing payload is a deliberate no-op guard, not an error: the call returns `Ok(None)`
	/// without any network traffic, freshness check included. Statuses in `[400, 500]` raise
	/// [`ApiError`] with enough context to diagnose without re-running; everything else
	/// (success, server errors above 500, redirects) is handed back unclassified.
	pub async fn call(
		&self,
		route: &str,
		payload: Option<serde_json::Value>,
	) -> Result<Option<TransportResponse>> {
		let Some(payload) = payload else {
			return Ok(None);
		};
		let span = OpSpan::new(RelayOp::Call, "call");

		obs::record_op_outcome(RelayOp::Call, OpOutcome::Attempt);

		let result = span
			.instrument(async move {
				let token = self.manager.ensure_fresh().await?;
				let url = self.post_url(route)?;
				let request =
					TransportRequest::post(url.clone()).bearer(token.clone()).json(payload);
				let response = self.transport.execute(request).await?;

				if (400..=500).contains(&response.status) {
					return Err(ApiError {
						url: url.to_string(),
						status: response.status,
						body: response.text(),
						token,
					}
					.into());
				}

				Ok(Some(response))
			})
			.await;

		match &result {
			Ok(_) => obs::record_op_outcome(RelayOp::Call, OpOutcome::Success),
			Err(_) => obs::record_op_outcome(RelayOp::Call, OpOutcome::Failure),
		}

		result
	}

	/// Relays a bearer GET to `{base}{route}` and decodes the JSON body.
	///
	/// Any non-success status maps to [`TransportError::Status`] with the body preserved.
	pub async fn get(&self, route: &str) -> Result<serde_json::Value> {
		let span = OpSpan::new(RelayOp::Get, "get");

		obs::record_op_outcome(RelayOp::Get, OpOutcome::Attempt);

		let result = span
			.instrument(async move {
				let token = self.manager.ensure_fresh().await?;
				let url = self.get_url(route)?;
				let request = TransportRequest::get(url.clone()).bearer(token);
				let response = self.transport.execute(request).await?;

				if !response.is_success() {
					return Err(TransportError::Status {
						url: url.to_string(),
						status: response.status,
						body: response.text(),
					}
					.into());
				}

				response
					.json::<serde_json::Value>()
					.map_err(|source| TransportError::Decode { url: url.to_string(), source }.into())
			})
			.await;

		match &result {
			Ok(_) => obs::record_op_outcome(RelayOp::Get, OpOutcome::Success),
			Err(_) => obs::record_op_outcome(RelayOp::Get, OpOutcome::Failure),
		}

		result
	}

	/// Probes a route with a bearer GET, reporting reachability instead of raising on
	/// non-success statuses.
	pub async fn ping(&self, route: &str) -> Result<bool> {
		let token = self.manager.ensure_fresh().await?;
		let url = self.get_url(route)?;
		let response = self.transport.execute(TransportRequest::get(url).bearer(token)).await?;

		Ok(response.is_success())
	}

	// POST inserts a separator between base and route; GET appends the route verbatim (routes on
	// that path carry their own leading slash). Both match the wrapped API's published contract.
	fn post_url(&self, route: &str) -> Result<Url, ConfigError> {
		let base = self.api_base.as_str().trim_end_matches('/');
		let value = format!("{base}/{}", route.trim_start_matches('/'));

		Url::parse(&value).map_err(|source| ConfigError::invalid_url(value, source))
	}

	fn get_url(&self, route: &str) -> Result<Url, ConfigError> {
		let value = format!("{}{route}", self.api_base.as_str().trim_end_matches('/'));

		Url::parse(&value).map_err(|source| ConfigError::invalid_url(value, source))
	}
}
#[cfg(feature = "reqwest")]
impl ApiClient<ReqwestTransport> {
	/// Creates a client that provisions its own reqwest-backed transport.
	pub fn new(config: RelayConfig, credentials: Credentials) -> Self {
		Self::with_transport(config, credentials, ReqwestTransport::default())
	}
}
impl<T> Debug for ApiClient<T>
where
	T: ?Sized + HttpTransport,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ApiClient")
			.field("api_base", &self.api_base.as_str())
			.field("manager", &self.manager)
			.finish()
	}
}
