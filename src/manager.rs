//! Client-credentials token lifecycle: acquisition, expiry tracking, lazy renewal, bounded retry.
//!
//! [`TokenManager`] owns the credential pair and the current [`TokenRecord`]. Freshness is
//! evaluated only at point of use (`ensure_fresh`); a stale or absent token triggers an
//! acquisition sequence of up to [`RetryPolicy::attempts`] POSTs against the token endpoint with
//! a non-blocking delay between attempts. Concurrent callers racing on a stale token serialize
//! on an async guard and piggy-back on the first renewal instead of stampeding the endpoint.
//! A failed sequence never poisons the manager; the next freshness check starts over.

// self
use crate::{
	_prelude::*,
	auth::{CredentialSource, Credentials, TokenGrant, TokenRecord, TokenSecret},
	config::RetryPolicy,
	error::{AuthenticationError, ConfigError},
	http::{HttpTransport, TransportRequest},
	obs::{self, OpOutcome, OpSpan, RelayOp},
};
#[cfg(feature = "reqwest")] use crate::http::ReqwestTransport;

/// Owns the access token for one client identity and renews it lazily.
pub struct TokenManager<T>
where
	T: ?Sized + HttpTransport,
{
	transport: Arc<T>,
	token_endpoint: Url,
	retry: RetryPolicy,
	source: Option<Arc<dyn CredentialSource>>,
	credentials: RwLock<Option<Credentials>>,
	token: RwLock<Option<TokenRecord>>,
	renew_guard: AsyncMutex<()>,
}
impl<T> TokenManager<T>
where
	T: ?Sized + HttpTransport,
{
	/// Creates a manager that reuses the caller-provided transport.
	pub fn with_transport(
		token_endpoint: Url,
		retry: RetryPolicy,
		transport: impl Into<Arc<T>>,
	) -> Self {
		Self {
			transport: transport.into(),
			token_endpoint,
			retry,
			source: None,
			credentials: RwLock::new(None),
			token: RwLock::new(None),
			renew_guard: AsyncMutex::new(()),
		}
	}

	/// Stores the initial credential pair.
	pub fn with_credentials(self, credentials: Credentials) -> Self {
		*self.credentials.write() = Some(credentials);

		self
	}

	/// Attaches a fallback source consulted by [`set_credentials`](Self::set_credentials) when a
	/// half is neither supplied nor already stored.
	pub fn with_credential_source(mut self, source: Arc<dyn CredentialSource>) -> Self {
		self.source = Some(source);

		self
	}

	/// Peeks at the current token record without touching the network.
	pub fn token_snapshot(&self) -> Option<TokenRecord> {
		self.token.read().clone()
	}

	pub(crate) fn transport(&self) -> Arc<T> {
		self.transport.clone()
	}

	/// Replaces the stored credential pair, renewing the token only when the pair changed.
	///
	/// Fallback precedence per half: the explicit argument, then the previously stored value,
	/// then the configured [`CredentialSource`]. A half still missing afterwards fails with a
	/// configuration error. An unchanged pair performs no acquisition at all; a changed pair
	/// forcibly runs exactly one acquisition sequence.
	pub async fn set_credentials(
		&self,
		client_id: Option<&str>,
		client_secret: Option<&str>,
	) -> Result<()> {
		let current = self.credentials.read().clone();
		let client_id = client_id
			.map(str::to_owned)
			.or_else(|| current.as_ref().map(|pair| pair.client_id.clone()))
			.or_else(|| self.source.as_ref().and_then(|source| source.client_id()))
			.ok_or(ConfigError::MissingClientId)?;
		let client_secret = client_secret
			.map(str::to_owned)
			.or_else(|| current.as_ref().map(|pair| pair.client_secret.expose().to_owned()))
			.or_else(|| self.source.as_ref().and_then(|source| source.client_secret()))
			.ok_or(ConfigError::MissingClientSecret)?;
		let replacement = Credentials::new(client_id, client_secret)?;

		if current.as_ref() == Some(&replacement) {
			return Ok(());
		}

		let _renewing = self.renew_guard.lock().await;

		*self.credentials.write() = Some(replacement);

		self.acquire().await.map(|_| ())
	}

	/// Returns a token that is valid right now, renewing it first when the window elapsed.
	///
	/// Lazy policy: staleness is detected only here, at point of use; there is no background
	/// timer and no proactive renewal. The never-acquired state behaves like an expired one.
	pub async fn ensure_fresh(&self) -> Result<TokenSecret> {
		if let Some(token) = self.fresh_snapshot() {
			return Ok(token);
		}

		let _renewing = self.renew_guard.lock().await;

		// Another caller may have renewed while this one waited on the guard.
		if let Some(token) = self.fresh_snapshot() {
			return Ok(token);
		}

		self.acquire().await
	}

	fn fresh_snapshot(&self) -> Option<TokenSecret> {
		let now = OffsetDateTime::now_utc();

		self.token
			.read()
			.as_ref()
			.filter(|record| record.is_fresh_at(now))
			.map(|record| record.access_token.clone())
	}

	/// Runs one bounded acquisition sequence. Caller holds the renew guard.
	async fn acquire(&self) -> Result<TokenSecret> {
		let span = OpSpan::new(RelayOp::TokenRenewal, "acquire");

		obs::record_op_outcome(RelayOp::TokenRenewal, OpOutcome::Attempt);

		let result = span.instrument(self.acquire_inner()).await;

		match &result {
			Ok(_) => obs::record_op_outcome(RelayOp::TokenRenewal, OpOutcome::Success),
			Err(_) => obs::record_op_outcome(RelayOp::TokenRenewal, OpOutcome::Failure),
		}

		result
	}

	async fn acquire_inner(&self) -> Result<TokenSecret> {
		let credentials =
			self.credentials.read().clone().ok_or(ConfigError::MissingClientId)?;

		// A failed sequence must leave the manager in the never-acquired state.
		*self.token.write() = None;

		let form: Vec<(String, String)> = vec![
			("grant_type".into(), "client_credentials".into()),
			("client_id".into(), credentials.client_id.clone()),
			("client_secret".into(), credentials.client_secret.expose().into()),
			("scope".into(), "openid".into()),
		];
		let mut last_status = None;
		let mut last_body = String::new();

		for attempt in 1..=self.retry.attempts {
			let request = TransportRequest::post(self.token_endpoint.clone()).form(form.clone());

			match self.transport.execute(request).await {
				Ok(response) if response.status == 200 => {
					let grant = TokenGrant::from_slice(&response.body)
						.map_err(|source| AuthenticationError::MalformedResponse { source })?;
					let record = grant.into_record(OffsetDateTime::now_utc());
					let token = record.access_token.clone();

					obs::renewal_succeeded(record.expires_in);

					*self.token.write() = Some(record);

					return Ok(token);
				},
				Ok(response) => {
					last_status = Some(response.status);
					last_body = response.text();

					obs::renewal_attempt_failed(
						attempt,
						self.retry.attempts,
						last_status,
						&last_body,
					);
				},
				Err(error) => {
					last_status = None;
					last_body = error.to_string();

					obs::renewal_attempt_failed(attempt, self.retry.attempts, None, &last_body);
				},
			}

			if attempt < self.retry.attempts {
				tokio::time::sleep(self.retry.delay.unsigned_abs()).await;
			}
		}

		Err(AuthenticationError::Exhausted {
			attempts: self.retry.attempts,
			status: last_status,
			body: last_body,
		}
		.into())
	}
}
#[cfg(feature = "reqwest")]
impl TokenManager<ReqwestTransport> {
	/// Creates a manager that provisions its own reqwest-backed transport.
	pub fn new(token_endpoint: Url, retry: RetryPolicy) -> Self {
		Self::with_transport(token_endpoint, retry, ReqwestTransport::default())
	}
}
impl<T> Debug for TokenManager<T>
where
	T: ?Sized + HttpTransport,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TokenManager")
			.field("token_endpoint", &self.token_endpoint.as_str())
			.field("retry", &self.retry)
			.field("credentials_set", &self.credentials.read().is_some())
			.field("token", &self.token.read())
			.finish()
	}
}
