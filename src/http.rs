//! Transport primitives shared by token acquisition and request dispatch.
//!
//! [`HttpTransport`] is the relay's only dependency on an HTTP stack. The token manager and the
//! API client both speak [`TransportRequest`]/[`TransportResponse`] and never classify statuses
//! here; classification lives with the callers. The default implementation wraps `reqwest`
//! behind the crate's `reqwest` feature.

// std
#[cfg(feature = "reqwest")] use std::ops::Deref;
// crates.io
#[cfg(feature = "reqwest")] use reqwest::header::{ACCEPT, AUTHORIZATION};
// self
use crate::{_prelude::*, auth::TokenSecret, error::TransportError};

/// Boxed future returned by [`HttpTransport::execute`].
pub type TransportFuture<'a> =
	Pin<Box<dyn Future<Output = Result<TransportResponse, TransportError>> + 'a + Send>>;

/// HTTP verbs the relay issues.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransportMethod {
	/// Bearer-authenticated read.
	Get,
	/// Form-encoded or JSON write.
	Post,
}

/// Request body variants the relay produces.
#[derive(Clone, Debug)]
pub enum TransportBody {
	/// No body (GET path).
	Empty,
	/// `application/x-www-form-urlencoded` pairs (token endpoint).
	Form(Vec<(String, String)>),
	/// `application/json` payload (wrapped API).
	Json(serde_json::Value),
}

/// Transport-agnostic request assembled by the relay.
#[derive(Clone, Debug)]
pub struct TransportRequest {
	/// Verb to issue.
	pub method: TransportMethod,
	/// Absolute request URL.
	pub url: Url,
	/// Bearer token attached as `Authorization`, when present.
	pub bearer: Option<TokenSecret>,
	/// Request body.
	pub body: TransportBody,
}
impl TransportRequest {
	/// Starts a GET request for the provided URL.
	pub fn get(url: Url) -> Self {
		Self { method: TransportMethod::Get, url, bearer: None, body: TransportBody::Empty }
	}

	/// Starts a POST request for the provided URL.
	pub fn post(url: Url) -> Self {
		Self { method: TransportMethod::Post, url, bearer: None, body: TransportBody::Empty }
	}

	/// Attaches a bearer token.
	pub fn bearer(mut self, token: TokenSecret) -> Self {
		self.bearer = Some(token);

		self
	}

	/// Sets a form-encoded body.
	pub fn form(
		mut self,
		pairs: impl IntoIterator<Item = (impl Into<String>, impl Into<String>)>,
	) -> Self {
		self.body =
			TransportBody::Form(pairs.into_iter().map(|(k, v)| (k.into(), v.into())).collect());

		self
	}

	/// Sets a JSON body.
	pub fn json(mut self, payload: serde_json::Value) -> Self {
		self.body = TransportBody::Json(payload);

		self
	}
}

/// Raw response surfaced by transports: status plus body bytes, unclassified.
#[derive(Clone, Debug)]
pub struct TransportResponse {
	/// HTTP status code.
	pub status: u16,
	/// Raw body bytes.
	pub body: Vec<u8>,
}
impl TransportResponse {
	/// Returns `true` for 2xx statuses.
	pub fn is_success(&self) -> bool {
		(200..300).contains(&self.status)
	}

	/// Body interpreted as UTF-8 text, lossily.
	pub fn text(&self) -> String {
		String::from_utf8_lossy(&self.body).into_owned()
	}

	/// Decodes the body as JSON, keeping the path of any failure.
	pub fn json<T>(&self) -> Result<T, serde_path_to_error::Error<serde_json::Error>>
	where
		T: for<'de> Deserialize<'de>,
	{
		let mut de = serde_json::Deserializer::from_slice(&self.body);

		serde_path_to_error::deserialize(&mut de)
	}
}

/// Abstraction over HTTP stacks capable of executing relay requests.
///
/// Implementations must be `Send + Sync + 'static` so one transport can be shared between the
/// token manager and the API client behind `Arc<T>`, and the futures they return must be `Send`
/// so relay operations can hop executors.
pub trait HttpTransport
where
	Self: 'static + Send + Sync,
{
	/// Executes the request, returning the raw status + body without classifying it.
	fn execute(&self, request: TransportRequest) -> TransportFuture<'_>;
}

/// Thin wrapper around [`ReqwestClient`] so shared HTTP behavior lives in one place.
#[cfg(feature = "reqwest")]
#[derive(Clone, Default)]
pub struct ReqwestTransport(pub ReqwestClient);
#[cfg(feature = "reqwest")]
impl ReqwestTransport {
	/// Wraps an existing reqwest [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}
}
#[cfg(feature = "reqwest")]
impl AsRef<ReqwestClient> for ReqwestTransport {
	fn as_ref(&self) -> &ReqwestClient {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl Deref for ReqwestTransport {
	type Target = ReqwestClient;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl HttpTransport for ReqwestTransport {
	fn execute(&self, request: TransportRequest) -> TransportFuture<'_> {
		let client = self.0.clone();

		Box::pin(async move {
			let mut builder = match request.method {
				TransportMethod::Get => client.get(request.url.clone()),
				TransportMethod::Post => client.post(request.url.clone()),
			};

			if let Some(token) = &request.bearer {
				builder = builder.header(AUTHORIZATION, format!("Bearer {}", token.expose()));
			}

			builder = match request.body {
				TransportBody::Empty => builder,
				TransportBody::Form(pairs) => builder.form(&pairs),
				TransportBody::Json(payload) =>
					builder.header(ACCEPT, "application/json").json(&payload),
			};

			let response = builder.send().await.map_err(TransportError::from)?;
			let status = response.status().as_u16();
			let body = response.bytes().await.map_err(TransportError::from)?.to_vec();

			Ok(TransportResponse { status, body })
		})
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn success_band_is_2xx() {
		assert!(!TransportResponse { status: 199, body: Vec::new() }.is_success());
		assert!(TransportResponse { status: 200, body: Vec::new() }.is_success());
		assert!(TransportResponse { status: 299, body: Vec::new() }.is_success());
		assert!(!TransportResponse { status: 300, body: Vec::new() }.is_success());
	}

	#[test]
	fn request_builders_compose() {
		let url = Url::parse("https://example.com/token")
			.expect("Fixture URL should parse successfully.");
		let request = TransportRequest::post(url)
			.bearer(TokenSecret::new("token"))
			.form([("grant_type", "client_credentials")]);

		assert_eq!(request.method, TransportMethod::Post);
		assert!(request.bearer.is_some());
		assert!(matches!(&request.body, TransportBody::Form(pairs) if pairs.len() == 1));
	}

	#[test]
	fn response_decodes_json() {
		let response = TransportResponse { status: 200, body: b"{\"ok\":true}".to_vec() };
		let value = response
			.json::<serde_json::Value>()
			.expect("Response body should decode as JSON.");

		assert_eq!(value, serde_json::json!({"ok": true}));
	}
}
