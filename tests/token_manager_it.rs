// std
use std::{
	collections::VecDeque,
	sync::{Arc, Mutex},
};
// crates.io
use httpmock::prelude::*;
// self
use bearer_relay::{
	_preludet::*,
	auth::CredentialSource,
	error::{AuthenticationError, ConfigError, Error},
	http::{HttpTransport, TransportFuture, TransportRequest, TransportResponse},
	manager::TokenManager,
};

const TOKEN_BODY: &str =
	"{\"access_token\":\"relay-token\",\"token_type\":\"bearer\",\"expires_in\":3600}";

/// Transport that serves a pre-programmed response sequence and records every request.
#[derive(Clone, Default)]
struct ScriptedTransport {
	responses: Arc<Mutex<VecDeque<Result<TransportResponse, bearer_relay::error::TransportError>>>>,
	requests: Arc<Mutex<Vec<TransportRequest>>>,
}
impl ScriptedTransport {
	fn push_status(&self, status: u16, body: &str) {
		self.responses
			.lock()
			.expect("Scripted transport lock should not be poisoned.")
			.push_back(Ok(TransportResponse { status, body: body.as_bytes().to_vec() }));
	}

	fn push_grant(&self, token: &str, expires_in: i64) {
		self.push_status(
			200,
			&format!("{{\"access_token\":\"{token}\",\"expires_in\":{expires_in}}}"),
		);
	}

	fn calls(&self) -> usize {
		self.requests.lock().expect("Scripted transport lock should not be poisoned.").len()
	}
}
impl HttpTransport for ScriptedTransport {
	fn execute(&self, request: TransportRequest) -> TransportFuture<'_> {
		let responses = self.responses.clone();
		let requests = self.requests.clone();

		Box::pin(async move {
			requests.lock().expect("Scripted transport lock should not be poisoned.").push(request);

			responses
				.lock()
				.expect("Scripted transport lock should not be poisoned.")
				.pop_front()
				.expect("Scripted transport ran out of responses.")
		})
	}
}

fn scripted_manager(transport: &ScriptedTransport) -> TokenManager<ScriptedTransport> {
	let token_endpoint = Url::parse("https://auth.example.com/token")
		.expect("Fixture token endpoint URL should parse successfully.");

	TokenManager::with_transport(token_endpoint, test_retry_policy(), transport.clone())
		.with_credentials(test_credentials())
}

#[tokio::test]
async fn ensure_fresh_reuses_token_inside_validity_window() {
	let transport = ScriptedTransport::default();

	transport.push_grant("first", 3_600);

	let manager = scripted_manager(&transport);
	let first = manager.ensure_fresh().await.expect("Initial acquisition should succeed.");
	let second = manager.ensure_fresh().await.expect("Cached token should be reused.");

	assert_eq!(first.expose(), "first");
	assert_eq!(second.expose(), "first");
	assert_eq!(transport.calls(), 1);
}

#[tokio::test]
async fn ensure_fresh_renews_once_window_elapsed() {
	let transport = ScriptedTransport::default();

	transport.push_grant("stale", 0);
	transport.push_grant("renewed", 3_600);

	let manager = scripted_manager(&transport);
	let first = manager.ensure_fresh().await.expect("Initial acquisition should succeed.");
	let second = manager.ensure_fresh().await.expect("Renewal should succeed.");

	assert_eq!(first.expose(), "stale");
	assert_eq!(second.expose(), "renewed");
	assert_eq!(transport.calls(), 2);
}

#[tokio::test]
async fn acquire_records_token_from_third_attempt() {
	let transport = ScriptedTransport::default();

	transport.push_status(503, "upstream unavailable");
	transport.push_status(503, "upstream unavailable");
	transport.push_grant("third-time-lucky", 1_800);

	let manager = scripted_manager(&transport);
	let token = manager.ensure_fresh().await.expect("Third attempt should succeed.");

	assert_eq!(token.expose(), "third-time-lucky");
	assert_eq!(transport.calls(), 3);
}

#[tokio::test]
async fn acquire_retries_past_transport_failures() {
	let transport = ScriptedTransport::default();

	transport
		.responses
		.lock()
		.expect("Scripted transport lock should not be poisoned.")
		.push_back(Err(bearer_relay::error::TransportError::network(
			"https://auth.example.com/token",
			std::io::Error::other("connection reset"),
		)));
	transport.push_grant("after-network-blip", 1_800);

	let manager = scripted_manager(&transport);
	let token = manager.ensure_fresh().await.expect("Second attempt should succeed.");

	assert_eq!(token.expose(), "after-network-blip");
	assert_eq!(transport.calls(), 2);
}

#[tokio::test]
async fn exhausted_attempts_fail_without_poisoning_the_manager() {
	let transport = ScriptedTransport::default();

	for _ in 0..3 {
		transport.push_status(401, "{\"error\":\"invalid_client\"}");
	}

	let manager = scripted_manager(&transport);
	let err = manager.ensure_fresh().await.expect_err("Exhausted attempts should surface.");

	match err {
		Error::Authentication(AuthenticationError::Exhausted { attempts, status, body }) => {
			assert_eq!(attempts, 3);
			assert_eq!(status, Some(401));
			assert!(body.contains("invalid_client"));
		},
		other => panic!("Expected an exhausted authentication error, got: {other:?}."),
	}

	assert_eq!(transport.calls(), 3);
	assert!(manager.token_snapshot().is_none());

	// The failure is fatal for that call only; the next freshness check starts over.
	transport.push_grant("recovered", 3_600);

	let token = manager.ensure_fresh().await.expect("Acquisition should recover afterwards.");

	assert_eq!(token.expose(), "recovered");
}

#[tokio::test]
async fn set_credentials_with_unchanged_pair_skips_acquisition() {
	let transport = ScriptedTransport::default();

	transport.push_grant("initial", 3_600);

	let manager = scripted_manager(&transport);

	manager.ensure_fresh().await.expect("Initial acquisition should succeed.");
	manager
		.set_credentials(Some("relay-client"), Some("relay-secret"))
		.await
		.expect("Unchanged credentials should be accepted.");

	assert_eq!(transport.calls(), 1);
}

#[tokio::test]
async fn set_credentials_with_new_pair_renews_immediately() {
	let transport = ScriptedTransport::default();

	transport.push_grant("old-identity", 3_600);
	transport.push_grant("new-identity", 3_600);

	let manager = scripted_manager(&transport);

	manager.ensure_fresh().await.expect("Initial acquisition should succeed.");
	// The omitted secret falls back to the stored one; the id change alone forces renewal.
	manager
		.set_credentials(Some("other-client"), None)
		.await
		.expect("Replacing the client id should trigger renewal.");

	assert_eq!(transport.calls(), 2);

	let snapshot =
		manager.token_snapshot().expect("A token should be in place after the forced renewal.");

	assert_eq!(snapshot.access_token.expose(), "new-identity");

	let acquisition = transport
		.requests
		.lock()
		.expect("Scripted transport lock should not be poisoned.")
		.last()
		.cloned()
		.expect("The forced renewal should have issued a request.");

	assert!(matches!(
		&acquisition.body,
		bearer_relay::http::TransportBody::Form(pairs)
			if pairs.iter().any(|(key, value)| key == "client_id" && value == "other-client")
	));
}

#[tokio::test]
async fn set_credentials_without_any_source_fails() {
	let transport = ScriptedTransport::default();
	let token_endpoint = Url::parse("https://auth.example.com/token")
		.expect("Fixture token endpoint URL should parse successfully.");
	let manager: TokenManager<ScriptedTransport> =
		TokenManager::with_transport(token_endpoint, test_retry_policy(), transport.clone());
	let err = manager
		.set_credentials(None, None)
		.await
		.expect_err("Credentials absent after every fallback should fail.");

	assert!(matches!(err, Error::Config(ConfigError::MissingClientId)));
	assert_eq!(transport.calls(), 0);
}

#[tokio::test]
async fn set_credentials_falls_back_to_the_configured_source() {
	struct StaticSource;
	impl CredentialSource for StaticSource {
		fn client_id(&self) -> Option<String> {
			Some("sourced-client".into())
		}

		fn client_secret(&self) -> Option<String> {
			Some("sourced-secret".into())
		}
	}

	let transport = ScriptedTransport::default();

	transport.push_grant("sourced-token", 3_600);

	let token_endpoint = Url::parse("https://auth.example.com/token")
		.expect("Fixture token endpoint URL should parse successfully.");
	let manager = TokenManager::with_transport(
		token_endpoint,
		test_retry_policy(),
		transport.clone(),
	)
	.with_credential_source(Arc::new(StaticSource));

	manager
		.set_credentials(None, None)
		.await
		.expect("Source-provided credentials should be accepted.");

	assert_eq!(transport.calls(), 1);
	assert!(manager.token_snapshot().is_some());
}

#[tokio::test]
async fn acquisition_speaks_the_form_encoded_grant_over_http() {
	let server = MockServer::start_async().await;
	let mock = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/token")
				.header("content-type", "application/x-www-form-urlencoded");
			then.status(200).header("content-type", "application/json").body(TOKEN_BODY);
		})
		.await;
	let config = test_relay_config(&server.url("/token"), &server.url("/app"));
	let manager = build_reqwest_test_manager(&config, test_credentials());
	let token = manager.ensure_fresh().await.expect("HTTP acquisition should succeed.");

	assert_eq!(token.expose(), "relay-token");

	mock.assert_async().await;
}

#[tokio::test]
async fn concurrent_callers_share_one_renewal() {
	let server = MockServer::start_async().await;
	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/token");
			then.status(200).header("content-type", "application/json").body(TOKEN_BODY);
		})
		.await;
	let config = test_relay_config(&server.url("/token"), &server.url("/app"));
	let manager = build_reqwest_test_manager(&config, test_credentials());
	let (first, second) = tokio::join!(manager.ensure_fresh(), manager.ensure_fresh());
	let first = first.expect("First concurrent caller should succeed.");
	let second = second.expect("Second concurrent caller should succeed.");

	assert_eq!(first.expose(), "relay-token");
	assert_eq!(second.expose(), "relay-token");

	mock.assert_calls_async(1).await;
}

#[tokio::test]
async fn always_failing_endpoint_exhausts_exactly_the_attempt_budget() {
	let server = MockServer::start_async().await;
	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/token");
			then.status(400)
				.header("content-type", "application/json")
				.body("{\"error\":\"invalid_scope\"}");
		})
		.await;
	let config = test_relay_config(&server.url("/token"), &server.url("/app"));
	let manager = build_reqwest_test_manager(&config, test_credentials());
	let err = manager.ensure_fresh().await.expect_err("Acquisition should exhaust and fail.");

	assert!(matches!(
		err,
		Error::Authentication(AuthenticationError::Exhausted { attempts: 3, status: Some(400), .. })
	));
	assert!(err.to_string().contains("invalid_scope"));
	assert!(manager.token_snapshot().is_none());

	mock.assert_calls_async(3).await;
}

#[tokio::test]
async fn malformed_success_body_fails_without_retrying() {
	let server = MockServer::start_async().await;
	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/token");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"token_type\":\"bearer\"}");
		})
		.await;
	let config = test_relay_config(&server.url("/token"), &server.url("/app"));
	let manager = build_reqwest_test_manager(&config, test_credentials());
	let err = manager.ensure_fresh().await.expect_err("Malformed grant should surface.");

	assert!(matches!(
		err,
		Error::Authentication(AuthenticationError::MalformedResponse { .. })
	));

	mock.assert_calls_async(1).await;
}
