//! Demonstrates relaying an authenticated call through the bearer relay with the default
//! reqwest transport, against a mock token endpoint + wrapped API.

// crates.io
use color_eyre::Result;
use httpmock::prelude::*;
use serde_json::json;
// self
use bearer_relay::{
	auth::Credentials,
	client::ApiClient,
	config::{RelayConfig, RetryPolicy},
	url::Url,
};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let server = MockServer::start_async().await;
	let token_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/token");
			then.status(200).header("content-type", "application/json").body(
				"{\"access_token\":\"demo-access\",\"token_type\":\"bearer\",\"expires_in\":900}",
			);
		})
		.await;
	let api_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/app/search");
			then.status(200).header("content-type", "application/json").body("{\"results\":[]}");
		})
		.await;
	let config =
		RelayConfig::new(Url::parse(&server.url("/token"))?, Url::parse(&server.url("/app"))?)
			.with_retry(RetryPolicy::default().with_attempts(2));
	let client = ApiClient::new(config, Credentials::new("demo-client", "super-secret")?);
	let response = client
		.call("search", Some(json!({"query": "demo"})))
		.await?
		.expect("A supplied payload always produces a response.");

	println!("Wrapped API answered with status {}.", response.status);

	token_mock.assert_async().await;
	api_mock.assert_async().await;

	Ok(())
}
