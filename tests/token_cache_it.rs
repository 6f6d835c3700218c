// crates.io
use httpmock::prelude::*;
use serde_json::json;
use time::Duration;
// self
use consent_broker::{
	auth::TokenSecret,
	oauth::{TokenCache, TokenProvider},
	provider::ProviderDescriptor,
	url::Url,
};

fn build_cache(server: &MockServer, window: Duration) -> TokenCache {
	let base = Url::parse(&server.base_url()).expect("Mock server base URL should parse.");
	let provider = ProviderDescriptor::new(base);
	let token_provider = TokenProvider::new(
		reqwest::Client::new(),
		&provider,
		"client-id",
		TokenSecret::new("client-secret"),
	)
	.expect("Token provider should build against the mock server.");

	TokenCache::new(token_provider).with_preemptive_window(window)
}

async fn token_mock(server: &MockServer, expires_in: i64) -> httpmock::Mock<'_> {
	server
		.mock_async(|when, then| {
			when.method(POST).path("/v1/oauth2/token");
			then.status(200).header("content-type", "application/json").json_body(json!({
				"access_token": "cached-bearer",
				"token_type": "Bearer",
				"expires_in": expires_in,
			}));
		})
		.await
}

#[tokio::test]
async fn sequential_callers_reuse_the_cached_token() {
	let server = MockServer::start_async().await;
	let mock = token_mock(&server, 900).await;
	let cache = build_cache(&server, Duration::ZERO);
	let first = cache.bearer().await.expect("Initial exchange should succeed.");
	let second = cache.bearer().await.expect("Cached lookup should succeed.");

	assert_eq!(first, "cached-bearer");
	assert_eq!(second, "cached-bearer");

	mock.assert_calls_async(1).await;
}

#[tokio::test]
async fn concurrent_callers_singleflight_one_exchange() {
	let server = MockServer::start_async().await;
	let mock = token_mock(&server, 900).await;
	let cache = build_cache(&server, Duration::ZERO);
	let (first, second) = tokio::join!(cache.bearer(), cache.bearer());

	assert_eq!(first.expect("First concurrent call should succeed."), "cached-bearer");
	assert_eq!(second.expect("Second concurrent call should succeed."), "cached-bearer");

	mock.assert_calls_async(1).await;
}

#[tokio::test]
async fn expired_tokens_trigger_one_re_exchange() {
	let server = MockServer::start_async().await;
	let mock = token_mock(&server, 1).await;
	let cache = build_cache(&server, Duration::ZERO);

	cache.bearer().await.expect("Initial exchange should succeed.");
	tokio::time::sleep(std::time::Duration::from_millis(1100)).await;
	cache.bearer().await.expect("Refresh after expiry should succeed.");

	mock.assert_calls_async(2).await;
}
