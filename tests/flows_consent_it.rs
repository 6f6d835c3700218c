// crates.io
use httpmock::prelude::*;
use serde_json::json;
// self
use consent_broker::{
	auth::TokenSecret,
	error::Error,
	flows::{ChargeRequest, ConsentBroker, ConsentUrls},
	oauth::{TokenCache, TokenProvider},
	provider::ProviderDescriptor,
	rest::RestClient,
	url::Url,
};

const CLIENT_ID: &str = "client-id";
const CLIENT_SECRET: &str = "client-secret";
// base64("client-id:client-secret")
const BASIC_AUTH: &str = "Basic Y2xpZW50LWlkOmNsaWVudC1zZWNyZXQ=";

fn build_broker(server: &MockServer) -> ConsentBroker {
	let base = Url::parse(&server.base_url()).expect("Mock server base URL should parse.");
	let provider = ProviderDescriptor::new(base);
	let http = reqwest::Client::new();
	let token_provider =
		TokenProvider::new(http.clone(), &provider, CLIENT_ID, TokenSecret::new(CLIENT_SECRET))
			.expect("Token provider should build against the mock server.");

	ConsentBroker::new(RestClient::new(http, provider, TokenCache::new(token_provider)))
}

fn urls() -> ConsentUrls {
	ConsentUrls {
		return_url: "https://shop.test/ba.html?approved=1".into(),
		cancel_url: "https://shop.test/ba.html?canceled=1".into(),
	}
}

async fn mock_token_endpoint(server: &MockServer) -> httpmock::Mock<'_> {
	server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/v1/oauth2/token")
				.header("authorization", BASIC_AUTH)
				.body_includes("grant_type=client_credentials");
			then.status(200).header("content-type", "application/json").json_body(json!({
				"access_token": "bearer-1",
				"token_type": "Bearer",
				"expires_in": 900,
			}));
		})
		.await
}

#[tokio::test]
async fn create_token_extracts_id_and_approval_link() {
	let server = MockServer::start_async().await;
	let token_mock = mock_token_endpoint(&server).await;
	let create_mock = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/v1/billing-agreements/agreement-tokens")
				.header("authorization", "Bearer bearer-1");
			then.status(201).header("content-type", "application/json").json_body(json!({
				"token_id": "EC-1",
				"links": [
					{ "rel": "approval_url", "href": "https://provider/approve?id=EC-1" },
				],
			}));
		})
		.await;
	let broker = build_broker(&server);
	let outcome = broker
		.create_agreement_token(urls())
		.await
		.expect("Agreement-token creation should succeed against the stub provider.");

	assert_eq!(outcome.token_id, "EC-1");
	assert_eq!(outcome.approval_url.as_deref(), Some("https://provider/approve?id=EC-1"));
	assert_eq!(outcome.raw["token_id"], "EC-1");

	token_mock.assert_async().await;
	create_mock.assert_async().await;
}

#[tokio::test]
async fn create_token_omits_approval_url_without_matching_link() {
	let server = MockServer::start_async().await;
	let _token_mock = mock_token_endpoint(&server).await;
	let _create_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/v1/billing-agreements/agreement-tokens");
			then.status(201).header("content-type", "application/json").json_body(json!({
				"token_id": "EC-2",
				"links": [{ "rel": "self", "href": "https://provider/self" }],
			}));
		})
		.await;
	let broker = build_broker(&server);
	let outcome = broker
		.create_agreement_token(urls())
		.await
		.expect("Agreement-token creation should succeed without an approval link.");

	assert_eq!(outcome.token_id, "EC-2");
	assert_eq!(outcome.approval_url, None);
}

#[tokio::test]
async fn oauth_failure_surfaces_status_and_body() {
	let server = MockServer::start_async().await;
	let token_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/v1/oauth2/token");
			then.status(401)
				.header("content-type", "application/json")
				.body("{\"error\":\"invalid_client\"}");
		})
		.await;
	let broker = build_broker(&server);
	let err = broker
		.create_agreement_token(urls())
		.await
		.expect_err("Token endpoint failures should propagate.");

	assert!(matches!(err, Error::OAuth { status: 401, .. }));
	assert!(err.to_string().contains("401"));
	assert!(err.to_string().contains("invalid_client"));

	token_mock.assert_async().await;
}

#[tokio::test]
async fn create_agreement_submits_the_token() {
	let server = MockServer::start_async().await;
	let _token_mock = mock_token_endpoint(&server).await;
	let create_mock = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/v1/billing-agreements/agreements")
				.header("authorization", "Bearer bearer-1")
				.json_body(json!({ "token_id": "EC-1" }));
			then.status(201)
				.header("content-type", "application/json")
				.json_body(json!({ "id": "B-1", "state": "ACTIVE" }));
		})
		.await;
	let broker = build_broker(&server);
	let outcome = broker
		.create_billing_agreement("EC-1")
		.await
		.expect("Billing-agreement creation should succeed against the stub provider.");

	assert_eq!(outcome.agreement_id, "B-1");
	assert_eq!(outcome.state, "ACTIVE");

	create_mock.assert_async().await;
}

#[tokio::test]
async fn create_agreement_rejects_missing_token_without_calling_out() {
	let server = MockServer::start_async().await;
	let token_mock = mock_token_endpoint(&server).await;
	let broker = build_broker(&server);
	let err = broker
		.create_billing_agreement("")
		.await
		.expect_err("An empty token_id should fail validation.");

	assert!(err.is_validation());
	assert!(err.to_string().contains("token_id"));

	token_mock.assert_calls_async(0).await;
}

#[tokio::test]
async fn charge_creates_then_captures_the_order() {
	let server = MockServer::start_async().await;
	let _token_mock = mock_token_endpoint(&server).await;
	let order_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/v2/checkout/orders").json_body(json!({
				"intent": "CAPTURE",
				"payment_source": {
					"token": { "id": "B-1", "type": "BILLING_AGREEMENT" },
				},
				"purchase_units": [
					{ "amount": { "currency_code": "USD", "value": "10.00" } },
				],
			}));
			then.status(201)
				.header("content-type", "application/json")
				.json_body(json!({ "id": "O-1", "status": "CREATED" }));
		})
		.await;
	let capture_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/v2/checkout/orders/O-1/capture");
			then.status(201)
				.header("content-type", "application/json")
				.json_body(json!({ "id": "C-1", "status": "COMPLETED" }));
		})
		.await;
	let broker = build_broker(&server);
	let outcome = broker
		.charge_agreement(ChargeRequest::new("B-1"))
		.await
		.expect("Charging with defaults should succeed against the stub provider.");

	assert_eq!(outcome.order_id, "O-1");
	assert_eq!(outcome.capture_id, "C-1");
	assert_eq!(outcome.capture_status, "COMPLETED");

	order_mock.assert_async().await;
	capture_mock.assert_async().await;
}

#[tokio::test]
async fn charge_rejects_missing_agreement_without_calling_out() {
	let server = MockServer::start_async().await;
	let token_mock = mock_token_endpoint(&server).await;
	let broker = build_broker(&server);
	let err = broker
		.charge_agreement(ChargeRequest::new(""))
		.await
		.expect_err("An empty agreement_id should fail validation.");

	assert!(err.is_validation());
	assert!(err.to_string().contains("agreement_id"));

	token_mock.assert_calls_async(0).await;
}

#[tokio::test]
async fn remote_failure_carries_method_path_status_and_body() {
	let server = MockServer::start_async().await;
	let _token_mock = mock_token_endpoint(&server).await;
	let _create_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/v1/billing-agreements/agreements");
			then.status(422)
				.header("content-type", "application/json")
				.body("{\"name\":\"VALIDATION_ERROR\"}");
		})
		.await;
	let broker = build_broker(&server);
	let err = broker
		.create_billing_agreement("EC-9")
		.await
		.expect_err("Provider rejections should propagate.");

	match &err {
		Error::Remote { method, path, status, body } => {
			assert_eq!(method.as_str(), "POST");
			assert_eq!(path, "/v1/billing-agreements/agreements");
			assert_eq!(*status, 422);
			assert!(body.contains("VALIDATION_ERROR"));
		},
		other => panic!("Expected a remote-call failure, got {other:?}."),
	}
}
