//! HTTP surface: router, handlers, and error mapping for the consent API.

// std
use std::path::Path;
// crates.io
use axum::{
	Json, Router,
	extract::State,
	http::{HeaderMap, StatusCode, header},
	response::{IntoResponse, Response},
	routing::{get, post},
};
use tokio::net::TcpListener;
use tower_http::{services::ServeDir, trace::TraceLayer};
// self
use crate::{
	_prelude::*,
	config::AppConfig,
	error::TransportError,
	flows::{ChargeRequest, ConsentBroker, ConsentUrls},
};

/// Fixed local approval page used when no return/cancel URLs are supplied.
const CONSENT_PAGE: &str = "/ba.html";

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
	/// Flow orchestrator shared across requests.
	pub broker: Arc<ConsentBroker>,
	/// Public client identifier surfaced by the config endpoint.
	pub client_id: String,
	/// Provider base URL surfaced by the config endpoint.
	pub base: Url,
}

/// Assembles the application router, serving static assets as the fallback.
pub fn router(state: AppState, static_dir: &Path) -> Router {
	Router::new()
		.route("/", get(root))
		.route("/api/ba/create-token", post(create_token))
		.route("/api/ba/create-agreement", post(create_agreement))
		.route("/api/ba/charge", post(charge))
		.route("/api/config", get(config))
		.fallback_service(ServeDir::new(static_dir))
		.layer(TraceLayer::new_for_http())
		.with_state(state)
}

/// Binds the configured port and serves the router until `ctrl-c`.
pub async fn serve(config: &AppConfig, app: Router) -> Result<()> {
	let listener = TcpListener::bind(("0.0.0.0", config.port)).await.map_err(TransportError::Io)?;

	tracing::info!(port = config.port, "Listening for consent API requests.");

	axum::serve(listener, app)
		.with_graceful_shutdown(shutdown_signal())
		.await
		.map_err(TransportError::Io)?;

	Ok(())
}

async fn shutdown_signal() {
	// Serve until interrupted; shutdown failures only matter at teardown.
	if let Err(error) = tokio::signal::ctrl_c().await {
		tracing::warn!(%error, "Failed to install the shutdown signal handler.");
	}
}

/// JSON error envelope produced by every failing handler.
pub struct ApiError(Error);
impl From<Error> for ApiError {
	fn from(e: Error) -> Self {
		Self(e)
	}
}
impl IntoResponse for ApiError {
	fn into_response(self) -> Response {
		let status = if self.0.is_validation() {
			StatusCode::BAD_REQUEST
		} else {
			tracing::error!(error = %self.0, "Consent API request failed.");

			StatusCode::INTERNAL_SERVER_ERROR
		};

		(status, Json(json!({ "error": self.0.to_string() }))).into_response()
	}
}

async fn root() -> Response {
	(StatusCode::FOUND, [(header::LOCATION, CONSENT_PAGE)]).into_response()
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateTokenBody {
	return_url: Option<String>,
	cancel_url: Option<String>,
}

async fn create_token(
	State(state): State<AppState>,
	headers: HeaderMap,
	body: Option<Json<CreateTokenBody>>,
) -> Result<Json<Value>, ApiError> {
	let body = body.map(|Json(body)| body).unwrap_or_default();
	let defaults = derived_consent_urls(&headers);
	let urls = ConsentUrls {
		return_url: body.return_url.unwrap_or(defaults.return_url),
		cancel_url: body.cancel_url.unwrap_or(defaults.cancel_url),
	};
	let outcome = state.broker.create_agreement_token(urls).await?;
	let mut response = json!({ "id": outcome.token_id, "raw": outcome.raw });

	if let Some(approve_url) = outcome.approval_url {
		response["approve_url"] = approve_url.into();
	}

	Ok(Json(response))
}

#[derive(Debug, Default, Deserialize)]
struct CreateAgreementBody {
	token_id: Option<String>,
}

async fn create_agreement(
	State(state): State<AppState>,
	body: Option<Json<CreateAgreementBody>>,
) -> Result<Json<Value>, ApiError> {
	let token_id = body.and_then(|Json(body)| body.token_id).unwrap_or_default();
	let outcome = state.broker.create_billing_agreement(&token_id).await?;

	Ok(Json(json!({
		"agreement_id": outcome.agreement_id,
		"state": outcome.state,
		"raw": outcome.raw,
	})))
}

#[derive(Debug, Default, Deserialize)]
struct ChargeBody {
	agreement_id: Option<String>,
	amount: Option<String>,
	currency: Option<String>,
}

async fn charge(
	State(state): State<AppState>,
	body: Option<Json<ChargeBody>>,
) -> Result<Json<Value>, ApiError> {
	let body = body.map(|Json(body)| body).unwrap_or_default();
	let mut request = ChargeRequest::new(body.agreement_id.unwrap_or_default());

	if let Some(amount) = body.amount {
		request = request.with_amount(amount);
	}
	if let Some(currency) = body.currency {
		request = request.with_currency(currency);
	}

	let outcome = state.broker.charge_agreement(request).await?;

	Ok(Json(json!({
		"order_id": outcome.order_id,
		"capture": {
			"id": outcome.capture_id,
			"status": outcome.capture_status,
			"raw": outcome.raw,
		},
	})))
}

async fn config(State(state): State<AppState>) -> Json<Value> {
	Json(json!({
		"clientId": state.client_id,
		"base": state.base.as_str().trim_end_matches('/'),
	}))
}

/// Derives the default return/cancel URLs from forwarded protocol and host headers.
fn derived_consent_urls(headers: &HeaderMap) -> ConsentUrls {
	let scheme = headers
		.get("x-forwarded-proto")
		.and_then(|value| value.to_str().ok())
		.unwrap_or("http");
	let host = headers
		.get("x-forwarded-host")
		.or_else(|| headers.get(header::HOST))
		.and_then(|value| value.to_str().ok())
		.unwrap_or("localhost:5174");

	ConsentUrls {
		return_url: format!("{scheme}://{host}{CONSENT_PAGE}?approved=1"),
		cancel_url: format!("{scheme}://{host}{CONSENT_PAGE}?canceled=1"),
	}
}
