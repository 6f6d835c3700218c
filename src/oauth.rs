//! OAuth client-credentials token provider and the shared token cache.
//!
//! [`TokenProvider::exchange`] performs one form-encoded `client_credentials` grant against the
//! provider's token endpoint, authenticated with HTTP Basic from the stored credentials. The
//! exchange is never retried; non-success statuses surface as [`Error::OAuth`] carrying the raw
//! status + body for diagnostics.
//!
//! [`TokenCache`] keeps the most recent [`AccessToken`] in a read-mostly slot shared across
//! concurrent requests and refreshes it lazily when the cached record is missing, expired, or
//! inside a jittered preemptive window. A singleflight guard ensures concurrent callers
//! piggy-back on the same in-flight exchange instead of stampeding the token endpoint.

// crates.io
use base64::{Engine, engine::general_purpose::STANDARD as BASE64};
use rand::Rng;
use reqwest::header::AUTHORIZATION;
// self
use crate::{
	_prelude::*,
	auth::{AccessToken, TokenSecret},
	error::{ConfigError, TransportError},
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
	provider::{ProviderDescriptor, TOKEN_PATH},
};

/// Wire shape of a successful token endpoint response.
#[derive(Debug, Deserialize)]
struct TokenEndpointResponse {
	access_token: String,
	expires_in: i64,
}

/// Exchanges stored client credentials for short-lived bearer tokens.
#[derive(Clone)]
pub struct TokenProvider {
	http: ReqwestClient,
	endpoint: Url,
	client_id: String,
	client_secret: TokenSecret,
}
impl TokenProvider {
	/// Builds a provider bound to the descriptor's token endpoint.
	pub fn new(
		http: ReqwestClient,
		provider: &ProviderDescriptor,
		client_id: impl Into<String>,
		client_secret: TokenSecret,
	) -> Result<Self> {
		Ok(Self {
			http,
			endpoint: provider.endpoint(TOKEN_PATH)?,
			client_id: client_id.into(),
			client_secret,
		})
	}

	/// Performs one client-credentials exchange. Not retried.
	pub async fn exchange(&self) -> Result<AccessToken> {
		const KIND: FlowKind = FlowKind::TokenExchange;

		let span = FlowSpan::new(KIND, "exchange");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span.instrument(self.exchange_inner()).await;

		match &result {
			Ok(_) => obs::record_flow_outcome(KIND, FlowOutcome::Success),
			Err(_) => obs::record_flow_outcome(KIND, FlowOutcome::Failure),
		}

		result
	}

	async fn exchange_inner(&self) -> Result<AccessToken> {
		let basic = BASE64.encode(format!("{}:{}", self.client_id, self.client_secret.expose()));
		let response = self
			.http
			.post(self.endpoint.clone())
			.header(AUTHORIZATION, format!("Basic {basic}"))
			.form(&[("grant_type", "client_credentials")])
			.send()
			.await
			.map_err(TransportError::from)?;
		let status = response.status();
		let body = response.text().await.map_err(TransportError::from)?;

		if !status.is_success() {
			return Err(Error::OAuth { status: status.as_u16(), body });
		}

		let mut deserializer = serde_json::Deserializer::from_str(&body);
		let parsed: TokenEndpointResponse = serde_path_to_error::deserialize(&mut deserializer)
			.map_err(|source| ConfigError::TokenResponseParse { source, status: status.as_u16() })?;

		if parsed.expires_in <= 0 {
			return Err(ConfigError::NonPositiveExpiresIn.into());
		}

		Ok(AccessToken::issued(
			TokenSecret::new(parsed.access_token),
			Duration::seconds(parsed.expires_in),
		))
	}
}
impl Debug for TokenProvider {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TokenProvider")
			.field("endpoint", &self.endpoint.as_str())
			.field("client_id", &self.client_id)
			.field("client_secret", &"<redacted>")
			.finish()
	}
}

/// Read-mostly cache sharing one bearer token across concurrent requests.
#[derive(Debug)]
pub struct TokenCache {
	provider: TokenProvider,
	slot: RwLock<Option<AccessToken>>,
	refresh_guard: AsyncMutex<()>,
	preemptive_window: Duration,
}
impl TokenCache {
	const DEFAULT_PREEMPTIVE_WINDOW: Duration = Duration::seconds(60);

	/// Creates a cache with the default preemptive refresh window (60 seconds).
	pub fn new(provider: TokenProvider) -> Self {
		Self {
			provider,
			slot: RwLock::new(None),
			refresh_guard: AsyncMutex::new(()),
			preemptive_window: Self::DEFAULT_PREEMPTIVE_WINDOW,
		}
	}

	/// Overrides the jittered preemptive window; negative values clamp to zero.
	pub fn with_preemptive_window(mut self, window: Duration) -> Self {
		self.preemptive_window = if window.is_negative() { Duration::ZERO } else { window };

		self
	}

	/// Returns a bearer secret, refreshing lazily when the cached token is stale.
	pub async fn bearer(&self) -> Result<String> {
		if let Some(bearer) = self.fresh(OffsetDateTime::now_utc()) {
			return Ok(bearer);
		}

		let _refresh = self.refresh_guard.lock().await;

		// Re-check after winning the guard; a concurrent caller may have refreshed already.
		if let Some(bearer) = self.fresh(OffsetDateTime::now_utc()) {
			return Ok(bearer);
		}

		let token = self.provider.exchange().await?;
		let bearer = token.secret.expose().to_owned();

		*self.slot.write() = Some(token);

		Ok(bearer)
	}

	fn fresh(&self, now: OffsetDateTime) -> Option<String> {
		let guard = self.slot.read();
		let token = guard.as_ref()?;

		if self.should_refresh(token, now) {
			None
		} else {
			Some(token.secret.expose().to_owned())
		}
	}

	fn should_refresh(&self, token: &AccessToken, now: OffsetDateTime) -> bool {
		if token.is_expired_at(now) {
			return true;
		}

		let window = self.jittered_window();

		if window.is_zero() {
			return false;
		}

		token.remaining_at(now) <= window
	}

	fn jittered_window(&self) -> Duration {
		let window_secs = self.preemptive_window.whole_seconds();

		if window_secs <= 1 {
			return self.preemptive_window;
		}

		self.preemptive_window - Duration::seconds(rand::rng().random_range(0..window_secs))
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn cache(window: Duration) -> TokenCache {
		let provider = ProviderDescriptor::new(
			Url::parse("https://provider.test").expect("Test base URL should parse."),
		);
		let token_provider =
			TokenProvider::new(ReqwestClient::new(), &provider, "cid", TokenSecret::new("shh"))
				.expect("Token provider fixture should build.");

		TokenCache::new(token_provider).with_preemptive_window(window)
	}

	fn token(remaining: Duration) -> AccessToken {
		let now = OffsetDateTime::now_utc();

		AccessToken {
			secret: TokenSecret::new("bearer"),
			issued_at: now - Duration::minutes(1),
			expires_at: now + remaining,
		}
	}

	#[test]
	fn expired_tokens_always_refresh() {
		let cache = cache(Duration::ZERO);

		assert!(cache.should_refresh(&token(Duration::seconds(-1)), OffsetDateTime::now_utc()));
	}

	#[test]
	fn valid_tokens_survive_a_zero_window() {
		let cache = cache(Duration::ZERO);

		assert!(!cache.should_refresh(&token(Duration::seconds(5)), OffsetDateTime::now_utc()));
	}

	#[test]
	fn tokens_outside_the_window_are_kept() {
		// The jitter only shrinks the window, so an hour of validity never refreshes early.
		let cache = cache(Duration::seconds(60));

		assert!(!cache.should_refresh(&token(Duration::hours(1)), OffsetDateTime::now_utc()));
	}

	#[test]
	fn negative_windows_clamp_to_zero() {
		let cache = cache(Duration::seconds(-5));

		assert!(cache.jittered_window().is_zero());
	}
}
