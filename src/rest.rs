//! Authenticated JSON REST client for provider calls.

// self
use crate::{_prelude::*, error::TransportError, oauth::TokenCache, provider::ProviderDescriptor};

/// Performs authenticated JSON calls against the provider REST surface.
///
/// Every call obtains a bearer token from the shared [`TokenCache`] (refreshed lazily when
/// stale), attaches it as a `Bearer` authorization header, and maps non-success statuses to
/// [`Error::Remote`] with the raw response body. Calls are never retried.
#[derive(Debug)]
pub struct RestClient {
	http: ReqwestClient,
	provider: ProviderDescriptor,
	tokens: TokenCache,
}
impl RestClient {
	/// Wires the shared HTTP client, descriptor, and token cache together.
	pub fn new(http: ReqwestClient, provider: ProviderDescriptor, tokens: TokenCache) -> Self {
		Self { http, provider, tokens }
	}

	/// Descriptor this client calls.
	pub fn provider(&self) -> &ProviderDescriptor {
		&self.provider
	}

	/// Performs one authenticated JSON call; an empty response body yields `{}`.
	pub async fn call(&self, method: Method, path: &str, body: Option<&Value>) -> Result<Value> {
		let url = self.provider.endpoint(path)?;
		let bearer = self.tokens.bearer().await?;
		let mut request = self.http.request(method.clone(), url).bearer_auth(bearer);

		if let Some(body) = body {
			request = request.json(body);
		}

		let response = request.send().await.map_err(TransportError::from)?;
		let status = response.status();
		let text = response.text().await.map_err(TransportError::from)?;

		if !status.is_success() {
			return Err(Error::Remote {
				method,
				path: path.to_owned(),
				status: status.as_u16(),
				body: text,
			});
		}
		if text.trim().is_empty() {
			return Ok(json!({}));
		}

		let mut deserializer = serde_json::Deserializer::from_str(&text);

		serde_path_to_error::deserialize(&mut deserializer).map_err(|source| Error::ResponseParse {
			method,
			path: path.to_owned(),
			source,
		})
	}
}
