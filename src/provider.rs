//! Provider endpoint descriptor shared by the token provider and REST client.

// self
use crate::{_prelude::*, error::ConfigError};

/// Default sandbox base URL used when no override is configured.
pub const SANDBOX_BASE: &str = "https://api-m.sandbox.paypal.com";
/// OAuth client-credentials token endpoint.
pub const TOKEN_PATH: &str = "/v1/oauth2/token";
/// Agreement-token creation endpoint (consent step A).
pub const AGREEMENT_TOKENS_PATH: &str = "/v1/billing-agreements/agreement-tokens";
/// Billing-agreement creation endpoint (consent step B).
pub const AGREEMENTS_PATH: &str = "/v1/billing-agreements/agreements";
/// Order creation endpoint (charge step C).
pub const ORDERS_PATH: &str = "/v2/checkout/orders";

/// Immutable descriptor for the payment provider's REST surface.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderDescriptor {
	/// Base URL every relative call path is joined onto.
	pub base: Url,
}
impl ProviderDescriptor {
	/// Wraps a validated base URL.
	pub fn new(base: Url) -> Self {
		Self { base }
	}

	/// Joins a relative call path onto the base URL.
	pub fn endpoint(&self, path: &str) -> Result<Url, ConfigError> {
		self.base
			.join(path)
			.map_err(|source| ConfigError::InvalidPath { path: path.to_owned(), source })
	}

	/// Capture endpoint for a created order.
	pub fn capture_path(order_id: &str) -> String {
		format!("{ORDERS_PATH}/{order_id}/capture")
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn descriptor() -> ProviderDescriptor {
		ProviderDescriptor::new(
			Url::parse(SANDBOX_BASE).expect("Sandbox base should be a valid URL."),
		)
	}

	#[test]
	fn endpoints_join_onto_base() {
		let url = descriptor().endpoint(TOKEN_PATH).expect("Token endpoint should join.");

		assert_eq!(url.as_str(), "https://api-m.sandbox.paypal.com/v1/oauth2/token");
	}

	#[test]
	fn capture_path_targets_the_order() {
		assert_eq!(
			ProviderDescriptor::capture_path("O-123"),
			"/v2/checkout/orders/O-123/capture"
		);
	}
}
