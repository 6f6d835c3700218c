//! Consent flow orchestration over the provider REST surface.
//!
//! The three-stage flow (unapproved token → approved token → agreement → charged) keeps no
//! local state; the remote provider is the sole record of each stage, and the calling client
//! is responsible for remembering the identifiers it receives.

pub mod charge;
pub mod create_agreement;
pub mod create_token;

pub use charge::*;
pub use create_agreement::*;
pub use create_token::*;

// self
use crate::rest::RestClient;

/// Coordinates the consent + charge flow against a single provider.
///
/// The broker owns the authenticated [`RestClient`] so individual flow implementations can
/// focus on payload construction and response extraction. No state is retained across calls.
#[derive(Debug)]
pub struct ConsentBroker {
	rest: RestClient,
}
impl ConsentBroker {
	/// Creates a broker over the provided REST client.
	pub fn new(rest: RestClient) -> Self {
		Self { rest }
	}

	pub(crate) fn rest(&self) -> &RestClient {
		&self.rest
	}
}
