//! Consent step B: upgrade an approved agreement token into a billing agreement.

// self
use crate::{
	_prelude::*,
	flows::ConsentBroker,
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
	provider::AGREEMENTS_PATH,
};

/// Outcome of a successful billing-agreement creation.
#[derive(Clone, Debug, Serialize)]
pub struct BillingAgreementOutcome {
	/// Identifier of the confirmed, chargeable agreement.
	pub agreement_id: String,
	/// Agreement state reported by the provider.
	pub state: String,
	/// Raw provider response kept for diagnostics.
	pub raw: Value,
}

impl ConsentBroker {
	/// Upgrades an approved agreement token into a persistent billing agreement.
	///
	/// An empty `token_id` fails validation before any outbound call is made; whether the
	/// token was actually approved by the payer is enforced solely by the remote provider.
	pub async fn create_billing_agreement(&self, token_id: &str) -> Result<BillingAgreementOutcome> {
		const KIND: FlowKind = FlowKind::CreateAgreement;

		if token_id.trim().is_empty() {
			return Err(Error::validation("token_id"));
		}

		let span = FlowSpan::new(KIND, "create_billing_agreement");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span
			.instrument(async move {
				let raw = self
					.rest()
					.call(Method::POST, AGREEMENTS_PATH, Some(&json!({ "token_id": token_id })))
					.await?;
				let agreement_id =
					raw.get("id").and_then(Value::as_str).map(str::to_owned).unwrap_or_default();
				let state =
					raw.get("state").and_then(Value::as_str).map(str::to_owned).unwrap_or_default();

				Ok(BillingAgreementOutcome { agreement_id, state, raw })
			})
			.await;

		match &result {
			Ok(_) => obs::record_flow_outcome(KIND, FlowOutcome::Success),
			Err(_) => obs::record_flow_outcome(KIND, FlowOutcome::Failure),
		}

		result
	}
}
