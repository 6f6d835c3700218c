//! Consent step A: create an agreement token and extract the payer approval link.

// self
use crate::{
	_prelude::*,
	flows::ConsentBroker,
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
	provider::AGREEMENT_TOKENS_PATH,
};

/// Return/cancel destinations the payer lands on after the approval page.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsentUrls {
	/// Destination after the payer approves.
	pub return_url: String,
	/// Destination after the payer cancels.
	pub cancel_url: String,
}

/// Outcome of a successful agreement-token creation.
#[derive(Clone, Debug, Serialize)]
pub struct AgreementTokenOutcome {
	/// Identifier of the not-yet-approved agreement token.
	pub token_id: String,
	/// Approval redirect URL, when the provider supplied one.
	pub approval_url: Option<String>,
	/// Raw provider response kept for diagnostics.
	pub raw: Value,
}

impl ConsentBroker {
	/// Creates an agreement token carrying the payer's return/cancel URLs.
	pub async fn create_agreement_token(
		&self,
		urls: ConsentUrls,
	) -> Result<AgreementTokenOutcome> {
		const KIND: FlowKind = FlowKind::CreateToken;

		let span = FlowSpan::new(KIND, "create_agreement_token");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span
			.instrument(async move {
				let payload = token_payload(&urls);
				let raw =
					self.rest().call(Method::POST, AGREEMENT_TOKENS_PATH, Some(&payload)).await?;
				let token_id = raw
					.get("token_id")
					.and_then(Value::as_str)
					.map(str::to_owned)
					.unwrap_or_default();
				let approval_url = approval_link(&raw);

				Ok(AgreementTokenOutcome { token_id, approval_url, raw })
			})
			.await;

		match &result {
			Ok(_) => obs::record_flow_outcome(KIND, FlowOutcome::Success),
			Err(_) => obs::record_flow_outcome(KIND, FlowOutcome::Failure),
		}

		result
	}
}

fn token_payload(urls: &ConsentUrls) -> Value {
	json!({
		"description": "Billing agreement for merchant-initiated charges",
		"payer": { "payment_method": "PAYPAL" },
		"plan": {
			"type": "MERCHANT_INITIATED_BILLING",
			"merchant_preferences": {
				"return_url": urls.return_url,
				"cancel_url": urls.cancel_url,
				"accepted_pymt_type": "INSTANT",
				"skip_shipping_address": true,
			},
		},
	})
}

/// Returns the `href` of the link entry whose relation tag is `approval_url`.
fn approval_link(raw: &Value) -> Option<String> {
	raw.get("links")?
		.as_array()?
		.iter()
		.find(|link| link.get("rel").and_then(Value::as_str) == Some("approval_url"))
		.and_then(|link| link.get("href"))
		.and_then(Value::as_str)
		.map(str::to_owned)
}
