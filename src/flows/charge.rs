//! Charge step C: create an order against a billing agreement and capture it immediately.

// self
use crate::{
	_prelude::*,
	flows::ConsentBroker,
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
	provider::{ORDERS_PATH, ProviderDescriptor},
};

/// Charge parameters; amount and currency fall back to fixed demo values.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChargeRequest {
	/// Identifier of the billing agreement to charge.
	pub agreement_id: String,
	/// Decimal amount string submitted to the provider.
	pub amount: String,
	/// ISO currency code submitted to the provider.
	pub currency: String,
}
impl ChargeRequest {
	/// Amount submitted when the caller does not specify one.
	pub const DEFAULT_AMOUNT: &str = "10.00";
	/// Currency submitted when the caller does not specify one.
	pub const DEFAULT_CURRENCY: &str = "USD";

	/// Creates a request with the default amount and currency.
	pub fn new(agreement_id: impl Into<String>) -> Self {
		Self {
			agreement_id: agreement_id.into(),
			amount: Self::DEFAULT_AMOUNT.into(),
			currency: Self::DEFAULT_CURRENCY.into(),
		}
	}

	/// Overrides the charged amount.
	pub fn with_amount(mut self, amount: impl Into<String>) -> Self {
		self.amount = amount.into();

		self
	}

	/// Overrides the charged currency.
	pub fn with_currency(mut self, currency: impl Into<String>) -> Self {
		self.currency = currency.into();

		self
	}
}

/// Outcome of a successful order create + capture pair.
#[derive(Clone, Debug, Serialize)]
pub struct ChargeOutcome {
	/// Identifier of the created order.
	pub order_id: String,
	/// Identifier of the capture, when the provider reported one.
	pub capture_id: String,
	/// Capture status reported by the provider.
	pub capture_status: String,
	/// Raw capture response kept for diagnostics.
	pub raw: Value,
}

impl ConsentBroker {
	/// Charges a billing agreement: creates an order with intent `CAPTURE`, then captures it.
	///
	/// An empty `agreement_id` fails validation before any outbound call is made.
	pub async fn charge_agreement(&self, request: ChargeRequest) -> Result<ChargeOutcome> {
		const KIND: FlowKind = FlowKind::Charge;

		if request.agreement_id.trim().is_empty() {
			return Err(Error::validation("agreement_id"));
		}

		let span = FlowSpan::new(KIND, "charge_agreement");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span
			.instrument(async move {
				let order = self
					.rest()
					.call(Method::POST, ORDERS_PATH, Some(&order_payload(&request)))
					.await?;
				let order_id = order
					.get("id")
					.and_then(Value::as_str)
					.ok_or(Error::MissingResponseField { field: "id" })?
					.to_owned();
				let raw = self
					.rest()
					.call(
						Method::POST,
						&ProviderDescriptor::capture_path(&order_id),
						Some(&json!({})),
					)
					.await?;
				let capture_id =
					raw.get("id").and_then(Value::as_str).map(str::to_owned).unwrap_or_default();
				let capture_status = raw
					.get("status")
					.and_then(Value::as_str)
					.map(str::to_owned)
					.unwrap_or_default();

				Ok(ChargeOutcome { order_id, capture_id, capture_status, raw })
			})
			.await;

		match &result {
			Ok(_) => obs::record_flow_outcome(KIND, FlowOutcome::Success),
			Err(_) => obs::record_flow_outcome(KIND, FlowOutcome::Failure),
		}

		result
	}
}

fn order_payload(request: &ChargeRequest) -> Value {
	json!({
		"intent": "CAPTURE",
		"payment_source": {
			"token": { "id": request.agreement_id, "type": "BILLING_AGREEMENT" },
		},
		"purchase_units": [
			{ "amount": { "currency_code": request.currency, "value": request.amount } },
		],
	})
}
