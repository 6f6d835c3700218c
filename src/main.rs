//! consent-broker server binary.

// std
use std::{sync::Arc, time::Duration};
// crates.io
use clap::Parser;
use color_eyre::Result;
// self
use consent_broker::{
	config::AppConfig,
	flows::ConsentBroker,
	oauth::{TokenCache, TokenProvider},
	obs,
	provider::ProviderDescriptor,
	rest::RestClient,
	serve::{self, AppState},
};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;
	obs::init_tracing();

	let config = AppConfig::parse();
	// A slow provider must not hold requests open forever.
	let http = reqwest::Client::builder().timeout(Duration::from_secs(30)).build()?;
	let provider = ProviderDescriptor::new(config.base.clone());
	let tokens = TokenCache::new(TokenProvider::new(
		http.clone(),
		&provider,
		config.client_id.clone(),
		config.client_secret.clone(),
	)?);
	let broker = Arc::new(ConsentBroker::new(RestClient::new(http, provider, tokens)));
	let state =
		AppState { broker, client_id: config.client_id.clone(), base: config.base.clone() };
	let app = serve::router(state, &config.static_dir);

	serve::serve(&config, app).await?;

	Ok(())
}
