//! Process configuration resolved once at startup and passed to components explicitly.

// std
use std::path::PathBuf;
// crates.io
use clap::Parser;
// self
use crate::{_prelude::*, auth::TokenSecret, provider};

/// Startup configuration parsed from CLI flags with environment fallbacks.
///
/// Every component receives the values it needs at construction; nothing reads
/// the environment after parsing.
#[derive(Clone, Debug, Parser)]
#[command(name = "consent-broker", version, about)]
pub struct AppConfig {
	/// OAuth client identifier issued by the payment provider.
	#[arg(long, env = "PAYPAL_CLIENT_ID")]
	pub client_id: String,
	/// OAuth client secret issued by the payment provider.
	#[arg(long, env = "PAYPAL_CLIENT_SECRET")]
	pub client_secret: TokenSecret,
	/// Base URL of the provider REST API.
	#[arg(long, env = "PAYPAL_API_BASE", default_value = provider::SANDBOX_BASE)]
	pub base: Url,
	/// TCP port the HTTP surface listens on.
	#[arg(long, env = "PORT", default_value_t = 5174)]
	pub port: u16,
	/// Directory holding the static approval pages.
	#[arg(long, env = "STATIC_DIR", default_value = "public")]
	pub static_dir: PathBuf,
}
