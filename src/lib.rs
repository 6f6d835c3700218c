//! Payment-consent gateway—broker a billing-agreement approval flow and charge the resulting
//! agreement against a provider REST API, with a cached OAuth client-credentials token shared
//! across requests.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod auth;
pub mod config;
pub mod error;
pub mod flows;
pub mod oauth;
pub mod obs;
pub mod provider;
pub mod rest;
pub mod serve;

mod _prelude {
	pub use std::{
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		sync::Arc,
	};

	pub use async_lock::Mutex as AsyncMutex;
	pub use parking_lot::RwLock;
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError, Method};
	pub use serde::{Deserialize, Serialize};
	pub use serde_json::{Value, json};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

pub use reqwest;
pub use url;

// Consumed by the server binary only.
use color_eyre as _;
#[cfg(test)] use {httpmock as _, tower as _};
