//! Error types shared by the token provider, REST client, flows, and HTTP surface.

// self
use crate::_prelude::*;

/// Crate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical error exposed by broker APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Transport failure (DNS, TCP, TLS).
	#[error(transparent)]
	Transport(#[from] TransportError),

	/// A required request field was missing or empty.
	#[error("Missing required field `{field}`.")]
	Validation {
		/// Name of the offending field.
		field: &'static str,
	},
	/// Token endpoint returned a non-success status.
	#[error("OAuth token request failed with status {status}: {body}")]
	OAuth {
		/// HTTP status code returned by the token endpoint.
		status: u16,
		/// Raw response body kept for diagnostics.
		body: String,
	},
	/// Provider REST call returned a non-success status.
	#[error("{method} {path} failed with status {status}: {body}")]
	Remote {
		/// HTTP method of the failed call.
		method: Method,
		/// Provider-relative path of the failed call.
		path: String,
		/// HTTP status code returned by the provider.
		status: u16,
		/// Raw response body kept for diagnostics.
		body: String,
	},
	/// Provider returned a success status with a malformed JSON body.
	#[error("{method} {path} returned malformed JSON.")]
	ResponseParse {
		/// HTTP method of the call.
		method: Method,
		/// Provider-relative path of the call.
		path: String,
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
	},
	/// Provider response omitted a field a follow-up call depends on.
	#[error("Provider response is missing `{field}`.")]
	MissingResponseField {
		/// Name of the absent field.
		field: &'static str,
	},
}
impl Error {
	/// Shorthand for a missing-field validation failure.
	pub fn validation(field: &'static str) -> Self {
		Self::Validation { field }
	}

	/// Returns `true` when the error stems from caller input rather than the provider.
	pub fn is_validation(&self) -> bool {
		matches!(self, Self::Validation { .. })
	}
}

/// Configuration and validation failures raised at construction time.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// Endpoint path cannot be joined onto the provider base URL.
	#[error("Endpoint path `{path}` cannot be joined onto the provider base.")]
	InvalidPath {
		/// Relative path that failed to join.
		path: String,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Token endpoint responded with malformed JSON.
	#[error("Token endpoint returned malformed JSON.")]
	TokenResponseParse {
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
		/// HTTP status code of the response.
		status: u16,
	},
	/// Token endpoint returned a non-positive `expires_in`.
	#[error("The expires_in value must be positive.")]
	NonPositiveExpiresIn,
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}

/// Transport-level failures (network, IO).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the provider.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred while calling the provider.")]
	Io(#[from] std::io::Error),
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}
}
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		Self::network(e)
	}
}
impl From<ReqwestError> for Error {
	fn from(e: ReqwestError) -> Self {
		Self::Transport(e.into())
	}
}
