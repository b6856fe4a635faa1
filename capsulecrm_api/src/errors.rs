//! Error types for the API client.

/// Errors that can occur when talking to the Capsule API.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// An HTTP request failed (network error, timeout, or bad URL).
    #[error("Request failed")]
    RequestFailed,
    /// The API returned a non-success status with a body snippet.
    #[error("Request failed with status {status}")]
    HttpStatus { status: u16, body: String },
    /// A successful response carried a body that is not JSON.
    #[error("Invalid JSON in response: {0}")]
    InvalidJson(String),
    /// A create call came back without a usable `Location` header.
    #[error("Response has no Location header with a resource id")]
    MissingLocation,
}
