//! Error types for the authorization flow.

use thiserror::Error;

/// Result type for authorization-flow operations.
pub type AuthResult<T> = Result<T, AuthError>;

/// Errors that can occur while running the authorization flow.
///
/// Every variant is terminal: the flow is a single-shot interactive helper,
/// so the first error is surfaced to the operator and the process exits.
#[derive(Debug, Error)]
pub enum AuthError {
    /// The embedded credential document is malformed or incomplete.
    #[error("invalid client configuration: {0}")]
    Config(String),

    /// The OS random source could not provide entropy.
    #[error("entropy source unavailable: {0}")]
    Entropy(String),

    /// The loopback redirect listener could not be started or served.
    #[error("redirect listener failed: {0}")]
    Listener(#[from] std::io::Error),

    /// The redirect listener stopped before delivering a callback.
    #[error("redirect listener closed before a callback was received")]
    ListenerClosed,

    /// No redirect arrived before the configured deadline.
    #[error("timed out waiting for the authorization redirect")]
    Timeout,

    /// The callback state does not match the generated state.
    #[error("state mismatch: got {got:?}, want {want:?}")]
    StateMismatch { want: String, got: String },

    /// The token endpoint rejected the code or was unreachable.
    #[error("token exchange failed: {0}")]
    Exchange(String),

    /// The sample API call after the exchange failed.
    #[error("API call failed: {0}")]
    ApiCall(String),
}
