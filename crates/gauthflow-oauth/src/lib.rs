//! OAuth 2.0 authorization-code flow for Google APIs.
//!
//! This crate drives a single interactive authorization from the terminal:
//!
//! 1. Parse the OAuth client credentials embedded by the caller
//! 2. Generate an anti-forgery state token and a PKCE challenge
//! 3. Start a loopback HTTP listener for the provider redirect
//! 4. Print the authorization URL (and open the browser) for the user
//! 5. Validate the returned state and exchange the code for tokens
//!
//! The flow is single-shot: tokens are handed back to the caller, never
//! persisted, and every failure is terminal.
//!
//! # Security
//!
//! - The state parameter ties the callback to the request that initiated it
//! - PKCE prevents authorization code interception attacks
//! - The loopback listener only accepts connections from localhost
//! - Randomness comes from the OS entropy source, with no weaker fallback

pub mod calendar;
pub mod credentials;
pub mod error;
pub mod flow;
pub mod listener;
pub mod state;

pub use calendar::{CalendarClient, Event};
pub use credentials::ClientCredentials;
pub use error::{AuthError, AuthResult};
pub use flow::{FlowOptions, OAuthFlow, TokenSet};
pub use listener::{CallbackResult, RedirectListener};
pub use state::{AuthState, PkceChallenge};
