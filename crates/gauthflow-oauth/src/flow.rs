//! The interactive authorization-code flow.
//!
//! [`OAuthFlow`] ties the pieces together: it generates the anti-forgery
//! state and PKCE challenge, starts the loopback listener, prints the
//! authorization URL for the user to visit, waits for the redirect,
//! validates the state, and exchanges the code at the configured token
//! endpoint. The state comparison happens before any token-endpoint call;
//! a mismatch aborts the run.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::credentials::ClientCredentials;
use crate::error::{AuthError, AuthResult};
use crate::listener::{CallbackResult, RedirectListener};
use crate::state::{AuthState, PkceChallenge};

/// Request timeout for calls to the token endpoint.
const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Options controlling a single authorization run.
#[derive(Debug, Clone)]
pub struct FlowOptions {
    /// OAuth scope to request.
    pub scope: String,
    /// How long to wait for the browser redirect. `None` waits forever.
    pub timeout: Option<Duration>,
    /// Whether to try opening the system browser at the authorization URL.
    pub open_browser: bool,
}

impl FlowOptions {
    /// Default bound on the redirect wait, in seconds.
    pub const DEFAULT_TIMEOUT_SECS: u64 = 300;

    /// Creates options for the given scope with the default wait bound.
    pub fn new(scope: impl Into<String>) -> Self {
        Self {
            scope: scope.into(),
            timeout: Some(Duration::from_secs(Self::DEFAULT_TIMEOUT_SECS)),
            open_browser: true,
        }
    }

    /// Sets the redirect wait bound. `None` waits forever.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets whether the system browser is opened automatically.
    #[must_use]
    pub fn with_open_browser(mut self, open_browser: bool) -> Self {
        self.open_browser = open_browser;
        self
    }
}

/// Tokens returned by the provider's token endpoint.
///
/// Printed by the caller and discarded at process exit; nothing is
/// persisted.
#[derive(Debug, Clone)]
pub struct TokenSet {
    /// Access token for API requests.
    pub access_token: String,
    /// Token type, usually `Bearer`.
    pub token_type: String,
    /// Refresh token issued thanks to `access_type=offline`.
    pub refresh_token: String,
    /// When the access token expires.
    pub expires_at: DateTime<Utc>,
}

/// Interactive authorization-code flow against a Google API.
#[derive(Debug)]
pub struct OAuthFlow {
    credentials: ClientCredentials,
    options: FlowOptions,
    http_client: reqwest::Client,
}

impl OAuthFlow {
    /// Creates a flow for the given credentials and options.
    pub fn new(credentials: ClientCredentials, options: FlowOptions) -> Self {
        let http_client = reqwest::Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()
            .expect("failed to create HTTP client");

        Self {
            credentials,
            options,
            http_client,
        }
    }

    /// Runs the full flow and returns the obtained tokens.
    ///
    /// This will:
    /// 1. Generate the anti-forgery state and PKCE challenge
    /// 2. Start the loopback listener on the redirect port
    /// 3. Print the authorization URL and try to open the browser
    /// 4. Wait for the redirect with the state and code
    /// 5. Validate the state, then exchange the code for tokens
    ///
    /// # Errors
    ///
    /// Returns an error if the listener cannot bind, the wait times out,
    /// the callback state differs from the generated one, or the token
    /// exchange fails. The token endpoint is never called on a state
    /// mismatch.
    pub async fn run(&self) -> AuthResult<TokenSet> {
        let state = AuthState::generate()?;
        let pkce = PkceChallenge::generate()?;

        let listener = RedirectListener::bind(self.credentials.callback_port())?;

        let auth_url = self.build_authorization_url(state.as_str(), &pkce.challenge);
        debug!("authorization URL: {}", auth_url);

        println!("Visit the URL: {auth_url}");

        if self.options.open_browser
            && let Err(e) = open::that(&auth_url)
        {
            warn!("failed to open browser: {}", e);
        }

        let callback = listener.recv(self.options.timeout)?;
        let code = validate_callback(&state, callback)?;

        println!("Exchanging the authorization code for tokens...");
        self.exchange_code(&code, &pkce.verifier).await
    }

    /// Builds the authorization URL for the configured scope.
    ///
    /// `access_type=offline` asks for a refresh token; `prompt=consent`
    /// forces the approval screen even for a previously authorized user.
    fn build_authorization_url(&self, state: &str, challenge: &str) -> String {
        format!(
            "{}?client_id={}&redirect_uri={}&response_type=code&scope={}&\
            code_challenge={}&code_challenge_method=S256&state={}&\
            access_type=offline&prompt=consent",
            self.credentials.auth_uri,
            urlencoding::encode(&self.credentials.client_id),
            urlencoding::encode(self.credentials.redirect_uri()),
            urlencoding::encode(&self.options.scope),
            urlencoding::encode(challenge),
            urlencoding::encode(state),
        )
    }

    /// Exchanges an authorization code for a token set at the configured
    /// token endpoint.
    pub async fn exchange_code(&self, code: &str, verifier: &str) -> AuthResult<TokenSet> {
        let params = [
            ("client_id", self.credentials.client_id.as_str()),
            ("client_secret", self.credentials.client_secret.as_str()),
            ("code", code),
            ("code_verifier", verifier),
            ("grant_type", "authorization_code"),
            ("redirect_uri", self.credentials.redirect_uri()),
        ];

        let response = self
            .http_client
            .post(&self.credentials.token_uri)
            .form(&params)
            .send()
            .await
            .map_err(|e| AuthError::Exchange(format!("token request failed: {e}")))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| AuthError::Exchange(format!("failed to read response: {e}")))?;

        if !status.is_success() {
            return Err(AuthError::Exchange(format!(
                "token endpoint returned {status}: {body}"
            )));
        }

        let token_response: TokenResponse = serde_json::from_str(&body)
            .map_err(|e| AuthError::Exchange(format!("invalid token response: {e}")))?;

        debug!("token exchange succeeded");
        Ok(token_response.into_token_set(Utc::now()))
    }
}

/// Checks the anti-forgery state and releases the authorization code.
///
/// The code is only handed on when the callback state matches the generated
/// state byte for byte.
fn validate_callback(expected: &AuthState, callback: CallbackResult) -> AuthResult<String> {
    if !expected.matches(&callback.state) {
        return Err(AuthError::StateMismatch {
            want: expected.as_str().to_string(),
            got: callback.state,
        });
    }
    Ok(callback.code)
}

/// Wire shape of the token endpoint response.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    token_type: Option<String>,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    expires_in: Option<i64>,
}

impl TokenResponse {
    fn into_token_set(self, now: DateTime<Utc>) -> TokenSet {
        TokenSet {
            access_token: self.access_token,
            token_type: self.token_type.unwrap_or_else(|| "Bearer".to_string()),
            refresh_token: self.refresh_token.unwrap_or_default(),
            expires_at: now + chrono::Duration::seconds(self.expires_in.unwrap_or(0)),
        }
    }
}
