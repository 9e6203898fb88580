//! OAuth client credential document parsing.
//!
//! Google Cloud Console exports OAuth client credentials for web
//! applications as a JSON document with a top-level `"web"` object. The
//! document is embedded into the binary at build time and parsed once at
//! startup; a malformed document is fatal since nothing useful can happen
//! without credentials.

use serde::Deserialize;
use url::Url;

use crate::error::{AuthError, AuthResult};

/// Fallback loopback port when the redirect URI does not name one.
pub const DEFAULT_CALLBACK_PORT: u16 = 8080;

/// OAuth 2.0 client credentials for a registered web application.
#[derive(Debug, Clone, Deserialize)]
pub struct ClientCredentials {
    /// The OAuth 2.0 client ID from the Google Cloud Console.
    pub client_id: String,
    /// The OAuth 2.0 client secret.
    pub client_secret: String,
    /// Registered redirect URIs; the first entry is used for the flow.
    pub redirect_uris: Vec<String>,
    /// Authorization endpoint.
    pub auth_uri: String,
    /// Token endpoint.
    pub token_uri: String,
}

/// Wire shape of the credential document.
#[derive(Debug, Deserialize)]
struct CredentialDocument {
    web: ClientCredentials,
}

impl ClientCredentials {
    /// Parses credentials from a Google credential JSON document.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Config`] when the document cannot be parsed
    /// into the expected shape or fails validation.
    pub fn from_json(json: &str) -> AuthResult<Self> {
        let doc: CredentialDocument = serde_json::from_str(json)
            .map_err(|e| AuthError::Config(format!("failed to parse credential document: {e}")))?;
        doc.web.validate()?;
        Ok(doc.web)
    }

    /// Checks that the parsed credentials are usable.
    fn validate(&self) -> AuthResult<()> {
        if self.client_id.is_empty() {
            return Err(AuthError::Config("client_id is required".to_string()));
        }
        if self.client_secret.is_empty() {
            return Err(AuthError::Config("client_secret is required".to_string()));
        }
        if self.redirect_uris.is_empty() {
            return Err(AuthError::Config(
                "at least one redirect URI is required".to_string(),
            ));
        }
        if self.auth_uri.is_empty() || self.token_uri.is_empty() {
            return Err(AuthError::Config(
                "auth_uri and token_uri are required".to_string(),
            ));
        }
        Ok(())
    }

    /// The redirect URI used for the flow.
    pub fn redirect_uri(&self) -> &str {
        // validate() guarantees at least one entry
        &self.redirect_uris[0]
    }

    /// Loopback port the redirect listener should bind, taken from the
    /// redirect URI when it names one.
    pub fn callback_port(&self) -> u16 {
        Url::parse(self.redirect_uri())
            .ok()
            .and_then(|u| u.port())
            .unwrap_or(DEFAULT_CALLBACK_PORT)
    }
}
