//! Anti-forgery state and PKCE material.
//!
//! Both values are drawn from the operating system's entropy source. There
//! is no fallback to a weaker generator: if the OS cannot provide random
//! bytes the flow aborts.

use base64::Engine;
use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
use rand::TryRngCore;
use rand::rngs::OsRng;
use sha2::{Digest, Sha256};

use crate::error::{AuthError, AuthResult};

/// Raw length of the anti-forgery state, before base64 encoding.
pub const STATE_LENGTH: usize = 20;

/// Raw length of the PKCE code verifier, before base64 encoding.
const VERIFIER_LENGTH: usize = 32;

/// Anti-forgery token round-tripped through the authorization redirect.
///
/// Generated once per run and compared exactly once against the
/// callback-supplied state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthState(String);

impl AuthState {
    /// Generates a fresh state token from OS entropy.
    pub fn generate() -> AuthResult<Self> {
        Ok(Self(STANDARD.encode(random_bytes(STATE_LENGTH)?)))
    }

    /// The encoded string form sent to the provider.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Compares the callback-supplied state against this one, byte for byte.
    pub fn matches(&self, received: &str) -> bool {
        self.0 == received
    }
}

/// PKCE verifier/challenge pair (RFC 7636).
#[derive(Debug)]
pub struct PkceChallenge {
    /// High-entropy code verifier, sent with the token exchange.
    pub verifier: String,
    /// base64url(SHA-256(verifier)), sent with the authorization request.
    pub challenge: String,
}

impl PkceChallenge {
    /// Generates a fresh verifier and its challenge.
    pub fn generate() -> AuthResult<Self> {
        let verifier = URL_SAFE_NO_PAD.encode(random_bytes(VERIFIER_LENGTH)?);
        let challenge = Self::compute_challenge(&verifier);
        Ok(Self {
            verifier,
            challenge,
        })
    }

    /// Computes the SHA-256 challenge for a code verifier.
    fn compute_challenge(verifier: &str) -> String {
        URL_SAFE_NO_PAD.encode(Sha256::digest(verifier.as_bytes()))
    }
}

fn random_bytes(len: usize) -> AuthResult<Vec<u8>> {
    let mut bytes = vec![0u8; len];
    OsRng
        .try_fill_bytes(&mut bytes)
        .map_err(|e| AuthError::Entropy(e.to_string()))?;
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn state_decodes_to_twenty_bytes() {
        let state = AuthState::generate().unwrap();
        let raw = STANDARD.decode(state.as_str()).unwrap();
        assert_eq!(raw.len(), STATE_LENGTH);
    }

    #[test]
    fn states_differ_between_runs() {
        let mut seen = HashSet::new();
        for _ in 0..100 {
            let state = AuthState::generate().unwrap();
            assert!(seen.insert(state.as_str().to_string()));
        }
    }

    #[test]
    fn state_matches_exact_value_only() {
        let state = AuthState::generate().unwrap();
        assert!(state.matches(state.as_str()));
        assert!(!state.matches("something-else"));
        assert!(!state.matches(""));
    }

    #[test]
    fn verifier_length() {
        let pkce = PkceChallenge::generate().unwrap();
        // Base64 encoding of 32 bytes = 43 characters (no padding)
        assert_eq!(pkce.verifier.len(), 43);
    }

    #[test]
    fn challenge_is_deterministic() {
        let a = PkceChallenge::compute_challenge("test-verifier-string");
        let b = PkceChallenge::compute_challenge("test-verifier-string");
        assert_eq!(a, b);
    }

    #[test]
    fn challenges_differ_for_different_verifiers() {
        let a = PkceChallenge::generate().unwrap();
        let b = PkceChallenge::generate().unwrap();
        assert_ne!(a.challenge, b.challenge);
    }
}
