//! PKCE (Proof Key for Code Exchange) implementation per RFC 7636
//!
//! Generates the state parameter, code verifier, and S256 challenge used
//! during the OAuth authorization flow. The verifier is held by the
//! manager until token exchange; the challenge is included in the
//! authorization URL so the authorization server can verify the exchange
//! request came from the same party that initiated the flow.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rand::RngExt;
use sha2::{Digest, Sha256};
use url::Url;

use crate::config::ServiceConfig;
use crate::error::{Error, Result};

/// Generate a cryptographically random CSRF state parameter.
///
/// 32 random bytes (256 bits) encoded as URL-safe base64 without padding,
/// 43 characters. Round-tripped unchanged through the authorization
/// redirect and checked against the verifier cache on callback.
pub fn generate_state() -> String {
    let mut bytes = [0u8; 32];
    rand::rng().fill(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Generate a cryptographically random PKCE code verifier.
///
/// 32 random bytes (256 bits) encoded as URL-safe base64 without padding,
/// 43 characters — the minimum length RFC 7636 allows, and what the
/// services' authorization servers all accept.
pub fn generate_verifier() -> String {
    let mut bytes = [0u8; 32];
    rand::rng().fill(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Compute the S256 code challenge from a verifier.
///
/// `challenge = BASE64URL(SHA256(ASCII(verifier)))`
pub fn compute_challenge(verifier: &str) -> String {
    let hash = Sha256::digest(verifier.as_bytes());
    URL_SAFE_NO_PAD.encode(hash)
}

/// Build the full authorization URL with all required OAuth parameters.
///
/// All parameter values are query-encoded. Fails only if the service's
/// configured authorization endpoint is not a parseable URL, which is a
/// configuration bug rather than a runtime condition.
pub fn build_authorization_url(
    config: &ServiceConfig,
    state: &str,
    challenge: &str,
) -> Result<String> {
    let mut url = Url::parse(&config.authorization_url).map_err(|e| {
        Error::InvalidUrl(format!(
            "authorization endpoint for {}: {e}",
            config.service_name
        ))
    })?;
    url.query_pairs_mut()
        .append_pair("response_type", "code")
        .append_pair("client_id", &config.client_id)
        .append_pair("redirect_uri", &config.redirect_uri)
        .append_pair("scope", &config.scope)
        .append_pair("state", state)
        .append_pair("code_challenge", challenge)
        .append_pair("code_challenge_method", "S256");
    Ok(url.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> ServiceConfig {
        ServiceConfig {
            service_name: "example".into(),
            client_id: "client-123".into(),
            client_secret: "shhh".into(),
            authorization_url: "https://auth.example.com/authorize".into(),
            token_url: "https://auth.example.com/token".into(),
            redirect_uri: "https://app.example.com/oauth/callback".into(),
            scope: "read write".into(),
        }
    }

    #[test]
    fn verifier_is_url_safe_base64() {
        let verifier = generate_verifier();
        // 32 bytes → 43 base64url chars, no padding
        assert_eq!(verifier.len(), 43);
        assert!(
            verifier
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'),
            "verifier must be URL-safe base64 (no padding): {verifier}"
        );
    }

    #[test]
    fn state_has_full_entropy_width() {
        let state = generate_state();
        assert_eq!(state.len(), 43, "32 random bytes must encode to 43 chars");
        assert_ne!(state, generate_state(), "two states must not collide");
    }

    #[test]
    fn verifiers_are_unique() {
        assert_ne!(
            generate_verifier(),
            generate_verifier(),
            "two verifiers must not collide"
        );
    }

    #[test]
    fn challenge_is_deterministic() {
        let c1 = compute_challenge("test-verifier-value");
        let c2 = compute_challenge("test-verifier-value");
        assert_eq!(c1, c2, "same verifier must produce same challenge");
    }

    #[test]
    fn challenge_matches_known_value() {
        // Pre-computed: SHA256("hello") = 2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824
        // base64url of those 32 bytes = LPJNul-wow4m6DsqxbninhsWHlwfp0JecwQzYpOLmCQ
        let challenge = compute_challenge("hello");
        assert_eq!(challenge, "LPJNul-wow4m6DsqxbninhsWHlwfp0JecwQzYpOLmCQ");
    }

    #[test]
    fn challenge_decodes_to_sha256_width() {
        let challenge = compute_challenge(&generate_verifier());
        let decoded = URL_SAFE_NO_PAD.decode(&challenge).expect("valid base64url");
        assert_eq!(decoded.len(), 32, "SHA-256 hash must be 32 bytes");
    }

    #[test]
    fn authorization_url_contains_required_params() {
        let config = test_config();
        let challenge = compute_challenge("test-verifier");
        let url = build_authorization_url(&config, "test-state-123", &challenge).unwrap();

        assert!(url.starts_with("https://auth.example.com/authorize?"));
        assert!(url.contains("response_type=code"));
        assert!(url.contains("client_id=client-123"));
        assert!(url.contains("code_challenge_method=S256"));
        assert!(url.contains(&format!("code_challenge={challenge}")));
        assert!(url.contains("state=test-state-123"));
    }

    #[test]
    fn authorization_url_query_encodes_values() {
        let config = test_config();
        let url = build_authorization_url(&config, "st", "ch").unwrap();

        // redirect URI and scope carry reserved characters and must arrive encoded
        assert!(
            url.contains("redirect_uri=https%3A%2F%2Fapp.example.com%2Foauth%2Fcallback"),
            "redirect_uri not encoded: {url}"
        );
        assert!(
            url.contains("scope=read+write") || url.contains("scope=read%20write"),
            "scope not encoded: {url}"
        );
    }

    #[test]
    fn unparseable_authorization_endpoint_is_rejected() {
        let mut config = test_config();
        config.authorization_url = "not a url".into();
        let err = build_authorization_url(&config, "st", "ch").unwrap_err();
        assert!(matches!(err, Error::InvalidUrl(_)));
    }
}
