//! OAuth token exchange and refresh
//!
//! Handles the two token endpoint interactions:
//! 1. Authorization code exchange (initial OAuth flow completion)
//! 2. Token refresh (request-time refresh of an expired access token)
//!
//! Both operations POST `application/x-www-form-urlencoded` bodies to the
//! service's configured token endpoint with different grant types, and
//! expect a JSON response. Timeouts are whatever the caller configured on
//! the `reqwest::Client` — a timed-out call surfaces as `Error::Http`.

use reqwest::header::ACCEPT;
use serde::{Deserialize, Serialize};

use crate::config::ServiceConfig;
use crate::error::{Error, Result};

fn default_token_type() -> String {
    "Bearer".into()
}

/// Response from the token endpoint for both exchange and refresh.
///
/// Only `access_token` is guaranteed by the services; everything else is
/// optional per RFC 6749. `expires_in` is a delta in seconds from the
/// response time — the manager converts it to an absolute instant when
/// storing the token.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// Seconds until the access token expires (delta, not absolute)
    #[serde(default)]
    pub expires_in: Option<u64>,
    #[serde(default = "default_token_type")]
    pub token_type: String,
    #[serde(default)]
    pub scope: Option<String>,
}

/// Exchange an authorization code for tokens (initial OAuth flow).
///
/// The user has authorized in their browser and the callback delivered
/// the authorization code. The PKCE verifier proves we initiated the
/// flow; the client secret authenticates the application itself.
pub async fn exchange_code(
    client: &reqwest::Client,
    config: &ServiceConfig,
    code: &str,
    verifier: &str,
) -> Result<TokenResponse> {
    let response = client
        .post(&config.token_url)
        .header(ACCEPT, "application/json")
        .form(&[
            ("grant_type", "authorization_code"),
            ("client_id", config.client_id.as_str()),
            ("client_secret", config.client_secret.expose().as_str()),
            ("code", code),
            ("redirect_uri", config.redirect_uri.as_str()),
            ("code_verifier", verifier),
        ])
        .send()
        .await
        .map_err(|e| Error::Http(format!("token exchange request failed: {e}")))?;

    let status = response.status();
    if !status.is_success() {
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| String::from("<no body>"));
        return Err(Error::Endpoint(format!(
            "token endpoint returned {status}: {body}"
        )));
    }

    response
        .json::<TokenResponse>()
        .await
        .map_err(|e| Error::InvalidResponse(format!("token exchange body: {e}")))
}

/// Refresh an access token using a refresh token.
///
/// Called by the manager when a stored token's expiry has passed.
pub async fn refresh(
    client: &reqwest::Client,
    config: &ServiceConfig,
    refresh_token: &str,
) -> Result<TokenResponse> {
    let response = client
        .post(&config.token_url)
        .header(ACCEPT, "application/json")
        .form(&[
            ("grant_type", "refresh_token"),
            ("client_id", config.client_id.as_str()),
            ("client_secret", config.client_secret.expose().as_str()),
            ("refresh_token", refresh_token),
        ])
        .send()
        .await
        .map_err(|e| Error::Http(format!("token refresh request failed: {e}")))?;

    let status = response.status();
    if !status.is_success() {
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| String::from("<no body>"));
        return Err(Error::Endpoint(format!(
            "token refresh returned {status}: {body}"
        )));
    }

    response
        .json::<TokenResponse>()
        .await
        .map_err(|e| Error::InvalidResponse(format!("token refresh body: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_string_contains, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_config(token_url: String) -> ServiceConfig {
        ServiceConfig {
            service_name: "example".into(),
            client_id: "client-123".into(),
            client_secret: "secret-456".into(),
            authorization_url: "https://auth.example.com/authorize".into(),
            token_url,
            redirect_uri: "https://app.example.com/oauth/callback".into(),
            scope: "read write".into(),
        }
    }

    #[test]
    fn token_response_fills_defaults() {
        let json = r#"{"access_token":"at_abc"}"#;
        let token: TokenResponse = serde_json::from_str(json).unwrap();
        assert_eq!(token.access_token, "at_abc");
        assert_eq!(token.refresh_token, None);
        assert_eq!(token.expires_in, None);
        assert_eq!(token.token_type, "Bearer");
        assert_eq!(token.scope, None);
    }

    #[test]
    fn token_response_deserializes_all_fields() {
        let json = r#"{"access_token":"at_abc","refresh_token":"rt_def","expires_in":3600,"token_type":"bearer","scope":"read"}"#;
        let token: TokenResponse = serde_json::from_str(json).unwrap();
        assert_eq!(token.refresh_token.as_deref(), Some("rt_def"));
        assert_eq!(token.expires_in, Some(3600));
        assert_eq!(token.token_type, "bearer");
        assert_eq!(token.scope.as_deref(), Some("read"));
    }

    #[tokio::test]
    async fn exchange_posts_form_encoded_grant() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .and(header("content-type", "application/x-www-form-urlencoded"))
            .and(header("accept", "application/json"))
            .and(body_string_contains("grant_type=authorization_code"))
            .and(body_string_contains("client_id=client-123"))
            .and(body_string_contains("client_secret=secret-456"))
            .and(body_string_contains("code=abc123"))
            .and(body_string_contains("code_verifier=ver-789"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "tok1",
                "refresh_token": "ref1",
                "expires_in": 3600
            })))
            .expect(1)
            .mount(&server)
            .await;

        let config = test_config(format!("{}/token", server.uri()));
        let client = reqwest::Client::new();
        let token = exchange_code(&client, &config, "abc123", "ver-789")
            .await
            .unwrap();
        assert_eq!(token.access_token, "tok1");
        assert_eq!(token.refresh_token.as_deref(), Some("ref1"));
        assert_eq!(token.expires_in, Some(3600));
    }

    #[tokio::test]
    async fn exchange_rejects_non_success_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(
                ResponseTemplate::new(400).set_body_json(json!({"error": "invalid_grant"})),
            )
            .mount(&server)
            .await;

        let config = test_config(format!("{}/token", server.uri()));
        let client = reqwest::Client::new();
        let err = exchange_code(&client, &config, "stale-code", "ver")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Endpoint(_)), "got: {err}");
        assert!(err.to_string().contains("invalid_grant"));
    }

    #[tokio::test]
    async fn exchange_rejects_malformed_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let config = test_config(format!("{}/token", server.uri()));
        let client = reqwest::Client::new();
        let err = exchange_code(&client, &config, "abc", "ver").await.unwrap_err();
        assert!(matches!(err, Error::InvalidResponse(_)), "got: {err}");
    }

    #[tokio::test]
    async fn exchange_maps_transport_failure_to_http() {
        // Nothing listens on this port; connection is refused
        let config = test_config("http://127.0.0.1:9/token".into());
        let client = reqwest::Client::new();
        let err = exchange_code(&client, &config, "abc", "ver").await.unwrap_err();
        assert!(matches!(err, Error::Http(_)), "got: {err}");
    }

    #[tokio::test]
    async fn refresh_posts_refresh_grant() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .and(body_string_contains("grant_type=refresh_token"))
            .and(body_string_contains("refresh_token=ref1"))
            .and(body_string_contains("client_secret=secret-456"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "tok2",
                "expires_in": 3600
            })))
            .expect(1)
            .mount(&server)
            .await;

        let config = test_config(format!("{}/token", server.uri()));
        let client = reqwest::Client::new();
        let token = refresh(&client, &config, "ref1").await.unwrap();
        assert_eq!(token.access_token, "tok2");
        assert_eq!(token.refresh_token, None, "no new refresh token issued");
    }

    #[tokio::test]
    async fn refresh_rejects_revoked_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(ResponseTemplate::new(401).set_body_string("revoked"))
            .mount(&server)
            .await;

        let config = test_config(format!("{}/token", server.uri()));
        let client = reqwest::Client::new();
        let err = refresh(&client, &config, "rt_dead").await.unwrap_err();
        assert!(matches!(err, Error::Endpoint(_)), "got: {err}");
    }
}
