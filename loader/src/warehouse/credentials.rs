//! Credentials for the warehouse API.
//!
//! A credentials file holds one of:
//!
//! - a service-account key (`"type": "service_account"`), exchanged for a
//!   bearer token with the OAuth2 JWT-bearer grant
//! - a JSON object carrying an `access_token` field (an OAuth token response)
//! - a plain-text token (`gcloud auth print-access-token > token`)
//!
//! Without a file the token is read from `BIGQUERY_ACCESS_TOKEN`.

use chrono::Utc;
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::env;
use std::fmt;
use std::fs;
use std::path::Path;

use crate::error::CredentialsError;
use crate::logs::{log_info, log_success};

/// Environment fallback when no credentials file is given.
pub const TOKEN_ENV: &str = "BIGQUERY_ACCESS_TOKEN";

/// OAuth scope requested for service-account tokens.
pub const BIGQUERY_SCOPE: &str = "https://www.googleapis.com/auth/bigquery";

/// Token endpoint used when the key file names none.
pub const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";

/// Google caps assertion lifetime at one hour.
const ASSERTION_LIFETIME_SECS: i64 = 3600;

// =============================================================================
// Access Token
// =============================================================================

#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(String);

impl AccessToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn from_env() -> Result<Self, CredentialsError> {
        let _ = dotenvy::dotenv();

        env::var(TOKEN_ENV)
            .ok()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .map(Self)
            .ok_or(CredentialsError::Missing)
    }

    pub fn secret(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken(***)")
    }
}

// =============================================================================
// Service Account
// =============================================================================

/// The fields of a service-account key file the token exchange needs.
#[derive(Clone, Deserialize)]
pub struct ServiceAccountKey {
    pub client_email: String,
    private_key: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

impl fmt::Debug for ServiceAccountKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceAccountKey")
            .field("client_email", &self.client_email)
            .field("token_uri", &self.token_uri)
            .finish_non_exhaustive()
    }
}

/// Claims of the signed JWT sent as the grant assertion.
#[derive(Debug, Serialize, Deserialize)]
struct AssertionClaims {
    iss: String,
    scope: String,
    aud: String,
    iat: i64,
    exp: i64,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

impl ServiceAccountKey {
    /// RS256-signed assertion issued at `issued_at` (seconds since epoch).
    fn assertion(&self, issued_at: i64) -> Result<String, CredentialsError> {
        let claims = AssertionClaims {
            iss: self.client_email.clone(),
            scope: BIGQUERY_SCOPE.to_string(),
            aud: self.token_uri.clone(),
            iat: issued_at,
            exp: issued_at + ASSERTION_LIFETIME_SECS,
        };
        let key = EncodingKey::from_rsa_pem(self.private_key.as_bytes())
            .map_err(|e| CredentialsError::Signing(e.to_string()))?;
        jsonwebtoken::encode(&Header::new(Algorithm::RS256), &claims, &key)
            .map_err(|e| CredentialsError::Signing(e.to_string()))
    }

    /// Exchange a fresh assertion for a bearer token at `token_uri`.
    pub async fn fetch_token(&self, http: &Client) -> Result<AccessToken, CredentialsError> {
        let assertion = self.assertion(Utc::now().timestamp())?;

        let response = http
            .post(&self.token_uri)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            .send()
            .await
            .map_err(|e| CredentialsError::Exchange(e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| CredentialsError::Exchange(e.to_string()))?;

        if !status.is_success() {
            return Err(CredentialsError::Exchange(format!(
                "HTTP {}: {}",
                status.as_u16(),
                text.trim()
            )));
        }

        let token: TokenResponse = serde_json::from_str(&text)
            .map_err(|e| CredentialsError::Exchange(format!("invalid token response: {}", e)))?;
        Ok(AccessToken::new(token.access_token))
    }
}

// =============================================================================
// Credentials
// =============================================================================

/// What a credentials source resolved to.
#[derive(Debug, Clone)]
pub enum Credentials {
    Token(AccessToken),
    ServiceAccount(ServiceAccountKey),
}

impl Credentials {
    /// Use `path` when given, otherwise the environment.
    pub fn resolve(path: Option<&Path>) -> Result<Self, CredentialsError> {
        match path {
            Some(path) => Self::from_file(path),
            None => AccessToken::from_env().map(Credentials::Token),
        }
    }

    pub fn from_file(path: &Path) -> Result<Self, CredentialsError> {
        let content = fs::read_to_string(path).map_err(|source| CredentialsError::Unreadable {
            path: path.to_path_buf(),
            source,
        })?;
        parse_credentials(&content).ok_or_else(|| CredentialsError::Invalid(path.to_path_buf()))
    }

    /// Bearer token for the API, exchanging the service-account key if needed.
    pub async fn access_token(&self, http: &Client) -> Result<AccessToken, CredentialsError> {
        match self {
            Credentials::Token(token) => Ok(token.clone()),
            Credentials::ServiceAccount(key) => {
                log_info(format!("Authenticating as {}", key.client_email));
                let token = key.fetch_token(http).await?;
                log_success("Access token obtained.");
                Ok(token)
            }
        }
    }
}

fn parse_credentials(content: &str) -> Option<Credentials> {
    let trimmed = content.trim();
    if trimmed.starts_with('{') {
        let value: Value = serde_json::from_str(trimmed).ok()?;
        if value.get("type").and_then(Value::as_str) == Some("service_account") {
            return serde_json::from_value(value).ok().map(Credentials::ServiceAccount);
        }
        return value
            .get("access_token")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(|t| Credentials::Token(AccessToken::new(t)));
    }
    if trimmed.is_empty() || trimmed.contains(char::is_whitespace) {
        return None;
    }
    Some(Credentials::Token(AccessToken::new(trimmed)))
}
