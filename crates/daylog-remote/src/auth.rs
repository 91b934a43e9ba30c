//! Google service-account authentication
//!
//! A service-account key file is exchanged for a short-lived OAuth access
//! token using the JWT bearer grant: a claim set naming the account, the
//! scope and the token endpoint is signed with the account's RSA key and
//! posted to the endpoint. Tokens are cached and reused until a minute
//! before they expire.

use std::fmt;
use std::path::Path;
use std::sync::Mutex;

use chrono::{DateTime, TimeDelta, Utc};
use daylog_core::SyncError;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::http::{self, map_error, parse_json, read_body};

pub const SPREADSHEETS_SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets";
pub const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";

/// Lifetime requested for the signed assertion (Google's maximum)
const ASSERTION_LIFETIME: TimeDelta = TimeDelta::seconds(3600);

/// Cached tokens are refreshed this long before they expire
const EXPIRY_MARGIN: TimeDelta = TimeDelta::seconds(60);

/// Source of bearer tokens for the spreadsheet API
pub trait TokenProvider {
    fn access_token(&self) -> Result<String, SyncError>;
}

/// A token obtained out of band, used as-is
pub struct StaticToken(pub String);

impl TokenProvider for StaticToken {
    fn access_token(&self) -> Result<String, SyncError> {
        Ok(self.0.clone())
    }
}

// ── Key file ───────────────────────────────────────────────────

/// The fields of a service-account JSON key this client needs
#[derive(Clone, Deserialize)]
pub struct ServiceAccountKey {
    pub client_email: String,
    pub private_key: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

impl ServiceAccountKey {
    pub fn parse(json: &str) -> Result<Self, SyncError> {
        serde_json::from_str(json)
            .map_err(|e| SyncError::Credentials(format!("invalid service-account key: {e}")))
    }

    pub fn from_file(path: &Path) -> Result<Self, SyncError> {
        let json = std::fs::read_to_string(path)
            .map_err(|e| SyncError::Credentials(format!("{}: {e}", path.display())))?;
        Self::parse(&json)
    }
}

impl fmt::Debug for ServiceAccountKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceAccountKey")
            .field("client_email", &self.client_email)
            .field("private_key", &"<redacted>")
            .field("token_uri", &self.token_uri)
            .finish()
    }
}

// ── Token exchange ─────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub iss: String,
    pub scope: String,
    pub aud: String,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Debug, Deserialize)]
struct TokenResponseWire {
    access_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
}

#[derive(Clone, Debug)]
struct CachedToken {
    token: String,
    expires_at: DateTime<Utc>,
}

impl CachedToken {
    fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        now + EXPIRY_MARGIN < self.expires_at
    }
}

/// Access tokens for one service account and scope
pub struct ServiceAccountAuth {
    key: ServiceAccountKey,
    scope: String,
    agent: ureq::Agent,
    cached: Mutex<Option<CachedToken>>,
}

impl ServiceAccountAuth {
    pub fn new(key: ServiceAccountKey, scope: impl Into<String>) -> Self {
        Self {
            key,
            scope: scope.into(),
            agent: http::agent(),
            cached: Mutex::new(None),
        }
    }

    /// Load the key file and request read/write access to spreadsheets
    pub fn from_file(path: &Path) -> Result<Self, SyncError> {
        Ok(Self::new(
            ServiceAccountKey::from_file(path)?,
            SPREADSHEETS_SCOPE,
        ))
    }

    pub fn client_email(&self) -> &str {
        &self.key.client_email
    }

    /// Signed RS256 assertion valid from `now` for one hour
    pub fn assertion(&self, now: DateTime<Utc>) -> Result<String, SyncError> {
        let claims = Claims {
            iss: self.key.client_email.clone(),
            scope: self.scope.clone(),
            aud: self.key.token_uri.clone(),
            iat: now.timestamp(),
            exp: (now + ASSERTION_LIFETIME).timestamp(),
        };
        let key = EncodingKey::from_rsa_pem(self.key.private_key.as_bytes())
            .map_err(|e| SyncError::Credentials(format!("invalid private key: {e}")))?;
        encode(&Header::new(Algorithm::RS256), &claims, &key)
            .map_err(|e| SyncError::Credentials(format!("signing assertion: {e}")))
    }

    fn exchange(&self, now: DateTime<Utc>) -> Result<CachedToken, SyncError> {
        let assertion = self.assertion(now)?;
        debug!(account = %self.key.client_email, "requesting access token");

        let response = self
            .agent
            .post(&self.key.token_uri)
            .send_form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            .map_err(map_error)?;
        let body = read_body(response)?;
        let token: TokenResponseWire = parse_json(&body)?;

        let lifetime = token
            .expires_in
            .map_or(ASSERTION_LIFETIME, TimeDelta::seconds);
        Ok(CachedToken {
            token: token.access_token,
            expires_at: now + lifetime,
        })
    }
}

impl TokenProvider for ServiceAccountAuth {
    fn access_token(&self) -> Result<String, SyncError> {
        let now = Utc::now();
        let mut cached = self
            .cached
            .lock()
            .map_err(|_| SyncError::Credentials("token cache poisoned".to_string()))?;

        if let Some(token) = cached.as_ref().filter(|t| t.is_fresh(now)) {
            return Ok(token.token.clone());
        }

        let fresh = self.exchange(now)?;
        let token = fresh.token.clone();
        *cached = Some(fresh);
        Ok(token)
    }
}
