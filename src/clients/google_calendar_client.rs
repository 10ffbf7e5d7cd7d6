use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
use base64::Engine;
use chrono::{DateTime, Duration, Utc};
use reqwest::Url;
use ring::rand::SystemRandom;
use ring::signature::{self, RsaKeyPair};
use serde::Deserialize;
use serde_json::json;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::error::CalendarError;
use crate::models::calendar_event::{CalendarEvent, CreatedEvent, EventInsertBody};

pub const CALENDAR_SCOPE: &str = "https://www.googleapis.com/auth/calendar";
pub const CALENDAR_API_BASE: &str = "https://www.googleapis.com";
const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const ASSERTION_LIFETIME_SECS: i64 = 3600;

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

/// The fields of a service-account JSON key this client needs.
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceAccountKey {
    pub client_email: String,
    pub private_key: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

impl ServiceAccountKey {
    pub fn from_json(blob: &str) -> Result<Self, CalendarError> {
        serde_json::from_str(blob).map_err(|e| CalendarError::InvalidCredentials(e.to_string()))
    }
}

fn pem_to_der(pem: &str) -> Result<Vec<u8>, CalendarError> {
    let body: String = pem
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with("-----"))
        .collect();
    STANDARD
        .decode(body)
        .map_err(|e| CalendarError::InvalidCredentials(format!("private key is not base64: {e}")))
}

/// RS256-signed assertion for the OAuth2 JWT bearer grant.
pub fn build_jwt_assertion(
    key: &ServiceAccountKey,
    issued_at: DateTime<Utc>,
) -> Result<String, CalendarError> {
    let iat = issued_at.timestamp();
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"RS256","typ":"JWT"}"#);
    let claims = json!({
        "iss": key.client_email,
        "scope": CALENDAR_SCOPE,
        "aud": key.token_uri,
        "iat": iat,
        "exp": iat + ASSERTION_LIFETIME_SECS,
    });
    let claims = URL_SAFE_NO_PAD.encode(claims.to_string());
    let signing_input = format!("{header}.{claims}");

    let der = pem_to_der(&key.private_key)?;
    let key_pair = RsaKeyPair::from_pkcs8(&der)
        .map_err(|e| CalendarError::InvalidCredentials(format!("private key rejected: {e}")))?;
    let mut signature_bytes = vec![0; key_pair.public().modulus_len()];
    key_pair
        .sign(
            &signature::RSA_PKCS1_SHA256,
            &SystemRandom::new(),
            signing_input.as_bytes(),
            &mut signature_bytes,
        )
        .map_err(|_| CalendarError::Signing)?;

    Ok(format!(
        "{signing_input}.{}",
        URL_SAFE_NO_PAD.encode(signature_bytes)
    ))
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
}

#[derive(Debug, Clone)]
struct CachedToken {
    value: String,
    refresh_after: DateTime<Utc>,
}

pub struct GoogleCalendarClient {
    http: reqwest::Client,
    key: ServiceAccountKey,
    api_base: String,
    token: Mutex<Option<CachedToken>>,
}

impl GoogleCalendarClient {
    pub fn new(key: ServiceAccountKey) -> Self {
        Self::with_base(key, CALENDAR_API_BASE.to_string())
    }

    pub fn with_base(key: ServiceAccountKey, api_base: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            key,
            api_base: api_base.trim_end_matches('/').to_string(),
            token: Mutex::new(None),
        }
    }

    pub fn client_email(&self) -> &str {
        &self.key.client_email
    }

    pub async fn access_token(&self) -> Result<String, CalendarError> {
        let mut cached = self.token.lock().await;
        let now = Utc::now();
        if let Some(token) = cached.as_ref().filter(|token| token.refresh_after > now) {
            return Ok(token.value.clone());
        }

        let assertion = build_jwt_assertion(&self.key, now)?;
        let response = self
            .http
            .post(&self.key.token_uri)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            .send()
            .await?;
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(CalendarError::Status {
                status: status.as_u16(),
                body,
            });
        }
        let parsed: TokenResponse = serde_json::from_str(&body)
            .map_err(|e| CalendarError::InvalidCredentials(format!("token response: {e}")))?;
        let lifetime = parsed.expires_in.unwrap_or(ASSERTION_LIFETIME_SECS);
        debug!(expires_in = lifetime, "calendar access token refreshed");
        *cached = Some(CachedToken {
            value: parsed.access_token.clone(),
            refresh_after: now + Duration::seconds((lifetime - 60).max(0)),
        });
        Ok(parsed.access_token)
    }

    pub fn events_url(&self, calendar_id: &str) -> Result<Url, CalendarError> {
        let mut url = Url::parse(&format!("{}/calendar/v3/calendars", self.api_base))
            .map_err(|e| CalendarError::InvalidCredentials(format!("calendar api base: {e}")))?;
        url.path_segments_mut()
            .map_err(|_| CalendarError::InvalidCredentials("calendar api base".to_string()))?
            .push(calendar_id)
            .push("events");
        Ok(url)
    }

    pub async fn insert_event(
        &self,
        calendar_id: &str,
        event: &CalendarEvent,
    ) -> Result<CreatedEvent, CalendarError> {
        let token = self.access_token().await?;
        let response = self
            .http
            .post(self.events_url(calendar_id)?)
            .bearer_auth(token)
            .json(&EventInsertBody::from(event))
            .send()
            .await?;
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            if status == reqwest::StatusCode::UNAUTHORIZED {
                *self.token.lock().await = None;
            }
            return Err(CalendarError::Status {
                status: status.as_u16(),
                body,
            });
        }
        let created = created_from_body(&body);
        info!(event_id = %created.id, "calendar event inserted");
        Ok(created)
    }
}

/// The insert already succeeded, so an unreadable body only loses the link.
fn created_from_body(body: &str) -> CreatedEvent {
    serde_json::from_str(body)
        .inspect_err(|err| warn!(error = %err, body = %body, "calendar insert response could not be read"))
        .unwrap_or_default()
}
