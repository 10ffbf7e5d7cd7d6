use async_trait::async_trait;
use tracing::{error, info, warn};

use crate::clients::google_calendar_client::{GoogleCalendarClient, ServiceAccountKey};
use crate::config::CalendarSettings;
use crate::error::CalendarError;
use crate::models::calendar_event::{CalendarEvent, CreatedEvent};

#[async_trait]
pub trait CalendarSubmitter: Send + Sync {
    async fn submit(&self, event: &CalendarEvent) -> Result<CreatedEvent, CalendarError>;
}

/// Inserts into one configured calendar. Each call is independent: no retry
/// and no idempotency key, so a resent note creates a duplicate.
pub struct GoogleCalendarService {
    client: Option<GoogleCalendarClient>,
    calendar_id: String,
}

impl GoogleCalendarService {
    pub fn from_settings(settings: &CalendarSettings) -> Self {
        let client = match settings.service_account_json.as_deref() {
            None => {
                warn!("GOOGLE_SERVICE_ACCOUNT_JSON not set, calendar events will not be created");
                None
            }
            Some(blob) => match ServiceAccountKey::from_json(blob) {
                Ok(key) => {
                    info!(account = %key.client_email, calendar = %settings.calendar_id, "calendar service ready");
                    Some(GoogleCalendarClient::new(key))
                }
                Err(err) => {
                    error!(error = %err, "calendar service account could not be loaded");
                    None
                }
            },
        };
        Self {
            client,
            calendar_id: settings.calendar_id.clone(),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.client.is_some()
    }
}

#[async_trait]
impl CalendarSubmitter for GoogleCalendarService {
    async fn submit(&self, event: &CalendarEvent) -> Result<CreatedEvent, CalendarError> {
        let Some(client) = &self.client else {
            return Err(CalendarError::NotConfigured);
        };
        client.insert_event(&self.calendar_id, event).await
    }
}
