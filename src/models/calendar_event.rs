use chrono::{DateTime, Duration};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

/// Default length of a hearing slot on the calendar.
pub fn event_duration() -> Duration {
    Duration::hours(1)
}

#[derive(Debug, Clone, PartialEq)]
pub struct CalendarEvent {
    pub title: String,
    pub start: DateTime<Tz>,
    pub end: DateTime<Tz>,
    pub location: Option<String>,
    pub description: String,
}

impl CalendarEvent {
    pub fn timezone_name(&self) -> &'static str {
        self.start.timezone().name()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct EventDateTime {
    #[serde(rename = "dateTime")]
    pub date_time: String,
    #[serde(rename = "timeZone")]
    pub time_zone: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct EventReminders {
    #[serde(rename = "useDefault")]
    pub use_default: bool,
    pub overrides: Vec<serde_json::Value>,
}

/// Body of a calendar `events.insert` request.
#[derive(Debug, Clone, Serialize)]
pub struct EventInsertBody {
    pub summary: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    pub description: String,
    pub start: EventDateTime,
    pub end: EventDateTime,
    pub reminders: EventReminders,
}

impl From<&CalendarEvent> for EventInsertBody {
    fn from(event: &CalendarEvent) -> Self {
        let zone = event.timezone_name().to_string();
        Self {
            summary: event.title.clone(),
            location: event.location.clone(),
            description: event.description.clone(),
            start: EventDateTime {
                date_time: event.start.to_rfc3339(),
                time_zone: zone.clone(),
            },
            end: EventDateTime {
                date_time: event.end.to_rfc3339(),
                time_zone: zone,
            },
            reminders: EventReminders {
                use_default: false,
                overrides: Vec::new(),
            },
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct CreatedEvent {
    #[serde(default)]
    pub id: String,
    #[serde(rename = "htmlLink", default)]
    pub html_link: Option<String>,
}
