use std::sync::LazyLock;

use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use regex::Regex;
use tracing::warn;

use crate::config::EventSettings;
use crate::error::FormatError;
use crate::models::calendar_event::{event_duration, CalendarEvent};
use crate::models::hearing::HearingEvent;

const DEFAULT_TITLE: &str = "Udienza";

static PARENTHETICAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*\([^)]*\)\s*").expect("valid regex"));
static DAY_FIRST_DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{1,2})\s*[/.\-]\s*(\d{1,2})(?:\s*[/.\-]\s*(\d{4}|\d{2}))?$").expect("valid regex")
});
static ISO_DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{4})\s*[/.\-]\s*(\d{1,2})\s*[/.\-]\s*(\d{1,2})$").expect("valid regex")
});
static CLOCK_TIME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?:h|ore|alle)?\s*(\d{1,2})(?:\s*[:.,]\s*(\d{2}))?(?:\s*[:.]\s*(\d{2}))?$")
        .expect("valid regex")
});

/// Drops qualifiers such as "(da confermare)".
pub fn strip_annotations(text: &str) -> String {
    PARENTHETICAL.replace_all(text, " ").trim().to_string()
}

fn number(captures: &regex::Captures<'_>, index: usize) -> Option<u32> {
    captures.get(index)?.as_str().parse().ok()
}

/// A date without a year falls in `default_year`.
pub fn parse_date(text: &str, default_year: i32) -> Option<NaiveDate> {
    let text = text.trim();
    if let Some(caps) = ISO_DATE.captures(text) {
        return NaiveDate::from_ymd_opt(number(&caps, 1)? as i32, number(&caps, 2)?, number(&caps, 3)?);
    }
    let caps = DAY_FIRST_DATE.captures(text)?;
    let day = number(&caps, 1)?;
    let month = number(&caps, 2)?;
    let year = match caps.get(3) {
        Some(raw) => {
            let year: i32 = raw.as_str().parse().ok()?;
            if raw.as_str().len() == 2 { year + 2000 } else { year }
        }
        None => default_year,
    };
    NaiveDate::from_ymd_opt(year, month, day)
}

pub fn parse_time(text: &str) -> Option<NaiveTime> {
    let caps = CLOCK_TIME.captures(text.trim())?;
    let hour = number(&caps, 1)?;
    let minute = caps.get(2).map_or(Some(0), |m| m.as_str().parse().ok())?;
    let second = caps.get(3).map_or(Some(0), |s| s.as_str().parse().ok())?;
    NaiveTime::from_hms_opt(hour, minute, second)
}

/// Combines a date and a time string, reading the date day-first.
pub fn parse_day_first(date: &str, time: &str, default_year: i32) -> Option<NaiveDateTime> {
    let date = parse_date(&strip_annotations(date), default_year)?;
    let time = parse_time(&strip_annotations(time))?;
    Some(date.and_time(time))
}

fn required(value: Option<&str>, missing: FormatError) -> Result<String, FormatError> {
    value
        .map(strip_annotations)
        .filter(|value| !value.is_empty())
        .ok_or(missing)
}

pub fn compose_title(event: &HearingEvent, marker: Option<&str>) -> String {
    let name = event.parte.as_deref().unwrap_or(DEFAULT_TITLE);
    let mut title = match marker.filter(|marker| !marker.is_empty()) {
        Some(marker) => format!("{marker} {name}"),
        None => name.to_string(),
    };
    if let Some(rg) = &event.rg {
        title.push_str(&format!(" - RG {rg}"));
    }
    title
}

fn compose_description(event: &HearingEvent) -> String {
    let mut parts = Vec::new();
    if let Some(note) = &event.note {
        parts.push(note.clone());
    }
    // When the judge fills the location the court would otherwise be lost.
    if let (Some(_), Some(court)) = (&event.giudice, &event.tribunale) {
        parts.push(format!("Tribunale: {court}"));
    }
    parts.join("\n")
}

pub fn format_calendar_event(
    event: &HearingEvent,
    settings: &EventSettings,
) -> Result<CalendarEvent, FormatError> {
    let date_text = required(event.data.as_deref(), FormatError::MissingDate)?;
    let time_text = required(event.ora.as_deref(), FormatError::MissingTime)?;
    let current_year = Utc::now().with_timezone(&settings.timezone).year();
    let date = parse_date(&date_text, current_year).ok_or_else(|| FormatError::InvalidDate(date_text.clone()))?;
    let time = parse_time(&time_text).ok_or_else(|| FormatError::InvalidTime(time_text.clone()))?;
    let naive = date.and_time(time);

    // A fall-back fold resolves to the first occurrence.
    let start = settings
        .timezone
        .from_local_datetime(&naive)
        .earliest()
        .ok_or_else(|| FormatError::NonexistentLocalTime(naive.to_string()))?;

    let location = event
        .giudice
        .clone()
        .or_else(|| event.tribunale.clone())
        .or_else(|| Some(settings.default_venue.clone()).filter(|venue| !venue.is_empty()));

    Ok(CalendarEvent {
        title: compose_title(event, settings.title_marker.as_deref()),
        start,
        end: start + event_duration(),
        location,
        description: compose_description(event),
    })
}

/// Logging wrapper used by the dispatcher: any failure means "no event".
pub fn try_format(event: &HearingEvent, settings: &EventSettings) -> Option<CalendarEvent> {
    format_calendar_event(event, settings)
        .inspect_err(|err| warn!(error = %err, "cannot build calendar event"))
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    fn hearing(date: Option<&str>, time: Option<&str>) -> HearingEvent {
        HearingEvent {
            parte: Some("Rossi".to_string()),
            giudice: Some("Sodani".to_string()),
            data: date.map(str::to_string),
            ora: time.map(str::to_string),
            ..HearingEvent::default()
        }
    }

    #[test]
    fn formats_reference_event_in_rome() {
        let event = format_calendar_event(
            &hearing(Some("15/03/2026"), Some("10:30")),
            &EventSettings::default(),
        )
        .unwrap();
        assert_eq!(event.start.to_rfc3339(), "2026-03-15T10:30:00+01:00");
        assert_eq!(event.end.to_rfc3339(), "2026-03-15T11:30:00+01:00");
        assert_eq!(event.end - event.start, chrono::Duration::hours(1));
        assert_eq!(event.title, "🤖 Rossi");
        assert_eq!(event.location.as_deref(), Some("Sodani"));
    }

    #[test]
    fn annotations_do_not_change_the_result() {
        let settings = EventSettings::default();
        let plain = format_calendar_event(&hearing(Some("15/03/2026"), Some("10:30")), &settings);
        let annotated = format_calendar_event(
            &hearing(Some("15/03/2026 (da confermare)"), Some("10:30 (circa)")),
            &settings,
        );
        assert_eq!(plain, annotated);
    }

    #[test]
    fn missing_or_bad_fields_fail_without_panicking() {
        let settings = EventSettings::default();
        let cases = [
            (None, Some("10:00"), FormatError::MissingDate),
            (Some("15/03/2026"), None, FormatError::MissingTime),
            (Some("(da definire)"), Some("10:00"), FormatError::MissingDate),
            (Some("31/02/2026"), Some("10:00"), FormatError::InvalidDate("31/02/2026".to_string())),
            (Some("domani"), Some("10:00"), FormatError::InvalidDate("domani".to_string())),
            (Some("15/03/2026"), Some("25:00"), FormatError::InvalidTime("25:00".to_string())),
            (Some("15/03/2026"), Some("mattina"), FormatError::InvalidTime("mattina".to_string())),
        ];
        for (date, time, expected) in cases {
            assert_eq!(
                format_calendar_event(&hearing(date, time), &settings),
                Err(expected)
            );
        }
        assert!(try_format(&HearingEvent::default(), &settings).is_none());
    }

    #[test]
    fn accepts_common_spellings() {
        let dt = parse_day_first("15/3/26", "h 9.30", 2026).unwrap();
        assert_eq!((dt.year(), dt.month(), dt.day(), dt.hour(), dt.minute()), (2026, 3, 15, 9, 30));
        let dt = parse_day_first("15.03.2026", "10", 2026).unwrap();
        assert_eq!((dt.day(), dt.hour(), dt.minute()), (15, 10, 0));
        let dt = parse_day_first("2026-03-15", "10,45", 2026).unwrap();
        assert_eq!((dt.month(), dt.day(), dt.minute()), (3, 15, 45));
        let dt = parse_day_first("1-2-2027", "ore 11:15:30", 2026).unwrap();
        assert_eq!((dt.month(), dt.day(), dt.second()), (2, 1, 30));
    }

    #[test]
    fn missing_year_defaults_to_the_given_one() {
        let dt = parse_day_first("15/03", "10:00", 2027).unwrap();
        assert_eq!((dt.year(), dt.month(), dt.day()), (2027, 3, 15));
        assert!(parse_date("31/02", 2027).is_none());
    }

    #[test]
    fn yearless_event_lands_in_the_current_year() {
        let settings = EventSettings::default();
        let event = format_calendar_event(&hearing(Some("03/04"), Some("09:00")), &settings).unwrap();
        let this_year = Utc::now().with_timezone(&settings.timezone).year();
        assert_eq!(
            (event.start.year(), event.start.month(), event.start.day(), event.start.hour()),
            (this_year, 4, 3, 9)
        );
    }

    #[test]
    fn day_comes_before_month() {
        let dt = parse_day_first("03/04/2026", "09:00", 2026).unwrap();
        assert_eq!((dt.day(), dt.month()), (3, 4));
    }

    #[test]
    fn spring_forward_gap_is_rejected() {
        let err = format_calendar_event(
            &hearing(Some("29/03/2026"), Some("02:30")),
            &EventSettings::default(),
        )
        .unwrap_err();
        assert!(matches!(err, FormatError::NonexistentLocalTime(_)));
    }

    #[test]
    fn title_location_and_description_rules() {
        let settings = EventSettings {
            title_marker: None,
            ..EventSettings::default()
        };
        let event = HearingEvent {
            parte: None,
            tribunale: Some("Tribunale di Roma".to_string()),
            data: Some("01/07/2026".to_string()),
            ora: Some("09:00".to_string()),
            rg: Some("1234/2025".to_string()),
            note: Some("esame testi".to_string()),
            ..HearingEvent::default()
        };
        let formatted = format_calendar_event(&event, &settings).unwrap();
        assert_eq!(formatted.title, "Udienza - RG 1234/2025");
        assert_eq!(formatted.location.as_deref(), Some("Tribunale di Roma"));
        assert_eq!(formatted.description, "esame testi");

        let with_judge = HearingEvent {
            giudice: Some("Beccia".to_string()),
            ..event.clone()
        };
        let formatted = format_calendar_event(&with_judge, &settings).unwrap();
        assert_eq!(formatted.location.as_deref(), Some("Beccia"));
        assert_eq!(formatted.description, "esame testi\nTribunale: Tribunale di Roma");

        let bare = HearingEvent {
            tribunale: None,
            ..event
        };
        let formatted = format_calendar_event(&bare, &settings).unwrap();
        assert_eq!(formatted.location.as_deref(), Some("Tribunale Civitavecchia"));
    }
}
