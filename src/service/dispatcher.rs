use std::sync::Arc;

use tracing::{error, info, warn};

use crate::config::EventSettings;
use crate::error::FormatError;
use crate::models::calendar_event::CreatedEvent;
use crate::models::hearing::{Correction, DateOption, HearingEvent};
use crate::models::interpretation::Interpretation;
use crate::service::calendar_service::CalendarSubmitter;
use crate::service::event_formatter::format_calendar_event;
use crate::service::session::{PendingKind, PendingPrompt};

pub const FAILURE_REPLY: &str = "⚠️ Non sono riuscito a interpretare il messaggio.";
pub const UNRECOGNIZED_REPLY: &str = "⚠️ Non ho capito il tipo di messaggio.";
pub const NO_EVENTS_REPLY: &str = "⚠️ Nessun evento trovato.";
pub const REJECTED_REPLY: &str = "❌ Ok, nessun evento creato.";
const NOT_AVAILABLE: &str = "N/A";

#[derive(Debug, Clone, PartialEq)]
pub enum EventOutcome {
    Incomplete,
    FormatFailed(FormatError),
    Created(CreatedEvent),
    NotCreated(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct DispatchOutcome {
    pub reply: String,
    pub outcomes: Vec<EventOutcome>,
    pub pending: Option<PendingPrompt>,
}

impl DispatchOutcome {
    fn reply_only(reply: impl Into<String>) -> Self {
        Self {
            reply: reply.into(),
            outcomes: Vec::new(),
            pending: None,
        }
    }

    pub fn created_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|outcome| matches!(outcome, EventOutcome::Created(_)))
            .count()
    }
}

pub struct Dispatcher {
    calendar: Arc<dyn CalendarSubmitter>,
    settings: EventSettings,
}

impl Dispatcher {
    pub fn new(calendar: Arc<dyn CalendarSubmitter>, settings: EventSettings) -> Self {
        Self { calendar, settings }
    }

    pub fn settings(&self) -> &EventSettings {
        &self.settings
    }

    pub async fn dispatch(&self, interpretation: Interpretation) -> DispatchOutcome {
        match interpretation {
            Interpretation::Unrecognized => DispatchOutcome::reply_only(UNRECOGNIZED_REPLY),
            Interpretation::Classified(kind) => DispatchOutcome::reply_only(kind.acknowledgement()),
            Interpretation::Clarification {
                doubt,
                interpretation,
                questions,
            } => {
                let reply = render_clarification(doubt.as_deref(), interpretation.as_ref(), &questions);
                DispatchOutcome {
                    reply,
                    outcomes: Vec::new(),
                    pending: Some(PendingPrompt {
                        kind: PendingKind::Clarification,
                        options: Vec::new(),
                        interpretation,
                    }),
                }
            }
            Interpretation::PastDate {
                date_read,
                options,
                question,
                interpretation,
            } => {
                let reply = render_past_date(date_read.as_deref(), &options, question.as_deref());
                let pending = (!options.is_empty()).then(|| PendingPrompt {
                    kind: PendingKind::PastDate,
                    options,
                    interpretation,
                });
                DispatchOutcome {
                    reply,
                    outcomes: Vec::new(),
                    pending,
                }
            }
            Interpretation::Hearings {
                events,
                corrections,
            } => self.create_events(&events, &corrections).await,
        }
    }

    /// One outcome per event; a failing event never stops its siblings.
    pub async fn create_events(
        &self,
        events: &[HearingEvent],
        corrections: &[Correction],
    ) -> DispatchOutcome {
        if events.is_empty() {
            return DispatchOutcome::reply_only(NO_EVENTS_REPLY);
        }

        let mut sections = Vec::new();
        if !corrections.is_empty() {
            sections.push(render_corrections(corrections));
        }

        let mut outcomes = Vec::with_capacity(events.len());
        for (index, event) in events.iter().enumerate() {
            let number = index + 1;
            if !event.has_schedule() {
                warn!(event = number, "event is missing date or time");
                sections.push(format!("⚠️ Evento {number}: dati incompleti"));
                outcomes.push(EventOutcome::Incomplete);
                continue;
            }

            let calendar_event = match format_calendar_event(event, &self.settings) {
                Ok(calendar_event) => calendar_event,
                Err(err) => {
                    warn!(event = number, error = %err, "cannot build calendar event");
                    sections.push(format!("⚠️ Evento {number}: errore formattazione"));
                    outcomes.push(EventOutcome::FormatFailed(err));
                    continue;
                }
            };

            match self.calendar.submit(&calendar_event).await {
                Ok(created) => {
                    info!(event = number, title = %calendar_event.title, "calendar event created");
                    sections.push(render_created(event, created.html_link.as_deref()));
                    outcomes.push(EventOutcome::Created(created));
                }
                Err(err) => {
                    error!(event = number, error = %err, "calendar event not created");
                    sections.push(render_not_created(event));
                    outcomes.push(EventOutcome::NotCreated(err.to_string()));
                }
            }
        }

        let mut outcome = DispatchOutcome {
            reply: sections.join("\n\n"),
            outcomes,
            pending: None,
        };
        let created = outcome.created_count();
        if events.len() > 1 {
            outcome
                .reply
                .push_str(&format!("\n\n📊 {created}/{} eventi creati", events.len()));
        }
        info!(created, total = events.len(), "hearing batch processed");
        outcome
    }
}

fn field(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or(NOT_AVAILABLE)
}

fn render_corrections(corrections: &[Correction]) -> String {
    let mut body = String::from("🔧 Correzioni automatiche:");
    for correction in corrections {
        body.push_str(&format!(
            "\n   • {}: '{}' → '{}'",
            correction.campo, correction.da, correction.a
        ));
    }
    body
}

fn render_event_lines(event: &HearingEvent) -> String {
    format!(
        "   👤 {}\n   ⚖️ {}\n   📅 {} 🕐 {}",
        field(&event.parte),
        field(&event.giudice),
        field(&event.data),
        field(&event.ora)
    )
}

fn render_created(event: &HearingEvent, link: Option<&str>) -> String {
    let mut body = format!("✅ Evento creato\n{}", render_event_lines(event));
    if let Some(link) = link {
        body.push_str(&format!("\n   🔗 {link}"));
    }
    body
}

fn render_not_created(event: &HearingEvent) -> String {
    format!("⚠️ Errore creazione\n{}", render_event_lines(event))
}

fn render_clarification(
    doubt: Option<&str>,
    interpretation: Option<&HearingEvent>,
    questions: &[String],
) -> String {
    let mut body = String::from("❓ Ho un dubbio");
    if let Some(doubt) = doubt {
        body.push_str(&format!("\n\n📋 {doubt}"));
    }
    if let Some(event) = interpretation {
        body.push_str(&format!(
            "\n\nLa mia interpretazione:\n   👤 Parte: {}\n   ⚖️ Giudice: {}\n   📅 Data: {}\n   🕐 Ora: {}",
            field(&event.parte),
            field(&event.giudice),
            field(&event.data),
            field(&event.ora)
        ));
    }
    if questions.is_empty() {
        body.push_str("\n\n💬 Va bene così? (sì/no)");
    } else {
        body.push('\n');
        for question in questions {
            body.push_str(&format!("\n💬 {question}"));
        }
    }
    body
}

fn render_past_date(date_read: Option<&str>, options: &[DateOption], question: Option<&str>) -> String {
    let mut body = String::from("❌ Data nel passato");
    if let Some(date) = date_read {
        body.push_str(&format!("\n\n📅 Ho letto: {date}"));
    }
    if options.is_empty() {
        if let Some(question) = question {
            body.push_str(&format!("\n\n💬 {question}"));
        }
        body.push_str("\n\n💬 Reinvia l'appunto con la data corretta.");
        return body;
    }
    body.push_str("\n\n💡 Intendevi:");
    for option in options {
        body.push_str(&format!("\n   {}) {}", option.id.to_uppercase(), option.data));
    }
    let letters = options
        .iter()
        .map(|option| format!("'{}'", option.id.to_lowercase()))
        .collect::<Vec<_>>()
        .join(" o ");
    body.push_str(&format!("\n\n💬 Rispondi con {letters}"));
    body
}
