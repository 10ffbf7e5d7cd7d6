use serde_json::{Map, Value};
use tracing::warn;

use super::hearing::{scalar_text, Correction, DateOption, HearingEvent};

/// Notes the model recognises as something other than a rescheduled hearing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoteKind {
    Verdict,
    Reservation,
    Withheld,
    ProceduralNote,
}

impl NoteKind {
    pub fn acknowledgement(&self) -> &'static str {
        match self {
            NoteKind::Verdict => "📋 È una sentenza",
            NoteKind::Reservation => "⏸️ È una riserva",
            NoteKind::Withheld => "⚖️ È una trattenuta",
            NoteKind::ProceduralNote => "📝 È una nota procedurale",
        }
    }
}

/// The model reply, decoded once at the interpreter boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Interpretation {
    Hearings {
        events: Vec<HearingEvent>,
        corrections: Vec<Correction>,
    },
    Clarification {
        doubt: Option<String>,
        interpretation: Option<HearingEvent>,
        questions: Vec<String>,
    },
    PastDate {
        date_read: Option<String>,
        options: Vec<DateOption>,
        question: Option<String>,
        interpretation: Option<HearingEvent>,
    },
    Classified(NoteKind),
    Unrecognized,
}

impl Interpretation {
    pub fn variant_name(&self) -> &'static str {
        match self {
            Interpretation::Hearings { .. } => "hearings",
            Interpretation::Clarification { .. } => "clarification",
            Interpretation::PastDate { .. } => "past_date",
            Interpretation::Classified(_) => "classified",
            Interpretation::Unrecognized => "unrecognized",
        }
    }

    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Array(items) => Interpretation::Hearings {
                events: items.into_iter().map(event_from).collect(),
                corrections: Vec::new(),
            },
            Value::Object(map) => from_object(map),
            _ => Interpretation::Unrecognized,
        }
    }
}

fn from_object(map: Map<String, Value>) -> Interpretation {
    let discriminator = map
        .get("tipo")
        .or_else(|| map.get("status"))
        .and_then(scalar_text)
        .map(|tag| tag.to_lowercase());

    match discriminator.as_deref() {
        Some("rinvio") | Some("ok") => hearings_from(map),
        Some("conferma") | Some("conferma_richiesta") | Some("chiarimento") => {
            Interpretation::Clarification {
                doubt: text_field(&map, &["dubbio", "messaggio", "motivo"]),
                interpretation: map.get("interpretazione").cloned().map(event_from),
                questions: questions_from(&map),
            }
        }
        Some("data_passata") => past_date_from(&map),
        Some("errore") => match past_date_from(&map) {
            Interpretation::PastDate { options, .. } if options.is_empty() => {
                Interpretation::Unrecognized
            }
            past => past,
        },
        Some("sentenza") => Interpretation::Classified(NoteKind::Verdict),
        Some("riserva") => Interpretation::Classified(NoteKind::Reservation),
        Some("trattenuta") => Interpretation::Classified(NoteKind::Withheld),
        Some("nota") | Some("nota_procedurale") => Interpretation::Classified(NoteKind::ProceduralNote),
        Some(_) => Interpretation::Unrecognized,
        None => {
            // Earliest prompt: a bare event object, no discriminator.
            let looks_like_event = ["eventi", "data", "ora", "nome_caso", "parte"]
                .iter()
                .any(|key| map.contains_key(*key));
            if looks_like_event {
                hearings_from(map)
            } else {
                Interpretation::Unrecognized
            }
        }
    }
}

fn hearings_from(mut map: Map<String, Value>) -> Interpretation {
    let corrections = match map.remove("correzioni") {
        Some(Value::Array(items)) => items
            .into_iter()
            .filter_map(|item| serde_json::from_value::<Correction>(item).ok())
            .collect(),
        _ => Vec::new(),
    };
    let events = match map.remove("eventi") {
        Some(Value::Array(items)) => items.into_iter().map(event_from).collect(),
        Some(Value::Object(single)) => vec![event_from(Value::Object(single))],
        _ if map.contains_key("data") || map.contains_key("ora") => {
            vec![event_from(Value::Object(map))]
        }
        _ => Vec::new(),
    };
    Interpretation::Hearings {
        events,
        corrections,
    }
}

fn past_date_from(map: &Map<String, Value>) -> Interpretation {
    let options = match map.get("opzioni") {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| serde_json::from_value::<DateOption>(item.clone()).ok())
            .collect(),
        _ => Vec::new(),
    };
    Interpretation::PastDate {
        date_read: text_field(map, &["data_letta", "data"]),
        options,
        question: text_field(map, &["domanda"]),
        interpretation: map.get("interpretazione").cloned().map(event_from),
    }
}

fn questions_from(map: &Map<String, Value>) -> Vec<String> {
    let mut questions = Vec::new();
    for key in ["domande", "domanda"] {
        match map.get(key) {
            Some(Value::Array(items)) => questions.extend(items.iter().filter_map(scalar_text)),
            Some(other) => questions.extend(scalar_text(other)),
            None => {}
        }
    }
    questions
}

fn text_field(map: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| map.get(*key).and_then(scalar_text))
}

/// Non-object items become an empty event, reported later as incomplete.
fn event_from(value: Value) -> HearingEvent {
    serde_json::from_value(value)
        .inspect_err(|err| warn!(error = %err, "event in model reply could not be read"))
        .unwrap_or_default()
}
