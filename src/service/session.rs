use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use crate::models::hearing::{DateOption, HearingEvent};

pub type ChatId = i64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PendingKind {
    Clarification,
    PastDate,
}

/// What the dispatcher asked the user; the handler turns it into a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingPrompt {
    pub kind: PendingKind,
    pub options: Vec<DateOption>,
    pub interpretation: Option<HearingEvent>,
}

#[derive(Debug, Clone)]
pub struct PendingConfirmation {
    pub id: String,
    pub kind: PendingKind,
    pub original_text: String,
    pub options: Vec<DateOption>,
    pub interpretation: Option<HearingEvent>,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FollowUp {
    Accept,
    Reject,
    ChooseOption(DateOption),
    NotAnAnswer,
}

const ACCEPT_WORDS: &[&str] = &[
    "si", "sì", "sí", "ok", "okay", "va bene", "confermo", "esatto", "giusto", "yes",
];
const REJECT_WORDS: &[&str] = &["no", "annulla", "nessuno", "lascia stare"];

fn normalize_answer(text: &str) -> String {
    text.trim()
        .trim_end_matches(['.', '!', ')'])
        .trim()
        .to_lowercase()
}

/// Only short, unambiguous answers count; anything else is a new note.
pub fn classify_follow_up(text: &str, pending: &PendingConfirmation) -> FollowUp {
    let answer = normalize_answer(text);
    if REJECT_WORDS.contains(&answer.as_str()) {
        return FollowUp::Reject;
    }
    match pending.kind {
        PendingKind::Clarification => {
            if ACCEPT_WORDS.contains(&answer.as_str()) {
                FollowUp::Accept
            } else {
                FollowUp::NotAnAnswer
            }
        }
        PendingKind::PastDate => pending
            .options
            .iter()
            .find(|option| option.id.trim().eq_ignore_ascii_case(&answer))
            .cloned()
            .map_or(FollowUp::NotAnAnswer, FollowUp::ChooseOption),
    }
}

#[derive(Debug)]
pub struct SessionStore {
    ttl: Duration,
    pending: HashMap<ChatId, PendingConfirmation>,
}

impl SessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            pending: HashMap::new(),
        }
    }

    pub fn open(
        &mut self,
        chat_id: ChatId,
        original_text: &str,
        prompt: PendingPrompt,
        now: DateTime<Utc>,
    ) -> &PendingConfirmation {
        let record = PendingConfirmation {
            id: Uuid::new_v4().to_string(),
            kind: prompt.kind,
            original_text: original_text.to_string(),
            options: prompt.options,
            interpretation: prompt.interpretation,
            expires_at: now + self.ttl,
        };
        self.pending.insert(chat_id, record);
        &self.pending[&chat_id]
    }

    /// Removes and returns the chat's record if it has not expired.
    pub fn take_active(&mut self, chat_id: ChatId, now: DateTime<Utc>) -> Option<PendingConfirmation> {
        self.pending
            .remove(&chat_id)
            .filter(|record| record.expires_at > now)
    }

    pub fn purge_expired(&mut self, now: DateTime<Utc>) -> usize {
        let before = self.pending.len();
        self.pending.retain(|_, record| record.expires_at > now);
        before - self.pending.len()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
