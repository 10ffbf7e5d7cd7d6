use std::sync::Arc;

use chrono::Utc;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::error::InterpretError;
use crate::handlers::responder::ChatResponder;
use crate::models::hearing::DateOption;
use crate::models::interpretation::Interpretation;
use crate::service::dispatcher::{Dispatcher, FAILURE_REPLY, REJECTED_REPLY};
use crate::service::interpreter::Interpreter;
use crate::service::session::{classify_follow_up, FollowUp, PendingConfirmation, SessionStore};

const CONFIRMED_CORRECTION: &str = "L'utente conferma l'interpretazione proposta.";

pub struct BotHandler {
    interpreter: Arc<dyn Interpreter>,
    dispatcher: Arc<Dispatcher>,
    sessions: Arc<Mutex<SessionStore>>,
    responder: Arc<dyn ChatResponder>,
}

impl BotHandler {
    pub fn new(
        interpreter: Arc<dyn Interpreter>,
        dispatcher: Arc<Dispatcher>,
        sessions: Arc<Mutex<SessionStore>>,
        responder: Arc<dyn ChatResponder>,
    ) -> Self {
        BotHandler {
            interpreter,
            dispatcher,
            sessions,
            responder,
        }
    }

    /// Entry point for every inbound text message. Sends exactly one reply
    /// unless the message is empty or a bot command.
    pub async fn handle_note(&self, chat_id: i64, message_id: i64, text: &str) {
        let text = text.trim();
        if text.is_empty() || text.starts_with('/') {
            debug!(chat_id, message_id, "ignoring empty message or command");
            return;
        }
        info!(chat_id, message_id, chars = text.chars().count(), "note received");

        self.responder.send_typing(chat_id).await;
        let reply = self.process(chat_id, text).await;
        self.responder.reply(chat_id, message_id, &reply).await;
    }

    /// Resolves follow-ups first, then treats the text as a fresh note.
    pub async fn process(&self, chat_id: i64, text: &str) -> String {
        let pending = {
            let mut sessions = self.sessions.lock().await;
            sessions.take_active(chat_id, Utc::now())
        };

        if let Some(pending) = pending {
            match classify_follow_up(text, &pending) {
                FollowUp::Reject => {
                    info!(chat_id, pending_id = %pending.id, "pending prompt rejected");
                    return REJECTED_REPLY.to_string();
                }
                FollowUp::Accept => return self.accept(chat_id, pending).await,
                FollowUp::ChooseOption(option) => return self.choose(chat_id, pending, option).await,
                FollowUp::NotAnAnswer => {
                    debug!(chat_id, pending_id = %pending.id, "pending prompt superseded by a new note");
                }
            }
        }

        let result = self.interpreter.interpret(text).await;
        self.finish(chat_id, text, result).await
    }

    async fn accept(&self, chat_id: i64, pending: PendingConfirmation) -> String {
        info!(chat_id, pending_id = %pending.id, "clarification accepted");
        match pending.interpretation.filter(|event| event.has_schedule()) {
            Some(event) => self.dispatcher.create_events(&[event], &[]).await.reply,
            None => {
                let result = self
                    .interpreter
                    .reinterpret(&pending.original_text, CONFIRMED_CORRECTION)
                    .await;
                self.finish(chat_id, &pending.original_text, result).await
            }
        }
    }

    async fn choose(&self, chat_id: i64, pending: PendingConfirmation, option: DateOption) -> String {
        info!(chat_id, pending_id = %pending.id, date = %option.data, "past-date option chosen");
        match pending.interpretation {
            Some(event) => {
                let corrected = event.with_date(&option.data);
                self.dispatcher.create_events(&[corrected], &[]).await.reply
            }
            None => {
                let correction = format!("La data corretta è {}", option.data);
                let result = self
                    .interpreter
                    .reinterpret(&pending.original_text, &correction)
                    .await;
                self.finish(chat_id, &pending.original_text, result).await
            }
        }
    }

    async fn finish(
        &self,
        chat_id: i64,
        original: &str,
        result: Result<Interpretation, InterpretError>,
    ) -> String {
        // The interpreter has already logged the failure.
        let Ok(interpretation) = result else {
            return FAILURE_REPLY.to_string();
        };

        let outcome = self.dispatcher.dispatch(interpretation).await;
        if let Some(prompt) = outcome.pending {
            let mut sessions = self.sessions.lock().await;
            let record = sessions.open(chat_id, original, prompt, Utc::now());
            info!(chat_id, pending_id = %record.id, expires_at = %record.expires_at, "awaiting follow-up");
        }
        outcome.reply
    }
}
