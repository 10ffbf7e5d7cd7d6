use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tracing::{error, info, warn};
use warp::http::StatusCode;
use warp::Filter;

use crate::clients::telegram_client::{TelegramClient, Update};
use crate::config::BotSettings;
use crate::error::{BotError, InterpretError, TelegramError};
use crate::events::queue::{Event, EventBus};
use crate::events::worker::run_event_worker;
use crate::handlers::responder::{ChatResponder, TelegramResponder};
use crate::handlers::telegram::BotHandler;
use crate::service::calendar_service::GoogleCalendarService;
use crate::service::dispatcher::Dispatcher;
use crate::service::interpreter::{Interpreter, NoteInterpreter};
use crate::service::model_service::AnthropicService;
use crate::service::session::SessionStore;
use crate::tasks::session_sweep::{run_session_sweep, SWEEP_INTERVAL};
use crate::tasks::task_runner::TaskRunner;

pub const SECRET_HEADER: &str = "x-telegram-bot-api-secret-token";
const EVENT_BUFFER: usize = 64;
const POLL_TIMEOUT_SECS: u64 = 30;
const POLL_BACKOFF: Duration = Duration::from_secs(5);

/// Everything a note needs on its way from text to calendar.
pub struct BotServices {
    pub interpreter: Arc<dyn Interpreter>,
    pub dispatcher: Arc<Dispatcher>,
    pub sessions: Arc<Mutex<SessionStore>>,
}

impl BotServices {
    pub fn from_settings(settings: &BotSettings) -> Result<Self, InterpretError> {
        let model = Arc::new(AnthropicService::new(settings.model.clone())?);
        let interpreter = Arc::new(NoteInterpreter::new(model, settings.events.timezone));
        let calendar = Arc::new(GoogleCalendarService::from_settings(&settings.calendar));
        let dispatcher = Arc::new(Dispatcher::new(calendar, settings.events.clone()));
        let sessions = Arc::new(Mutex::new(SessionStore::new(chrono::Duration::seconds(
            settings.session_ttl_secs,
        ))));
        Ok(Self {
            interpreter,
            dispatcher,
            sessions,
        })
    }

    pub fn handler(&self, responder: Arc<dyn ChatResponder>) -> BotHandler {
        BotHandler::new(
            self.interpreter.clone(),
            self.dispatcher.clone(),
            self.sessions.clone(),
            responder,
        )
    }
}

pub async fn run_bot(settings: BotSettings, token: String) -> Result<(), BotError> {
    let services = BotServices::from_settings(&settings)
        .inspect_err(|err| error!(error = %err, "cannot build model client"))?;
    let client = Arc::new(TelegramClient::new(token.clone()));
    let responder: Arc<dyn ChatResponder> = Arc::new(TelegramResponder::new(client.clone()));
    let handler = Arc::new(services.handler(responder));
    let (bus, rx) = EventBus::new(EVENT_BUFFER);

    let mut task_runner = TaskRunner::new();
    task_runner.add_task("event-worker", move || {
        tokio::spawn(async move {
            run_event_worker(rx, handler).await;
        })
    });
    task_runner.add_task("session-sweep", {
        let sessions = services.sessions.clone();
        move || {
            tokio::spawn(async move {
                run_session_sweep(sessions, SWEEP_INTERVAL).await;
            })
        }
    });
    task_runner.start_all();

    match settings.telegram.webhook_url.as_deref() {
        Some(base) => {
            run_webhook(
                client,
                bus,
                token,
                base,
                settings.telegram.webhook_secret.clone(),
                settings.telegram.port,
            )
            .await?;
            Ok(())
        }
        None => {
            run_polling(client, bus).await;
            Ok(())
        }
    }
}

pub async fn forward_update(bus: &EventBus, update: &Update) -> bool {
    match update.note() {
        Some((chat_id, message_id, text)) => {
            bus.emit(Event::note(chat_id, message_id, text)).await;
            true
        }
        None => false,
    }
}

pub async fn run_polling(client: Arc<TelegramClient>, bus: EventBus) {
    if let Err(err) = client.delete_webhook().await {
        warn!(error = %err, "could not remove existing webhook");
    }
    info!("polling for updates");

    let mut offset = None;
    loop {
        match client.get_updates(offset, POLL_TIMEOUT_SECS).await {
            Ok(updates) => {
                for update in updates {
                    offset = Some(update.update_id + 1);
                    forward_update(&bus, &update).await;
                }
            }
            Err(err) => {
                warn!(error = %err, "getUpdates failed, backing off");
                tokio::time::sleep(POLL_BACKOFF).await;
            }
        }
    }
}

pub fn secret_matches(expected: Option<&str>, provided: Option<&str>) -> bool {
    match expected.map(str::trim).filter(|secret| !secret.is_empty()) {
        None => true,
        Some(expected) => provided.map(str::trim) == Some(expected),
    }
}

#[derive(Clone)]
struct WebhookState {
    bus: EventBus,
    secret: Option<Arc<String>>,
}

async fn accept_update(provided: Option<String>, update: Update, state: WebhookState) -> StatusCode {
    if !secret_matches(state.secret.as_deref().map(String::as_str), provided.as_deref()) {
        warn!(update_id = update.update_id, "telegram webhook secret mismatch");
        return StatusCode::UNAUTHORIZED;
    }
    forward_update(&state.bus, &update).await;
    StatusCode::OK
}

pub async fn run_webhook(
    client: Arc<TelegramClient>,
    bus: EventBus,
    token: String,
    base_url: &str,
    secret: Option<String>,
    port: u16,
) -> Result<(), TelegramError> {
    let hook_url = format!("{base_url}/{token}");
    client.set_webhook(&hook_url, secret.as_deref()).await?;
    info!(port, "webhook registered");

    let state = WebhookState {
        bus,
        secret: secret.map(Arc::new),
    };
    let route = warp::post()
        .and(warp::path(token))
        .and(warp::path::end())
        .and(warp::header::optional::<String>(SECRET_HEADER))
        .and(warp::body::json::<Update>())
        .and(warp::any().map(move || state.clone()))
        .then(accept_update);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    warp::serve(route).run(addr).await;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn secret_is_optional() {
        assert!(secret_matches(None, None));
        assert!(secret_matches(None, Some("anything")));
        assert!(secret_matches(Some("  "), None));
        assert!(secret_matches(Some("s3cret"), Some("s3cret")));
        assert!(!secret_matches(Some("s3cret"), None));
        assert!(!secret_matches(Some("s3cret"), Some("other")));
    }

    #[tokio::test]
    async fn only_text_updates_reach_the_bus() {
        let (bus, mut rx) = EventBus::new(4);
        let text: Update = serde_json::from_value(serde_json::json!({
            "update_id": 10,
            "message": {"message_id": 5, "chat": {"id": 99}, "text": "Rossi 15/3/26 h 10"}
        }))
        .unwrap();
        let sticker: Update = serde_json::from_value(serde_json::json!({
            "update_id": 11,
            "message": {"message_id": 6, "chat": {"id": 99}}
        }))
        .unwrap();

        assert!(forward_update(&bus, &text).await);
        assert!(!forward_update(&bus, &sticker).await);
        drop(bus);

        let Some(Event::NoteReceived { chat_id, message_id, text, .. }) = rx.recv().await else {
            panic!("expected a note");
        };
        assert_eq!((chat_id, message_id, text.as_str()), (99, 5, "Rossi 15/3/26 h 10"));
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn webhook_rejects_wrong_secret() {
        let (bus, mut rx) = EventBus::new(4);
        let state = WebhookState {
            bus,
            secret: Some(Arc::new("s3cret".to_string())),
        };
        let update: Update = serde_json::from_value(serde_json::json!({
            "update_id": 1,
            "message": {"message_id": 1, "chat": {"id": 1}, "text": "ciao"}
        }))
        .unwrap();

        let status = accept_update(Some("nope".to_string()), update.clone(), state.clone()).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        let status = accept_update(Some("s3cret".to_string()), update, state).await;
        assert_eq!(status, StatusCode::OK);
        assert!(rx.recv().await.is_some());
    }
}
