#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Arc;

use rinviaBot::config::EventSettings;
use rinviaBot::error::{CalendarError, InterpretError};
use rinviaBot::handlers::responder::ChatResponder;
use rinviaBot::handlers::telegram::BotHandler;
use rinviaBot::models::calendar_event::{CalendarEvent, CreatedEvent};
use rinviaBot::service::calendar_service::CalendarSubmitter;
use rinviaBot::service::dispatcher::Dispatcher;
use rinviaBot::service::interpreter::NoteInterpreter;
use rinviaBot::service::model_service::ModelClient;
use rinviaBot::service::session::SessionStore;
use tokio::sync::Mutex;

/// Replays canned model replies in order and records every prompt.
#[derive(Default)]
pub struct FakeModel {
    replies: Mutex<VecDeque<Result<String, String>>>,
    pub prompts: Mutex<Vec<String>>,
}

impl FakeModel {
    pub fn scripted(replies: &[&str]) -> Self {
        Self {
            replies: Mutex::new(replies.iter().map(|reply| Ok(reply.to_string())).collect()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(status: u16) -> Self {
        Self {
            replies: Mutex::new(VecDeque::from([Err(status.to_string())])),
            prompts: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait::async_trait]
impl ModelClient for FakeModel {
    async fn complete(&self, prompt: &str) -> Result<String, InterpretError> {
        self.prompts.lock().await.push(prompt.to_string());
        match self.replies.lock().await.pop_front() {
            Some(Ok(reply)) => Ok(reply),
            Some(Err(status)) => Err(InterpretError::Status {
                status: status.parse().unwrap_or(500),
                body: "overloaded".to_string(),
            }),
            None => Err(InterpretError::EmptyReply),
        }
    }
}

/// Accepts every event except those whose title contains `fail_on`.
#[derive(Default)]
pub struct FakeCalendar {
    pub fail_on: Option<String>,
    pub submitted: Mutex<Vec<CalendarEvent>>,
}

impl FakeCalendar {
    pub fn failing_on(fragment: &str) -> Self {
        Self {
            fail_on: Some(fragment.to_string()),
            submitted: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait::async_trait]
impl CalendarSubmitter for FakeCalendar {
    async fn submit(&self, event: &CalendarEvent) -> Result<CreatedEvent, CalendarError> {
        let mut submitted = self.submitted.lock().await;
        submitted.push(event.clone());
        if self
            .fail_on
            .as_deref()
            .is_some_and(|fragment| event.title.contains(fragment))
        {
            return Err(CalendarError::Status {
                status: 403,
                body: "forbidden".to_string(),
            });
        }
        let id = submitted.len();
        Ok(CreatedEvent {
            id: format!("evt{id}"),
            html_link: Some(format!("https://calendar.google.com/event?eid=evt{id}")),
        })
    }
}

#[derive(Default)]
pub struct MockResponder {
    pub typing: Mutex<Vec<i64>>,
    pub replies: Mutex<Vec<(i64, i64, String)>>,
}

impl MockResponder {
    pub async fn texts(&self) -> Vec<String> {
        let replies = self.replies.lock().await;
        replies.iter().map(|(_, _, text)| text.clone()).collect()
    }
}

#[async_trait::async_trait]
impl ChatResponder for MockResponder {
    async fn send_typing(&self, chat_id: i64) {
        self.typing.lock().await.push(chat_id);
    }

    async fn reply(&self, chat_id: i64, reply_to: i64, content: &str) {
        let mut replies = self.replies.lock().await;
        replies.push((chat_id, reply_to, content.to_string()));
    }
}

pub struct Harness {
    pub model: Arc<FakeModel>,
    pub calendar: Arc<FakeCalendar>,
    pub responder: Arc<MockResponder>,
    pub sessions: Arc<Mutex<SessionStore>>,
    pub handler: BotHandler,
}

pub fn harness(model: FakeModel, calendar: FakeCalendar) -> Harness {
    let model = Arc::new(model);
    let calendar = Arc::new(calendar);
    let responder = Arc::new(MockResponder::default());
    let sessions = Arc::new(Mutex::new(SessionStore::new(chrono::Duration::minutes(5))));
    let interpreter = Arc::new(NoteInterpreter::new(
        model.clone(),
        chrono_tz::Europe::Rome,
    ));
    let dispatcher = Arc::new(Dispatcher::new(calendar.clone(), EventSettings::default()));
    let handler = BotHandler::new(
        interpreter,
        dispatcher,
        sessions.clone(),
        responder.clone(),
    );
    Harness {
        model,
        calendar,
        responder,
        sessions,
        handler,
    }
}
