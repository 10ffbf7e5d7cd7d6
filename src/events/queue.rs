use tokio::sync::mpsc;
use tracing::warn;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    NoteReceived {
        note_id: String,
        chat_id: i64,
        message_id: i64,
        text: String,
    },
}

impl Event {
    pub fn note(chat_id: i64, message_id: i64, text: impl Into<String>) -> Self {
        Event::NoteReceived {
            note_id: Uuid::new_v4().to_string(),
            chat_id,
            message_id,
            text: text.into(),
        }
    }
}

#[derive(Clone)]
pub struct EventBus {
    tx: mpsc::Sender<Event>,
}

impl EventBus {
    pub fn new(buffer: usize) -> (Self, mpsc::Receiver<Event>) {
        let (tx, rx) = mpsc::channel(buffer);
        (Self { tx }, rx)
    }

    pub async fn emit(&self, event: Event) {
        if self.tx.send(event).await.is_err() {
            warn!("event worker has stopped, dropping event");
        }
    }
}
