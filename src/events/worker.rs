use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{info, info_span, Instrument};

use crate::events::queue::Event;
use crate::handlers::telegram::BotHandler;

/// Drains the bus one note at a time until every sender is dropped.
pub async fn run_event_worker(mut rx: mpsc::Receiver<Event>, handler: Arc<BotHandler>) {
    while let Some(event) = rx.recv().await {
        match event {
            Event::NoteReceived {
                note_id,
                chat_id,
                message_id,
                text,
            } => {
                handler
                    .handle_note(chat_id, message_id, &text)
                    .instrument(info_span!("note", %note_id, chat_id))
                    .await;
            }
        }
    }
    info!("event bus closed, worker exiting");
}
