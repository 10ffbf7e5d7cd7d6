use std::sync::Arc;

use async_trait::async_trait;
use clap::{Parser, Subcommand};
use inquire::Text;

use crate::config::BotSettings;
use crate::error::BotError;
use crate::handlers::responder::ChatResponder;
use crate::models::calendar_event::EventInsertBody;
use crate::models::interpretation::Interpretation;
use crate::runtime::BotServices;
use crate::service::event_formatter::try_format;

const CLI_CHAT_ID: i64 = 0;

#[derive(Parser)]
#[command(name = "rinviaBot", about = "Turns hearing notes into calendar events")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Interpret a note and print what would be created, without touching the calendar.
    Interpret { text: String },
    /// Read notes interactively and run them through the whole bot.
    Prompt,
}

struct StdoutResponder;

#[async_trait]
impl ChatResponder for StdoutResponder {
    async fn send_typing(&self, _chat_id: i64) {}

    async fn reply(&self, _chat_id: i64, _reply_to: i64, content: &str) {
        println!("{content}\n");
    }
}

pub async fn cli(settings: BotSettings) -> Result<(), BotError> {
    // Fine to exit here on bad arguments
    let cli = Cli::parse();
    let services = BotServices::from_settings(&settings)?;
    match cli.command {
        Commands::Interpret { text } => dry_run(&services, &settings, &text).await,
        Commands::Prompt => {
            prompt_loop(&services).await;
            Ok(())
        }
    }
}

async fn dry_run(services: &BotServices, settings: &BotSettings, text: &str) -> Result<(), BotError> {
    let interpretation = services.interpreter.interpret(text).await?;
    println!("{interpretation:#?}");
    if let Interpretation::Hearings { events, .. } = &interpretation {
        for event in events {
            match try_format(event, &settings.events) {
                Some(formatted) => {
                    let body = EventInsertBody::from(&formatted);
                    match serde_json::to_string_pretty(&body) {
                        Ok(json) => println!("{json}"),
                        Err(err) => println!("cannot render payload: {err}"),
                    }
                }
                None => println!("skipped: {event:?}"),
            }
        }
    }
    Ok(())
}

async fn prompt_loop(services: &BotServices) {
    let handler = services.handler(Arc::new(StdoutResponder));
    let mut message_id = 0;
    loop {
        let note = match Text::new("Appunto (vuoto per uscire):").prompt() {
            Ok(note) => note,
            Err(err) => {
                println!("No note supplied: {err}");
                return;
            }
        };
        if note.trim().is_empty() {
            return;
        }
        message_id += 1;
        handler.handle_note(CLI_CHAT_ID, message_id, &note).await;
    }
}
