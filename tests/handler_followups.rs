mod common;

use common::{harness, FakeCalendar, FakeModel};
use rinviaBot::service::dispatcher::{FAILURE_REPLY, REJECTED_REPLY};

const CHAT: i64 = 4242;

const CLARIFICATION: &str = r#"{"tipo":"conferma","dubbio":"Non so se Rossi è la parte","interpretazione":{"parte":"Rossi","giudice":"Sodani","data":"15/03/2026","ora":"10:00"}}"#;
const PAST_DATE_WITH_EVENT: &str = r#"{"tipo":"data_passata","data_letta":"15/01/2024","opzioni":[{"id":"a","data":"15/01/2027"},{"id":"b","data":"15/01/2028"}],"interpretazione":{"parte":"Rossi","data":"15/01/2024","ora":"09:00"}}"#;
const PAST_DATE_BARE: &str = r#"{"tipo":"data_passata","data_letta":"15/01/2024","opzioni":[{"id":"a","data":"15/01/2027"},{"id":"b","data":"15/01/2028"}]}"#;
const RINVIO: &str = r#"{"tipo":"rinvio","eventi":[{"parte":"Rossi","data":"15/01/2027","ora":"09:00"}]}"#;

#[tokio::test]
async fn every_note_gets_typing_and_one_reply() {
    let h = harness(FakeModel::scripted(&[RINVIO]), FakeCalendar::default());
    h.handler.handle_note(CHAT, 7, "Rossi 15/1/27 h 9").await;

    assert_eq!(*h.responder.typing.lock().await, vec![CHAT]);
    let replies = h.responder.replies.lock().await;
    assert_eq!(replies.len(), 1);
    assert_eq!((replies[0].0, replies[0].1), (CHAT, 7));
    assert!(replies[0].2.starts_with("✅ Evento creato"));
}

#[tokio::test]
async fn commands_and_blank_messages_are_ignored() {
    let h = harness(FakeModel::default(), FakeCalendar::default());
    h.handler.handle_note(CHAT, 1, "   ").await;
    h.handler.handle_note(CHAT, 2, "/start").await;

    assert!(h.responder.replies.lock().await.is_empty());
    assert!(h.responder.typing.lock().await.is_empty());
    assert!(h.model.prompts.lock().await.is_empty());
}

#[tokio::test]
async fn model_failure_gets_apology() {
    let h = harness(FakeModel::failing(500), FakeCalendar::default());
    h.handler.handle_note(CHAT, 1, "Rossi 15/1/27 h 9").await;
    assert_eq!(h.responder.texts().await, vec![FAILURE_REPLY.to_string()]);
    assert!(h.calendar.submitted.lock().await.is_empty());
}

#[tokio::test]
async fn accepting_a_clarification_creates_the_proposed_event() {
    let h = harness(FakeModel::scripted(&[CLARIFICATION]), FakeCalendar::default());
    h.handler.handle_note(CHAT, 1, "Rossi? Sodani 15/3 h 10").await;
    assert_eq!(h.sessions.lock().await.len(), 1);

    h.handler.handle_note(CHAT, 2, "Sì").await;

    let texts = h.responder.texts().await;
    assert!(texts[0].starts_with("❓ Ho un dubbio"));
    assert!(texts[1].starts_with("✅ Evento creato\n   👤 Rossi"));
    assert_eq!(h.model.prompts.lock().await.len(), 1);
    assert_eq!(h.calendar.submitted.lock().await.len(), 1);
    assert!(h.sessions.lock().await.is_empty());
}

#[tokio::test]
async fn rejecting_creates_nothing() {
    let h = harness(FakeModel::scripted(&[CLARIFICATION]), FakeCalendar::default());
    h.handler.handle_note(CHAT, 1, "Rossi? Sodani 15/3 h 10").await;
    h.handler.handle_note(CHAT, 2, "no").await;

    assert_eq!(h.responder.texts().await[1], REJECTED_REPLY);
    assert!(h.calendar.submitted.lock().await.is_empty());
    assert!(h.sessions.lock().await.is_empty());
}

#[tokio::test]
async fn choosing_an_option_reuses_the_stored_event() {
    let h = harness(FakeModel::scripted(&[PAST_DATE_WITH_EVENT]), FakeCalendar::default());
    h.handler.handle_note(CHAT, 1, "Rossi 15/1/24 h 9").await;
    h.handler.handle_note(CHAT, 2, "B").await;

    let submitted = h.calendar.submitted.lock().await;
    assert_eq!(submitted.len(), 1);
    assert_eq!(submitted[0].start.to_rfc3339(), "2028-01-15T09:00:00+01:00");
    assert_eq!(h.model.prompts.lock().await.len(), 1);
}

#[tokio::test]
async fn choosing_an_option_without_event_reinterprets_with_correction() {
    let h = harness(
        FakeModel::scripted(&[PAST_DATE_BARE, RINVIO]),
        FakeCalendar::default(),
    );
    h.handler.handle_note(CHAT, 1, "Rossi 15/1/24 h 9").await;
    h.handler.handle_note(CHAT, 2, "a").await;

    let prompts = h.model.prompts.lock().await;
    assert_eq!(prompts.len(), 2);
    assert!(prompts[1].contains("APPUNTO ORIGINALE:\nRossi 15/1/24 h 9"));
    assert!(prompts[1].contains("La data corretta è 15/01/2027"));
    assert_eq!(h.calendar.submitted.lock().await.len(), 1);
}

#[tokio::test]
async fn unrelated_text_supersedes_the_pending_prompt() {
    let h = harness(
        FakeModel::scripted(&[CLARIFICATION, RINVIO]),
        FakeCalendar::default(),
    );
    h.handler.handle_note(CHAT, 1, "Rossi? Sodani 15/3 h 10").await;
    h.handler.handle_note(CHAT, 2, "Rossi rinvio al 15/1/27 h 9").await;

    let prompts = h.model.prompts.lock().await;
    assert_eq!(prompts.len(), 2);
    assert!(prompts[1].contains("APPUNTO DA ANALIZZARE:\nRossi rinvio al 15/1/27 h 9"));
    assert!(h.sessions.lock().await.is_empty());
}

#[tokio::test]
async fn pending_prompts_are_per_chat() {
    let h = harness(
        FakeModel::scripted(&[CLARIFICATION, "{\"tipo\":\"riserva\"}"]),
        FakeCalendar::default(),
    );
    h.handler.handle_note(CHAT, 1, "Rossi? Sodani 15/3 h 10").await;
    // "sì" from another chat is a fresh note, not an answer.
    h.handler.handle_note(CHAT + 1, 1, "sì").await;

    assert_eq!(h.model.prompts.lock().await.len(), 2);
    assert!(h.calendar.submitted.lock().await.is_empty());
    assert_eq!(h.sessions.lock().await.len(), 1);
}
