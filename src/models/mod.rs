pub mod calendar_event;
pub mod hearing;
pub mod interpretation;
