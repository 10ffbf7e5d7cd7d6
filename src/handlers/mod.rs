pub mod responder;
pub mod telegram;
