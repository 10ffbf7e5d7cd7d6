pub mod calendar_service;
pub mod dispatcher;
pub mod event_formatter;
pub mod interpreter;
pub mod model_service;
pub mod prompt;
pub mod session;
