use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("invalid value for {key}: {value}")]
    Invalid { key: &'static str, value: String },
    #[error("invalid config line {line}: {content}")]
    InvalidLine { line: usize, content: String },
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum InterpretError {
    #[error("model API key is not configured")]
    MissingApiKey,
    #[error("model request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("model request failed with status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("model API response could not be read: {0}")]
    Envelope(serde_json::Error),
    #[error("model reply contained no text")]
    EmptyReply,
    #[error("model reply is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FormatError {
    #[error("event has no date")]
    MissingDate,
    #[error("event has no time")]
    MissingTime,
    #[error("unparseable date: {0}")]
    InvalidDate(String),
    #[error("unparseable time: {0}")]
    InvalidTime(String),
    #[error("local time {0} does not exist in the calendar time zone")]
    NonexistentLocalTime(String),
}

#[derive(Debug, Error)]
pub enum CalendarError {
    #[error("calendar service account is not configured")]
    NotConfigured,
    #[error("invalid service account credentials: {0}")]
    InvalidCredentials(String),
    #[error("failed to sign token request")]
    Signing,
    #[error("calendar request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("calendar request failed with status {status}: {body}")]
    Status { status: u16, body: String },
}

#[derive(Debug, Error)]
pub enum TelegramError {
    #[error("telegram request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("telegram API error: {0}")]
    Api(String),
}

#[derive(Debug, Error)]
pub enum BotError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Interpret(#[from] InterpretError),
    #[error(transparent)]
    Telegram(#[from] TelegramError),
}
