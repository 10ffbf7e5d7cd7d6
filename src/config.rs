use std::collections::HashMap;
use std::env;
use std::fs;

use chrono_tz::Tz;

use crate::error::ConfigError;

pub const DEFAULT_CALENDAR_ID: &str = "primary";
pub const DEFAULT_MODEL: &str = "claude-3-haiku-20240307";
pub const DEFAULT_MODEL_API_BASE: &str = "https://api.anthropic.com";
pub const DEFAULT_MAX_TOKENS: u32 = 1000;
pub const DEFAULT_PORT: u16 = 8443;
pub const DEFAULT_TIMEZONE: Tz = chrono_tz::Europe::Rome;
pub const DEFAULT_VENUE: &str = "Tribunale Civitavecchia";
pub const DEFAULT_TITLE_MARKER: &str = "🤖";
pub const DEFAULT_SESSION_TTL_SECS: i64 = 300;

/// Raw `KEY=VALUE` pairs loaded from `CONFIG_FILE`.
#[derive(Debug, Default, Clone)]
pub struct AppConfig {
    values: HashMap<String, String>,
}

impl AppConfig {
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let mut values = HashMap::new();
        for (idx, line) in content.lines().enumerate() {
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            let trimmed = trimmed.strip_prefix("export ").unwrap_or(trimmed);
            let Some((key, value)) = trimmed.split_once('=') else {
                return Err(ConfigError::InvalidLine {
                    line: idx + 1,
                    content: line.to_string(),
                });
            };
            let key = key.trim();
            let mut value = value.trim().to_string();
            if value.len() >= 2
                && ((value.starts_with('"') && value.ends_with('"'))
                    || (value.starts_with('\'') && value.ends_with('\'')))
            {
                value = value[1..value.len() - 1].to_string();
            }
            values.insert(key.to_string(), value);
        }
        Ok(Self { values })
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    /// File value first, then the process environment.
    pub fn lookup(&self, key: &str) -> Option<String> {
        self.get(key)
            .or_else(|| env::var(key).ok())
            .filter(|value| !value.trim().is_empty())
    }
}

#[derive(Debug, Clone)]
pub struct ModelSettings {
    pub api_key: Option<String>,
    pub api_base: String,
    pub model: String,
    pub max_tokens: u32,
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone)]
pub struct CalendarSettings {
    pub service_account_json: Option<String>,
    pub calendar_id: String,
}

#[derive(Debug, Clone)]
pub struct EventSettings {
    pub timezone: Tz,
    pub default_venue: String,
    pub title_marker: Option<String>,
}

impl Default for EventSettings {
    fn default() -> Self {
        Self {
            timezone: DEFAULT_TIMEZONE,
            default_venue: DEFAULT_VENUE.to_string(),
            title_marker: Some(DEFAULT_TITLE_MARKER.to_string()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct TelegramSettings {
    pub bot_token: Option<String>,
    pub webhook_url: Option<String>,
    pub webhook_secret: Option<String>,
    pub port: u16,
}

/// Typed settings resolved once at startup and shared read-only afterwards.
#[derive(Debug, Clone)]
pub struct BotSettings {
    pub telegram: TelegramSettings,
    pub model: ModelSettings,
    pub calendar: CalendarSettings,
    pub events: EventSettings,
    pub session_ttl_secs: i64,
}

impl BotSettings {
    pub fn from_config(config: &AppConfig) -> Result<Self, ConfigError> {
        Self::from_lookup(|key| config.lookup(key))
    }

    pub fn from_lookup<F>(get: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let port = parse_or("PORT", get("PORT"), DEFAULT_PORT)?;
        let max_tokens = parse_or("ANTHROPIC_MAX_TOKENS", get("ANTHROPIC_MAX_TOKENS"), DEFAULT_MAX_TOKENS)?;
        let timeout_secs = match get("ANTHROPIC_TIMEOUT_SECS") {
            Some(raw) => Some(parse_or("ANTHROPIC_TIMEOUT_SECS", Some(raw), 0u64)?),
            None => None,
        };
        let session_ttl_secs =
            parse_or("SESSION_TTL_SECS", get("SESSION_TTL_SECS"), DEFAULT_SESSION_TTL_SECS)?;
        let timezone = match get("CALENDAR_TIMEZONE") {
            Some(raw) => raw.trim().parse::<Tz>().map_err(|_| ConfigError::Invalid {
                key: "CALENDAR_TIMEZONE",
                value: raw.clone(),
            })?,
            None => DEFAULT_TIMEZONE,
        };
        let title_marker = match get("EVENT_TITLE_MARKER") {
            Some(raw) if raw.trim().eq_ignore_ascii_case("none") => None,
            Some(raw) => Some(raw.trim().to_string()),
            None => Some(DEFAULT_TITLE_MARKER.to_string()),
        };

        Ok(Self {
            telegram: TelegramSettings {
                bot_token: get("TELEGRAM_BOT_TOKEN"),
                webhook_url: get("WEBHOOK_URL").map(|url| url.trim_end_matches('/').to_string()),
                webhook_secret: get("TELEGRAM_WEBHOOK_SECRET"),
                port,
            },
            model: ModelSettings {
                api_key: get("ANTHROPIC_API_KEY"),
                api_base: get("ANTHROPIC_API_BASE")
                    .unwrap_or_else(|| DEFAULT_MODEL_API_BASE.to_string()),
                model: get("ANTHROPIC_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
                max_tokens,
                timeout_secs,
            },
            calendar: CalendarSettings {
                service_account_json: get("GOOGLE_SERVICE_ACCOUNT_JSON"),
                calendar_id: get("GOOGLE_CALENDAR_ID")
                    .unwrap_or_else(|| DEFAULT_CALENDAR_ID.to_string()),
            },
            events: EventSettings {
                timezone,
                default_venue: get("DEFAULT_VENUE").unwrap_or_else(|| DEFAULT_VENUE.to_string()),
                title_marker,
            },
            session_ttl_secs,
        })
    }

    /// Startup gate: the bot cannot run without its own token and a model key.
    pub fn require_bot_credentials(&self) -> Result<&str, ConfigError> {
        if self.model.api_key.is_none() {
            return Err(ConfigError::Missing("ANTHROPIC_API_KEY"));
        }
        self.telegram
            .bot_token
            .as_deref()
            .ok_or(ConfigError::Missing("TELEGRAM_BOT_TOKEN"))
    }
}

fn parse_or<T: std::str::FromStr>(
    key: &'static str,
    raw: Option<String>,
    default: T,
) -> Result<T, ConfigError> {
    match raw {
        Some(value) => value.trim().parse::<T>().map_err(|_| ConfigError::Invalid { key, value }),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn parses_env_style_file() {
        let config = AppConfig::parse(
            "# comment\nexport TELEGRAM_BOT_TOKEN=\"abc:123\"\nGOOGLE_CALENDAR_ID='team@group.calendar.google.com'\n\n",
        )
        .unwrap();
        assert_eq!(config.get("TELEGRAM_BOT_TOKEN").as_deref(), Some("abc:123"));
        assert_eq!(
            config.get("GOOGLE_CALENDAR_ID").as_deref(),
            Some("team@group.calendar.google.com")
        );
    }

    #[test]
    fn rejects_lines_without_separator() {
        let err = AppConfig::parse("OK=1\nnot a pair\n").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidLine { line: 2, .. }));
    }

    #[test]
    fn defaults_apply_when_unset() {
        let settings = BotSettings::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(settings.telegram.port, 8443);
        assert_eq!(settings.calendar.calendar_id, "primary");
        assert_eq!(settings.model.model, DEFAULT_MODEL);
        assert_eq!(settings.events.timezone, chrono_tz::Europe::Rome);
        assert_eq!(settings.events.title_marker.as_deref(), Some("🤖"));
        assert!(settings.model.api_key.is_none());
    }

    #[test]
    fn invalid_port_is_reported() {
        let err = BotSettings::from_lookup(lookup_from(&[("PORT", "eighty")])).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "PORT", .. }));
    }

    #[test]
    fn credentials_gate_requires_model_key_and_token() {
        let settings =
            BotSettings::from_lookup(lookup_from(&[("TELEGRAM_BOT_TOKEN", "t")])).unwrap();
        assert!(matches!(
            settings.require_bot_credentials(),
            Err(ConfigError::Missing("ANTHROPIC_API_KEY"))
        ));

        let settings = BotSettings::from_lookup(lookup_from(&[
            ("TELEGRAM_BOT_TOKEN", "t"),
            ("ANTHROPIC_API_KEY", "k"),
            ("WEBHOOK_URL", "https://bot.example.org/"),
        ]))
        .unwrap();
        assert_eq!(settings.require_bot_credentials().unwrap(), "t");
        assert_eq!(
            settings.telegram.webhook_url.as_deref(),
            Some("https://bot.example.org")
        );
    }
}
