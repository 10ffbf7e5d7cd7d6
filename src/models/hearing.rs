use serde::{Deserialize, Deserializer, Serialize};

/// One hearing as extracted by the model. Every field is optional because
/// the reply shape is negotiated through the prompt, not enforced.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawHearing")]
pub struct HearingEvent {
    pub parte: Option<String>,
    pub giudice: Option<String>,
    pub tribunale: Option<String>,
    pub data: Option<String>,
    pub ora: Option<String>,
    pub rg: Option<String>,
    pub note: Option<String>,
}

/// Wire shape: the party name arrives as `parte`, `nome_caso` or `caso`,
/// sometimes more than one at once.
#[derive(Deserialize)]
struct RawHearing {
    #[serde(default, deserialize_with = "non_blank")]
    parte: Option<String>,
    #[serde(default, deserialize_with = "non_blank")]
    nome_caso: Option<String>,
    #[serde(default, deserialize_with = "non_blank")]
    caso: Option<String>,
    #[serde(default, deserialize_with = "non_blank")]
    giudice: Option<String>,
    #[serde(default, deserialize_with = "non_blank")]
    tribunale: Option<String>,
    #[serde(default, deserialize_with = "non_blank")]
    data: Option<String>,
    #[serde(default, deserialize_with = "non_blank")]
    ora: Option<String>,
    #[serde(default, deserialize_with = "non_blank")]
    rg: Option<String>,
    #[serde(default, deserialize_with = "non_blank")]
    note: Option<String>,
}

impl From<RawHearing> for HearingEvent {
    fn from(raw: RawHearing) -> Self {
        Self {
            parte: raw.parte.or(raw.nome_caso).or(raw.caso),
            giudice: raw.giudice,
            tribunale: raw.tribunale,
            data: raw.data,
            ora: raw.ora,
            rg: raw.rg,
            note: raw.note,
        }
    }
}

impl HearingEvent {
    pub fn has_schedule(&self) -> bool {
        self.data.is_some() && self.ora.is_some()
    }

    pub fn with_date(&self, date: &str) -> Self {
        Self {
            data: Some(date.to_string()),
            ..self.clone()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Correction {
    #[serde(default, deserialize_with = "lossy_string")]
    pub campo: String,
    #[serde(default, deserialize_with = "lossy_string")]
    pub da: String,
    #[serde(default, deserialize_with = "lossy_string")]
    pub a: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateOption {
    #[serde(deserialize_with = "lossy_string")]
    pub id: String,
    #[serde(deserialize_with = "lossy_string")]
    pub data: String,
}

/// Models sometimes answer numbers or nulls where strings are asked for.
fn non_blank<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.and_then(|value| scalar_text(&value)))
}

fn lossy_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.and_then(|value| scalar_text(&value)).unwrap_or_default())
}

pub(crate) fn scalar_text(value: &serde_json::Value) -> Option<String> {
    let text = match value {
        serde_json::Value::String(s) => s.trim().to_string(),
        serde_json::Value::Number(n) => n.to_string(),
        serde_json::Value::Bool(b) => b.to_string(),
        _ => return None,
    };
    if text.is_empty() || text.eq_ignore_ascii_case("null") {
        None
    } else {
        Some(text)
    }
}
