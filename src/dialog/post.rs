use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// The body the platform posts when a responder answers a question.
///
/// Every field is optional; the platform omits what it does not know.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnswerPost {
    #[serde(deserialize_with = "scalar_string")]
    pub dialog_id: Option<String>,
    #[serde(deserialize_with = "scalar_string")]
    pub question_id: Option<String>,
    #[serde(deserialize_with = "scalar_string")]
    pub answer_id: Option<String>,
    pub answer_text: Option<String>,
    pub responder: Option<String>,
    pub transcription: Option<String>,
    #[serde(rename = "voiceMessageURL")]
    pub voice_message_url: Option<String>,
    #[serde(deserialize_with = "null_as_empty")]
    pub extras: HashMap<String, Value>,
}

/// Identifiers arrive as strings or as bare numbers.
fn scalar_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(Value::Bool(b)) => Ok(Some(b.to_string())),
        Some(other) => Err(serde::de::Error::custom(format!(
            "expected a string or number, got {other}"
        ))),
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<HashMap<String, Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<HashMap<String, Value>>::deserialize(deserializer)?.unwrap_or_default())
}

impl AnswerPost {
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    /// Whether the post names a chosen answer, by identifier or by text.
    pub fn is_answer(&self) -> bool {
        self.answer_id.is_some() || self.answer_text.is_some()
    }
}
