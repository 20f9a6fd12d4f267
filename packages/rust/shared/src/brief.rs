//! The positioning brief: the validated handoff from synthesis to rendering.
//!
//! Only the presence of the structural keys is enforced. Leaf values stay
//! loosely shaped: every list element that may be either a plain string or a
//! record is decoded into an [`Entry`] when it is read.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::error::{PositioningError, Result};

/// Keys every brief must carry at the top level.
pub const REQUIRED_KEYS: [&str; 8] = [
    "company",
    "date",
    "competitors",
    "executive_summary",
    "positioning_elements",
    "territory_map",
    "white_space",
    "messaging_framework",
];

/// Keys every brief's `messaging_framework` must carry.
pub const REQUIRED_FRAMEWORK_KEYS: [&str; 5] = [
    "positioning_statements",
    "one_liners",
    "value_propositions",
    "what_not_to_say",
    "competitive_responses",
];

// ---------------------------------------------------------------------------
// Entry
// ---------------------------------------------------------------------------

/// A list element decoded by shape.
///
/// Decoding tries, in order: a JSON object as the record `T`, a JSON string
/// as plain text, and finally any other value kept as its compact JSON text.
#[derive(Debug, Clone, PartialEq)]
pub enum Entry<T> {
    Structured(T),
    PlainText(String),
    Other(String),
}

impl<T: DeserializeOwned> Entry<T> {
    pub fn decode(value: &Value) -> Self {
        match value {
            Value::Object(_) => match T::deserialize(value) {
                Ok(record) => Self::Structured(record),
                Err(_) => Self::Other(text_of(value)),
            },
            Value::String(s) => Self::PlainText(s.clone()),
            other => Self::Other(text_of(other)),
        }
    }
}

/// Decode a list-valued field. A lone non-list value becomes a single entry.
fn entries<T: DeserializeOwned>(value: Option<&Value>) -> Vec<Entry<T>> {
    match value {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => items.iter().map(Entry::decode).collect(),
        Some(single) => vec![Entry::decode(single)],
    }
}

/// Display text for any JSON value: strings verbatim, null empty,
/// everything else as compact JSON.
pub fn text_of(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn lenient_text<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<String, D::Error> {
    Value::deserialize(deserializer).map(|v| text_of(&v))
}

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct WhiteSpaceItem {
    #[serde(default, deserialize_with = "lenient_text")]
    pub territory: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub rationale: String,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct PositioningStatement {
    #[serde(default, alias = "statement", deserialize_with = "lenient_text")]
    pub text: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub angle: String,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ValueProposition {
    #[serde(default, deserialize_with = "lenient_text")]
    pub headline: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub supporting: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub proof_point: String,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct AudienceMessage {
    #[serde(default, alias = "segment", deserialize_with = "lenient_text")]
    pub audience: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Avoidance {
    #[serde(default, deserialize_with = "lenient_text")]
    pub phrase: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct CompetitiveResponse {
    #[serde(default, deserialize_with = "lenient_text")]
    pub competitor: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub their_strength: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub their_weakness: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub our_counter: String,
}

/// Attribute table for one entity under `positioning_elements`.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityElements {
    pub name: String,
    /// `(attribute, value)` rows, or the raw text when the entity is not a mapping.
    pub attributes: Entry<Vec<(String, String)>>,
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Check the structural key sets. Missing names are reported sorted.
pub fn check_required_keys(value: &Value) -> Result<()> {
    let Value::Object(map) = value else {
        return Err(PositioningError::schema(format!(
            "expected a JSON object at the top level, got {}",
            kind_of(value)
        )));
    };

    let missing = missing_keys(map, &REQUIRED_KEYS);
    if !missing.is_empty() {
        return Err(PositioningError::schema(format!(
            "Missing required keys: {}",
            missing.join(", ")
        )));
    }

    let Some(Value::Object(framework)) = map.get("messaging_framework") else {
        return Err(PositioningError::schema(
            "messaging_framework must be a JSON object",
        ));
    };

    let missing = missing_keys(framework, &REQUIRED_FRAMEWORK_KEYS);
    if !missing.is_empty() {
        return Err(PositioningError::schema(format!(
            "Missing messaging_framework keys: {}",
            missing.join(", ")
        )));
    }

    Ok(())
}

fn missing_keys<'a>(map: &Map<String, Value>, required: &[&'a str]) -> Vec<&'a str> {
    let mut missing: Vec<&str> = required
        .iter()
        .copied()
        .filter(|k| !map.contains_key(*k))
        .collect();
    missing.sort_unstable();
    missing
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

// ---------------------------------------------------------------------------
// PositioningBrief
// ---------------------------------------------------------------------------

/// A brief whose structural keys have been checked. Unknown keys are kept
/// so the persisted artifact loses nothing the generator produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct PositioningBrief(Map<String, Value>);

impl PositioningBrief {
    /// Validate and wrap a parsed response.
    pub fn from_value(value: Value) -> Result<Self> {
        check_required_keys(&value)?;
        match value {
            Value::Object(map) => Ok(Self(map)),
            other => Err(PositioningError::schema(format!(
                "expected a JSON object at the top level, got {}",
                kind_of(&other)
            ))),
        }
    }

    /// Wrap an object without validation (rendering of hand-edited briefs).
    pub fn from_object(map: Map<String, Value>) -> Self {
        Self(map)
    }

    /// Fill metadata the generator left out: `website` when absent and
    /// `competitors` when empty.
    pub fn with_defaults(mut self, website: &str, competitors: &[String]) -> Self {
        self.0
            .entry("website")
            .or_insert_with(|| Value::String(website.to_string()));

        if self.competitors().is_empty() && !competitors.is_empty() {
            self.0.insert(
                "competitors".into(),
                Value::Array(competitors.iter().cloned().map(Value::String).collect()),
            );
        }
        self
    }

    fn text(&self, key: &str) -> Option<String> {
        self.0.get(key).map(text_of).filter(|s| !s.is_empty())
    }

    fn framework(&self, key: &str) -> Option<&Value> {
        self.0.get("messaging_framework")?.as_object()?.get(key)
    }

    pub fn company(&self) -> Option<String> {
        self.text("company")
    }

    pub fn date(&self) -> Option<String> {
        self.text("date")
    }

    pub fn website(&self) -> Option<String> {
        self.text("website")
    }

    pub fn executive_summary(&self) -> String {
        self.text("executive_summary").unwrap_or_default()
    }

    pub fn competitors(&self) -> Vec<String> {
        match self.0.get("competitors") {
            Some(Value::Array(items)) => items
                .iter()
                .map(text_of)
                .filter(|s| !s.is_empty())
                .collect(),
            Some(Value::String(s)) if !s.is_empty() => vec![s.clone()],
            _ => Vec::new(),
        }
    }

    /// Entities in document order with their attribute rows.
    pub fn positioning_elements(&self) -> Vec<EntityElements> {
        let Some(Value::Object(entities)) = self.0.get("positioning_elements") else {
            return Vec::new();
        };

        entities
            .iter()
            .map(|(name, value)| {
                let attributes = match value {
                    Value::Object(attrs) => Entry::Structured(
                        attrs.iter().map(|(k, v)| (k.clone(), text_of(v))).collect(),
                    ),
                    Value::String(s) => Entry::PlainText(s.clone()),
                    other => Entry::Other(text_of(other)),
                };
                EntityElements {
                    name: name.clone(),
                    attributes,
                }
            })
            .collect()
    }

    pub fn territory_map(&self) -> Option<&Value> {
        self.0.get("territory_map").filter(|v| !v.is_null())
    }

    pub fn white_space(&self) -> Vec<Entry<WhiteSpaceItem>> {
        entries(self.0.get("white_space"))
    }

    pub fn positioning_statements(&self) -> Vec<Entry<PositioningStatement>> {
        entries(self.framework("positioning_statements"))
    }

    pub fn one_liners(&self) -> Vec<String> {
        match self.framework("one_liners") {
            Some(Value::Array(items)) => items.iter().map(text_of).collect(),
            Some(Value::Null) | None => Vec::new(),
            Some(single) => vec![text_of(single)],
        }
    }

    pub fn value_propositions(&self) -> Vec<Entry<ValueProposition>> {
        entries(self.framework("value_propositions"))
    }

    pub fn audience_messaging(&self) -> Vec<Entry<AudienceMessage>> {
        entries(self.framework("audience_messaging"))
    }

    pub fn what_not_to_say(&self) -> Vec<Entry<Avoidance>> {
        entries(self.framework("what_not_to_say"))
    }

    pub fn competitive_responses(&self) -> Vec<Entry<CompetitiveResponse>> {
        entries(self.framework("competitive_responses"))
    }
}
