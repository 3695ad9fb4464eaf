//! Pitch data structures.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// The structured pitch produced by the model (`generated_data` column).
///
/// Deserialization never fails: any JSON value is coerced field by field,
/// so `null`, wrong types and missing keys all come out blank.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Value")]
pub struct PitchData {
    /// Startup name
    pub name: String,

    /// One-line tagline
    pub tagline: String,

    /// Short narrative pitch
    pub elevator_pitch: String,

    pub problem: String,

    pub solution: String,

    pub target_audience: TargetAudience,

    pub unique_value_proposition: String,

    pub landing_copy: LandingCopy,

    /// Industry tag used for filtering
    pub industry: String,

    pub colors: Colors,

    pub logo_ideas: Vec<String>,
}

impl PitchData {
    pub const DEFAULT_NAME: &'static str = "Untitled Startup";
    pub const DEFAULT_TAGLINE: &'static str = "Transforming ideas into reality";
    pub const DEFAULT_INDUSTRY: &'static str = "Technology";
    pub const DEFAULT_CALL_TO_ACTION: &'static str = "Get Started Free";

    /// Replace blank fields with their documented defaults.
    ///
    /// Landing copy falls back to the (already defaulted) name and tagline.
    pub fn with_defaults(mut self) -> Self {
        fill(&mut self.name, Self::DEFAULT_NAME);
        fill(&mut self.tagline, Self::DEFAULT_TAGLINE);
        fill(&mut self.industry, Self::DEFAULT_INDUSTRY);

        let defaults = Colors::default();
        fill(&mut self.colors.primary, &defaults.primary);
        fill(&mut self.colors.secondary, &defaults.secondary);
        fill(&mut self.colors.accent, &defaults.accent);
        fill(&mut self.colors.neutral, &defaults.neutral);

        fill(&mut self.landing_copy.headline, &self.name);
        fill(&mut self.landing_copy.subheadline, &self.tagline);
        fill(
            &mut self.landing_copy.call_to_action,
            Self::DEFAULT_CALL_TO_ACTION,
        );

        self.target_audience.segments.retain(|s| !s.trim().is_empty());
        self.logo_ideas.retain(|s| !s.trim().is_empty());
        self
    }
}

fn fill(field: &mut String, default: &str) {
    if field.trim().is_empty() {
        *field = default.to_string();
    }
}

impl From<Value> for PitchData {
    fn from(value: Value) -> Self {
        match value {
            Value::Object(object) => coerce(&object),
            _ => PitchData::default(),
        }
    }
}

fn coerce(object: &Map<String, Value>) -> PitchData {
    let audience = object.get("target_audience");
    let landing = object.get("landing_copy");
    let colors = object.get("colors");

    PitchData {
        name: text_field(object.get("name")),
        tagline: text_field(object.get("tagline")),
        elevator_pitch: text_field(object.get("elevator_pitch")),
        problem: text_field(object.get("problem")),
        solution: text_field(object.get("solution")),
        target_audience: match audience {
            // A bare string is taken as the description.
            Some(Value::String(s)) => TargetAudience {
                description: s.trim().to_string(),
                segments: Vec::new(),
            },
            _ => TargetAudience {
                description: text_field(nested(audience, "description")),
                segments: list_field(nested(audience, "segments")),
            },
        },
        unique_value_proposition: text_field(object.get("unique_value_proposition")),
        landing_copy: LandingCopy {
            headline: text_field(nested(landing, "headline")),
            subheadline: text_field(nested(landing, "subheadline")),
            call_to_action: text_field(nested(landing, "call_to_action")),
        },
        industry: text_field(object.get("industry")),
        colors: Colors {
            primary: text_field(nested(colors, "primary")),
            secondary: text_field(nested(colors, "secondary")),
            accent: text_field(nested(colors, "accent")),
            neutral: text_field(nested(colors, "neutral")),
        },
        logo_ideas: list_field(object.get("logo_ideas")),
    }
}

fn nested<'a>(parent: Option<&'a Value>, key: &str) -> Option<&'a Value> {
    parent?.as_object()?.get(key)
}

/// Strings are trimmed, numbers and booleans stringified, anything else blank.
fn text_field(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.trim().to_string(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        _ => String::new(),
    }
}

/// Arrays keep their textual items; a lone string becomes one item.
fn list_field(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| text_field(Some(item)))
            .filter(|s| !s.is_empty())
            .collect(),
        Some(Value::String(s)) if !s.trim().is_empty() => vec![s.trim().to_string()],
        _ => Vec::new(),
    }
}

/// Who the startup sells to.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TargetAudience {
    pub description: String,
    pub segments: Vec<String>,
}

/// Copy for the landing page hero.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LandingCopy {
    pub headline: String,
    pub subheadline: String,
    pub call_to_action: String,
}

/// Brand palette as CSS hex colors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Colors {
    pub primary: String,
    pub secondary: String,
    pub accent: String,
    pub neutral: String,
}

impl Default for Colors {
    fn default() -> Self {
        Self {
            primary: "#3B82F6".into(),
            secondary: "#8B5CF6".into(),
            accent: "#06B6D4".into(),
            neutral: "#6B7280".into(),
        }
    }
}

/// Row identifier; the backend may hand out numbers or UUID strings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct PitchId(pub String);

impl<'de> Deserialize<'de> for PitchId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Text(String),
            Number(i64),
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Text(s) => PitchId(s),
            Raw::Number(n) => PitchId(n.to_string()),
        })
    }
}

impl fmt::Display for PitchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PitchId {
    fn from(s: &str) -> Self {
        PitchId(s.to_string())
    }
}

/// A persisted pitch row.
///
/// Rows written by other clients may carry `null` in any nullable column;
/// decoding goes through [`PitchRow`] and fills the gaps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "PitchRow")]
pub struct Pitch {
    pub id: PitchId,

    /// Owning user
    pub user_id: String,

    pub title: String,

    pub short_description: String,

    pub industry: Option<String>,

    pub tone: Option<String>,

    pub language: Option<String>,

    pub generated_data: PitchData,

    /// Generated landing page HTML
    pub landing_code: Option<String>,

    pub created_at: DateTime<Utc>,
}

/// Wire shape of a `pitches` row before gaps are filled.
#[derive(Deserialize)]
struct PitchRow {
    id: PitchId,
    #[serde(default)]
    user_id: Option<String>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    short_description: Option<String>,
    #[serde(default)]
    industry: Option<String>,
    #[serde(default)]
    tone: Option<String>,
    #[serde(default)]
    language: Option<String>,
    #[serde(default)]
    generated_data: PitchData,
    #[serde(default)]
    landing_code: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<PitchRow> for Pitch {
    fn from(row: PitchRow) -> Self {
        let title = row.title.filter(|s| !s.trim().is_empty());
        let short_description = row.short_description.filter(|s| !s.trim().is_empty());

        let mut data = row.generated_data;
        fill(&mut data.name, title.as_deref().unwrap_or_default());
        fill(
            &mut data.tagline,
            short_description.as_deref().unwrap_or_default(),
        );
        fill(&mut data.industry, row.industry.as_deref().unwrap_or_default());
        let data = data.with_defaults();

        Self {
            id: row.id,
            user_id: row.user_id.unwrap_or_default(),
            title: title.unwrap_or_else(|| data.name.clone()),
            short_description: short_description.unwrap_or_else(|| data.tagline.clone()),
            industry: row.industry,
            tone: row.tone,
            language: row.language,
            generated_data: data,
            landing_code: row.landing_code,
            created_at: row.created_at,
        }
    }
}

impl Pitch {
    /// Display name, preferring the generated name over the title column.
    pub fn display_name(&self) -> &str {
        if self.generated_data.name.is_empty() {
            &self.title
        } else {
            &self.generated_data.name
        }
    }

    /// Industry tag or `General` when absent.
    pub fn industry_label(&self) -> &str {
        self.industry
            .as_deref()
            .filter(|s| !s.is_empty())
            .unwrap_or("General")
    }
}

/// Insert payload for a new pitch row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewPitch {
    pub user_id: String,
    pub title: String,
    pub short_description: String,
    pub industry: String,
    pub tone: String,
    pub language: String,
    pub generated_data: PitchData,
    pub landing_code: Option<String>,
}

impl NewPitch {
    pub fn new(user_id: impl Into<String>, data: PitchData, landing_code: Option<String>) -> Self {
        Self {
            user_id: user_id.into(),
            title: data.name.clone(),
            short_description: data.tagline.clone(),
            industry: data.industry.clone(),
            tone: "auto".into(),
            language: "auto".into(),
            generated_data: data,
            landing_code,
        }
    }
}
