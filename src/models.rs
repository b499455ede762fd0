use serde::{Serialize, Deserialize};

use crate::error::ClientError;

/// Free-text craft idea. Always trimmed and non-empty once constructed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Idea(String);

impl Idea {
    pub fn parse(raw: &str) -> Result<Self, ClientError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(ClientError::Validation("Please describe your idea first".into()));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str { &self.0 }

    pub fn char_count(&self) -> usize { self.0.chars().count() }
}

impl std::fmt::Display for Idea {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result { f.write_str(&self.0) }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct Suggestion {
    pub title: String,
    #[serde(default)]
    pub materials: String,
    #[serde(default)]
    pub difficulty: String,
    #[serde(default)]
    pub time: String,
    #[serde(default)]
    pub cost: String,
    #[serde(default)]
    pub steps: Vec<String>,
    #[serde(default)]
    pub tech_requirements: Option<Vec<String>>,
}

impl Suggestion {
    /// Tech requirements worth rendering; `None` when absent or empty.
    pub fn tech_requirements(&self) -> Option<&[String]> {
        self.tech_requirements.as_deref().filter(|reqs| !reqs.is_empty())
    }
}

/// Backends that only produce one-line ideas send bare strings instead of records.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SuggestionWire {
    Full(Suggestion),
    Line(String),
}

impl From<SuggestionWire> for Suggestion {
    fn from(wire: SuggestionWire) -> Self {
        match wire {
            SuggestionWire::Full(s) => s,
            SuggestionWire::Line(title) => Suggestion { title, ..Default::default() },
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SuggestionsPayload {
    #[serde(deserialize_with = "deserialize_suggestions")]
    pub suggestions: Vec<Suggestion>,
}

fn deserialize_suggestions<'de, D>(deserializer: D) -> Result<Vec<Suggestion>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let wire = Vec::<SuggestionWire>::deserialize(deserializer)?;
    Ok(wire.into_iter().map(Suggestion::from).collect())
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct GeneratedImage {
    /// Base64 JPEG payload, kept verbatim.
    pub image: String,
    #[serde(default)]
    pub remaining_requests: Option<u32>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct TrendingProject {
    pub title: String,
    #[serde(default)]
    pub category: String,
    #[serde(alias = "image", default)]
    pub image_url: String,
    #[serde(default)]
    pub likes: u64,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub difficulty: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TrendingPayload {
    pub ideas: Vec<TrendingProject>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct UserProfile {
    #[serde(default)]
    pub picture: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AuthPayload {
    pub user: UserProfile,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct IdeaRequest {
    pub idea: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CredentialRequest {
    pub credential: String,
}

/// A "Generate Preview" click on one suggestion card.
#[derive(Debug, Deserialize)]
pub struct CardRequest {
    pub index: usize,
}

#[derive(Debug, Deserialize)]
pub struct CategoryRequest {
    pub category: String,
}
