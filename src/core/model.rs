use crate::core::error::ValidationError;
use serde::{Deserialize, Serialize};
use std::fmt;

pub const MIN_PLAYERS: u8 = 3;
pub const MAX_PLAYERS: u8 = 6;

/// Number of troubleshooters a scenario is written for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct PlayerCount(u8);

impl PlayerCount {
    pub fn new(count: u8) -> Result<Self, ValidationError> {
        if (MIN_PLAYERS..=MAX_PLAYERS).contains(&count) {
            Ok(Self(count))
        } else {
            Err(ValidationError::PlayerCount(count))
        }
    }

    pub fn all() -> impl Iterator<Item = PlayerCount> {
        (MIN_PLAYERS..=MAX_PLAYERS).map(PlayerCount)
    }

    pub fn get(self) -> usize {
        self.0 as usize
    }
}

impl TryFrom<u8> for PlayerCount {
    type Error = ValidationError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<PlayerCount> for u8 {
    fn from(value: PlayerCount) -> Self {
        value.0
    }
}

impl fmt::Display for PlayerCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerCharacter {
    pub nom: String,
    pub description: String,
    pub societe_secrete: String,
    pub objectif_societe_secrete: String,
    pub mutation: String,
    pub objectif_personnel: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Briefing {
    pub pour_joueur: String,
    pub contenu: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioOption {
    pub label: String,
    pub action: String,
    pub consequence: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioStep {
    pub titre: String,
    pub description: String,
    #[serde(default)]
    pub options: Vec<ScenarioOption>,
    #[serde(default)]
    pub actions_table: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InfoCardKind {
    #[serde(rename = "PNJ", alias = "NPC")]
    Npc,
    #[serde(rename = "Lieu", alias = "Location")]
    Location,
    #[serde(rename = "Objet", alias = "Item")]
    Item,
}

impl fmt::Display for InfoCardKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self {
            InfoCardKind::Npc => "PNJ",
            InfoCardKind::Location => "Lieu",
            InfoCardKind::Item => "Objet",
        };
        f.write_str(tag)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InfoCard {
    #[serde(rename = "type")]
    pub kind: InfoCardKind,
    pub nom: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Clue {
    pub titre: String,
    pub contenu: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ending {
    pub titre: String,
    pub description: String,
    pub condition: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImagePrompt {
    pub titre: String,
    pub prompt: String,
}

/// Structured result of the main scenario generation call.
///
/// Field names follow the wire format of the response schema. Fields that
/// only some schema revisions produce default to empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioContent {
    pub titre: String,
    #[serde(default)]
    pub pitch: String,
    pub presentation: String,
    pub introduction: String,
    pub joueurs: Vec<PlayerCharacter>,
    pub briefings: Vec<Briefing>,
    pub etapes: Vec<ScenarioStep>,
    pub fiches: Vec<InfoCard>,
    pub indices: Vec<Clue>,
    #[serde(default)]
    pub messages_ordinateur: Vec<String>,
    #[serde(default)]
    pub fins_alternatives: Vec<Ending>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_prompt: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub images_prompts: Vec<ImagePrompt>,
}

impl ScenarioContent {
    /// Image requests to issue for this content, in display order. A gallery
    /// takes precedence over the single cover prompt.
    pub fn image_requests(&self) -> Vec<ImagePrompt> {
        if !self.images_prompts.is_empty() {
            return self.images_prompts.clone();
        }
        match self.image_prompt.as_deref().map(str::trim) {
            Some(prompt) if !prompt.is_empty() => vec![ImagePrompt {
                titre: self.titre.clone(),
                prompt: prompt.to_string(),
            }],
            _ => Vec::new(),
        }
    }

    pub fn uses_cover_image(&self) -> bool {
        self.images_prompts.is_empty() && self.image_prompt.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedImage {
    pub titre: String,
    /// `data:` URI, or the placeholder URL when generation failed.
    pub url: String,
}

/// Display-ready aggregate: generated text plus resolved artwork.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scenario {
    #[serde(flatten)]
    pub content: ScenarioContent,
    #[serde(default)]
    pub cover_image: Option<String>,
    #[serde(default)]
    pub images: Vec<GeneratedImage>,
}

impl Scenario {
    pub fn new(content: ScenarioContent, images: Vec<GeneratedImage>) -> Self {
        let cover_image = if content.uses_cover_image() {
            images.first().map(|img| img.url.clone())
        } else {
            None
        };
        Self {
            content,
            cover_image,
            images,
        }
    }
}

/// A part of the scenario that can be rewritten in place.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Presentation,
    Introduction,
    Step(usize),
}

impl Section {
    /// Short description handed to the model so it knows what it rewrites.
    pub fn context(self) -> String {
        match self {
            Section::Presentation => "game master presentation".to_string(),
            Section::Introduction => "introduction read aloud to the players".to_string(),
            Section::Step(i) => format!("description of scenario step {}", i + 1),
        }
    }

    pub fn text(self, scenario: &Scenario) -> Result<&str, ValidationError> {
        match self {
            Section::Presentation => Ok(&scenario.content.presentation),
            Section::Introduction => Ok(&scenario.content.introduction),
            Section::Step(i) => scenario
                .content
                .etapes
                .get(i)
                .map(|s| s.description.as_str())
                .ok_or(ValidationError::StepOutOfRange(i)),
        }
    }

    /// Replaces the targeted field and nothing else.
    pub fn replace(self, scenario: &mut Scenario, text: String) -> Result<(), ValidationError> {
        match self {
            Section::Presentation => scenario.content.presentation = text,
            Section::Introduction => scenario.content.introduction = text,
            Section::Step(i) => {
                scenario
                    .content
                    .etapes
                    .get_mut(i)
                    .ok_or(ValidationError::StepOutOfRange(i))?
                    .description = text
            }
        }
        Ok(())
    }
}
