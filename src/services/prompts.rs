use crate::core::error::ValidationError;
use crate::core::i18n::Locale;
use crate::core::model::PlayerCount;
use serde_json::{json, Value};

pub const IDEA_COUNT: usize = 5;

/// Appended to every image prompt so the artwork stays consistent.
pub const IMAGE_STYLE: &str = "Style: semi-realistic digital painting, highly detailed, cinematic composition, dramatic lighting, intense sci-fi comic book art atmosphere.";

const LORE_REMINDER: &str = "CRUCIAL LORE REMINDER: ALPHA Complex is NOT a communist state. It is a totalitarian, dystopian world run by a paranoid AI, The Computer. There is no democracy. Communism (and capitalism) are ideologies of secret societies and are considered high treason. The Computer is obsessed with eradicating traitors, mutants, and secret society members. Ensure the scenario reflects this tension and paranoia, not a simple caricature of communism.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Ideas,
    Scenario,
    Improve,
    Image,
}

/// Everything needed for one call to the generation service.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub stage: Stage,
    pub prompt: String,
    /// Structured-output schema. `None` means free-form text.
    pub schema: Option<Value>,
    pub locale: Option<Locale>,
    pub theme: Option<String>,
    pub player_count: Option<PlayerCount>,
}

pub fn ideas_request(locale: Locale, theme: Option<&str>) -> GenerationRequest {
    let theme = theme.map(str::trim).filter(|t| !t.is_empty());
    let mut prompt = format!(
        "Act as an expert in the Paranoia RPG. Generate {} short and punchy scenario ideas. \
         Each idea must be a single intriguing sentence. \
         The output language for the ideas MUST be {}.",
        IDEA_COUNT,
        locale.language_name()
    );
    if let Some(theme) = theme {
        prompt.push_str(&format!(
            " Every idea must revolve around the following theme: \"{}\".",
            theme
        ));
    }

    GenerationRequest {
        stage: Stage::Ideas,
        prompt,
        schema: Some(ideas_schema()),
        locale: Some(locale),
        theme: theme.map(str::to_string),
        player_count: None,
    }
}

fn ideas_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "ideas": {
                "type": "ARRAY",
                "items": { "type": "STRING" },
                "description": format!("A list of {} scenario ideas.", IDEA_COUNT)
            }
        },
        "required": ["ideas"]
    })
}

pub fn scenario_request(
    idea: &str,
    player_count: PlayerCount,
    locale: Locale,
) -> Result<GenerationRequest, ValidationError> {
    let idea = idea.trim();
    if idea.is_empty() {
        return Err(ValidationError::EmptyIdea);
    }
    let language = locale.language_name();

    let prompt = format!(
        "Act as an expert Paranoia RPG game master. Based on the following scenario idea: \"{idea}\", \
generate a complete, extremely detailed, and very long scenario for {count} players.\n\
The entire output, including all text fields in the JSON object, MUST be in {language}.\n\
The tone must be humorous, absurd, and full of danger, typical of Paranoia.\n\
The output MUST be a valid JSON object. Do not provide any explanation or text outside of the JSON object.\n\
\n\
{LORE_REMINDER}\n\
\n\
Adhere to the following content and length constraints:\n\
- 'pitch': A two or three sentence hook summarising the mission.\n\
- 'presentation': Write a presentation of about 500 words for the game master.\n\
- 'joueurs': Generate exactly {count} player characters. Their secret society objectives and personal objectives MUST conflict with each other.\n\
- 'briefings': Generate an individual briefing for each player character, using the exact character name in 'pourJoueur'. Each briefing should contain rumors (true or false) about the mission, NPCs, or other player characters.\n\
- 'etapes': Generate 5 to 7 steps. Each 'description' must be extremely detailed, making about 1000 words. Each step must offer 2 to 5 branching 'options' (label, action, consequence) and include an 'actionsTable', a summary table in Markdown format listing possible or expected actions, clues to find, and how to progress.\n\
- 'fiches': Generate at least 8 detailed cards (200-300 words each) of type PNJ, Lieu or Objet.\n\
- 'indices': Generate at least 6 substantial clues.\n\
- 'messagesOrdinateur': Generate at least 8 computer messages (3 lines, max 23 characters per line, separated by \\n).\n\
- 'finsAlternatives': Generate exactly 3 alternative endings, each with the condition that triggers it.\n\
- 'imagePrompt': One prompt for the cover image of the scenario, written in English, ending with '{IMAGE_STYLE}'",
        count = player_count,
    );

    Ok(GenerationRequest {
        stage: Stage::Scenario,
        prompt,
        schema: Some(scenario_schema(player_count)),
        locale: Some(locale),
        theme: None,
        player_count: Some(player_count),
    })
}

fn string_field(description: &str) -> Value {
    json!({ "type": "STRING", "description": description })
}

fn scenario_schema(player_count: PlayerCount) -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "titre": string_field("A catchy title for the scenario."),
            "pitch": string_field("A short, punchy hook for the mission."),
            "presentation": string_field("A very detailed summary of about 500 words for the Game Master only."),
            "introduction": string_field("A long and immersive flavor text to be read to the players."),
            "joueurs": {
                "type": "ARRAY",
                "description": format!("Exactly {} player characters with highly detailed physical and psychological descriptions.", player_count),
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "nom": string_field("e.g., ZAP-R-DED"),
                        "description": string_field("Very detailed physical description and personality (2-3 paragraphs)."),
                        "societeSecrete": string_field("e.g., The Enlightened Freemasons"),
                        "objectifSocieteSecrete": string_field("A detailed secret objective related to the society."),
                        "mutation": string_field("e.g., Pyrokinesis"),
                        "objectifPersonnel": string_field("A detailed personal secret objective, conflicting with the other characters.")
                    },
                    "required": ["nom", "description", "societeSecrete", "objectifSocieteSecrete", "mutation", "objectifPersonnel"]
                }
            },
            "briefings": {
                "type": "ARRAY",
                "description": "An individual briefing for each player, containing rumors and hidden objectives.",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "pourJoueur": string_field("The exact name of the player character this briefing is for."),
                        "contenu": string_field("The content of the secret briefing for this player.")
                    },
                    "required": ["pourJoueur", "contenu"]
                }
            },
            "etapes": {
                "type": "ARRAY",
                "description": "5 to 7 key stages of the scenario, each described in great detail (approx. 1000 words).",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "titre": string_field("Title of the step."),
                        "description": string_field("A very detailed description of what happens (approx. 1000 words)."),
                        "options": {
                            "type": "ARRAY",
                            "description": "2 to 5 branching choices offered to the players.",
                            "items": {
                                "type": "OBJECT",
                                "properties": {
                                    "label": string_field("Short name of the choice."),
                                    "action": string_field("What the troubleshooters do."),
                                    "consequence": string_field("What happens as a result.")
                                },
                                "required": ["label", "action", "consequence"]
                            }
                        },
                        "actionsTable": string_field("A summary table in Markdown format of possible/expected actions, clues, and progression.")
                    },
                    "required": ["titre", "description", "options", "actionsTable"]
                }
            },
            "fiches": {
                "type": "ARRAY",
                "description": "At least 8 detailed info cards (200-300 words each) for important NPCs, locations, and items.",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "type": { "type": "STRING", "enum": ["PNJ", "Lieu", "Objet"], "description": "PNJ (NPC), Lieu (Location), or Objet (Item)" },
                        "nom": { "type": "STRING" },
                        "description": string_field("A complete and detailed description and its role in the scenario (several paragraphs).")
                    },
                    "required": ["type", "nom", "description"]
                }
            },
            "indices": {
                "type": "ARRAY",
                "description": "At least 6 substantial and detailed clues to give to the players.",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "titre": string_field("e.g., 'Intercepted Message'"),
                        "contenu": string_field("The detailed content of the clue.")
                    },
                    "required": ["titre", "contenu"]
                }
            },
            "messagesOrdinateur": {
                "type": "ARRAY",
                "description": "At least 8 messages from The Computer (3 lines, max 23 char/line, separated by \\n).",
                "items": { "type": "STRING" }
            },
            "finsAlternatives": {
                "type": "ARRAY",
                "description": "3 alternative endings.",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "titre": string_field("Name of the ending."),
                        "description": string_field("What happens."),
                        "condition": string_field("What the players must do (or fail to do) to reach it.")
                    },
                    "required": ["titre", "description", "condition"]
                }
            },
            "imagePrompt": string_field(&format!("A detailed prompt for the cover image, ending with '{}'", IMAGE_STYLE))
        },
        "required": [
            "titre", "pitch", "presentation", "introduction", "joueurs", "briefings", "etapes",
            "fiches", "indices", "messagesOrdinateur", "finsAlternatives", "imagePrompt"
        ]
    })
}

pub fn improve_request(
    original: &str,
    context: &str,
    locale: Locale,
) -> Result<GenerationRequest, ValidationError> {
    if original.trim().is_empty() {
        return Err(ValidationError::EmptyText);
    }
    let prompt = format!(
        "You are an expert writer for the Paranoia RPG.\n\
Your task is to rewrite and significantly expand the following text.\n\
Make it more detailed, more immersive, and infused with the typical dark humor and constant danger of the Paranoia setting.\n\
The text is the \"{}\" part of a scenario.\n\
The final output MUST be in {}.\n\
\n\
Original text to improve:\n\
---\n\
{}\n\
---\n\
\n\
Now, provide the new, improved, and much longer version of the text:",
        context,
        locale.language_name(),
        original
    );

    Ok(GenerationRequest {
        stage: Stage::Improve,
        prompt,
        schema: None,
        locale: Some(locale),
        theme: None,
        player_count: None,
    })
}

pub fn image_request(prompt: &str) -> GenerationRequest {
    GenerationRequest {
        stage: Stage::Image,
        prompt: prompt.trim().to_string(),
        schema: None,
        locale: None,
        theme: None,
        player_count: None,
    }
}

/// Models sometimes wrap JSON in a Markdown fence even when asked not to.
pub fn strip_code_blocks(s: &str) -> String {
    let s = s.trim();
    if s.starts_with("```json") {
        s.trim_start_matches("```json").trim_end_matches("```").trim().to_string()
    } else if s.starts_with("```") {
        s.trim_start_matches("```").trim_end_matches("```").trim().to_string()
    } else {
        s.to_string()
    }
}
