use crate::core::error::Result;
use crate::core::i18n::{Labels, Locale};
use crate::core::io::Storage;
use crate::core::model::Scenario;
use crate::utils::media::{decode_data_uri, image_extension, sanitize_filename};
use std::fmt::Write as _;
use std::io::{Cursor, Write};
use std::path::Path;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

/// One Markdown file of the exported scenario.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub file_name: &'static str,
    pub title: String,
    pub body: String,
}

impl Document {
    fn new(file_name: &'static str, title: &str, body: String) -> Self {
        Self {
            file_name,
            title: title.to_string(),
            body,
        }
    }

    pub fn to_markdown(&self) -> String {
        format!("# {}\n\n{}", self.title, self.body)
    }
}

#[derive(Debug, Clone)]
pub struct ScenarioArchive {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl ScenarioArchive {
    /// Writes the archive into `folder` and returns the full path. An
    /// existing archive is never overwritten: `name-2.zip`, `name-3.zip`...
    /// are tried until a free name is found.
    pub async fn save(&self, storage: &dyn Storage, folder: &str) -> anyhow::Result<String> {
        let path = free_path(storage, folder, &self.file_name).await?;
        storage.write(&path, &self.bytes).await?;
        log::info!("Scenario saved to {}", path);
        Ok(path)
    }
}

async fn free_path(storage: &dyn Storage, folder: &str, file_name: &str) -> anyhow::Result<String> {
    let name = Path::new(file_name);
    let stem = name.file_stem().map(|s| s.to_string_lossy()).unwrap_or_default();
    let extension = name
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();

    let mut attempt = 1;
    loop {
        let candidate = if attempt == 1 {
            file_name.to_string()
        } else {
            format!("{}-{}{}", stem, attempt, extension)
        };
        let path = Path::new(folder).join(candidate).to_string_lossy().to_string();
        if !storage.exists(&path).await? {
            return Ok(path);
        }
        log::debug!("{} already exists", path);
        attempt += 1;
    }
}

pub fn archive_name(title: &str) -> String {
    let name = sanitize_filename(title.trim());
    if name.is_empty() {
        "scenario.zip".to_string()
    } else {
        format!("{}.zip", name)
    }
}

/// Renders every section of the scenario with the labels of `locale`.
/// Endings are only included when the scenario has some.
pub fn documents(scenario: &Scenario, locale: Locale) -> Vec<Document> {
    let labels = locale.labels();
    let content = &scenario.content;

    let mut docs = vec![
        Document::new("01_presentation.md", labels.presentation, presentation(scenario, labels)),
        Document::new("02_introduction.md", labels.introduction, content.introduction.clone()),
        Document::new("03_player_characters.md", labels.player_characters, characters(scenario, labels)),
        Document::new("04_briefings.md", labels.briefings, briefings(scenario, labels)),
        Document::new("05_steps.md", labels.steps, steps(scenario, labels)),
        Document::new("06_info_cards.md", labels.info_cards, info_cards(scenario, labels)),
        Document::new("07_clues.md", labels.clues, clues(scenario, labels)),
        Document::new("08_computer_messages.md", labels.computer_messages, computer_messages(scenario)),
    ];
    if !content.fins_alternatives.is_empty() {
        docs.push(Document::new("09_endings.md", labels.endings, endings(scenario, labels)));
    }
    docs
}

fn presentation(scenario: &Scenario, labels: &Labels) -> String {
    let content = &scenario.content;
    let mut out = format!("## {}\n\n", content.titre);
    if !content.pitch.trim().is_empty() {
        let _ = write!(out, "**{}:** {}\n\n", labels.pitch, content.pitch);
    }
    out.push_str(&content.presentation);
    out
}

fn characters(scenario: &Scenario, labels: &Labels) -> String {
    let mut out = String::new();
    for pc in &scenario.content.joueurs {
        let _ = write!(
            out,
            "## {}\n\n**{}:** {}\n\n**{}:** {}\n\n**{}:** {}\n\n**{}:** {}\n\n**{}:** {}\n\n",
            pc.nom,
            labels.description,
            pc.description,
            labels.mutation,
            pc.mutation,
            labels.secret_society,
            pc.societe_secrete,
            labels.society_objective,
            pc.objectif_societe_secrete,
            labels.personal_objective,
            pc.objectif_personnel
        );
    }
    out
}

fn briefings(scenario: &Scenario, labels: &Labels) -> String {
    let mut out = String::new();
    for b in &scenario.content.briefings {
        let _ = write!(out, "## {}: {}\n\n{}\n\n", labels.for_player, b.pour_joueur, b.contenu);
    }
    out
}

fn steps(scenario: &Scenario, labels: &Labels) -> String {
    let mut out = String::new();
    for (i, step) in scenario.content.etapes.iter().enumerate() {
        let _ = write!(out, "## {} {}: {}\n\n{}\n\n", labels.step, i + 1, step.titre, step.description);
        if !step.options.is_empty() {
            let _ = write!(out, "### {}\n\n", labels.options);
            for option in &step.options {
                let _ = writeln!(out, "- **{}**: {}", option.label, option.action);
                let _ = writeln!(out, "  - *{}:* {}", labels.consequence, option.consequence);
            }
            out.push('\n');
        }
        if !step.actions_table.trim().is_empty() {
            let _ = write!(out, "### {}\n\n{}\n\n", labels.summary_table, step.actions_table.trim());
        }
    }
    out
}

fn info_cards(scenario: &Scenario, labels: &Labels) -> String {
    let mut out = String::new();
    for card in &scenario.content.fiches {
        let _ = write!(
            out,
            "## {}\n\n**{}:** {}\n\n{}\n\n",
            card.nom, labels.info_card, card.kind, card.description
        );
    }
    out
}

fn clues(scenario: &Scenario, labels: &Labels) -> String {
    let mut out = String::new();
    for (i, clue) in scenario.content.indices.iter().enumerate() {
        let _ = write!(out, "## {} {}: {}\n\n{}\n\n", labels.clue, i + 1, clue.titre, clue.contenu);
    }
    out
}

fn computer_messages(scenario: &Scenario) -> String {
    let mut out = String::new();
    for message in &scenario.content.messages_ordinateur {
        let _ = write!(out, "```\n{}\n```\n\n", message.trim());
    }
    out
}

fn endings(scenario: &Scenario, labels: &Labels) -> String {
    let mut out = String::new();
    for ending in &scenario.content.fins_alternatives {
        let _ = write!(
            out,
            "## {}\n\n{}\n\n**{}:** {}\n\n",
            ending.titre, ending.description, labels.condition, ending.condition
        );
    }
    out
}

/// Builds the zip archive in memory. Images that are not decodable data
/// URIs (the placeholder among them) are left out.
pub fn package(scenario: &Scenario, locale: Locale) -> Result<ScenarioArchive> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = FileOptions::default().compression_method(CompressionMethod::Deflated);

    for doc in documents(scenario, locale) {
        zip.start_file(doc.file_name, options)?;
        zip.write_all(doc.to_markdown().as_bytes())?;
    }

    for (i, image) in scenario.images.iter().enumerate() {
        let Some((mime, bytes)) = decode_data_uri(&image.url) else {
            log::warn!("Skipping image \"{}\": not an embedded image", image.titre);
            continue;
        };
        let name = format!(
            "images/{:02}_{}.{}",
            i + 1,
            sanitize_filename(&image.titre),
            image_extension(&mime)
        );
        zip.start_file(name, options)?;
        zip.write_all(&bytes)?;
    }

    let bytes = zip.finish()?.into_inner();
    Ok(ScenarioArchive {
        file_name: archive_name(&scenario.content.titre),
        bytes,
    })
}
