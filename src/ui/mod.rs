use crate::core::config::Config;
use crate::core::i18n::Locale;
use crate::core::io::Storage;
use crate::core::model::{PlayerCount, Scenario, Section};
use crate::core::state::WorkflowState;
use crate::services::export;
use crate::services::generation::{GenerationClient, PLACEHOLDER_IMAGE_URL};
use crate::services::workflow::WorkflowManager;
use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};
use inquire::{Select, Text};
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

/// Menu entry: what is shown, and what it stands for.
struct Choice<T> {
    label: String,
    value: T,
}

impl<T> Choice<T> {
    fn new(label: impl Into<String>, value: T) -> Self {
        Self {
            label: label.into(),
            value,
        }
    }
}

impl<T> fmt::Display for Choice<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label)
    }
}

fn choose<T>(message: &str, choices: Vec<Choice<T>>) -> Result<T> {
    Ok(Select::new(message, choices).prompt()?.value)
}

enum IdeaAction {
    Pick(usize),
    Regenerate,
    Quit,
}

enum ReadyAction {
    Improve,
    Download,
    NewScenario,
    Quit,
}

pub struct App {
    manager: WorkflowManager,
    storage: Arc<dyn Storage>,
    output_folder: String,
    theme: Option<String>,
}

impl App {
    pub fn new(config: &Config, client: GenerationClient, storage: Arc<dyn Storage>) -> Result<Self> {
        let manager = WorkflowManager::from_config(client, config)?
            .with_progress_listener(Arc::new(|message: &str| log::info!("{}", message)));

        Ok(Self {
            manager,
            storage,
            output_folder: config.output_folder.clone(),
            theme: config.theme.clone(),
        })
    }

    /// Runs `task` under a spinner that follows the workflow's loading
    /// message, or shows `idle_message` when the stage has none.
    async fn with_spinner<F, T>(&self, idle_message: &str, task: F) -> Result<T>
    where
        F: Future<Output = T>,
    {
        let pb = ProgressBar::new_spinner();
        pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed_precise}] {msg}")?);
        pb.enable_steady_tick(Duration::from_millis(120));
        pb.set_message(idle_message.to_string());

        let mut task = std::pin::pin!(task);
        let mut ticker = tokio::time::interval(Duration::from_millis(100));
        let output = loop {
            tokio::select! {
                output = &mut task => break output,
                _ = ticker.tick() => {
                    pb.set_message(spinner_message(&self.manager.state(), idle_message));
                }
            }
        };

        pb.finish_and_clear();
        Ok(output)
    }

    pub async fn run(&mut self) -> Result<()> {
        let mut shown_scenario = false;
        loop {
            let locale = self.manager.locale();
            let labels = locale.labels();

            match self.manager.state() {
                WorkflowState::Idle => {
                    shown_scenario = false;
                    let mut prompt = Text::new(labels.theme_prompt);
                    if let Some(theme) = self.theme.as_deref() {
                        prompt = prompt.with_default(theme);
                    }
                    let theme = prompt.prompt()?;
                    let theme = theme.trim();
                    self.theme = (!theme.is_empty()).then(|| theme.to_string());
                    self.request_ideas().await?;
                }
                WorkflowState::IdeasReady { ideas } => {
                    let mut choices: Vec<Choice<IdeaAction>> = ideas
                        .iter()
                        .enumerate()
                        .map(|(i, idea)| Choice::new(idea.as_str(), IdeaAction::Pick(i)))
                        .collect();
                    choices.push(Choice::new(labels.other_ideas, IdeaAction::Regenerate));
                    choices.push(Choice::new(labels.quit, IdeaAction::Quit));

                    match choose(labels.choose_mission, choices)? {
                        IdeaAction::Pick(i) => {
                            self.manager.select_idea(i)?;
                        }
                        IdeaAction::Regenerate => self.request_ideas().await?,
                        IdeaAction::Quit => return Ok(()),
                    }
                }
                WorkflowState::SelectingLanguage { .. } => {
                    let choices = Locale::ALL
                        .iter()
                        .map(|l| Choice::new(l.to_string(), *l))
                        .collect();
                    let picked = choose(labels.choose_language, choices)?;
                    self.manager.select_language(picked)?;
                }
                WorkflowState::SelectingPlayerCount { .. } => {
                    let choices = PlayerCount::all()
                        .map(|n| Choice::new(format!("{} {}", n, labels.players), n))
                        .collect();
                    let count = choose(labels.choose_player_count, choices)?;
                    let manager = &self.manager;
                    self.with_spinner(labels.loading_scenario, manager.generate_scenario(count))
                        .await??;
                }
                WorkflowState::ScenarioReady(ready) => {
                    if !shown_scenario {
                        println!("{}", render(&ready.scenario, ready.locale));
                        shown_scenario = true;
                    }
                    if let Some(notice) = &ready.notice {
                        eprintln!("{}", notice);
                    }

                    let choices = vec![
                        Choice::new(labels.improve, ReadyAction::Improve),
                        Choice::new(labels.download, ReadyAction::Download),
                        Choice::new(labels.new_scenario, ReadyAction::NewScenario),
                        Choice::new(labels.quit, ReadyAction::Quit),
                    ];
                    match choose(&ready.scenario.content.titre, choices)? {
                        ReadyAction::Improve => self.improve(&ready.scenario).await?,
                        ReadyAction::Download => self.download().await?,
                        ReadyAction::NewScenario => self.manager.reset(),
                        ReadyAction::Quit => return Ok(()),
                    }
                }
                WorkflowState::Error { message } => {
                    eprintln!("{}\n{}", labels.error_title, message);
                    let choices = vec![
                        Choice::new(labels.restart, true),
                        Choice::new(labels.quit, false),
                    ];
                    if !choose(labels.error_title, choices)? {
                        return Ok(());
                    }
                    self.manager.retry()?;
                }
                WorkflowState::LoadingIdeas { .. } | WorkflowState::LoadingScenario { .. } => {
                    tokio::time::sleep(Duration::from_millis(100)).await;
                }
            }
        }
    }

    async fn request_ideas(&self) -> Result<()> {
        let manager = &self.manager;
        let labels = manager.locale().labels();
        self.with_spinner(labels.loading_ideas, manager.request_ideas(self.theme.as_deref()))
            .await??;
        Ok(())
    }

    async fn improve(&self, scenario: &Scenario) -> Result<()> {
        let labels = self.manager.locale().labels();
        let mut choices = vec![
            Choice::new(labels.presentation, Section::Presentation),
            Choice::new(labels.introduction, Section::Introduction),
        ];
        choices.extend(scenario.content.etapes.iter().enumerate().map(|(i, step)| {
            Choice::new(
                format!("{} {}: {}", labels.step, i + 1, step.titre),
                Section::Step(i),
            )
        }));
        let section = choose(labels.improve, choices)?;

        let manager = &self.manager;
        self.with_spinner(labels.improving_text, manager.improve_section(section))
            .await??;

        if let Some(updated) = self.manager.state().scenario() {
            println!("{}", section.text(updated)?);
        }
        Ok(())
    }

    async fn download(&self) -> Result<()> {
        let archive = self.manager.export()?;
        let path = archive
            .save(self.storage.as_ref(), &self.output_folder)
            .await?;
        println!("{}", path);
        Ok(())
    }
}

fn spinner_message(state: &WorkflowState, idle_message: &str) -> String {
    state.loading_message().unwrap_or(idle_message).to_string()
}

/// Plain-text rendering of the whole scenario for the terminal.
pub fn render(scenario: &Scenario, locale: Locale) -> String {
    let labels = locale.labels();
    let mut out = format!("==== {} ====\n\n", scenario.content.titre);

    for doc in export::documents(scenario, locale) {
        out.push_str(&doc.to_markdown());
        out.push('\n');
    }

    if !scenario.images.is_empty() {
        out.push_str(&format!("# {}\n\n", labels.images));
        for image in &scenario.images {
            let status = if image.url == PLACEHOLDER_IMAGE_URL {
                PLACEHOLDER_IMAGE_URL
            } else {
                "[embedded]"
            };
            out.push_str(&format!("- {}: {}\n", image.titre, status));
        }
    }
    out
}

pub async fn run(config: &Config, client: GenerationClient, storage: Arc<dyn Storage>) -> Result<()> {
    let mut app = App::new(config, client, storage)?;
    app.run().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::model::{fixtures, GeneratedImage};

    #[test]
    fn test_render_uses_locale_labels() {
        let scenario = Scenario::new(
            fixtures::content(3, 2),
            vec![GeneratedImage {
                titre: "Cover".to_string(),
                url: PLACEHOLDER_IMAGE_URL.to_string(),
            }],
        );

        let text = render(&scenario, Locale::It);
        let labels = Locale::It.labels();
        assert!(text.starts_with("==== The Cone of Silence! ===="));
        assert!(text.contains(labels.player_characters));
        assert!(text.contains(labels.computer_messages));
        assert!(text.contains("ZAP-R-DED-3"));
        assert!(text.contains(&format!("- Cover: {}", PLACEHOLDER_IMAGE_URL)));
    }

    #[test]
    fn test_spinner_follows_loading_message() {
        let loading = WorkflowState::LoadingScenario {
            idea: "Bots go rogue".to_string(),
            locale: Locale::De,
            player_count: PlayerCount::new(4).unwrap(),
            message: "Bilder (2/3)".to_string(),
        };
        assert_eq!(spinner_message(&loading, "ignored"), "Bilder (2/3)");

        let idle = Locale::De.labels().improving_text;
        assert_eq!(spinner_message(&WorkflowState::Idle, idle), idle);
    }

    #[test]
    fn test_choice_displays_label() {
        let choice = Choice::new("Quit", 7);
        assert_eq!(choice.to_string(), "Quit");
        assert_eq!(choice.value, 7);
    }
}
