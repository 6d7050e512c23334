use crate::core::config::Config;
use crate::core::error::{Result, ValidationError};
use crate::core::i18n::Locale;
use crate::core::model::{PlayerCount, Section};
use crate::core::state::{Ticket, WorkflowMachine, WorkflowState};
use crate::services::assembly::assemble;
use crate::services::export::{self, ScenarioArchive};
use crate::services::generation::GenerationClient;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Receives every loading message (including image progress).
pub type ProgressListener = Arc<dyn Fn(&str) + Send + Sync>;

/// Runs generation calls around the [`WorkflowMachine`].
///
/// All methods take `&self` and the machine sits behind a mutex that is
/// never held across an await, so a `reset` can land while a request is in
/// flight. The late result is then dropped by the machine.
#[derive(Clone)]
pub struct WorkflowManager {
    client: GenerationClient,
    machine: Arc<Mutex<WorkflowMachine>>,
    image_concurrency: Option<usize>,
    listener: Option<ProgressListener>,
}

impl WorkflowManager {
    pub fn new(client: GenerationClient, locale: Locale) -> Self {
        Self {
            client,
            machine: Arc::new(Mutex::new(WorkflowMachine::new(locale))),
            image_concurrency: None,
            listener: None,
        }
    }

    pub fn from_config(client: GenerationClient, config: &Config) -> Result<Self> {
        let locale = config.locale()?;
        Ok(Self::new(client, locale).with_image_concurrency(config.images.concurrency))
    }

    pub fn with_image_concurrency(mut self, concurrency: Option<usize>) -> Self {
        self.image_concurrency = concurrency;
        self
    }

    pub fn with_progress_listener(mut self, listener: ProgressListener) -> Self {
        self.listener = Some(listener);
        self
    }

    fn machine(&self) -> MutexGuard<'_, WorkflowMachine> {
        self.machine.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn notify(&self, message: &str) {
        if let Some(listener) = &self.listener {
            listener(message);
        }
    }

    /// Updates the loading message if `ticket` is still current.
    fn progress(&self, ticket: Ticket, message: String) -> bool {
        let accepted = self.machine().set_loading_message(ticket, message.clone());
        if accepted {
            self.notify(&message);
        }
        accepted
    }

    pub fn state(&self) -> WorkflowState {
        self.machine().state().clone()
    }

    pub fn locale(&self) -> Locale {
        self.machine().locale()
    }

    pub async fn request_ideas(&self, theme: Option<&str>) -> Result<()> {
        let job = self.machine().begin_ideas()?;
        self.notify(job.locale.labels().loading_ideas);

        let result = self.client.fetch_ideas(job.locale, theme).await;
        if let Err(e) = &result {
            log::error!("Idea generation failed: {}", e);
        }
        self.machine().complete_ideas(job.ticket, result);
        Ok(())
    }

    pub fn select_idea(&self, index: usize) -> Result<String> {
        Ok(self.machine().select_idea(index)?)
    }

    pub fn select_language(&self, locale: Locale) -> Result<()> {
        Ok(self.machine().select_language(locale)?)
    }

    /// Generates the scenario text, then its images. Ends in
    /// `ScenarioReady` or `Error` unless a reset happened meanwhile.
    pub async fn generate_scenario(&self, player_count: PlayerCount) -> Result<()> {
        let job = self.machine().begin_scenario(player_count)?;
        let labels = job.locale.labels();
        self.notify(labels.loading_scenario);

        let content = match self
            .client
            .fetch_scenario(&job.idea, job.player_count, job.locale)
            .await
        {
            Ok(content) => content,
            Err(e) => {
                log::error!("Scenario generation failed: {}", e);
                self.machine().complete_scenario(job.ticket, Err(e));
                return Ok(());
            }
        };

        let total = content.image_requests().len();
        if !self.progress(job.ticket, format!("{} (0/{})", labels.loading_images, total)) {
            log::debug!("Scenario arrived after the workflow moved on, skipping images");
            return Ok(());
        }

        let scenario = assemble(
            &self.client,
            content,
            self.image_concurrency,
            |done, total| {
                self.progress(job.ticket, format!("{} ({}/{})", labels.loading_images, done, total));
            },
        )
        .await;

        self.machine().complete_scenario(job.ticket, Ok(scenario));
        Ok(())
    }

    pub async fn improve_section(&self, section: Section) -> Result<()> {
        let job = self.machine().begin_improve(section)?;
        self.notify(job.locale.labels().improving_text);

        let result = self
            .client
            .improve_text(&job.original, &section.context(), job.locale)
            .await;
        if let Err(e) = &result {
            log::warn!("Improving {:?} failed: {}", section, e);
        }
        self.machine().complete_improve(job.ticket, section, result);
        Ok(())
    }

    pub fn reset(&self) {
        self.machine().reset();
    }

    pub fn retry(&self) -> Result<()> {
        Ok(self.machine().retry()?)
    }

    pub fn export(&self) -> Result<ScenarioArchive> {
        let ready = match self.machine().state() {
            WorkflowState::ScenarioReady(ready) => ready.clone(),
            other => {
                return Err(ValidationError::InvalidTransition {
                    stage: other.name(),
                    action: "export",
                }
                .into())
            }
        };
        export::package(&ready.scenario, ready.locale)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::ModelConfig;
    use crate::core::error::Error;
    use crate::core::model::fixtures;
    use crate::services::llm::ImageOptions;
    use crate::services::testing::MockService;
    use tokio::sync::Notify;

    const IDEAS: &str = r#"{"ideas": ["Lost cone", "Bot uprising", "Happy hour", "Secret audit", "Clone shortage"]}"#;

    fn manager(service: MockService) -> (WorkflowManager, Arc<MockService>) {
        let service = Arc::new(service);
        let client = GenerationClient::new(
            service.clone(),
            ModelConfig::default(),
            ImageOptions::default(),
        );
        (WorkflowManager::new(client, Locale::En), service)
    }

    fn scenario_json(players: usize) -> String {
        serde_json::to_string(&fixtures::content(players, 5)).unwrap()
    }

    #[tokio::test]
    async fn test_full_flow_in_spanish_with_five_players() {
        let messages = Arc::new(Mutex::new(Vec::new()));
        let sink = messages.clone();
        let (manager, service) = manager(
            MockService::new()
                .with_text(IDEAS)
                .with_text(&scenario_json(5))
                .with_image_model("imagen-4.0-generate-001"),
        );
        let manager = manager.with_progress_listener(Arc::new(move |m: &str| {
            sink.lock().unwrap().push(m.to_string())
        }));

        manager.request_ideas(None).await.unwrap();
        match manager.state() {
            WorkflowState::IdeasReady { ideas } => assert_eq!(ideas.len(), 5),
            other => panic!("unexpected state: {:?}", other),
        }

        assert_eq!(manager.select_idea(1).unwrap(), "Bot uprising");
        manager.select_language(Locale::Es).unwrap();
        assert_eq!(manager.locale(), Locale::Es);

        manager
            .generate_scenario(PlayerCount::new(5).unwrap())
            .await
            .unwrap();

        let WorkflowState::ScenarioReady(ready) = manager.state() else {
            panic!("scenario not ready");
        };
        assert_eq!(ready.scenario.content.joueurs.len(), 5);
        assert_eq!(ready.locale, Locale::Es);
        assert!(ready.scenario.cover_image.is_some());

        let calls = service.content_calls.lock().unwrap();
        assert!(calls[1].prompt.contains("Bot uprising"));
        assert!(calls[1].prompt.contains("Spanish"));

        let messages = messages.lock().unwrap();
        assert_eq!(messages.first().map(String::as_str), Some(Locale::En.labels().loading_ideas));
        assert!(messages.contains(&format!("{} (1/1)", Locale::Es.labels().loading_images)));
    }

    #[tokio::test]
    async fn test_generation_failure_moves_to_error_and_retry_to_idle() {
        let (manager, _) = manager(MockService::new().with_failure("quota exceeded"));

        manager.request_ideas(Some("bots")).await.unwrap();
        match manager.state() {
            WorkflowState::Error { message } => assert!(message.contains("quota exceeded")),
            other => panic!("unexpected state: {:?}", other),
        }

        manager.retry().unwrap();
        assert_eq!(manager.state(), WorkflowState::Idle);
    }

    #[tokio::test]
    async fn test_nonconforming_scenario_is_an_error_state() {
        let (manager, _) = manager(MockService::new().with_text(IDEAS).with_text(&scenario_json(3)));

        manager.request_ideas(None).await.unwrap();
        manager.select_idea(0).unwrap();
        manager.select_language(Locale::En).unwrap();
        manager
            .generate_scenario(PlayerCount::new(6).unwrap())
            .await
            .unwrap();

        assert!(matches!(manager.state(), WorkflowState::Error { .. }));
        assert!(manager.export().is_err());
    }

    #[tokio::test]
    async fn test_improve_presentation_only() {
        let (manager, _) = manager(
            MockService::new()
                .with_text(IDEAS)
                .with_text(&scenario_json(3))
                .with_text("A far more paranoid presentation."),
        );
        manager.request_ideas(None).await.unwrap();
        manager.select_idea(0).unwrap();
        manager.select_language(Locale::En).unwrap();
        manager
            .generate_scenario(PlayerCount::new(3).unwrap())
            .await
            .unwrap();
        let before = manager.state().scenario().cloned().unwrap();

        manager.improve_section(Section::Presentation).await.unwrap();

        let after = manager.state().scenario().cloned().unwrap();
        assert_eq!(after.content.presentation, "A far more paranoid presentation.");
        let mut expected = before;
        expected.content.presentation = after.content.presentation.clone();
        assert_eq!(after, expected);
    }

    #[tokio::test]
    async fn test_reset_drops_in_flight_scenario() {
        let gate = Arc::new(Notify::new());
        let (manager, service) = manager(
            MockService::new()
                .with_text(IDEAS)
                .with_text(&scenario_json(3))
                .with_image_model("imagen-4.0-generate-001")
                .with_gate(gate.clone()),
        );

        gate.notify_one();
        manager.request_ideas(None).await.unwrap();
        manager.select_idea(2).unwrap();
        manager.select_language(Locale::Fr).unwrap();

        let background = manager.clone();
        let handle = tokio::spawn(async move {
            background
                .generate_scenario(PlayerCount::new(3).unwrap())
                .await
        });

        while manager.state().loading_message().is_none() {
            tokio::task::yield_now().await;
        }
        manager.reset();
        gate.notify_one();
        handle.await.unwrap().unwrap();

        assert_eq!(manager.state(), WorkflowState::Idle);
        assert!(service.image_calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_export_requires_ready_scenario() {
        let (manager, _) = manager(MockService::new());
        assert!(matches!(
            manager.export(),
            Err(Error::Validation(ValidationError::InvalidTransition { action: "export", .. }))
        ));
    }

    #[tokio::test]
    async fn test_export_ready_scenario() {
        let (manager, _) = manager(MockService::new().with_text(IDEAS).with_text(&scenario_json(4)));
        manager.request_ideas(None).await.unwrap();
        manager.select_idea(0).unwrap();
        manager.select_language(Locale::De).unwrap();
        manager
            .generate_scenario(PlayerCount::new(4).unwrap())
            .await
            .unwrap();

        let archive = manager.export().unwrap();
        assert_eq!(archive.file_name, "the_cone_of_silence_.zip");
        assert!(!archive.bytes.is_empty());
    }
}
