use crate::core::config::Config;
use crate::core::config::ModelConfig;
use crate::core::error::GenerationError;
use crate::core::i18n::Locale;
use crate::core::model::{PlayerCount, ScenarioContent};
use crate::services::llm::{ContentRequest, GenerationService, ImageOptions};
use crate::services::prompts::{self, strip_code_blocks, GenerationRequest, IDEA_COUNT};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::sync::Arc;

/// Shown instead of an image when both image models fail.
pub const PLACEHOLDER_IMAGE_URL: &str =
    "https://via.placeholder.com/1024x576.png/0A0A0A/FFB000?text=IMAGE+GENERATION+FAILED";

#[derive(Deserialize)]
struct IdeasPayload {
    ideas: Vec<String>,
}

/// Typed calls for each generation stage on top of a [`GenerationService`].
#[derive(Debug, Clone)]
pub struct GenerationClient {
    service: Arc<dyn GenerationService>,
    models: ModelConfig,
    image_options: ImageOptions,
}

impl GenerationClient {
    pub fn new(
        service: Arc<dyn GenerationService>,
        models: ModelConfig,
        image_options: ImageOptions,
    ) -> Self {
        Self {
            service,
            models,
            image_options,
        }
    }

    pub fn from_config(service: Arc<dyn GenerationService>, config: &Config) -> Self {
        Self::new(
            service,
            config.models.clone(),
            ImageOptions {
                aspect_ratio: config.images.aspect_ratio.clone(),
                mime_type: config.images.mime_type.clone(),
            },
        )
    }

    async fn run(&self, model: &str, request: GenerationRequest) -> Result<String, GenerationError> {
        log::debug!("{:?} request to {}", request.stage, model);
        let content = ContentRequest {
            model: model.to_string(),
            prompt: request.prompt,
            schema: request.schema,
        };
        self.service
            .generate_content(&content)
            .await
            .map_err(|e| GenerationError::Service(format!("{:#}", e)))
    }

    pub async fn fetch_ideas(
        &self,
        locale: Locale,
        theme: Option<&str>,
    ) -> Result<Vec<String>, GenerationError> {
        let request = prompts::ideas_request(locale, theme);
        let text = self.run(&self.models.ideas, request).await?;
        let payload: IdeasPayload = parse_json(&text)?;

        let ideas: Vec<String> = payload
            .ideas
            .into_iter()
            .map(|idea| idea.trim().to_string())
            .filter(|idea| !idea.is_empty())
            .take(IDEA_COUNT)
            .collect();
        if ideas.is_empty() {
            return Err(GenerationError::Malformed("no scenario ideas returned".to_string()));
        }
        Ok(ideas)
    }

    pub async fn fetch_scenario(
        &self,
        idea: &str,
        player_count: PlayerCount,
        locale: Locale,
    ) -> Result<ScenarioContent, GenerationError> {
        let request = prompts::scenario_request(idea, player_count, locale)?;
        let text = self.run(&self.models.scenario, request).await?;
        let content: ScenarioContent = parse_json(&text)?;
        check_conformance(&content, player_count)?;
        log::info!(
            "Scenario \"{}\": {} characters, {} steps, {} cards",
            content.titre,
            content.joueurs.len(),
            content.etapes.len(),
            content.fiches.len()
        );
        Ok(content)
    }

    /// Returns a data URI for the prompt, or [`PLACEHOLDER_IMAGE_URL`] when
    /// neither image model produced anything.
    pub async fn fetch_image(&self, prompt: &str) -> String {
        let request = prompts::image_request(prompt);
        if request.prompt.is_empty() {
            log::warn!("Empty image prompt, using placeholder");
            return PLACEHOLDER_IMAGE_URL.to_string();
        }

        for model in [&self.models.image, &self.models.fallback_image] {
            match self
                .service
                .generate_images(model, &request.prompt, &self.image_options)
                .await
            {
                Ok(images) => match images.first() {
                    Some(image) => return image.data_uri(),
                    None => log::warn!("{} returned no image", model),
                },
                Err(e) => log::warn!("Image generation with {} failed: {:#}", model, e),
            }
        }
        PLACEHOLDER_IMAGE_URL.to_string()
    }

    pub async fn improve_text(
        &self,
        original: &str,
        context: &str,
        locale: Locale,
    ) -> Result<String, GenerationError> {
        let request = prompts::improve_request(original, context, locale)?;
        let text = self.run(&self.models.improve, request).await?;
        let text = text.trim();
        if text.is_empty() {
            return Err(GenerationError::Malformed("empty rewrite returned".to_string()));
        }
        Ok(text.to_string())
    }
}

fn parse_json<T: DeserializeOwned>(text: &str) -> Result<T, GenerationError> {
    serde_json::from_str(&strip_code_blocks(text))
        .map_err(|e| GenerationError::Malformed(e.to_string()))
}

fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase()
}

fn check_conformance(
    content: &ScenarioContent,
    player_count: PlayerCount,
) -> Result<(), GenerationError> {
    if content.joueurs.len() != player_count.get() {
        return Err(GenerationError::NonConforming(format!(
            "expected {} player characters, got {}",
            player_count,
            content.joueurs.len()
        )));
    }

    let names: Vec<String> = content.joueurs.iter().map(|pc| normalize_name(&pc.nom)).collect();
    if let Some(stray) = content
        .briefings
        .iter()
        .find(|b| !names.contains(&normalize_name(&b.pour_joueur)))
    {
        return Err(GenerationError::NonConforming(format!(
            "briefing addressed to unknown character \"{}\"",
            stray.pour_joueur
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::model::fixtures;
    use crate::services::testing::{decode_prompt, MockService};

    fn make_client(service: MockService) -> (GenerationClient, Arc<MockService>) {
        let service = Arc::new(service);
        let client = GenerationClient::new(
            service.clone(),
            ModelConfig::default(),
            ImageOptions::default(),
        );
        (client, service)
    }

    #[tokio::test]
    async fn test_fetch_ideas_keeps_first_five() {
        let answer = r#"```json
{"ideas": ["one", " two ", "", "three", "four", "five", "six"]}
```"#;
        let (client, service) = make_client(MockService::new().with_text(answer));

        let ideas = client.fetch_ideas(Locale::It, None).await.unwrap();
        assert_eq!(ideas, vec!["one", "two", "three", "four", "five"]);

        let calls = service.content_calls.lock().unwrap();
        assert_eq!(calls[0].model, "gemini-2.5-flash");
        assert!(calls[0].prompt.contains("Italian"));
        assert!(calls[0].schema.is_some());
    }

    #[tokio::test]
    async fn test_fetch_ideas_errors() {
        let (client, _) = make_client(
            MockService::new()
                .with_text(r#"{"ideas": []}"#)
                .with_text("not json")
                .with_failure("quota exceeded"),
        );

        assert!(matches!(
            client.fetch_ideas(Locale::En, None).await,
            Err(GenerationError::Malformed(_))
        ));
        assert!(matches!(
            client.fetch_ideas(Locale::En, None).await,
            Err(GenerationError::Malformed(_))
        ));
        match client.fetch_ideas(Locale::En, None).await {
            Err(GenerationError::Service(msg)) => assert!(msg.contains("quota exceeded")),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_fetch_scenario_for_each_player_count() {
        for count in PlayerCount::all() {
            let json = serde_json::to_string(&fixtures::content(count.get(), 5)).unwrap();
            let (client, service) = make_client(MockService::new().with_text(&json));

            let content = client
                .fetch_scenario("Find the cone", count, Locale::Fr)
                .await
                .unwrap();
            assert_eq!(content.joueurs.len(), count.get());
            assert_eq!(service.content_calls.lock().unwrap()[0].model, "gemini-2.5-pro");
        }
    }

    #[tokio::test]
    async fn test_fetch_scenario_rejects_wrong_player_count() {
        let json = serde_json::to_string(&fixtures::content(3, 5)).unwrap();
        let (client, _) = make_client(MockService::new().with_text(&json));

        let result = client
            .fetch_scenario("Find the cone", PlayerCount::new(4).unwrap(), Locale::En)
            .await;
        assert!(matches!(result, Err(GenerationError::NonConforming(_))));
    }

    #[tokio::test]
    async fn test_briefing_names_are_matched_loosely() {
        let mut content = fixtures::content(3, 5);
        content.briefings[0].pour_joueur = "  zap-r-ded-1 ".to_string();
        let loose = serde_json::to_string(&content).unwrap();

        content.briefings[1].pour_joueur = "Someone-R-ELS".to_string();
        let stray = serde_json::to_string(&content).unwrap();

        let (client, _) = make_client(MockService::new().with_text(&loose).with_text(&stray));
        let count = PlayerCount::new(3).unwrap();

        assert!(client.fetch_scenario("idea", count, Locale::En).await.is_ok());
        match client.fetch_scenario("idea", count, Locale::En).await {
            Err(GenerationError::NonConforming(msg)) => assert!(msg.contains("Someone-R-ELS")),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_fetch_scenario_rejects_empty_idea_without_calling() {
        let (client, service) = make_client(MockService::new());
        let result = client
            .fetch_scenario("   ", PlayerCount::new(3).unwrap(), Locale::En)
            .await;
        assert!(matches!(result, Err(GenerationError::Rejected(_))));
        assert!(service.content_calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_fetch_image_uses_primary_model() {
        let (client, service) = make_client(MockService::new().with_image_model("imagen-4.0-generate-001"));

        let url = client.fetch_image("a cone").await;
        assert!(url.starts_with("data:image/jpeg;base64,"));
        assert_eq!(decode_prompt(&url), "a cone");
        assert_eq!(service.image_calls.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_fetch_image_falls_back() {
        let (client, service) =
            make_client(MockService::new().with_image_model("gemini-2.5-flash-image-preview"));

        let url = client.fetch_image("a cone").await;
        assert_eq!(decode_prompt(&url), "a cone");

        let models: Vec<String> = service
            .image_calls
            .lock()
            .unwrap()
            .iter()
            .map(|(m, _)| m.clone())
            .collect();
        assert_eq!(
            models,
            vec!["imagen-4.0-generate-001", "gemini-2.5-flash-image-preview"]
        );
    }

    #[tokio::test]
    async fn test_fetch_image_falls_back_on_empty_result() {
        let (client, service) = make_client(
            MockService::new()
                .with_empty_model("imagen-4.0-generate-001")
                .with_image_model("gemini-2.5-flash-image-preview"),
        );

        let url = client.fetch_image("a cone").await;
        assert!(url.starts_with("data:image/jpeg;base64,"));
        assert_eq!(decode_prompt(&url), "a cone");

        let calls = service.image_calls.lock().unwrap();
        let models: Vec<&str> = calls.iter().map(|(m, _)| m.as_str()).collect();
        assert_eq!(
            models,
            vec!["imagen-4.0-generate-001", "gemini-2.5-flash-image-preview"]
        );
    }

    #[tokio::test]
    async fn test_fetch_image_placeholder_when_both_fail() {
        let (client, _) = make_client(MockService::new());
        assert_eq!(client.fetch_image("a cone").await, PLACEHOLDER_IMAGE_URL);
    }

    #[tokio::test]
    async fn test_improve_text_trims_answer() {
        let (client, service) = make_client(MockService::new().with_text("\n  Much longer text.  \n"));

        let text = client
            .improve_text("Short text.", "introduction", Locale::De)
            .await
            .unwrap();
        assert_eq!(text, "Much longer text.");
        let calls = service.content_calls.lock().unwrap();
        assert!(calls[0].schema.is_none());
        assert!(calls[0].prompt.contains("German"));
    }

    #[tokio::test]
    async fn test_improve_text_empty_answer_is_error() {
        let (client, _) = make_client(MockService::new().with_text("   "));
        assert!(client
            .improve_text("Short text.", "introduction", Locale::En)
            .await
            .is_err());
    }
}
