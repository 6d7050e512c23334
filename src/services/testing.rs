use crate::services::llm::{ContentRequest, GenerationService, ImageOptions, InlineImage};
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;

/// Scripted service: text answers are served in order, image models listed
/// in `working_models` answer with the prompt itself as the image payload
/// and those in `empty_models` answer with no image at all.
#[derive(Debug, Default)]
pub struct MockService {
    texts: Mutex<VecDeque<Result<String, String>>>,
    working_models: HashSet<String>,
    empty_models: HashSet<String>,
    delays: HashMap<String, u64>,
    gate: Option<Arc<Notify>>,
    pub content_calls: Arc<Mutex<Vec<ContentRequest>>>,
    pub image_calls: Arc<Mutex<Vec<(String, String)>>>,
}

impl MockService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_text(self, text: &str) -> Self {
        self.texts.lock().unwrap().push_back(Ok(text.to_string()));
        self
    }

    pub fn with_failure(self, message: &str) -> Self {
        self.texts.lock().unwrap().push_back(Err(message.to_string()));
        self
    }

    pub fn with_image_model(mut self, model: &str) -> Self {
        self.working_models.insert(model.to_string());
        self
    }

    pub fn with_empty_model(mut self, model: &str) -> Self {
        self.empty_models.insert(model.to_string());
        self
    }

    pub fn with_delay(mut self, prompt: &str, millis: u64) -> Self {
        self.delays.insert(prompt.to_string(), millis);
        self
    }

    /// Text requests wait until the gate is notified.
    pub fn with_gate(mut self, gate: Arc<Notify>) -> Self {
        self.gate = Some(gate);
        self
    }
}

pub fn decode_prompt(data_uri: &str) -> String {
    let (_, payload) = data_uri.split_once(',').unwrap();
    String::from_utf8(STANDARD.decode(payload).unwrap()).unwrap()
}

#[async_trait]
impl GenerationService for MockService {
    async fn generate_content(&self, request: &ContentRequest) -> Result<String> {
        self.content_calls.lock().unwrap().push(request.clone());
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        let next = self.texts.lock().unwrap().pop_front();
        match next {
            Some(Ok(text)) => Ok(text),
            Some(Err(message)) => Err(anyhow!(message)),
            None => Err(anyhow!("no scripted response left")),
        }
    }

    async fn generate_images(
        &self,
        model: &str,
        prompt: &str,
        options: &ImageOptions,
    ) -> Result<Vec<InlineImage>> {
        self.image_calls
            .lock()
            .unwrap()
            .push((model.to_string(), prompt.to_string()));
        if let Some(millis) = self.delays.get(prompt) {
            tokio::time::sleep(Duration::from_millis(*millis)).await;
        }
        if self.empty_models.contains(model) {
            Ok(Vec::new())
        } else if self.working_models.contains(model) {
            Ok(vec![InlineImage {
                mime_type: options.mime_type.clone(),
                data: STANDARD.encode(prompt),
            }])
        } else {
            Err(anyhow!("model {} unavailable", model))
        }
    }
}
