use crate::core::config::Config;
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt::Debug;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

const HARM_CATEGORIES: [&str; 4] = [
    "HARM_CATEGORY_HARASSMENT",
    "HARM_CATEGORY_HATE_SPEECH",
    "HARM_CATEGORY_SEXUALLY_EXPLICIT",
    "HARM_CATEGORY_DANGEROUS_CONTENT",
];

#[derive(Debug, Clone, PartialEq)]
pub struct ContentRequest {
    pub model: String,
    pub prompt: String,
    /// When set, the model is asked for JSON matching this schema.
    pub schema: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageOptions {
    pub aspect_ratio: String,
    pub mime_type: String,
}

impl Default for ImageOptions {
    fn default() -> Self {
        Self {
            aspect_ratio: "16:9".to_string(),
            mime_type: "image/jpeg".to_string(),
        }
    }
}

/// Raw image as returned by the service: MIME type plus base64 payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineImage {
    pub mime_type: String,
    pub data: String,
}

impl InlineImage {
    pub fn data_uri(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.data)
    }
}

#[async_trait]
pub trait GenerationService: Send + Sync + Debug {
    async fn generate_content(&self, request: &ContentRequest) -> Result<String>;
    async fn generate_images(
        &self,
        model: &str,
        prompt: &str,
        options: &ImageOptions,
    ) -> Result<Vec<InlineImage>>;
}

pub fn create_service(config: &Config) -> Result<Arc<dyn GenerationService>> {
    let api_key = config
        .api_key
        .as_deref()
        .filter(|k| !k.trim().is_empty())
        .context("Gemini API key missing")?;
    let timeout = config.request_timeout_seconds.map(Duration::from_secs);
    Ok(Arc::new(GeminiService::new(
        api_key,
        &config.base_url,
        timeout,
        config.safety_threshold.clone(),
    )?))
}

// --- Gemini ---
#[derive(Debug)]
pub struct GeminiService {
    api_key: String,
    base_url: Url,
    safety_threshold: Option<String>,
    client: reqwest::Client,
}

impl GeminiService {
    pub fn new(
        api_key: &str,
        base_url: &str,
        timeout: Option<Duration>,
        safety_threshold: Option<String>,
    ) -> Result<Self> {
        let mut base = base_url.trim().to_string();
        if !base.ends_with('/') {
            base.push('/');
        }
        let base_url = Url::parse(&base).with_context(|| format!("Invalid base_url: {}", base))?;

        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            api_key: api_key.trim().to_string(),
            base_url,
            safety_threshold,
            client: builder.build()?,
        })
    }

    fn endpoint(&self, model: &str, method: &str) -> Result<Url> {
        Ok(self.base_url.join(&format!("models/{}:{}", model, method))?)
    }

    fn safety_settings(&self) -> Vec<SafetySetting<'_>> {
        match self.safety_threshold.as_deref() {
            Some(threshold) => HARM_CATEGORIES
                .iter()
                .map(|&category| SafetySetting {
                    category,
                    threshold,
                })
                .collect(),
            None => Vec::new(),
        }
    }

    async fn post<T: Serialize + ?Sized>(&self, url: Url, body: &T) -> Result<String> {
        log::debug!("POST {}", url);
        let resp = self
            .client
            .post(url)
            .header("x-goog-api-key", &self.api_key)
            .json(body)
            .send()
            .await?;

        let status = resp.status();
        let response_text = resp.text().await?;
        if !status.is_success() {
            let message = serde_json::from_str::<ErrorEnvelope>(&response_text)
                .ok()
                .and_then(|e| e.error)
                .map(|e| e.message)
                .unwrap_or(response_text);
            return Err(anyhow!("Gemini API error ({}): {}", status, message));
        }
        Ok(response_text)
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<RequestContent<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig<'a>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    safety_settings: Vec<SafetySetting<'a>>,
}

#[derive(Serialize)]
struct RequestContent<'a> {
    role: &'a str,
    parts: Vec<RequestPart<'a>>,
}

#[derive(Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Serialize, Default)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_schema: Option<&'a Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_modalities: Option<Vec<&'a str>>,
}

#[derive(Serialize)]
struct SafetySetting<'a> {
    category: &'a str,
    threshold: &'a str,
}

#[derive(Serialize)]
struct PredictRequest<'a> {
    instances: Vec<PredictInstance<'a>>,
    parameters: PredictParameters<'a>,
}

#[derive(Serialize)]
struct PredictInstance<'a> {
    prompt: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PredictParameters<'a> {
    sample_count: u32,
    aspect_ratio: &'a str,
    output_mime_type: &'a str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    candidates: Option<Vec<GeminiCandidate>>,
    prompt_feedback: Option<PromptFeedback>,
    error: Option<GeminiError>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

#[derive(Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiContentResponse>,
    #[serde(rename = "finishReason")]
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct GeminiContentResponse {
    #[serde(default)]
    parts: Vec<GeminiPartResponse>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiPartResponse {
    text: Option<String>,
    inline_data: Option<InlineData>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Deserialize, Debug)]
struct GeminiError {
    message: String,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: Option<GeminiError>,
}

#[derive(Deserialize)]
struct PredictResponse {
    #[serde(default)]
    predictions: Vec<Prediction>,
    error: Option<GeminiError>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Prediction {
    bytes_base64_encoded: Option<String>,
    mime_type: Option<String>,
    rai_filtered_reason: Option<String>,
}

fn parse_content_response(response_text: &str) -> Result<Vec<GeminiPartResponse>> {
    let result: GeminiResponse = serde_json::from_str(response_text)
        .map_err(|e| anyhow!("Failed to parse Gemini response: {}. Body: {}", e, response_text))?;

    if let Some(err) = result.error {
        return Err(anyhow!("Gemini API returned error: {}", err.message));
    }
    if let Some(reason) = result.prompt_feedback.and_then(|f| f.block_reason) {
        return Err(anyhow!("Gemini blocked the prompt: {}", reason));
    }

    let first = result
        .candidates
        .and_then(|c| c.into_iter().next())
        .ok_or_else(|| anyhow!("Gemini response has no candidates"))?;

    match first.content {
        Some(content) if !content.parts.is_empty() => Ok(content.parts),
        _ => {
            let reason = first.finish_reason.as_deref().unwrap_or("UNKNOWN");
            Err(anyhow!("Gemini response empty. Finish reason: {}", reason))
        }
    }
}

fn extract_text(response_text: &str) -> Result<String> {
    let text: String = parse_content_response(response_text)?
        .into_iter()
        .filter_map(|p| p.text)
        .collect();
    if text.trim().is_empty() {
        return Err(anyhow!("Gemini response contains no text"));
    }
    Ok(text)
}

fn extract_inline_images(response_text: &str) -> Result<Vec<InlineImage>> {
    Ok(parse_content_response(response_text)?
        .into_iter()
        .filter_map(|p| p.inline_data)
        .map(|d| InlineImage {
            mime_type: d.mime_type,
            data: d.data,
        })
        .collect())
}

fn extract_predictions(response_text: &str, default_mime: &str) -> Result<Vec<InlineImage>> {
    let result: PredictResponse = serde_json::from_str(response_text)
        .map_err(|e| anyhow!("Failed to parse Imagen response: {}. Body: {}", e, response_text))?;
    if let Some(err) = result.error {
        return Err(anyhow!("Imagen API returned error: {}", err.message));
    }

    Ok(result
        .predictions
        .into_iter()
        .filter_map(|p| {
            if let Some(reason) = &p.rai_filtered_reason {
                log::warn!("Imagen filtered an image: {}", reason);
            }
            let data = p.bytes_base64_encoded?;
            Some(InlineImage {
                mime_type: p.mime_type.unwrap_or_else(|| default_mime.to_string()),
                data,
            })
        })
        .collect())
}

/// Imagen models live behind `:predict`; everything else is a Gemini model
/// that answers with inline image parts.
fn is_imagen_model(model: &str) -> bool {
    model.starts_with("imagen")
}

#[async_trait]
impl GenerationService for GeminiService {
    async fn generate_content(&self, request: &ContentRequest) -> Result<String> {
        let url = self.endpoint(&request.model, "generateContent")?;
        let generation_config = request.schema.as_ref().map(|schema| GenerationConfig {
            response_mime_type: Some("application/json"),
            response_schema: Some(schema),
            ..Default::default()
        });

        let body = GenerateContentRequest {
            contents: vec![RequestContent {
                role: "user",
                parts: vec![RequestPart {
                    text: &request.prompt,
                }],
            }],
            generation_config,
            safety_settings: self.safety_settings(),
        };

        let response_text = self.post(url, &body).await?;
        extract_text(&response_text)
    }

    async fn generate_images(
        &self,
        model: &str,
        prompt: &str,
        options: &ImageOptions,
    ) -> Result<Vec<InlineImage>> {
        if is_imagen_model(model) {
            let url = self.endpoint(model, "predict")?;
            let body = PredictRequest {
                instances: vec![PredictInstance { prompt }],
                parameters: PredictParameters {
                    sample_count: 1,
                    aspect_ratio: &options.aspect_ratio,
                    output_mime_type: &options.mime_type,
                },
            };
            let response_text = self.post(url, &body).await?;
            extract_predictions(&response_text, &options.mime_type)
        } else {
            let url = self.endpoint(model, "generateContent")?;
            let body = GenerateContentRequest {
                contents: vec![RequestContent {
                    role: "user",
                    parts: vec![RequestPart { text: prompt }],
                }],
                generation_config: Some(GenerationConfig {
                    response_modalities: Some(vec!["TEXT", "IMAGE"]),
                    ..Default::default()
                }),
                safety_settings: self.safety_settings(),
            };
            let response_text = self.post(url, &body).await?;
            extract_inline_images(&response_text)
        }
    }
}
