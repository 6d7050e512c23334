use crate::core::model::{GeneratedImage, Scenario, ScenarioContent};
use crate::services::generation::GenerationClient;
use futures_util::stream::{self, StreamExt};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Resolves every image prompt of `content` and joins the results into a
/// [`Scenario`]. Images keep the order of their prompts whatever order the
/// requests finish in. `on_progress` gets `(done, total)` after each image.
///
/// `concurrency` caps the number of requests in flight; `None` sends them
/// all at once.
pub async fn assemble<F>(
    client: &GenerationClient,
    content: ScenarioContent,
    concurrency: Option<usize>,
    on_progress: F,
) -> Scenario
where
    F: Fn(usize, usize) + Sync,
{
    let requests = content.image_requests();
    let total = requests.len();
    if total == 0 {
        return Scenario::new(content, Vec::new());
    }

    let max_concurrency = concurrency.filter(|n| *n > 0).unwrap_or(total);
    log::info!("Generating {} image(s), {} at a time", total, max_concurrency);

    let done = AtomicUsize::new(0);
    let done_ref = &done;
    let on_progress_ref = &on_progress;

    let prompts: Vec<String> = requests.iter().map(|r| r.prompt.clone()).collect();
    let results: Vec<(usize, String)> = stream::iter(prompts.into_iter().enumerate())
        .map(|(i, prompt)| async move {
            let url = client.fetch_image(&prompt).await;
            let finished = done_ref.fetch_add(1, Ordering::SeqCst) + 1;
            on_progress_ref(finished, total);
            (i, url)
        })
        .buffer_unordered(max_concurrency)
        .collect()
        .await;

    let mut urls = vec![String::new(); total];
    for (i, url) in results {
        urls[i] = url;
    }

    let images = requests
        .into_iter()
        .zip(urls)
        .map(|(request, url)| GeneratedImage {
            titre: request.titre,
            url,
        })
        .collect();
    Scenario::new(content, images)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::ModelConfig;
    use crate::core::model::{fixtures, ImagePrompt};
    use crate::services::generation::PLACEHOLDER_IMAGE_URL;
    use crate::services::llm::ImageOptions;
    use crate::services::testing::{decode_prompt, MockService};
    use std::sync::{Arc, Mutex};

    fn make_client(service: MockService) -> GenerationClient {
        GenerationClient::new(
            Arc::new(service),
            ModelConfig::default(),
            ImageOptions::default(),
        )
    }

    fn gallery(n: usize) -> Vec<ImagePrompt> {
        (0..n)
            .map(|i| ImagePrompt {
                titre: format!("Image {}", i + 1),
                prompt: format!("prompt {}", i + 1),
            })
            .collect()
    }

    #[tokio::test]
    async fn test_gallery_order_survives_shuffled_completion() {
        let service = MockService::new()
            .with_image_model("imagen-4.0-generate-001")
            .with_delay("prompt 1", 60)
            .with_delay("prompt 2", 5)
            .with_delay("prompt 3", 30);
        let client = make_client(service);

        let mut content = fixtures::content(3, 5);
        content.images_prompts = gallery(4);

        let progress = Mutex::new(Vec::new());
        let scenario = assemble(&client, content, None, |done, total| {
            progress.lock().unwrap().push((done, total));
        })
        .await;

        let titles: Vec<&str> = scenario.images.iter().map(|i| i.titre.as_str()).collect();
        assert_eq!(titles, vec!["Image 1", "Image 2", "Image 3", "Image 4"]);
        for (i, image) in scenario.images.iter().enumerate() {
            assert_eq!(decode_prompt(&image.url), format!("prompt {}", i + 1));
        }
        assert!(scenario.cover_image.is_none());
        assert_eq!(
            progress.into_inner().unwrap(),
            vec![(1, 4), (2, 4), (3, 4), (4, 4)]
        );
    }

    #[tokio::test]
    async fn test_cover_variant_sets_cover_image() {
        let client = make_client(MockService::new().with_image_model("imagen-4.0-generate-001"));
        let content = fixtures::content(3, 5);

        let scenario = assemble(&client, content, Some(2), |_, _| {}).await;

        assert_eq!(scenario.images.len(), 1);
        assert_eq!(scenario.images[0].titre, "The Cone of Silence!");
        assert_eq!(scenario.cover_image.as_deref(), Some(scenario.images[0].url.as_str()));
    }

    #[tokio::test]
    async fn test_failed_images_become_placeholders() {
        let client = make_client(MockService::new());
        let mut content = fixtures::content(3, 5);
        content.images_prompts = gallery(2);

        let scenario = assemble(&client, content, Some(1), |_, _| {}).await;

        assert_eq!(scenario.images.len(), 2);
        assert!(scenario.images.iter().all(|i| i.url == PLACEHOLDER_IMAGE_URL));
    }

    #[tokio::test]
    async fn test_no_prompts_no_images() {
        let client = make_client(MockService::new());
        let mut content = fixtures::content(3, 5);
        content.image_prompt = None;

        let scenario = assemble(&client, content, None, |_, _| {}).await;
        assert!(scenario.images.is_empty());
        assert!(scenario.cover_image.is_none());
    }
}
