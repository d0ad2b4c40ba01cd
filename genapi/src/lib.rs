use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

const IMAGE_SIZE: u32 = 512;
const SEED_MAX_LEN: usize = 64;

#[derive(Debug, Error)]
pub enum GenApiError {
    #[error("generation backend request failed")]
    Transport(#[from] reqwest::Error),
    #[error("generation backend answered with status {0}")]
    BackendStatus(u16),
    #[error("generation backend answered without an image url")]
    MissingImageUrl,
}

/// Boundary to whatever produces an image for a prompt. The workflow only
/// ever sees an opaque URL, so the backend can be swapped without touching
/// callers.
#[async_trait]
pub trait ImageGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, GenApiError>;
}

/// Derives a picsum.photos URL from the prompt and the current time.
/// The time component keeps repeated identical prompts from colliding
/// on the same cached image.
pub struct PlaceholderGenerator;

impl PlaceholderGenerator {
    pub fn image_url(prompt: &str, unix_millis: i64) -> String {
        format!(
            "https://picsum.photos/seed/{}-{}/{}/{}",
            seed_from_prompt(prompt),
            unix_millis,
            IMAGE_SIZE,
            IMAGE_SIZE
        )
    }
}

#[async_trait]
impl ImageGenerator for PlaceholderGenerator {
    async fn generate(&self, prompt: &str) -> Result<String, GenApiError> {
        Ok(Self::image_url(prompt, chrono::Utc::now().timestamp_millis()))
    }
}

fn seed_from_prompt(prompt: &str) -> String {
    let mut seed: String = prompt
        .chars()
        .take(SEED_MAX_LEN)
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
        .collect();
    if seed.is_empty() {
        seed.push('-');
    }
    seed
}

#[derive(Serialize)]
struct BackendRequest<'a> {
    prompt: &'a str,
    width: u32,
    height: u32,
}

#[derive(Deserialize)]
struct BackendResponse {
    image_url: Option<String>,
    url: Option<String>,
}

/// Calls a real generative backend over HTTP with a bearer credential.
pub struct BackendGenerator {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl BackendGenerator {
    pub fn new(endpoint: &str, api_key: &str, timeout_secs: u64) -> Result<Self, GenApiError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;
        Ok(Self {
            client,
            endpoint: endpoint.to_string(),
            api_key: api_key.to_string(),
        })
    }
}

#[async_trait]
impl ImageGenerator for BackendGenerator {
    async fn generate(&self, prompt: &str) -> Result<String, GenApiError> {
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&BackendRequest {
                prompt,
                width: IMAGE_SIZE,
                height: IMAGE_SIZE,
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            log::error!("Generation backend returned {status}");
            return Err(GenApiError::BackendStatus(status.as_u16()));
        }

        let body: BackendResponse = response.json().await?;
        body.image_url
            .or(body.url)
            .ok_or(GenApiError::MissingImageUrl)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seed_keeps_alphanumerics() {
        assert_eq!(seed_from_prompt("sunset"), "sunset");
        assert_eq!(seed_from_prompt("red Fox 7"), "red-Fox-7");
    }

    #[test]
    fn seed_replaces_non_ascii() {
        assert_eq!(seed_from_prompt("café ☀"), "caf---");
    }

    #[test]
    fn seed_never_empty() {
        assert_eq!(seed_from_prompt(""), "-");
    }

    #[test]
    fn seed_truncates_long_prompts() {
        let long = "a".repeat(500);
        assert_eq!(seed_from_prompt(&long).len(), SEED_MAX_LEN);
    }

    #[test]
    fn placeholder_url_shape() {
        let url = PlaceholderGenerator::image_url("sunset", 1700000000000);
        assert_eq!(url, "https://picsum.photos/seed/sunset-1700000000000/512/512");
    }

    #[test]
    fn placeholder_urls_differ_over_time() {
        let a = PlaceholderGenerator::image_url("sunset", 1);
        let b = PlaceholderGenerator::image_url("sunset", 2);
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn placeholder_generate_embeds_prompt_seed() {
        let url = PlaceholderGenerator.generate("a horse").await.unwrap();
        assert!(url.starts_with("https://picsum.photos/seed/a-horse-"));
        assert!(url.ends_with("/512/512"));
    }
}
