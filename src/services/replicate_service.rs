use crate::{
    config::ReplicateConfig,
    error::{ApiError, Result},
};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

/// HTTP client for the remote training provider (Replicate API).
pub struct ReplicateService {
    config: ReplicateConfig,
    http_client: reqwest::Client,
}

#[derive(Debug, Serialize)]
struct CreateModelRequest<'a> {
    owner: &'a str,
    name: &'a str,
    visibility: &'a str,
    hardware: &'a str,
}

#[derive(Debug, Serialize)]
struct CreateTrainingRequest<'a> {
    destination: String,
    input: TrainingInput<'a>,
    webhook: &'a str,
    webhook_events_filter: Vec<&'a str>,
}

#[derive(Debug, Serialize)]
struct TrainingInput<'a> {
    steps: i32,
    resolution: &'a str,
    input_images: &'a str,
    trigger_word: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct TrainingCreated {
    pub id: String,
    /// Absent when the provider has not scheduled the run yet.
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WebhookSecretResponse {
    key: String,
}

impl ReplicateService {
    pub fn new(config: &ReplicateConfig) -> Self {
        let http_client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_millis(config.request_timeout_ms))
            .connect_timeout(std::time::Duration::from_secs(10))
            .build()
            .expect("Failed to build HTTP client");

        Self {
            config: config.clone(),
            http_client,
        }
    }

    /// Create a private model namespace that will receive the trained version.
    #[instrument(skip(self))]
    pub async fn create_model(&self, model_id: &str) -> Result<()> {
        let url = format!("{}/v1/models", self.config.api_base);
        let request = CreateModelRequest {
            owner: &self.config.model_owner,
            name: model_id,
            visibility: "private",
            hardware: &self.config.hardware,
        };

        let response = self
            .http_client
            .post(&url)
            .bearer_auth(&self.config.api_token)
            .json(&request)
            .send()
            .await
            .map_err(|e| ApiError::Provider(format!("Failed to create model: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Provider(format!(
                "Model creation returned {}: {}",
                status, body
            )));
        }

        info!(
            "Created provider model {}/{}",
            self.config.model_owner, model_id
        );

        Ok(())
    }

    /// Start a training run against the pinned trainer, targeting the given
    /// model namespace. The provider reads the training archive from
    /// `input_images_url` and posts completion to `webhook_url`.
    #[instrument(skip(self, input_images_url, webhook_url))]
    pub async fn create_training(
        &self,
        model_id: &str,
        steps: i32,
        resolution: &str,
        trigger_word: &str,
        input_images_url: &str,
        webhook_url: &str,
    ) -> Result<TrainingCreated> {
        let trainer = &self.config.trainer;
        let url = format!(
            "{}/v1/models/{}/{}/versions/{}/trainings",
            self.config.api_base, trainer.owner, trainer.name, trainer.version
        );

        let request = CreateTrainingRequest {
            destination: format!("{}/{}", self.config.model_owner, model_id),
            input: TrainingInput {
                steps,
                resolution,
                input_images: input_images_url,
                trigger_word,
            },
            webhook: webhook_url,
            webhook_events_filter: vec!["completed"],
        };

        let response = self
            .http_client
            .post(&url)
            .bearer_auth(&self.config.api_token)
            .json(&request)
            .send()
            .await
            .map_err(|e| ApiError::Provider(format!("Failed to start training: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Provider(format!(
                "Training creation returned {}: {}",
                status, body
            )));
        }

        let training: TrainingCreated = response
            .json()
            .await
            .map_err(|e| ApiError::Provider(format!("Invalid training response: {}", e)))?;

        info!(
            "Started training {} for model {} (status: {})",
            training.id,
            model_id,
            training.status.as_deref().unwrap_or("pending")
        );

        Ok(training)
    }

    /// Fetch the current default webhook signing secret.
    ///
    /// Fetched per verification rather than cached for process lifetime, the
    /// provider rotates it.
    #[instrument(skip(self))]
    pub async fn get_webhook_secret(&self) -> Result<String> {
        let url = format!("{}/v1/webhooks/default/secret", self.config.api_base);

        let response = self
            .http_client
            .get(&url)
            .bearer_auth(&self.config.api_token)
            .send()
            .await
            .map_err(|e| ApiError::Provider(format!("Failed to fetch webhook secret: {}", e)))?;

        if response.status() == StatusCode::UNAUTHORIZED {
            return Err(ApiError::Provider(
                "Provider rejected API token while fetching webhook secret".to_string(),
            ));
        }

        if !response.status().is_success() {
            return Err(ApiError::Provider(format!(
                "Webhook secret fetch returned {}",
                response.status()
            )));
        }

        let secret: WebhookSecretResponse = response
            .json()
            .await
            .map_err(|e| ApiError::Provider(format!("Invalid webhook secret response: {}", e)))?;

        Ok(secret.key)
    }
}
