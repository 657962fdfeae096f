//! Submit-then-poll prediction client.
//!
//! A prediction is created with one `POST`, then its `urls.get` link is
//! polled at a fixed interval until the job reaches a terminal status or
//! the attempt ceiling is hit. Submission is retried on network failures;
//! polling never is, beyond continuing to the next attempt.

use async_trait::async_trait;
use nightjar_config::{PollingConfig, ProviderConfig};
use nightjar_core::error::{FailureKind, PredictionError};
use nightjar_core::job::{InferenceJob, JobStatus};
use nightjar_core::prediction::Predictor;
use nightjar_core::prompt::{BudgetedPrompt, ModelParams};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::retry::{FailureClassifier, RawFailure, RetryPolicy};
use crate::wire::{PredictionRequest, PredictionResponse, PredictionUrls, error_detail};

/// Client for a Replicate-compatible prediction API.
pub struct PredictionJobClient {
    client: reqwest::Client,
    base_url: String,
    endpoint: String,
    api_token: String,
    polling: PollingConfig,
    classifier: FailureClassifier,
    policy: RetryPolicy,
}

impl PredictionJobClient {
    pub fn new(
        provider: &ProviderConfig,
        api_token: impl Into<String>,
        polling: PollingConfig,
    ) -> Self {
        let client = reqwest::Client::builder()
            .timeout(provider.request_timeout())
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            base_url: provider.base_url.trim_end_matches('/').to_string(),
            endpoint: provider.predictions_url(),
            api_token: api_token.into(),
            policy: RetryPolicy::from_config(&polling),
            polling,
            classifier: FailureClassifier,
        }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Run a prediction to completion.
    pub async fn submit(
        &self,
        prompt: &BudgetedPrompt,
        params: &ModelParams,
    ) -> Result<String, PredictionError> {
        self.submit_with_cancel(prompt, params, &CancellationToken::new())
            .await
    }

    /// Run a prediction to completion, stopping early when `cancel` fires.
    ///
    /// Cancellation is checked before every poll and during submission
    /// retry delays. Either way it is reported as
    /// [`PredictionError::Timeout`]; a job that was already created also
    /// gets a best-effort remote cancel request.
    pub async fn submit_with_cancel(
        &self,
        prompt: &BudgetedPrompt,
        params: &ModelParams,
        cancel: &CancellationToken,
    ) -> Result<String, PredictionError> {
        let created = self.create_prediction(prompt, params, cancel).await?;
        let urls = created.urls.clone();
        let job = created.into_job();

        info!(
            job_id = %job.id,
            status = %job.status,
            prompt_tokens = prompt.estimated_tokens,
            "Prediction submitted"
        );

        if job.status.is_terminal() {
            return self.resolve(job);
        }

        self.poll(job, &urls, cancel).await
    }

    // ── Submission ────────────────────────────────────────────────────

    async fn create_prediction(
        &self,
        prompt: &BudgetedPrompt,
        params: &ModelParams,
        cancel: &CancellationToken,
    ) -> Result<PredictionResponse, PredictionError> {
        let body = PredictionRequest::new(prompt, params);
        let mut retries = 0;

        loop {
            let raw = match self.post_prediction(&body).await {
                Ok(created) => return Ok(created),
                Err(raw) => raw,
            };

            let kind = self.classifier.classify(&raw);
            let error = self.classifier.into_error(raw);
            if !self.policy.should_retry(kind, retries) {
                warn!(%kind, retries, error = %error, "Prediction submission failed");
                return Err(error);
            }

            retries += 1;
            warn!(
                %kind,
                retry = retries,
                max_retries = self.policy.max_retries,
                error = %error,
                "Prediction submission failed, retrying"
            );

            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    info!(retries, "Prediction cancelled before submission succeeded");
                    return Err(PredictionError::Timeout { attempts: 0 });
                }
                _ = tokio::time::sleep(self.policy.delay) => {}
            }
        }
    }

    async fn post_prediction(
        &self,
        body: &PredictionRequest<'_>,
    ) -> Result<PredictionResponse, RawFailure> {
        debug!(endpoint = %self.endpoint, "Creating prediction");

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_token)
            .json(body)
            .send()
            .await
            .map_err(|e| RawFailure::Transport(e.to_string()))?;

        Self::read_prediction(response).await
    }

    // ── Polling ───────────────────────────────────────────────────────

    async fn poll(
        &self,
        mut job: InferenceJob,
        urls: &PredictionUrls,
        cancel: &CancellationToken,
    ) -> Result<String, PredictionError> {
        let poll_url = urls
            .get
            .clone()
            .unwrap_or_else(|| format!("{}/predictions/{}", self.base_url, job.id));
        let max_attempts = self.polling.max_attempts;

        for attempt in 1..=max_attempts {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    info!(job_id = %job.id, attempt, "Prediction cancelled by caller");
                    self.cancel_remote(&job.id, urls).await;
                    return Err(self.classifier.into_error(RawFailure::Exhausted {
                        attempts: attempt - 1,
                    }));
                }
                _ = tokio::time::sleep(self.polling.poll_delay()) => {}
            }

            match self.get_prediction(&poll_url).await {
                Ok(next) => job = next.into_job(),
                Err(raw) => {
                    let kind = self.classifier.classify(&raw);
                    let error = self.classifier.into_error(raw);
                    if kind == FailureKind::Network {
                        warn!(job_id = %job.id, attempt, error = %error, "Poll request failed");
                        continue;
                    }
                    return Err(error);
                }
            }

            match &job.status {
                JobStatus::Starting | JobStatus::Processing => {
                    debug!(
                        job_id = %job.id,
                        attempt,
                        status = %job.status,
                        "Prediction in progress"
                    );
                }
                JobStatus::Unknown(raw) => {
                    warn!(
                        job_id = %job.id,
                        attempt,
                        status = %raw,
                        "Unrecognised prediction status, continuing to poll"
                    );
                }
                JobStatus::Succeeded | JobStatus::Failed | JobStatus::Canceled => {
                    debug!(job_id = %job.id, attempt, status = %job.status, "Prediction finished");
                    return self.resolve(job);
                }
            }
        }

        warn!(job_id = %job.id, max_attempts, "Prediction timed out");
        Err(self.classifier.into_error(RawFailure::Exhausted {
            attempts: max_attempts,
        }))
    }

    async fn get_prediction(&self, url: &str) -> Result<PredictionResponse, RawFailure> {
        let response = self
            .client
            .get(url)
            .bearer_auth(&self.api_token)
            .send()
            .await
            .map_err(|e| RawFailure::Transport(e.to_string()))?;

        Self::read_prediction(response).await
    }

    /// Ask the service to stop a job. Failures are logged and ignored.
    async fn cancel_remote(&self, job_id: &str, urls: &PredictionUrls) {
        let url = urls
            .cancel
            .clone()
            .unwrap_or_else(|| format!("{}/predictions/{}/cancel", self.base_url, job_id));

        match self
            .client
            .post(&url)
            .bearer_auth(&self.api_token)
            .send()
            .await
        {
            Ok(resp) if resp.status().is_success() => {
                debug!(job_id, "Remote prediction cancelled");
            }
            Ok(resp) => {
                warn!(job_id, status = resp.status().as_u16(), "Remote cancel rejected");
            }
            Err(e) => {
                warn!(job_id, error = %e, "Remote cancel failed");
            }
        }
    }

    // ── Response handling ─────────────────────────────────────────────

    async fn read_prediction(
        response: reqwest::Response,
    ) -> Result<PredictionResponse, RawFailure> {
        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .map_err(|e| RawFailure::Transport(e.to_string()))?;

        if status != 200 && status != 201 {
            return Err(RawFailure::Http {
                status,
                detail: error_detail(&text),
            });
        }

        serde_json::from_str(&text)
            .map_err(|e| RawFailure::Decode(format!("invalid prediction body: {e}")))
    }

    /// Turn a terminal job into its single outcome.
    fn resolve(&self, job: InferenceJob) -> Result<String, PredictionError> {
        match job.status {
            JobStatus::Succeeded => {
                let text = job.output.as_ref().and_then(|output| output.normalize());
                match text {
                    Some(text) => {
                        info!(job_id = %job.id, chars = text.len(), "Prediction succeeded");
                        Ok(text)
                    }
                    None => Err(self.classifier.into_error(RawFailure::Decode(format!(
                        "prediction {} succeeded with unsupported output: {:?}",
                        job.id, job.output
                    )))),
                }
            }
            status => {
                warn!(
                    job_id = %job.id,
                    %status,
                    error = job.error_message.as_deref().unwrap_or(""),
                    "Prediction did not succeed"
                );
                Err(self.classifier.into_error(RawFailure::Terminal {
                    status: status.to_string(),
                    error: job.error_message,
                    logs: job.logs,
                }))
            }
        }
    }
}

#[async_trait]
impl Predictor for PredictionJobClient {
    fn name(&self) -> &str {
        "replicate"
    }

    async fn predict(
        &self,
        prompt: &BudgetedPrompt,
        params: &ModelParams,
    ) -> Result<String, PredictionError> {
        self.submit(prompt, params).await
    }
}
