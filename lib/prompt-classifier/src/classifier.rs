use crate::{
    Error, Result,
    request::{ClassifierConfig, ZeroShotRequest},
    response::{Action, ZeroShotResponse, rank_actions},
};
use reqwest::{
    Client, StatusCode,
    header::{AUTHORIZATION, HeaderMap, HeaderValue},
};
use std::fmt;

const LOG_BODY_MAX_CHARS: usize = 512;

/// Why a classification produced no actions without failing the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DegradeReason {
    MalformedResponse,
    Rejected { status: u16 },
    RetriesExhausted { attempts: u32 },
}

impl fmt::Display for DegradeReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MalformedResponse => write!(f, "malformed response"),
            Self::Rejected { status } if *status == 401 || *status == 403 => {
                write!(f, "rejected with status {status}, check the API token permissions")
            }
            Self::Rejected { status } => write!(f, "rejected with status {status}"),
            Self::RetriesExhausted { attempts } => {
                write!(f, "model still loading after {attempts} attempts")
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassificationStatus {
    Classified,
    Degraded(DegradeReason),
}

impl fmt::Display for ClassificationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Classified => write!(f, "classified"),
            Self::Degraded(reason) => write!(f, "degraded: {reason}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    pub actions: Vec<Action>,
    pub status: ClassificationStatus,
}

impl Classification {
    fn classified(actions: Vec<Action>) -> Self {
        Self {
            actions,
            status: ClassificationStatus::Classified,
        }
    }

    fn degraded(reason: DegradeReason) -> Self {
        log::warn!("AI classification degraded to no actions: {reason}");

        Self {
            actions: vec![],
            status: ClassificationStatus::Degraded(reason),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Classifier {
    config: ClassifierConfig,
    http: Client,
}

impl Classifier {
    pub fn new(config: ClassifierConfig) -> Result<Self> {
        config.validate()?;

        if config.api_key.trim().is_empty() {
            log::warn!("classifier api_key is empty, requests will likely be rejected");
        }

        let http = Client::builder()
            .timeout(config.timeout())
            .default_headers(Self::headers(&config))
            .build()
            .map_err(Error::Client)?;

        Ok(Self { config, http })
    }

    fn headers(config: &ClassifierConfig) -> HeaderMap {
        let mut headers = HeaderMap::new();
        let api_key = config.api_key.trim();
        if !api_key.is_empty() {
            match HeaderValue::from_str(&format!("Bearer {api_key}")) {
                Ok(mut value) => {
                    value.set_sensitive(true);
                    headers.insert(AUTHORIZATION, value);
                }
                Err(e) => log::warn!("classifier api_key is not a valid header value: {e}"),
            }
        }

        headers
    }

    /// Ranked actions for `prompt`. Degraded outcomes yield an empty list.
    pub async fn classify(&self, prompt: &str) -> Result<Vec<Action>> {
        Ok(self.classify_detailed(prompt).await?.actions)
    }

    pub async fn classify_detailed(&self, prompt: &str) -> Result<Classification> {
        let prompt = prompt.trim();
        if prompt.is_empty() {
            return Err(Error::EmptyPrompt);
        }

        let request = ZeroShotRequest::new(prompt, &self.config.labels);
        let attempts = self.config.max_retries.saturating_add(1);

        for attempt in 0..attempts {
            let is_last = attempt + 1 == attempts;
            log::debug!("classify attempt {}/{attempts}: {prompt:?}", attempt + 1);

            let (status, body) = match self.send(&request).await {
                Ok(reply) => reply,
                Err(e) if e.is_timeout() => {
                    if is_last {
                        return Err(Error::Timeout { attempts });
                    }
                    log::warn!("AI request timed out (attempt {}/{attempts})", attempt + 1);
                    continue;
                }
                Err(e) => {
                    if is_last {
                        return Err(Error::Network(e));
                    }
                    log::warn!("AI network error (attempt {}/{attempts}): {e}", attempt + 1);
                    continue;
                }
            };

            if status.is_success() {
                let Some(response) = ZeroShotResponse::parse(&body) else {
                    log::debug!("{}", truncate(&body));
                    return Ok(Classification::degraded(DegradeReason::MalformedResponse));
                };

                let actions = rank_actions(
                    response.into_pairs(),
                    self.config.confidence_threshold,
                    &self.config.no_change_label,
                );

                log::info!("AI classified prompt {prompt:?}, found {} actions", actions.len());
                for action in actions.iter() {
                    log::info!(" - {} (confidence: {:.2})", action.label, action.confidence);
                }

                return Ok(Classification::classified(actions));
            }

            if status == StatusCode::SERVICE_UNAVAILABLE {
                if is_last {
                    break;
                }

                let delay = self.config.backoff_delay(attempt);
                log::info!("model is loading, waiting {delay:?} before retrying");
                tokio::time::sleep(delay).await;
                continue;
            }

            log::debug!("{}", truncate(&body));
            return Ok(Classification::degraded(DegradeReason::Rejected {
                status: status.as_u16(),
            }));
        }

        Ok(Classification::degraded(DegradeReason::RetriesExhausted {
            attempts,
        }))
    }

    async fn send(
        &self,
        request: &ZeroShotRequest<'_>,
    ) -> std::result::Result<(StatusCode, String), reqwest::Error> {
        let response = self
            .http
            .post(&self.config.api_url)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        Ok((status, body))
    }
}

fn truncate(body: &str) -> String {
    if body.chars().count() <= LOG_BODY_MAX_CHARS {
        return body.to_string();
    }

    let mut text = body.chars().take(LOG_BODY_MAX_CHARS).collect::<String>();
    text.push_str("...");
    text
}
