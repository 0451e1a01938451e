use derivative::Derivative;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Serialize, Deserialize, Debug, Clone, Derivative)]
#[derivative(Default)]
#[serde(default)]
pub struct ClassifierConfig {
    #[derivative(Default(
        value = "\"https://api-inference.huggingface.co/models/facebook/bart-large-mnli\".to_string()"
    ))]
    pub api_url: String,

    pub api_key: String,

    #[derivative(Default(value = "default_labels()"))]
    pub labels: Vec<String>,

    // always dropped from the ranked actions
    #[derivative(Default(value = "\"no change needed\".to_string()"))]
    pub no_change_label: String,

    #[derivative(Default(value = "0.3"))]
    pub confidence_threshold: f32,

    #[derivative(Default(value = "10"))]
    pub timeout_secs: u64,

    #[derivative(Default(value = "3"))]
    pub max_retries: u32,

    #[derivative(Default(value = "1000"))]
    pub retry_base_delay_ms: u64,
}

impl ClassifierConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Delay before the attempt following `attempt` (0-based): base, 2*base, 4*base, ...
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        Duration::from_millis(
            self.retry_base_delay_ms
                .saturating_mul(2u64.saturating_pow(attempt)),
        )
    }

    pub fn validate(&self) -> crate::Result<()> {
        if self.api_url.trim().is_empty() {
            return Err(crate::Error::InvalidConfig("api_url is empty".to_string()));
        }

        if self.labels.is_empty() {
            return Err(crate::Error::InvalidConfig(
                "label catalog is empty".to_string(),
            ));
        }

        if !(0.0..=1.0).contains(&self.confidence_threshold) {
            return Err(crate::Error::InvalidConfig(format!(
                "confidence_threshold {} is outside [0, 1]",
                self.confidence_threshold
            )));
        }

        Ok(())
    }
}

fn default_labels() -> Vec<String> {
    [
        "increase brightness",
        "decrease brightness",
        "increase contrast",
        "decrease contrast",
        "increase saturation",
        "decrease saturation",
        "remove background",
        "no change needed",
    ]
    .iter()
    .map(|label| label.to_string())
    .collect()
}

#[derive(Serialize, Debug, Clone)]
pub(crate) struct ZeroShotRequest<'a> {
    pub inputs: &'a str,
    pub parameters: Parameters<'a>,
    pub options: Options,
}

#[derive(Serialize, Debug, Clone)]
pub(crate) struct Parameters<'a> {
    pub candidate_labels: &'a [String],
}

#[derive(Serialize, Debug, Clone)]
pub(crate) struct Options {
    pub wait_for_model: bool,
}

impl<'a> ZeroShotRequest<'a> {
    pub fn new(prompt: &'a str, labels: &'a [String]) -> Self {
        Self {
            inputs: prompt,
            parameters: Parameters {
                candidate_labels: labels,
            },
            options: Options {
                wait_for_model: true,
            },
        }
    }
}
