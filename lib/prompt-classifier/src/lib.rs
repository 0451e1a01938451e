mod classifier;
mod request;
mod response;

pub use classifier::{Classification, ClassificationStatus, Classifier, DegradeReason};
pub use request::ClassifierConfig;
pub use response::{Action, ZeroShotResponse, rank_actions};

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("AI classification timed out after {attempts} attempts")]
    Timeout { attempts: u32 },

    #[error("Failed to connect to AI service: {0}")]
    Network(#[source] reqwest::Error),

    #[error("Failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("Invalid classifier config: {0}")]
    InvalidConfig(String),

    #[error("Prompt is empty")]
    EmptyPrompt,
}
