use crate::{
    config::Config,
    logic::{ActionMapper, BackgroundRemoval, OnnxBackgroundRemover, Storage},
};
use anyhow::{Context, Result};
use background_remover::Model;
use prompt_classifier::Classifier;
use std::sync::Arc;

pub type AppState = Arc<State>;

pub struct State {
    pub config: Config,
    pub storage: Storage,
    pub classifier: Classifier,
    pub mapper: ActionMapper,
}

impl State {
    pub fn new(config: Config) -> Result<Self> {
        let model = config
            .background_remover
            .model
            .parse::<Model>()
            .with_context(|| "invalid background_remover.model")?;

        let remover = Arc::new(OnnxBackgroundRemover::new(
            model,
            config.background_remover.model_path.clone(),
        ));

        Self::with_remover(config, remover)
    }

    /// Builds the state around a given background-removal implementation.
    pub fn with_remover(config: Config, remover: Arc<dyn BackgroundRemoval>) -> Result<Self> {
        let classifier = Classifier::new(config.classifier.clone())
            .with_context(|| "create prompt classifier failed")?;
        let storage = Storage::new(
            config.server.upload_dir.clone(),
            config.server.processed_dir.clone(),
        );
        let mapper = ActionMapper::new(config.adjustment.decrease_floor, remover);

        Ok(Self {
            config,
            storage,
            classifier,
            mapper,
        })
    }
}
