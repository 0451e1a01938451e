use crate::logic::action_mapper::BackgroundRemoval;
use background_remover::{BackgroundRemover, Model};
use std::{
    path::PathBuf,
    sync::{Mutex, MutexGuard},
};

/// ONNX matting model loaded on first use.
///
/// An ort session runs one inference at a time, so calls are serialized.
#[derive(Debug)]
pub struct OnnxBackgroundRemover {
    model: Model,
    model_path: PathBuf,
    inner: Mutex<Option<BackgroundRemover>>,
}

impl OnnxBackgroundRemover {
    pub fn new(model: Model, model_path: impl Into<PathBuf>) -> Self {
        let model_path = model_path.into();
        if !model_path.exists() {
            log::warn!(
                "{model} not found at {}, background removal will fail until it is downloaded from {}",
                model_path.display(),
                model.download_url()
            );
        }

        Self {
            model,
            model_path,
            inner: Mutex::new(None),
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.lock().is_some()
    }

    fn lock(&self) -> MutexGuard<'_, Option<BackgroundRemover>> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl BackgroundRemoval for OnnxBackgroundRemover {
    fn remove_background(&self, png: &[u8]) -> background_remover::Result<Vec<u8>> {
        let mut guard = self.lock();

        let mut remover = match guard.take() {
            Some(remover) => remover,
            None => BackgroundRemover::new(self.model, &self.model_path)?,
        };

        let output = remover.remove_encoded(png);
        *guard = Some(remover);
        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_model_fails_without_loading() {
        let remover = OnnxBackgroundRemover::new(Model::U2NET, "/nonexistent/u2net.onnx");

        let err = remover.remove_background(&[]).unwrap_err();
        assert!(matches!(err, background_remover::Error::ModelNotFound(_)));
        assert!(!remover.is_loaded());
    }
}
