pub mod action_mapper;
pub mod codec;
pub mod remover;
pub mod storage;

pub use action_mapper::{ActionMapper, AdjustmentRecord, BackgroundRemoval, EditAction, MappedImage};
pub use remover::OnnxBackgroundRemover;
pub use storage::Storage;
