//! Animal photo classification as a Spin HTTP component.
//!
//! A photo goes through an image classification model, the top label is
//! mapped onto a small knowledge base of animals, and the caller gets back a
//! card with a description, safety tips and a few simulated scores.

pub mod category;
pub mod component;
pub mod config;
pub mod inference;
pub mod knowledge;
pub mod result;
pub mod scores;
pub mod tract_pipeline;

pub use category::{resolve_category, Category};
pub use config::ClassifierConfig;
pub use inference::{
    AnimalClassifier, ExecutionMode, ImagePayload, ImagePipeline, InferenceAdapter,
    InferenceError, PipelineLoader, Prediction, UploadSource,
};
pub use knowledge::{KnowledgeEntry, Mood};
pub use result::{assemble, confidence_percent, ClassificationResult, ImageRef};
pub use scores::{ScoreSource, SimulatedScores};
pub use tract_pipeline::TractLoader;
