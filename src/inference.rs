use crate::result::{assemble, ClassificationResult, ImageRef};
use crate::scores::ScoreSource;
use async_trait::async_trait;
use futures::future::{BoxFuture, FutureExt, Shared};
use std::sync::{Arc, OnceLock};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Number of ranked predictions requested from the pipeline.
pub const DEFAULT_TOP_K: usize = 5;

const PLACEHOLDER_LABEL: &str = "Unknown";

#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    pub label: String,
    /// Probability between 0.0 and 1.0.
    pub confidence: f32,
}

impl Prediction {
    fn placeholder() -> Self {
        Self {
            label: PLACEHOLDER_LABEL.to_string(),
            confidence: 0.0,
        }
    }
}

/// How the image reached us.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UploadSource {
    /// Picked through a file browser. Any file is passed on.
    #[default]
    Browse,
    /// Dropped onto the page. Only image content types are taken.
    Drop,
}

/// Raw image bytes as submitted by the user.
#[derive(Debug, Clone, Default)]
pub struct ImagePayload {
    pub bytes: Vec<u8>,
    pub content_type: Option<String>,
}

impl ImagePayload {
    pub fn new(bytes: Vec<u8>, content_type: Option<String>) -> Self {
        Self {
            bytes,
            content_type,
        }
    }

    pub fn is_image(&self) -> bool {
        self.content_type
            .as_deref()
            .is_some_and(|content_type| content_type.trim().to_ascii_lowercase().starts_with("image/"))
    }

    /// Whether the payload should be classified at all. Browsed files are
    /// always accepted and left for the pipeline to reject.
    pub fn accepted_from(&self, source: UploadSource) -> bool {
        match source {
            UploadSource::Browse => true,
            UploadSource::Drop => self.is_image(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionMode {
    /// Fastest plan the runtime can produce. Tried first.
    Accelerated,
    Default,
}

impl std::fmt::Display for ExecutionMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExecutionMode::Accelerated => f.write_str("accelerated"),
            ExecutionMode::Default => f.write_str("default"),
        }
    }
}

/// A ready-to-run image classification model.
pub trait ImagePipeline: Send + Sync {
    /// Returns up to `top_k` predictions, best first.
    fn predict(&self, image: &ImagePayload, top_k: usize) -> anyhow::Result<Vec<Prediction>>;
}

/// Builds pipelines. Loading may be slow (model download, graph
/// optimisation) and is done at most once per [`InferenceAdapter`].
#[async_trait]
pub trait PipelineLoader: Send + Sync + 'static {
    async fn load(&self, mode: ExecutionMode) -> anyhow::Result<Arc<dyn ImagePipeline>>;
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum InferenceError {
    #[error("no classifier available (accelerated: {accelerated}; default: {default})")]
    Unavailable { accelerated: String, default: String },

    #[error("classification failed: {0}")]
    Prediction(String),
}

type PipelineResult = Result<Arc<dyn ImagePipeline>, InferenceError>;
type PendingPipeline = Shared<BoxFuture<'static, PipelineResult>>;

/// Wraps the model runtime behind a lazily built, shared pipeline.
///
/// The first caller creates a single construction future; every caller,
/// including ones that arrive while it is still running, awaits a clone of
/// that same future. Its outcome, success or failure, is kept for the
/// adapter's lifetime.
pub struct InferenceAdapter {
    loader: Arc<dyn PipelineLoader>,
    pending: OnceLock<PendingPipeline>,
    top_k: usize,
}

impl InferenceAdapter {
    pub fn new(loader: Arc<dyn PipelineLoader>) -> Self {
        Self::with_top_k(loader, DEFAULT_TOP_K)
    }

    pub fn with_top_k(loader: Arc<dyn PipelineLoader>, top_k: usize) -> Self {
        Self {
            loader,
            pending: OnceLock::new(),
            top_k: top_k.max(1),
        }
    }

    async fn pipeline(&self) -> PipelineResult {
        let pending = self.pending.get_or_init(|| {
            let loader = Arc::clone(&self.loader);
            construct(loader).boxed().shared()
        });
        pending.clone().await
    }

    /// Ranked predictions for `image`. Never empty: a model that returns
    /// nothing yields a single "Unknown" prediction with zero confidence.
    pub async fn classify(&self, image: &ImagePayload) -> Result<Vec<Prediction>, InferenceError> {
        let pipeline = self.pipeline().await?;
        let mut predictions = pipeline
            .predict(image, self.top_k)
            .map_err(|err| InferenceError::Prediction(format!("{err:#}")))?;

        predictions.retain(|prediction| prediction.confidence.is_finite());
        predictions.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
        predictions.truncate(self.top_k);
        if predictions.is_empty() {
            debug!("pipeline returned no predictions, using placeholder");
            predictions.push(Prediction::placeholder());
        }
        Ok(predictions)
    }
}

async fn construct(loader: Arc<dyn PipelineLoader>) -> PipelineResult {
    let accelerated = match loader.load(ExecutionMode::Accelerated).await {
        Ok(pipeline) => {
            info!(mode = %ExecutionMode::Accelerated, "classification pipeline ready");
            return Ok(pipeline);
        }
        Err(err) => {
            warn!(error = %format!("{err:#}"), "accelerated pipeline failed, falling back");
            format!("{err:#}")
        }
    };

    match loader.load(ExecutionMode::Default).await {
        Ok(pipeline) => {
            info!(mode = %ExecutionMode::Default, "classification pipeline ready");
            Ok(pipeline)
        }
        Err(err) => {
            let err = InferenceError::Unavailable {
                accelerated,
                default: format!("{err:#}"),
            };
            warn!(error = %err, "classification pipeline unavailable");
            Err(err)
        }
    }
}

/// Photo in, safety card out.
pub struct AnimalClassifier {
    adapter: InferenceAdapter,
}

impl AnimalClassifier {
    pub fn new(adapter: InferenceAdapter) -> Self {
        Self { adapter }
    }

    pub fn adapter(&self) -> &InferenceAdapter {
        &self.adapter
    }

    /// Classifies `image` and maps the top prediction onto the knowledge
    /// base. `image_ref` is moved into the result untouched.
    pub async fn classify_image(
        &self,
        image: &ImagePayload,
        image_ref: Option<ImageRef>,
        source: &mut impl ScoreSource,
    ) -> Result<ClassificationResult, InferenceError> {
        let predictions = self.adapter.classify(image).await?;
        // `classify` never returns an empty list.
        let top = predictions
            .first()
            .cloned()
            .unwrap_or_else(Prediction::placeholder);
        debug!(label = %top.label, confidence = top.confidence, "top prediction");

        let result = assemble(&top, image_ref, source);
        info!("{}", result.summary());
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scores::test_support::Lowest;
    use anyhow::anyhow;
    use futures::channel::oneshot;
    use futures::executor::block_on;
    use futures::future::join_all;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    struct FixedPipeline(Vec<Prediction>);

    impl ImagePipeline for FixedPipeline {
        fn predict(&self, _image: &ImagePayload, _top_k: usize) -> anyhow::Result<Vec<Prediction>> {
            Ok(self.0.clone())
        }
    }

    struct FailingPipeline;

    impl ImagePipeline for FailingPipeline {
        fn predict(&self, _image: &ImagePayload, _top_k: usize) -> anyhow::Result<Vec<Prediction>> {
            Err(anyhow!("not an image"))
        }
    }

    /// Counts load attempts per mode and fails the modes it is told to.
    struct FakeLoader {
        fail_accelerated: bool,
        fail_default: bool,
        predictions: Vec<Prediction>,
        accelerated_calls: AtomicUsize,
        default_calls: AtomicUsize,
        gate: Mutex<Option<oneshot::Receiver<()>>>,
    }

    impl FakeLoader {
        fn new(predictions: Vec<Prediction>) -> Self {
            Self {
                fail_accelerated: false,
                fail_default: false,
                predictions,
                accelerated_calls: AtomicUsize::new(0),
                default_calls: AtomicUsize::new(0),
                gate: Mutex::new(None),
            }
        }

        fn total_calls(&self) -> usize {
            self.accelerated_calls.load(Ordering::SeqCst) + self.default_calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl PipelineLoader for FakeLoader {
        async fn load(&self, mode: ExecutionMode) -> anyhow::Result<Arc<dyn ImagePipeline>> {
            let gate = self.gate.lock().unwrap().take();
            if let Some(gate) = gate {
                gate.await?;
            }
            let fail = match mode {
                ExecutionMode::Accelerated => {
                    self.accelerated_calls.fetch_add(1, Ordering::SeqCst);
                    self.fail_accelerated
                }
                ExecutionMode::Default => {
                    self.default_calls.fetch_add(1, Ordering::SeqCst);
                    self.fail_default
                }
            };
            if fail {
                return Err(anyhow!("{mode} backend missing"));
            }
            Ok(Arc::new(FixedPipeline(self.predictions.clone())))
        }
    }

    fn prediction(label: &str, confidence: f32) -> Prediction {
        Prediction {
            label: label.to_string(),
            confidence,
        }
    }

    fn jpeg() -> ImagePayload {
        ImagePayload::new(vec![0xff, 0xd8, 0xff], Some("image/jpeg".to_string()))
    }

    #[test]
    fn builds_pipeline_once_across_calls() {
        let loader = Arc::new(FakeLoader::new(vec![prediction("beagle", 0.7)]));
        let adapter = InferenceAdapter::new(loader.clone());

        block_on(async {
            for _ in 0..3 {
                let predictions = adapter.classify(&jpeg()).await.unwrap();
                assert_eq!(predictions[0].label, "beagle");
            }
        });
        assert_eq!(loader.accelerated_calls.load(Ordering::SeqCst), 1);
        assert_eq!(loader.default_calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn concurrent_callers_share_one_construction() {
        let (open, gate) = oneshot::channel();
        let loader = Arc::new(FakeLoader::new(vec![prediction("tiger", 0.9)]));
        *loader.gate.lock().unwrap() = Some(gate);
        let adapter = InferenceAdapter::new(loader.clone());

        let image = jpeg();
        let calls = join_all((0..8).map(|_| adapter.classify(&image)));
        let release = async {
            open.send(()).unwrap();
        };
        let (results, ()) = block_on(futures::future::join(calls, release));

        assert_eq!(results.len(), 8);
        assert!(results.iter().all(|r| r.as_ref().unwrap()[0].label == "tiger"));
        assert_eq!(loader.total_calls(), 1);
    }

    #[test]
    fn falls_back_to_default_mode() {
        let mut loader = FakeLoader::new(vec![prediction("cobra", 0.4)]);
        loader.fail_accelerated = true;
        let loader = Arc::new(loader);
        let adapter = InferenceAdapter::new(loader.clone());

        let first = block_on(adapter.classify(&jpeg())).unwrap();
        let second = block_on(adapter.classify(&jpeg())).unwrap();
        assert_eq!(first, second);
        assert_eq!(loader.accelerated_calls.load(Ordering::SeqCst), 1);
        assert_eq!(loader.default_calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn unavailable_when_both_modes_fail() {
        let mut loader = FakeLoader::new(vec![]);
        loader.fail_accelerated = true;
        loader.fail_default = true;
        let loader = Arc::new(loader);
        let classifier = AnimalClassifier::new(InferenceAdapter::new(loader.clone()));

        let err = block_on(classifier.classify_image(&jpeg(), None, &mut Lowest)).unwrap_err();
        match &err {
            InferenceError::Unavailable { accelerated, default } => {
                assert!(accelerated.contains("accelerated backend missing"));
                assert!(default.contains("default backend missing"));
            }
            other => panic!("unexpected error {other:?}"),
        }

        // The failed construction is remembered, not retried.
        let again = block_on(classifier.adapter().classify(&jpeg())).unwrap_err();
        assert_eq!(again, err);
        assert_eq!(loader.total_calls(), 2);
    }

    #[test]
    fn empty_output_becomes_placeholder() {
        let adapter = InferenceAdapter::new(Arc::new(FakeLoader::new(vec![])));
        let predictions = block_on(adapter.classify(&jpeg())).unwrap();
        assert_eq!(predictions, vec![prediction("Unknown", 0.0)]);
    }

    #[test]
    fn predictions_are_ranked_and_truncated() {
        let raw = vec![
            prediction("a", 0.1),
            prediction("b", 0.5),
            prediction("c", 0.3),
            prediction("d", 0.05),
        ];
        let adapter = InferenceAdapter::with_top_k(Arc::new(FakeLoader::new(raw)), 2);
        let predictions = block_on(adapter.classify(&jpeg())).unwrap();
        let labels: Vec<_> = predictions.iter().map(|p| p.label.as_str()).collect();
        assert_eq!(labels, ["b", "c"]);
    }

    #[test]
    fn nan_confidence_does_not_outrank_real_predictions() {
        let raw = vec![
            prediction("glitch", f32::NAN),
            prediction("beagle", 0.6),
            prediction("overflow", f32::INFINITY),
            prediction("tabby", 0.3),
        ];
        let adapter = InferenceAdapter::new(Arc::new(FakeLoader::new(raw)));
        let predictions = block_on(adapter.classify(&jpeg())).unwrap();
        assert_eq!(predictions, vec![prediction("beagle", 0.6), prediction("tabby", 0.3)]);

        let only_nan = vec![prediction("glitch", f32::NAN)];
        let adapter = InferenceAdapter::new(Arc::new(FakeLoader::new(only_nan)));
        let predictions = block_on(adapter.classify(&jpeg())).unwrap();
        assert_eq!(predictions, vec![prediction("Unknown", 0.0)]);
    }

    #[test]
    fn prediction_errors_are_reported() {
        struct BrokenLoader;

        #[async_trait]
        impl PipelineLoader for BrokenLoader {
            async fn load(&self, _mode: ExecutionMode) -> anyhow::Result<Arc<dyn ImagePipeline>> {
                Ok(Arc::new(FailingPipeline))
            }
        }

        let adapter = InferenceAdapter::new(Arc::new(BrokenLoader));
        let err = block_on(adapter.classify(&ImagePayload::default())).unwrap_err();
        assert_eq!(err, InferenceError::Prediction("not an image".to_string()));
    }

    #[test]
    fn classifies_unknown_placeholder_as_generic_wildlife() {
        let classifier = AnimalClassifier::new(InferenceAdapter::new(Arc::new(FakeLoader::new(vec![]))));
        let result = block_on(classifier.classify_image(&jpeg(), None, &mut Lowest)).unwrap();
        assert_eq!(result.name, "Unknown");
        assert_eq!(result.kind, "Wildlife");
        assert_eq!(result.confidence, 0);
    }

    #[test]
    fn end_to_end_cow_result() {
        let loader = FakeLoader::new(vec![prediction("ox", 0.2), prediction("zebu bull", 0.8)]);
        let classifier = AnimalClassifier::new(InferenceAdapter::new(Arc::new(loader)));
        let image_ref = ImageRef::new("blob:cow");
        let result = block_on(classifier.classify_image(&jpeg(), Some(image_ref.clone()), &mut Lowest))
            .unwrap();
        assert_eq!(result.name, "Cow");
        assert_eq!(result.confidence, 80);
        assert_eq!(result.body_structure_score, Some(80));
        assert_eq!(result.dairy_potential, Some(75));
        assert_eq!(result.health_score, Some(85));
        assert_eq!(result.image, Some(image_ref));
    }

    #[test]
    fn drop_path_only_accepts_images() {
        let text = ImagePayload::new(b"hello".to_vec(), Some("text/plain".to_string()));
        assert!(!text.accepted_from(UploadSource::Drop));
        assert!(text.accepted_from(UploadSource::Browse));

        let untyped = ImagePayload::new(vec![1, 2, 3], None);
        assert!(!untyped.accepted_from(UploadSource::Drop));
        assert!(untyped.accepted_from(UploadSource::Browse));

        let png = ImagePayload::new(vec![1], Some("Image/PNG".to_string()));
        assert!(png.accepted_from(UploadSource::Drop));
    }
}
