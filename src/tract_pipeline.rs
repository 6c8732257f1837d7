use crate::config::ClassifierConfig;
use crate::inference::{ExecutionMode, ImagePayload, ImagePipeline, PipelineLoader, Prediction};
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::io::{BufRead, Cursor};
use std::sync::Arc;
use tracing::{debug, info, warn};
use tract_tensorflow::prelude::*;

type Plan = TypedRunnableModel<TypedModel>;

/// Frozen TensorFlow MobileNet graph run through tract.
pub struct TractPipeline {
    model: Plan,
    labels: Vec<String>,
    input_size: usize,
}

impl TractPipeline {
    fn input_tensor(&self, image: &ImagePayload) -> Result<Tensor> {
        let image = image::load_from_memory(&image.bytes)
            .context("image could not be decoded")?
            .to_rgb8();
        let size = self.input_size;
        let resized = image::imageops::resize(
            &image,
            size as u32,
            size as u32,
            image::imageops::FilterType::Triangle,
        );
        debug!(size, "resized image");

        Ok(
            tract_ndarray::Array4::from_shape_fn((1, size, size, 3), |(_, y, x, c)| {
                resized[(x as _, y as _)][c] as f32 / 255.0
            })
            .into(),
        )
    }
}

impl ImagePipeline for TractPipeline {
    fn predict(&self, image: &ImagePayload, top_k: usize) -> Result<Vec<Prediction>> {
        let input = self.input_tensor(image)?;
        let outputs = self.model.run(tvec!(input.into()))?;
        let scores: Vec<f32> = outputs[0].to_array_view::<f32>()?.iter().copied().collect();
        Ok(rank(&scores, &self.labels, top_k))
    }
}

/// Best `top_k` scores first, paired with their labels.
///
/// Output index i is line i of the labels file, line 0 being "background".
/// Non-finite scores and indices with no label are skipped.
fn rank(scores: &[f32], labels: &[String], top_k: usize) -> Vec<Prediction> {
    if scores.len() > labels.len() {
        warn!(
            outputs = scores.len(),
            labels = labels.len(),
            "model has more outputs than labels, extra outputs are ignored"
        );
    }

    let mut ranked: Vec<(usize, f32)> = scores
        .iter()
        .copied()
        .enumerate()
        .filter(|(_, confidence)| confidence.is_finite())
        .collect();
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1));

    ranked
        .into_iter()
        .filter_map(|(index, confidence)| {
            labels.get(index).map(|label| Prediction {
                label: label.clone(),
                confidence,
            })
        })
        .take(top_k)
        .collect()
}

/// Loads the model and labels from the paths in [`ClassifierConfig`].
pub struct TractLoader {
    config: ClassifierConfig,
}

impl TractLoader {
    pub fn new(config: ClassifierConfig) -> Self {
        Self { config }
    }

    fn build(&self, mode: ExecutionMode) -> Result<TractPipeline> {
        let model_bytes = std::fs::read(&self.config.model_path).with_context(|| {
            format!("reading model {}", self.config.model_path.display())
        })?;
        let labels = std::fs::read(&self.config.labels_path).with_context(|| {
            format!("reading labels {}", self.config.labels_path.display())
        })?;
        let labels = parse_labels(&labels)?;

        let size = self.config.input_size;
        let model = tract_tensorflow::tensorflow()
            .model_for_read(&mut Cursor::new(model_bytes))?
            .with_input_fact(0, f32::fact([1, size, size, 3]).into())?;
        let model = match mode {
            ExecutionMode::Accelerated => model.into_optimized()?,
            ExecutionMode::Default => model.into_typed()?.into_decluttered()?,
        };
        let model = model.into_runnable()?;
        info!(%mode, labels = labels.len(), "loaded Tensorflow model");

        Ok(TractPipeline {
            model,
            labels,
            input_size: size,
        })
    }
}

#[async_trait]
impl PipelineLoader for TractLoader {
    async fn load(&self, mode: ExecutionMode) -> Result<Arc<dyn ImagePipeline>> {
        let pipeline = self.build(mode)?;
        Ok(Arc::new(pipeline))
    }
}

fn parse_labels(bytes: &[u8]) -> Result<Vec<String>> {
    let labels = Cursor::new(bytes)
        .lines()
        .map(|line| line.map(|label| label.trim().to_string()))
        .collect::<std::io::Result<Vec<_>>>()
        .context("labels file is not valid UTF-8 text")?;
    anyhow::ensure!(!labels.is_empty(), "labels file is empty");
    Ok(labels)
}
