use crate::inference::{AnimalClassifier, ImagePayload, InferenceError, UploadSource};
use crate::result::{ClassificationResult, ImageRef};
use crate::scores::ScoreSource;
use anyhow::Result;
use spin_sdk::http::{Method, Request, Response};
use tracing::{error, info, warn};

#[cfg(target_arch = "wasm32")]
use {
    crate::config::ClassifierConfig,
    crate::inference::InferenceAdapter,
    crate::tract_pipeline::TractLoader,
    spin_sdk::http::IntoResponse,
    spin_sdk::http_component,
    std::sync::{Arc, OnceLock},
    tracing_subscriber::EnvFilter,
};

fn text(status: u16, body: &str) -> Response {
    Response::builder()
        .status(status)
        .header("content-type", "text/plain")
        .body(body.to_string())
        .build()
}

fn json(result: &ClassificationResult, mode: &str) -> Result<Response> {
    Ok(Response::builder()
        .status(200)
        .header("content-type", "application/json")
        .header("x-classifier-mode", mode)
        .body(serde_json::to_string(result)?)
        .build())
}

fn header<'a>(req: &'a Request, name: &str) -> Option<&'a str> {
    req.header(name).and_then(|value| value.as_str())
}

/// Turns an upload request into a safety card response.
///
/// `POST` only. The body is the image, `content-type` its type,
/// `x-upload-source: drop` restricts it to images and `x-image-ref` is
/// echoed back as `imageUrl`. When no classifier can be started a demo
/// sample is returned with `x-classifier-mode: demo`.
pub async fn handle_request(
    req: &Request,
    classifier: &AnimalClassifier,
    source: &mut impl ScoreSource,
) -> Result<Response> {
    if *req.method() != Method::Post {
        return Ok(text(405, "Send the image with POST."));
    }

    let image = ImagePayload::new(
        req.body().to_vec(),
        header(req, "content-type").map(str::to_string),
    );
    if image.bytes.is_empty() {
        return Ok(text(400, "No image data received."));
    }

    let upload = match header(req, "x-upload-source") {
        Some(value) if value.eq_ignore_ascii_case("drop") => UploadSource::Drop,
        _ => UploadSource::Browse,
    };
    if !image.accepted_from(upload) {
        return Ok(text(415, "Only image files can be dropped."));
    }
    info!(bytes = image.bytes.len(), ?upload, "received image");

    let image_ref = header(req, "x-image-ref").map(ImageRef::new);
    let outcome = classifier.classify_image(&image, image_ref, source).await;
    match outcome {
        Ok(result) => json(&result, "model"),
        Err(err @ InferenceError::Unavailable { .. }) => {
            let sample = ClassificationResult::demo_sample(source);
            warn!(error = %err, sample = %sample.name, "classifier not available, using demo mode");
            json(&sample, "demo")
        }
        Err(err) => {
            error!(error = %err, "error during classification");
            Ok(text(500, "Error during classification"))
        }
    }
}

#[cfg(target_arch = "wasm32")]
static CLASSIFIER: OnceLock<AnimalClassifier> = OnceLock::new();

#[cfg(target_arch = "wasm32")]
fn classifier() -> Result<&'static AnimalClassifier> {
    if let Some(classifier) = CLASSIFIER.get() {
        return Ok(classifier);
    }
    let config = ClassifierConfig::from_variables(spin_sdk::variables::get)?;
    info!(model = %config.model_path.display(), top_k = config.top_k, "configuring classifier");
    let top_k = config.top_k;
    Ok(CLASSIFIER.get_or_init(|| {
        let loader = Arc::new(TractLoader::new(config));
        AnimalClassifier::new(InferenceAdapter::with_top_k(loader, top_k))
    }))
}

#[cfg(target_arch = "wasm32")]
fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Accepts a photo as the request body and answers with a safety card.
#[cfg(target_arch = "wasm32")]
#[http_component]
async fn handle_animal_classification(req: Request) -> Result<impl IntoResponse> {
    init_logging();
    let mut rng = rand::thread_rng();
    handle_request(&req, classifier()?, &mut rng).await
}
