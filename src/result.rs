use crate::category::resolve_category;
use crate::inference::Prediction;
use crate::knowledge::Mood;
use crate::scores::{ScoreSource, SimulatedScores};
use serde::Serialize;

const FALLBACK_NAME: &str = "Unknown Animal";
const FALLBACK_KIND: &str = "Wildlife";
const FALLBACK_DESCRIPTION: &str =
    "Could not confidently map the species. Exercise caution and keep a safe distance from wildlife.";
const FALLBACK_TIPS: [&str; 3] = [
    "Observe from a safe distance",
    "Avoid feeding or provoking",
    "Report unusual sightings to local authorities",
];

/// Caller-supplied reference to the submitted image, such as a URL the
/// display layer created for it.
///
/// The result takes ownership of the reference and hands it back unchanged.
/// Whatever the reference points at was created by the caller and is never
/// released here; dropping the result only drops the reference itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ImageRef(String);

impl ImageRef {
    pub fn new(reference: impl Into<String>) -> Self {
        Self(reference.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassificationResult {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub mood: Mood,
    pub description: String,
    pub safety_tips: Vec<String>,
    /// Top prediction confidence as a rounded percentage.
    pub confidence: u8,
    #[serde(rename = "imageUrl", skip_serializing_if = "Option::is_none")]
    pub image: Option<ImageRef>,
    /// Simulated, see [`crate::scores`].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body_structure_score: Option<u8>,
    /// Simulated, see [`crate::scores`].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dairy_potential: Option<u8>,
    /// Simulated, see [`crate::scores`].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub health_score: Option<u8>,
}

/// Converts a raw `[0, 1]` confidence into a whole percentage.
///
/// Rounding happens in `f32`, the precision the model reports in, so
/// `0.945` becomes `95`.
pub fn confidence_percent(raw: f32) -> u8 {
    let percent = (raw.clamp(0.0, 1.0) * 100.0).round();
    if percent.is_nan() {
        0
    } else {
        percent as u8
    }
}

/// Builds the result for the top prediction.
pub fn assemble(
    top: &Prediction,
    image: Option<ImageRef>,
    source: &mut impl ScoreSource,
) -> ClassificationResult {
    let category = resolve_category(&top.label);
    let scores = SimulatedScores::generate(category, source);
    let confidence = confidence_percent(top.confidence);

    let (name, kind, mood, description, safety_tips) = match category {
        Some(category) => {
            let entry = category.knowledge();
            (
                entry.name.to_string(),
                entry.kind.to_string(),
                entry.mood,
                entry.description.to_string(),
                entry.safety_tips.iter().map(|tip| tip.to_string()).collect(),
            )
        }
        None => (
            fallback_name(&top.label),
            FALLBACK_KIND.to_string(),
            Mood::Calm,
            FALLBACK_DESCRIPTION.to_string(),
            FALLBACK_TIPS.iter().map(|tip| tip.to_string()).collect(),
        ),
    };

    ClassificationResult {
        name,
        kind,
        mood,
        description,
        safety_tips,
        confidence,
        image,
        body_structure_score: scores.body_structure,
        dairy_potential: scores.dairy_potential,
        health_score: Some(scores.health),
    }
}

/// "giant_panda" -> "Giant panda", "" -> "Unknown Animal".
fn fallback_name(label: &str) -> String {
    if label.is_empty() {
        return FALLBACK_NAME.to_string();
    }
    let spaced = label.replace('_', " ");
    let mut chars = spaced.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => spaced,
    }
}

impl ClassificationResult {
    /// One-line notice for the display layer, e.g. `Identified: Dog (91%)`.
    pub fn summary(&self) -> String {
        format!("Identified: {} ({}%)", self.name, self.confidence)
    }

    /// A canned result to show when no classifier could be started.
    pub fn demo_sample(source: &mut impl ScoreSource) -> Self {
        let last = (DEMO_SAMPLES.len() - 1) as u8;
        let index = usize::from(source.score_in(0..=last));
        let sample = &DEMO_SAMPLES[index];
        ClassificationResult {
            name: sample.name.to_string(),
            kind: sample.kind.to_string(),
            mood: sample.mood,
            description: sample.description.to_string(),
            safety_tips: sample.safety_tips.iter().map(|tip| tip.to_string()).collect(),
            confidence: sample.confidence,
            image: None,
            body_structure_score: None,
            dairy_potential: None,
            health_score: None,
        }
    }
}

struct DemoSample {
    name: &'static str,
    kind: &'static str,
    mood: Mood,
    description: &'static str,
    safety_tips: &'static [&'static str],
    confidence: u8,
}

static DEMO_SAMPLES: [DemoSample; 2] = [
    DemoSample {
        name: "Bengal Tiger",
        kind: "Big Cat",
        mood: Mood::Aggressive,
        description: "The Bengal tiger is a large carnivore native to the Indian subcontinent. Known for their distinctive orange coat with black stripes, they are powerful predators that primarily hunt deer, wild boar, and other large mammals.",
        safety_tips: &[
            "Never approach or attempt to feed wild tigers",
            "Maintain at least 100 meters distance at all times",
            "Make noise to avoid surprising the animal",
            "Back away slowly if encountered, never run",
            "Report sightings to local wildlife authorities",
        ],
        confidence: 94,
    },
    DemoSample {
        name: "Indian Elephant",
        kind: "Herbivore",
        mood: Mood::Calm,
        description: "Asian elephants are gentle giants native to Asia. They are highly intelligent, social animals that live in family groups. These herbivores play a crucial role in maintaining forest ecosystems by dispersing seeds.",
        safety_tips: &[
            "Respect their space and observe from a distance",
            "Never feed wild elephants human food",
            "Stay quiet and move slowly around them",
            "Be aware that mothers with calves can be protective",
        ],
        confidence: 88,
    },
];
