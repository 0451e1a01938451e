use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Action {
    #[serde(rename = "action")]
    pub label: String,
    pub confidence: f32,
}

impl Action {
    pub fn new(label: impl ToString, confidence: f32) -> Self {
        Self {
            label: label.to_string(),
            confidence,
        }
    }
}

/// Body of a successful zero-shot classification call.
///
/// The hosted inference API answers with parallel `labels`/`scores`
/// sequences; the newer router answers with a list of `{label, score}`
/// objects. Anything else is treated as malformed.
#[derive(Deserialize, Debug, Clone)]
#[serde(untagged)]
pub enum ZeroShotResponse {
    Parallel { labels: Vec<String>, scores: Vec<f32> },
    Pairs(Vec<LabelScore>),
}

#[derive(Deserialize, Debug, Clone)]
pub struct LabelScore {
    pub label: String,
    pub score: f32,
}

impl ZeroShotResponse {
    pub fn parse(body: &str) -> Option<Self> {
        match serde_json::from_str::<Self>(body) {
            Ok(Self::Parallel { labels, scores }) if labels.len() != scores.len() => {
                log::warn!(
                    "zero-shot response has {} labels but {} scores",
                    labels.len(),
                    scores.len()
                );
                None
            }
            Ok(response) => Some(response),
            Err(e) => {
                log::warn!("unexpected zero-shot response format: {e}");
                None
            }
        }
    }

    pub fn into_pairs(self) -> Vec<(String, f32)> {
        match self {
            Self::Parallel { labels, scores } => labels.into_iter().zip(scores).collect(),
            Self::Pairs(items) => items
                .into_iter()
                .map(|item| (item.label, item.score))
                .collect(),
        }
    }
}

/// Keeps pairs scoring at least `threshold` that are not `no_change_label`,
/// highest confidence first. Equal scores keep their response order.
pub fn rank_actions(
    pairs: Vec<(String, f32)>,
    threshold: f32,
    no_change_label: &str,
) -> Vec<Action> {
    let mut actions = pairs
        .into_iter()
        .filter(|(label, score)| *score >= threshold && label != no_change_label)
        .map(|(label, score)| Action::new(label, score))
        .collect::<Vec<_>>();

    actions.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
    actions
}
