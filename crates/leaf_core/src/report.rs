//! View model for the prediction panel.

use crate::client::{Prediction, ScoredClass};

/// Rows rendered in the ranked breakdown.
pub const MAX_RANKED_ROWS: usize = 3;

#[derive(Debug, Clone, PartialEq)]
pub struct ScoreRow {
    pub label: String,
    /// Bar fill in [0,1]; clamped copy of the score.
    pub fill: f32,
    /// Percentage text, e.g. `82.00%`.
    pub percent: String,
    /// The top entry is drawn differently from the rest.
    pub emphasized: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResultView {
    pub label: String,
    pub rows: Vec<ScoreRow>,
}

impl ResultView {
    /// `None` when there is nothing to show.
    pub fn from_prediction(prediction: Option<&Prediction>) -> Option<Self> {
        let prediction = prediction?;
        if !is_ranked(&prediction.top_k) {
            tracing::warn!("top-k scores are not in descending order; showing as received");
        }
        let rows = prediction
            .top_k
            .iter()
            .take(MAX_RANKED_ROWS)
            .enumerate()
            .map(|(idx, entry)| ScoreRow {
                label: entry.label.clone(),
                fill: entry.score.clamp(0.0, 1.0),
                percent: format_percent(entry.score),
                emphasized: idx == 0,
            })
            .collect();
        Some(Self {
            label: prediction.label.clone(),
            rows,
        })
    }
}

/// Probability as a percentage with two decimals.
pub fn format_percent(score: f32) -> String {
    format!("{:.2}%", score * 100.0)
}

/// True when scores never increase from one entry to the next.
pub fn is_ranked(entries: &[ScoredClass]) -> bool {
    entries.windows(2).all(|w| w[0].score >= w[1].score)
}
