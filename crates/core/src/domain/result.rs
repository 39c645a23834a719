use crate::domain::prediction::PredictionDirection;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PredictionOutcome {
    Correct,
    Wrong,
    #[serde(rename = "N/A")]
    NotApplicable,
}

impl fmt::Display for PredictionOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Correct => "Correct",
            Self::Wrong => "Wrong",
            Self::NotApplicable => "N/A",
        };
        f.write_str(s)
    }
}

/// Per-symbol scoring record.
///
/// Invariant: `change_percent` is present iff both boundary prices are
/// present; incomplete records always carry a non-empty `note` and a
/// `NotApplicable` outcome. Enforced by the two constructors below.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SymbolResult {
    pub symbol: String,
    pub window_start_price: Option<f64>,
    pub window_end_price: Option<f64>,
    pub change_percent: Option<f64>,
    pub note: String,
    pub prediction: PredictionDirection,
    pub outcome: PredictionOutcome,
}

impl SymbolResult {
    pub fn complete(
        symbol: String,
        prediction: PredictionDirection,
        start_price: f64,
        end_price: f64,
        change_percent: f64,
    ) -> Self {
        Self {
            symbol,
            window_start_price: Some(start_price),
            window_end_price: Some(end_price),
            change_percent: Some(change_percent),
            note: String::new(),
            prediction,
            outcome: classify_outcome(prediction, change_percent),
        }
    }

    pub fn incomplete(symbol: String, prediction: PredictionDirection, note: String) -> Self {
        debug_assert!(!note.is_empty(), "incomplete results must explain why");
        Self {
            symbol,
            window_start_price: None,
            window_end_price: None,
            change_percent: None,
            note,
            prediction,
            outcome: PredictionOutcome::NotApplicable,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.change_percent.is_some()
    }

    /// Signed contribution to the direction-adjusted aggregate: the change
    /// percentage, negated for bearish predictions. `None` for rows without a
    /// directional prediction or without complete data.
    pub fn adjusted_contribution(&self) -> Option<f64> {
        let pct = self.change_percent?;
        match self.prediction {
            PredictionDirection::Bullish => Some(pct),
            PredictionDirection::Bearish => Some(-pct),
            PredictionDirection::None => None,
        }
    }
}

pub fn classify_outcome(
    prediction: PredictionDirection,
    change_percent: f64,
) -> PredictionOutcome {
    match prediction {
        PredictionDirection::Bullish if change_percent > 0.0 => PredictionOutcome::Correct,
        PredictionDirection::Bearish if change_percent < 0.0 => PredictionOutcome::Correct,
        PredictionDirection::Bullish | PredictionDirection::Bearish => PredictionOutcome::Wrong,
        PredictionDirection::None => PredictionOutcome::NotApplicable,
    }
}
