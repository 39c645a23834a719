use crate::domain::result::{PredictionOutcome, SymbolResult};
use crate::time::window::{ReportWindow, WindowPolicy};
use serde::Serialize;

/// One scoring run: the resolved window plus every per-symbol row, in input
/// order. Transient; built per submission and discarded after rendering.
#[derive(Debug, Clone, Serialize)]
pub struct AggregateResult {
    pub window: ReportWindow,
    pub policy: WindowPolicy,
    pub results: Vec<SymbolResult>,
}

impl AggregateResult {
    /// Qualifying rows only: complete data and a directional prediction.
    pub fn contributions(&self) -> Vec<(&str, f64)> {
        self.results
            .iter()
            .filter_map(|r| r.adjusted_contribution().map(|pct| (r.symbol.as_str(), pct)))
            .collect()
    }

    /// Direction-adjusted total. `None` is the explicit "no valid returns to
    /// aggregate" state; it is never reported as a zero total.
    pub fn adjusted_total(&self) -> Option<f64> {
        let contributions = self.contributions();
        if contributions.is_empty() {
            return None;
        }
        Some(contributions.iter().map(|(_, pct)| pct).sum())
    }

    /// Sum of raw change percentages over the correctly-predicted rows,
    /// reported alongside the adjusted total. `None` when nothing was
    /// predicted correctly.
    pub fn correct_prediction_total(&self) -> Option<f64> {
        let correct: Vec<f64> = self
            .results
            .iter()
            .filter(|r| r.outcome == PredictionOutcome::Correct)
            .filter_map(|r| r.change_percent)
            .collect();
        if correct.is_empty() {
            return None;
        }
        Some(correct.iter().sum())
    }

    pub fn has_missing_data(&self) -> bool {
        self.results.iter().any(|r| !r.is_complete())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::prediction::PredictionDirection;
    use chrono::NaiveDate;

    fn window() -> ReportWindow {
        ReportWindow {
            start: NaiveDate::from_ymd_opt(2026, 1, 5).unwrap(),
            end: NaiveDate::from_ymd_opt(2026, 1, 9).unwrap(),
        }
    }

    fn complete(symbol: &str, prediction: PredictionDirection, pct: f64) -> SymbolResult {
        SymbolResult::complete(symbol.to_string(), prediction, 100.0, 100.0 + pct, pct)
    }

    fn aggregate(results: Vec<SymbolResult>) -> AggregateResult {
        AggregateResult {
            window: window(),
            policy: WindowPolicy::CurrentWeek,
            results,
        }
    }

    #[test]
    fn opposite_moves_cancel_out() {
        let agg = aggregate(vec![
            complete("AAA", PredictionDirection::Bullish, 10.0),
            complete("BBB", PredictionDirection::Bullish, -10.0),
        ]);
        assert_eq!(agg.adjusted_total(), Some(0.0));
    }

    #[test]
    fn excluding_a_row_shifts_the_total_by_its_contribution() {
        let mut rows = vec![
            complete("AAA", PredictionDirection::Bullish, 3.5),
            complete("BBB", PredictionDirection::Bearish, -2.0),
            complete("CCC", PredictionDirection::Bullish, 1.25),
        ];
        let full = aggregate(rows.clone()).adjusted_total().unwrap();

        let dropped = rows.remove(2);
        let reduced = aggregate(rows).adjusted_total().unwrap();

        let contribution = dropped.adjusted_contribution().unwrap();
        assert!((full - reduced - contribution).abs() < 1e-12);
    }

    #[test]
    fn non_directional_and_incomplete_rows_do_not_contribute() {
        let agg = aggregate(vec![
            complete("AAA", PredictionDirection::Bullish, 2.0),
            complete("BBB", PredictionDirection::None, 50.0),
            SymbolResult::incomplete(
                "CCC".to_string(),
                PredictionDirection::Bearish,
                "下載資料失敗: unknown symbol: CCC".to_string(),
            ),
        ]);

        assert_eq!(agg.contributions(), vec![("AAA", 2.0)]);
        assert_eq!(agg.adjusted_total(), Some(2.0));
        assert!(agg.has_missing_data());
    }

    #[test]
    fn correct_prediction_total_sums_only_correct_rows() {
        // A correct bearish call keeps its raw (negative) change here.
        let agg = aggregate(vec![
            complete("AAA", PredictionDirection::Bullish, 10.0),
            complete("TAP", PredictionDirection::Bearish, -2.0),
            complete("BBB", PredictionDirection::Bullish, -3.0),
            complete("PG", PredictionDirection::None, 5.0),
        ]);
        let total = agg.correct_prediction_total().unwrap();
        assert!((total - 8.0).abs() < 1e-12);
    }

    #[test]
    fn no_correct_rows_means_no_correct_total() {
        let agg = aggregate(vec![
            complete("AAA", PredictionDirection::Bullish, -1.0),
            complete("BBB", PredictionDirection::None, 4.0),
            SymbolResult::incomplete(
                "CCC".to_string(),
                PredictionDirection::Bullish,
                "兩個交易日其中之一缺資料".to_string(),
            ),
        ]);
        assert_eq!(agg.correct_prediction_total(), None);
    }

    #[test]
    fn all_non_directional_means_no_total_at_all() {
        let agg = aggregate(vec![
            complete("AAA", PredictionDirection::None, 10.0),
            complete("BBB", PredictionDirection::None, -4.0),
        ]);
        assert_eq!(agg.adjusted_total(), None);
        assert!(agg.contributions().is_empty());
    }
}
