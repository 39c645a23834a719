use crate::domain::prediction::SymbolEntry;
use crate::domain::result::SymbolResult;
use crate::marketdata::error::ProviderError;
use crate::marketdata::types::DailyBar;
use crate::time::window::{BoundaryPrice, ReportWindow};

pub const NOTE_FETCH_FAILED_PREFIX: &str = "下載資料失敗";
pub const NOTE_MISSING_BOUNDARY: &str = "兩個交易日其中之一缺資料";
pub const NOTE_ZERO_START_PRICE: &str = "起始價為零，無法計算漲跌幅";

/// Scores one symbol against the fetched bar series. Pure: provider failures
/// arrive as a value and leave as a populated `note`, never as an error.
pub fn score_symbol(
    entry: &SymbolEntry,
    window: ReportWindow,
    start_anchor: BoundaryPrice,
    fetched: Result<Vec<DailyBar>, ProviderError>,
) -> SymbolResult {
    let bars = match fetched {
        Ok(bars) => bars,
        Err(err) => {
            return SymbolResult::incomplete(
                entry.symbol.clone(),
                entry.prediction,
                format!("{NOTE_FETCH_FAILED_PREFIX}: {err}"),
            );
        }
    };

    let start_bar = bars.iter().find(|b| b.date == window.start);
    let end_bar = bars.iter().find(|b| b.date == window.end);

    let (Some(start_bar), Some(end_bar)) = (start_bar, end_bar) else {
        return SymbolResult::incomplete(
            entry.symbol.clone(),
            entry.prediction,
            NOTE_MISSING_BOUNDARY.to_string(),
        );
    };

    let start_price = match start_anchor {
        BoundaryPrice::Open => start_bar.open,
        BoundaryPrice::Close => start_bar.close,
    };
    let end_price = end_bar.close;

    // Degenerate quote; percentage change is undefined.
    if start_price == 0.0 {
        return SymbolResult::incomplete(
            entry.symbol.clone(),
            entry.prediction,
            NOTE_ZERO_START_PRICE.to_string(),
        );
    }

    let change_percent = (end_price - start_price) / start_price * 100.0;
    SymbolResult::complete(
        entry.symbol.clone(),
        entry.prediction,
        start_price,
        end_price,
        change_percent,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::prediction::PredictionDirection;
    use crate::domain::result::PredictionOutcome;
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn window() -> ReportWindow {
        ReportWindow {
            start: date(2026, 1, 5),
            end: date(2026, 1, 9),
        }
    }

    fn bar(d: NaiveDate, open: f64, close: f64) -> DailyBar {
        DailyBar {
            date: d,
            open,
            close,
            volume: 1_000,
        }
    }

    fn entry(symbol: &str, prediction: PredictionDirection) -> SymbolEntry {
        SymbolEntry::new(symbol, prediction).unwrap()
    }

    #[test]
    fn bullish_gain_is_correct() {
        let bars = vec![bar(date(2026, 1, 5), 100.0, 101.0), bar(date(2026, 1, 9), 109.0, 110.0)];
        let r = score_symbol(
            &entry("AAA", PredictionDirection::Bullish),
            window(),
            BoundaryPrice::Open,
            Ok(bars),
        );
        assert_eq!(r.window_start_price, Some(100.0));
        assert_eq!(r.window_end_price, Some(110.0));
        assert_eq!(r.change_percent, Some(10.0));
        assert_eq!(r.outcome, PredictionOutcome::Correct);
        assert!(r.note.is_empty());
    }

    #[test]
    fn bullish_loss_is_wrong() {
        let bars = vec![bar(date(2026, 1, 5), 50.0, 51.0), bar(date(2026, 1, 9), 46.0, 45.0)];
        let r = score_symbol(
            &entry("BBB", PredictionDirection::Bullish),
            window(),
            BoundaryPrice::Open,
            Ok(bars),
        );
        assert_eq!(r.change_percent, Some(-10.0));
        assert_eq!(r.outcome, PredictionOutcome::Wrong);
    }

    #[test]
    fn close_anchor_uses_the_start_close() {
        // TrailingFridays measures previous Friday close to Friday close.
        let w = ReportWindow {
            start: date(2026, 1, 2),
            end: date(2026, 1, 9),
        };
        let bars = vec![bar(date(2026, 1, 2), 95.0, 100.0), bar(date(2026, 1, 9), 102.0, 104.0)];
        let r = score_symbol(
            &entry("AAA", PredictionDirection::Bullish),
            w,
            BoundaryPrice::Close,
            Ok(bars),
        );
        assert_eq!(r.window_start_price, Some(100.0));
        assert_eq!(r.change_percent, Some(4.0));
    }

    #[test]
    fn missing_end_bar_yields_incomplete_row() {
        let bars = vec![bar(date(2026, 1, 5), 100.0, 101.0)];
        let r = score_symbol(
            &entry("CCC", PredictionDirection::Bullish),
            window(),
            BoundaryPrice::Open,
            Ok(bars),
        );
        assert!(r.window_start_price.is_none());
        assert!(r.window_end_price.is_none());
        assert!(r.change_percent.is_none());
        assert_eq!(r.outcome, PredictionOutcome::NotApplicable);
        assert_eq!(r.note, NOTE_MISSING_BOUNDARY);
    }

    #[test]
    fn provider_error_is_downgraded_to_a_note() {
        let r = score_symbol(
            &entry("DDD", PredictionDirection::Bearish),
            window(),
            BoundaryPrice::Open,
            Err(ProviderError::UnknownSymbol("DDD".to_string())),
        );
        assert!(r.change_percent.is_none());
        assert_eq!(r.outcome, PredictionOutcome::NotApplicable);
        assert!(r.note.starts_with(NOTE_FETCH_FAILED_PREFIX));
        assert!(r.note.contains("DDD"));
    }

    #[test]
    fn zero_start_price_is_guarded() {
        let bars = vec![bar(date(2026, 1, 5), 0.0, 1.0), bar(date(2026, 1, 9), 1.0, 2.0)];
        let r = score_symbol(
            &entry("EEE", PredictionDirection::Bullish),
            window(),
            BoundaryPrice::Open,
            Ok(bars),
        );
        assert!(r.change_percent.is_none());
        assert_eq!(r.note, NOTE_ZERO_START_PRICE);
        assert_eq!(r.outcome, PredictionOutcome::NotApplicable);
    }
}
