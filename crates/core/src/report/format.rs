//! Presentation boundary. Rounding and localization happen here only; the
//! computed values underneath are never mutated.

use crate::domain::result::SymbolResult;
use crate::report::aggregate::AggregateResult;
use crate::time::window::ReportWindow;

pub const NO_QUALIFYING_WARNING: &str = "本次查詢沒有有效報酬率可加總";
pub const MISSING_DATA_FOOTNOTE: &str = "有標的資料缺漏（如非美股、停牌、代碼錯誤），詳見「備註」欄";
pub const EMPTY_INPUT_WARNING: &str = "請至少輸入一檔股票代碼";

pub const TABLE_HEADERS: [&str; 7] = [
    "股票代碼",
    "起始價",
    "結束價",
    "漲跌幅(%)",
    "備註",
    "預測",
    "預測結果",
];

pub fn window_line(window: ReportWindow) -> String {
    format!(
        "查詢區間：{} ~ {}",
        window.start.format("%Y/%m/%d"),
        window.end.format("%Y/%m/%d")
    )
}

/// `（AAA +1.2%、BBB -0.5%）：+0.7%` over the qualifying rows; `None` when
/// nothing qualifies.
pub fn summary_line(agg: &AggregateResult) -> Option<String> {
    let contributions = agg.contributions();
    if contributions.is_empty() {
        return None;
    }

    let parts: Vec<String> = contributions
        .iter()
        .map(|(symbol, pct)| format!("{symbol} {}{:.1}%", sign(*pct), pct.abs()))
        .collect();
    let total: f64 = contributions.iter().map(|(_, pct)| pct).sum();

    Some(format!(
        "（{}）：{}{:.1}%",
        parts.join("、"),
        sign(total),
        total.abs()
    ))
}

/// Total line, or the explicit no-qualifying-symbols warning.
pub fn total_line(agg: &AggregateResult) -> String {
    match agg.adjusted_total() {
        Some(total) => format!("調整後總報酬率：{total:.2}%"),
        None => NO_QUALIFYING_WARNING.to_string(),
    }
}

/// `預測正確的報酬率總和：8.00%`; omitted when nothing was predicted
/// correctly or the correct calls net out to exactly zero.
pub fn correct_total_line(agg: &AggregateResult) -> Option<String> {
    let total = agg.correct_prediction_total()?;
    if total == 0.0 {
        return None;
    }
    Some(format!("預測正確的報酬率總和：{total:.2}%"))
}

pub fn table_row(result: &SymbolResult) -> [String; 7] {
    [
        result.symbol.clone(),
        fmt_price(result.window_start_price),
        fmt_price(result.window_end_price),
        fmt_percent(result.change_percent),
        result.note.clone(),
        result.prediction.to_string(),
        result.outcome.to_string(),
    ]
}

pub fn render_table(agg: &AggregateResult) -> String {
    let mut out = String::new();
    out.push_str(&TABLE_HEADERS.join(" | "));
    out.push('\n');
    for result in &agg.results {
        out.push_str(&table_row(result).join(" | "));
        out.push('\n');
    }
    out
}

// Display rounding: prices to 2dp, percentages to 3dp; absent values as "-".
fn fmt_price(value: Option<f64>) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{v:.2}"))
}

fn fmt_percent(value: Option<f64>) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{v:.3}"))
}

fn sign(value: f64) -> char {
    if value >= 0.0 {
        '+'
    } else {
        '-'
    }
}
