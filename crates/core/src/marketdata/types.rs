use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One daily trading bar. Series returned by providers are time-ordered and
/// weekday-only.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DailyBar {
    pub date: NaiveDate,
    pub open: f64,
    pub close: f64,
    pub volume: u64,
}
