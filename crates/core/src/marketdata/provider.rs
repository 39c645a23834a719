use crate::marketdata::error::ProviderError;
use crate::marketdata::types::DailyBar;
use chrono::NaiveDate;

#[async_trait::async_trait]
pub trait BarProvider: Send + Sync {
    fn provider_name(&self) -> &'static str;

    /// Daily bars for `symbol` over the inclusive date range, time-ordered
    /// and restricted to weekdays.
    async fn fetch_daily_bars(
        &self,
        symbol: &str,
        start: NaiveDate,
        end_inclusive: NaiveDate,
    ) -> Result<Vec<DailyBar>, ProviderError>;
}
