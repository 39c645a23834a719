use crate::domain::prediction::SymbolEntry;
use crate::domain::result::SymbolResult;
use crate::marketdata::provider::BarProvider;
use crate::report::score::score_symbol;
use crate::time::window::{BoundaryPrice, ReportWindow};

/// Fetches and scores every entry sequentially. A provider failure is scoped
/// to its symbol: the row is marked incomplete and the batch continues.
pub async fn run_batch(
    provider: &dyn BarProvider,
    entries: &[SymbolEntry],
    window: ReportWindow,
    start_anchor: BoundaryPrice,
) -> Vec<SymbolResult> {
    let mut results = Vec::with_capacity(entries.len());
    for entry in entries {
        let fetched = provider
            .fetch_daily_bars(&entry.symbol, window.start, window.end)
            .await;

        if let Err(err) = &fetched {
            tracing::warn!(
                symbol = %entry.symbol,
                provider = provider.provider_name(),
                error = %err,
                "daily bar fetch failed; scoring symbol as incomplete"
            );
        }

        results.push(score_symbol(entry, window, start_anchor, fetched));
    }
    results
}
