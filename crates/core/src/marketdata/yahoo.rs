use crate::config::Settings;
use crate::marketdata::error::ProviderError;
use crate::marketdata::provider::BarProvider;
use crate::marketdata::types::DailyBar;
use crate::time::window::is_weekend;
use anyhow::{Context, Result};
use chrono::{DateTime, Duration as ChronoDuration, NaiveDate, NaiveTime};
use reqwest::StatusCode;
use serde::Deserialize;
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "https://query1.finance.yahoo.com";
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const USER_AGENT: &str = concat!("weekret/", env!("CARGO_PKG_VERSION"));

/// Yahoo v8 chart-API client. Fetches raw daily bars (no adjustment) for one
/// symbol per request; no retries, per the one-shot nature of a scoring run.
#[derive(Debug, Clone)]
pub struct YahooChartClient {
    http: reqwest::Client,
    base_url: String,
}

impl YahooChartClient {
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let base_url = settings
            .market_data_base_url
            .clone()
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        let timeout_secs = settings
            .market_data_timeout_secs
            .unwrap_or(DEFAULT_TIMEOUT_SECS);

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .user_agent(USER_AGENT)
            .build()
            .context("failed to build market data http client")?;

        Ok(Self { http, base_url })
    }

    fn chart_url(&self, symbol: &str) -> String {
        format!(
            "{}/v8/finance/chart/{symbol}",
            self.base_url.trim_end_matches('/')
        )
    }
}

#[async_trait::async_trait]
impl BarProvider for YahooChartClient {
    fn provider_name(&self) -> &'static str {
        "yahoo_chart"
    }

    async fn fetch_daily_bars(
        &self,
        symbol: &str,
        start: NaiveDate,
        end_inclusive: NaiveDate,
    ) -> Result<Vec<DailyBar>, ProviderError> {
        // period2 is exclusive on the provider side, so extend by one day to
        // keep the caller-facing range inclusive.
        let period1 = unix_midnight(start);
        let period2 = unix_midnight(end_inclusive + ChronoDuration::days(1));

        let res = self
            .http
            .get(self.chart_url(symbol))
            .query(&[
                ("period1", period1.to_string()),
                ("period2", period2.to_string()),
                ("interval", "1d".to_string()),
                ("includePrePost", "false".to_string()),
                ("events", "div,split".to_string()),
            ])
            .send()
            .await?;

        let status = res.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(ProviderError::RateLimited);
        }

        let text = res.text().await?;

        if !status.is_success() {
            // Unknown symbols come back as HTTP 404 with a chart error body.
            if let Ok(envelope) = serde_json::from_str::<ChartEnvelope>(&text) {
                if let Some(err) = envelope.chart.error {
                    if err.code.eq_ignore_ascii_case("not found") {
                        return Err(ProviderError::UnknownSymbol(symbol.to_string()));
                    }
                }
            }
            return Err(ProviderError::Http {
                status,
                detail: truncate_detail(&text),
            });
        }

        parse_chart_bars(&text, symbol, start, end_inclusive)
    }
}

/// Parses a chart response body into weekday bars within the requested range.
/// Days with a null open or close (halts, partial sessions) are dropped.
pub fn parse_chart_bars(
    text: &str,
    symbol: &str,
    start: NaiveDate,
    end_inclusive: NaiveDate,
) -> Result<Vec<DailyBar>, ProviderError> {
    let envelope: ChartEnvelope = serde_json::from_str(text)
        .map_err(|e| ProviderError::Decode(format!("chart response is not valid JSON: {e}")))?;

    if let Some(err) = envelope.chart.error {
        if err.code.eq_ignore_ascii_case("not found") {
            return Err(ProviderError::UnknownSymbol(symbol.to_string()));
        }
        return Err(ProviderError::Decode(format!(
            "chart error {}: {}",
            err.code,
            err.description.unwrap_or_default()
        )));
    }

    let result = envelope
        .chart
        .result
        .and_then(|mut v| (!v.is_empty()).then(|| v.remove(0)))
        .ok_or_else(|| ProviderError::Decode("chart result is empty".to_string()))?;

    let timestamps = result.timestamp.unwrap_or_default();
    let quote = result
        .indicators
        .quote
        .into_iter()
        .next()
        .ok_or_else(|| ProviderError::Decode("chart quote block is missing".to_string()))?;

    let opens = quote.open.unwrap_or_default();
    let closes = quote.close.unwrap_or_default();
    let volumes = quote.volume.unwrap_or_default();

    let mut bars = Vec::with_capacity(timestamps.len());
    for (idx, ts) in timestamps.iter().enumerate() {
        let Some(at) = DateTime::from_timestamp(*ts, 0) else {
            continue;
        };
        // Bar timestamps are session opens; their UTC calendar date is the
        // trading date for the venues we query (US/HK/TW sessions open after
        // 00:00 UTC of the same day).
        let date = at.date_naive();
        if date < start || date > end_inclusive || is_weekend(date) {
            continue;
        }

        let (Some(Some(open)), Some(Some(close))) =
            (opens.get(idx).copied(), closes.get(idx).copied())
        else {
            continue;
        };
        let volume = volumes.get(idx).copied().flatten().unwrap_or(0);

        bars.push(DailyBar {
            date,
            open,
            close,
            volume,
        });
    }

    Ok(bars)
}

fn unix_midnight(date: NaiveDate) -> i64 {
    date.and_time(NaiveTime::MIN).and_utc().timestamp()
}

fn truncate_detail(text: &str) -> String {
    const MAX: usize = 200;
    if text.len() <= MAX {
        return text.to_string();
    }
    let cut = text
        .char_indices()
        .take_while(|(i, _)| *i < MAX)
        .last()
        .map(|(i, c)| i + c.len_utf8())
        .unwrap_or(0);
    format!("{}...", &text[..cut])
}

#[derive(Debug, Deserialize)]
struct ChartEnvelope {
    chart: ChartBody,
}

#[derive(Debug, Deserialize)]
struct ChartBody {
    result: Option<Vec<ChartResult>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    timestamp: Option<Vec<i64>>,
    indicators: ChartIndicators,
}

#[derive(Debug, Deserialize)]
struct ChartIndicators {
    quote: Vec<ChartQuote>,
}

#[derive(Debug, Deserialize)]
struct ChartQuote {
    open: Option<Vec<Option<f64>>>,
    close: Option<Vec<Option<f64>>>,
    volume: Option<Vec<Option<u64>>>,
}
