use axum::{
    extract::State,
    http::StatusCode,
    response::Html,
    routing::{get, post},
    Form, Json, Router,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use weekret_core::config::Settings;
use weekret_core::domain::prediction::{parse_entries, PredictionDirection, SymbolEntry};
use weekret_core::domain::result::SymbolResult;
use weekret_core::marketdata::provider::BarProvider;
use weekret_core::marketdata::yahoo::YahooChartClient;
use weekret_core::report::aggregate::AggregateResult;
use weekret_core::report::{format, run::run_batch};
use weekret_core::time::window::{as_of_noon_utc, resolve_window, ReportWindow, WindowPolicy};

// The form mirrors the original five-slot input UI.
const FORM_SLOTS: usize = 5;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer())
        .init();

    let provider = YahooChartClient::from_settings(&settings)?;
    let state = AppState {
        provider: Arc::new(provider),
        default_policy: settings.window_policy.unwrap_or_default(),
    };

    let app = Router::new()
        .route("/healthz", get(healthz))
        .route("/", get(input_form))
        .route("/score", post(score_form))
        .route("/api/score", post(score_json))
        .with_state(state)
        .layer(TraceLayer::new_for_http());

    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(3000);
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));

    tracing::info!(%addr, "api listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn healthz() -> &'static str {
    "ok"
}

#[derive(Clone)]
struct AppState {
    provider: Arc<dyn BarProvider>,
    default_policy: WindowPolicy,
}

async fn run_and_aggregate(
    state: &AppState,
    entries: Vec<SymbolEntry>,
    policy: WindowPolicy,
    as_of: Option<NaiveDate>,
) -> anyhow::Result<AggregateResult> {
    let now_utc = match as_of {
        Some(date) => as_of_noon_utc(date)?,
        None => chrono::Utc::now(),
    };
    let window = resolve_window(policy, now_utc)?;
    let results = run_batch(state.provider.as_ref(), &entries, window, policy.start_anchor()).await;
    Ok(AggregateResult {
        window,
        policy,
        results,
    })
}

// ---- HTML form surface ----

#[derive(Debug, Deserialize)]
struct ScoreForm {
    symbol1: Option<String>,
    symbol2: Option<String>,
    symbol3: Option<String>,
    symbol4: Option<String>,
    symbol5: Option<String>,
    direction1: Option<String>,
    direction2: Option<String>,
    direction3: Option<String>,
    direction4: Option<String>,
    direction5: Option<String>,
}

impl ScoreForm {
    fn slots(&self) -> [(&Option<String>, &Option<String>); FORM_SLOTS] {
        [
            (&self.symbol1, &self.direction1),
            (&self.symbol2, &self.direction2),
            (&self.symbol3, &self.direction3),
            (&self.symbol4, &self.direction4),
            (&self.symbol5, &self.direction5),
        ]
    }

    fn entries(&self) -> anyhow::Result<Vec<SymbolEntry>> {
        let mut pairs = Vec::with_capacity(FORM_SLOTS);
        for (symbol, direction) in self.slots() {
            let direction = direction
                .as_deref()
                .unwrap_or("")
                .parse::<PredictionDirection>()?;
            pairs.push((symbol.as_deref().unwrap_or(""), direction));
        }
        parse_entries(pairs)
    }
}

async fn input_form() -> Html<String> {
    Html(render_form_page())
}

async fn score_form(
    State(state): State<AppState>,
    Form(form): Form<ScoreForm>,
) -> Result<Html<String>, StatusCode> {
    let entries = form.entries().map_err(|e| {
        tracing::warn!(error = %e, "rejecting malformed form submission");
        StatusCode::BAD_REQUEST
    })?;

    if entries.is_empty() {
        return Ok(Html(render_message_page(format::EMPTY_INPUT_WARNING)));
    }

    let agg = run_and_aggregate(&state, entries, state.default_policy, None)
        .await
        .map_err(|e| {
            sentry_anyhow::capture_anyhow(&e);
            tracing::error!(error = %e, "scoring run failed");
            StatusCode::INTERNAL_SERVER_ERROR
        })?;

    Ok(Html(render_results_page(&agg)))
}

// ---- JSON surface ----

#[derive(Debug, Deserialize)]
struct ScoreRequest {
    entries: Vec<EntryDto>,
    policy: Option<WindowPolicy>,
    /// Optional as-of date (YYYY-MM-DD) for reproducible queries.
    as_of: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
struct EntryDto {
    symbol: String,
    #[serde(default)]
    direction: PredictionDirection,
}

#[derive(Debug, Serialize)]
struct ScoreResponse {
    window: ReportWindow,
    policy: WindowPolicy,
    results: Vec<SymbolResult>,
    summary: Option<String>,
    adjusted_total_return: Option<f64>,
}

async fn score_json(
    State(state): State<AppState>,
    Json(req): Json<ScoreRequest>,
) -> Result<Json<ScoreResponse>, StatusCode> {
    let pairs = req
        .entries
        .iter()
        .map(|e| (e.symbol.as_str(), e.direction));
    let entries = parse_entries(pairs).map_err(|e| {
        tracing::warn!(error = %e, "rejecting malformed score request");
        StatusCode::BAD_REQUEST
    })?;

    if entries.is_empty() {
        return Err(StatusCode::BAD_REQUEST);
    }

    let policy = req.policy.unwrap_or(state.default_policy);
    let agg = run_and_aggregate(&state, entries, policy, req.as_of)
        .await
        .map_err(|e| {
            sentry_anyhow::capture_anyhow(&e);
            tracing::error!(error = %e, "scoring run failed");
            StatusCode::INTERNAL_SERVER_ERROR
        })?;

    let summary = format::summary_line(&agg);
    let adjusted_total_return = agg.adjusted_total();
    Ok(Json(ScoreResponse {
        window: agg.window,
        policy: agg.policy,
        results: agg.results,
        summary,
        adjusted_total_return,
    }))
}

// ---- HTML rendering ----

fn render_form_page() -> String {
    let mut slots = String::new();
    for i in 1..=FORM_SLOTS {
        slots.push_str(&format!(
            "<fieldset><legend>標的{i}</legend>\
             <input type=\"text\" name=\"symbol{i}\" placeholder=\"例如 TSM、2330.TW、1810.HK\">\
             <select name=\"direction{i}\">\
             <option value=\"無\">無</option>\
             <option value=\"看漲\">看漲</option>\
             <option value=\"看跌\">看跌</option>\
             </select></fieldset>"
        ));
    }

    page(
        "股票多標的週報酬與預測分析",
        &format!(
            "<p>請輸入股票代碼並選擇預測方向（空白的欄位將略過）。\
             代碼以 Yahoo Finance 為準，例如台積電美股為 TSM、台灣交易所為 2330.TW。</p>\
             <form method=\"post\" action=\"/score\">{slots}\
             <button type=\"submit\">計算週報酬率</button></form>"
        ),
    )
}

fn render_message_page(message: &str) -> String {
    page("股票多標的週報酬與預測分析", &format!("<p>{}</p>", escape(message)))
}

fn render_results_page(agg: &AggregateResult) -> String {
    let mut rows = String::new();
    for result in &agg.results {
        rows.push_str("<tr>");
        for cell in format::table_row(result) {
            rows.push_str(&format!("<td>{}</td>", escape(&cell)));
        }
        rows.push_str("</tr>");
    }

    let headers: String = format::TABLE_HEADERS
        .iter()
        .map(|h| format!("<th>{h}</th>"))
        .collect();

    let mut tail = String::new();
    if let Some(summary) = format::summary_line(agg) {
        tail.push_str(&format!("<p>{}</p>", escape(&summary)));
    }
    tail.push_str(&format!("<p>{}</p>", escape(&format::total_line(agg))));
    if let Some(line) = format::correct_total_line(agg) {
        tail.push_str(&format!("<p>{}</p>", escape(&line)));
    }
    if agg.has_missing_data() {
        tail.push_str(&format!("<p>{}</p>", format::MISSING_DATA_FOOTNOTE));
    }

    page(
        "週報酬計算結果",
        &format!(
            "<p>{}</p><table><thead><tr>{headers}</tr></thead><tbody>{rows}</tbody></table>{tail}\
             <p><a href=\"/\">回到輸入頁</a></p>",
            format::window_line(agg.window)
        ),
    )
}

fn page(title: &str, body: &str) -> String {
    format!(
        "<!doctype html><html lang=\"zh-Hant\"><head><meta charset=\"utf-8\">\
         <title>{title}</title></head><body><h1>{title}</h1>{body}</body></html>"
    )
}

fn escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}

fn init_sentry(settings: &Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(symbols: [&str; FORM_SLOTS], directions: [&str; FORM_SLOTS]) -> ScoreForm {
        let s = |v: &str| (!v.is_empty()).then(|| v.to_string());
        ScoreForm {
            symbol1: s(symbols[0]),
            symbol2: s(symbols[1]),
            symbol3: s(symbols[2]),
            symbol4: s(symbols[3]),
            symbol5: s(symbols[4]),
            direction1: s(directions[0]),
            direction2: s(directions[1]),
            direction3: s(directions[2]),
            direction4: s(directions[3]),
            direction5: s(directions[4]),
        }
    }

    #[test]
    fn form_slots_map_to_normalized_entries() {
        let f = form(
            [" tsm ", "", "2330.tw", "", "pg"],
            ["看漲", "看跌", "看跌", "", "無"],
        );
        let entries = f.entries().unwrap();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].symbol, "TSM");
        assert_eq!(entries[0].prediction, PredictionDirection::Bullish);
        assert_eq!(entries[1].symbol, "2330.TW");
        assert_eq!(entries[1].prediction, PredictionDirection::Bearish);
        assert_eq!(entries[2].prediction, PredictionDirection::None);
    }

    #[test]
    fn unknown_direction_labels_are_rejected() {
        let f = form(["TSM", "", "", "", ""], ["sideways", "", "", "", ""]);
        assert!(f.entries().is_err());
    }
}
