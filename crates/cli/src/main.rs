use anyhow::Context;
use chrono::NaiveDate;
use clap::Parser;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use weekret_core::config::Settings;
use weekret_core::domain::prediction::{ensure_batch_size, SymbolEntry};
use weekret_core::marketdata::yahoo::YahooChartClient;
use weekret_core::report::aggregate::AggregateResult;
use weekret_core::report::{format, run::run_batch};
use weekret_core::time::window::{as_of_noon_utc, resolve_window, WindowPolicy};

#[derive(Debug, Parser)]
#[command(name = "weekret_cli")]
struct Args {
    /// Symbol with an optional predicted direction, e.g. AAPL=bullish or a
    /// bare symbol for no prediction. Repeatable.
    #[arg(long = "entry", required = true)]
    entries: Vec<SymbolEntry>,

    /// Report window policy: current-week | trailing-fridays.
    /// Defaults to WEEKLY_WINDOW_POLICY, then current-week.
    #[arg(long)]
    policy: Option<WindowPolicy>,

    /// Score as of this date (YYYY-MM-DD) instead of the wall clock.
    #[arg(long)]
    as_of: Option<NaiveDate>,

    /// Emit the result document as JSON instead of the table.
    #[arg(long)]
    json: bool,
}

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

    let args = Args::parse();
    ensure_batch_size(args.entries.len())?;

    let policy = args.policy.or(settings.window_policy).unwrap_or_default();
    let now_utc = match args.as_of {
        Some(date) => as_of_noon_utc(date)?,
        None => chrono::Utc::now(),
    };
    let window = resolve_window(policy, now_utc)?;

    let provider =
        YahooChartClient::from_settings(&settings).context("failed to build market data client")?;

    tracing::info!(
        %policy,
        start = %window.start,
        end = %window.end,
        symbols = args.entries.len(),
        "scoring weekly returns"
    );

    let results = run_batch(&provider, &args.entries, window, policy.start_anchor()).await;
    let agg = AggregateResult {
        window,
        policy,
        results,
    };

    if args.json {
        let doc = serde_json::json!({
            "window": agg.window,
            "policy": agg.policy,
            "results": agg.results,
            "summary": format::summary_line(&agg),
            "adjusted_total_return": agg.adjusted_total(),
        });
        println!("{}", serde_json::to_string_pretty(&doc)?);
        return Ok(());
    }

    println!("{}", format::window_line(agg.window));
    println!();
    print!("{}", format::render_table(&agg));
    println!();
    if let Some(summary) = format::summary_line(&agg) {
        println!("{summary}");
    }
    println!("{}", format::total_line(&agg));
    if let Some(line) = format::correct_total_line(&agg) {
        println!("{line}");
    }
    if agg.has_missing_data() {
        println!("{}", format::MISSING_DATA_FOOTNOTE);
    }

    Ok(())
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
