pub mod domain;
pub mod marketdata;
pub mod report;
pub mod time;

pub mod config {
    use crate::time::window::WindowPolicy;

    #[derive(Debug, Clone)]
    pub struct Settings {
        pub sentry_dsn: Option<String>,
        pub market_data_base_url: Option<String>,
        pub market_data_timeout_secs: Option<u64>,
        pub window_policy: Option<WindowPolicy>,
    }

    impl Settings {
        pub fn from_env() -> anyhow::Result<Self> {
            let window_policy = match std::env::var("WEEKLY_WINDOW_POLICY") {
                Ok(s) if !s.trim().is_empty() => Some(s.parse()?),
                _ => None,
            };

            Ok(Self {
                sentry_dsn: std::env::var("SENTRY_DSN").ok(),
                market_data_base_url: std::env::var("MARKET_DATA_BASE_URL").ok(),
                market_data_timeout_secs: std::env::var("MARKET_DATA_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse::<u64>().ok()),
                window_policy,
            })
        }
    }
}
