use thiserror::Error;

/// Typed failure at the price-fetch boundary. Consumed per symbol by the
/// scoring layer; never fatal to a batch.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("provider request failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("provider HTTP {status}: {detail}")]
    Http {
        status: reqwest::StatusCode,
        detail: String,
    },

    #[error("rate limited by provider")]
    RateLimited,

    #[error("unknown symbol: {0}")]
    UnknownSymbol(String),

    #[error("malformed provider response: {0}")]
    Decode(String),
}
