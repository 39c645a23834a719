use anyhow::{bail, ensure, Context};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Upper bound on the number of symbols scored in one submission.
pub const MAX_SYMBOLS: usize = 20;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PredictionDirection {
    Bullish,
    Bearish,
    #[default]
    None,
}

impl PredictionDirection {
    pub fn is_directional(self) -> bool {
        matches!(self, Self::Bullish | Self::Bearish)
    }
}

impl fmt::Display for PredictionDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Bullish => "bullish",
            Self::Bearish => "bearish",
            Self::None => "none",
        };
        f.write_str(s)
    }
}

impl std::str::FromStr for PredictionDirection {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        // Accepts both the internal labels and the form labels (看漲/看跌).
        match s.trim().to_ascii_lowercase().as_str() {
            "bullish" | "看漲" => Ok(Self::Bullish),
            "bearish" | "看跌" => Ok(Self::Bearish),
            "" | "none" | "無" => Ok(Self::None),
            other => bail!("unknown prediction direction: {other}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolEntry {
    pub symbol: String,
    pub prediction: PredictionDirection,
}

impl SymbolEntry {
    /// Normalizes the raw symbol (trim + uppercase). Returns `None` for blank
    /// slots so callers can skip them.
    pub fn new(raw_symbol: &str, prediction: PredictionDirection) -> Option<Self> {
        let symbol = raw_symbol.trim().to_ascii_uppercase();
        if symbol.is_empty() {
            return None;
        }
        Some(Self { symbol, prediction })
    }
}

impl std::str::FromStr for SymbolEntry {
    type Err = anyhow::Error;

    /// Parses `SYMBOL=direction`; a bare `SYMBOL` carries no prediction.
    fn from_str(s: &str) -> anyhow::Result<Self> {
        let (symbol, prediction) = match s.split_once('=') {
            Some((symbol, direction)) => (symbol, direction.parse::<PredictionDirection>()?),
            None => (s, PredictionDirection::None),
        };
        Self::new(symbol, prediction).context("symbol must be non-empty")
    }
}

/// Builds the scoring batch from raw symbol/direction pairs, skipping blank
/// slots and preserving the given order.
pub fn parse_entries<'a, I>(pairs: I) -> anyhow::Result<Vec<SymbolEntry>>
where
    I: IntoIterator<Item = (&'a str, PredictionDirection)>,
{
    let entries: Vec<SymbolEntry> = pairs
        .into_iter()
        .filter_map(|(symbol, prediction)| SymbolEntry::new(symbol, prediction))
        .collect();

    ensure_batch_size(entries.len())?;
    Ok(entries)
}

pub fn ensure_batch_size(len: usize) -> anyhow::Result<()> {
    ensure!(
        len <= MAX_SYMBOLS,
        "at most {MAX_SYMBOLS} symbols per submission (got {len})"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_and_skips_blank_entries() {
        let entries = parse_entries([
            (" aapl ", PredictionDirection::Bullish),
            ("", PredictionDirection::Bearish),
            ("   ", PredictionDirection::None),
            ("2330.tw", PredictionDirection::Bearish),
        ])
        .unwrap();

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].symbol, "AAPL");
        assert_eq!(entries[0].prediction, PredictionDirection::Bullish);
        assert_eq!(entries[1].symbol, "2330.TW");
    }

    #[test]
    fn rejects_oversized_batches() {
        let raw: Vec<String> = (0..=MAX_SYMBOLS).map(|i| format!("SYM{i}")).collect();
        let pairs = raw
            .iter()
            .map(|s| (s.as_str(), PredictionDirection::Bullish));
        assert!(parse_entries(pairs).is_err());
    }

    #[test]
    fn parses_direction_labels() {
        assert_eq!(
            "看漲".parse::<PredictionDirection>().unwrap(),
            PredictionDirection::Bullish
        );
        assert_eq!(
            "BEARISH".parse::<PredictionDirection>().unwrap(),
            PredictionDirection::Bearish
        );
        assert_eq!(
            "".parse::<PredictionDirection>().unwrap(),
            PredictionDirection::None
        );
        assert!("sideways".parse::<PredictionDirection>().is_err());
    }

    #[test]
    fn parses_cli_entry_argument() {
        let e: SymbolEntry = "tsm=bullish".parse().unwrap();
        assert_eq!(e.symbol, "TSM");
        assert_eq!(e.prediction, PredictionDirection::Bullish);

        let bare: SymbolEntry = "PG".parse().unwrap();
        assert_eq!(bare.prediction, PredictionDirection::None);

        assert!(" =bullish".parse::<SymbolEntry>().is_err());
    }
}
