//! Technical indicators over daily closes

use crate::error::{AdvisorError, Result};
use serde::{Deserialize, Serialize};
use ta::{
    Next,
    indicators::{ExponentialMovingAverage, SimpleMovingAverage},
};
use tracing::warn;

pub const RSI_PERIOD: usize = 14;

/// Length of the flat series used when no history is available
pub const FALLBACK_HISTORY_LEN: usize = 100;
pub const FALLBACK_CLOSE: f64 = 100.0;

/// Latest indicator readings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TechnicalIndicators {
    pub rsi: f64,
    pub macd: f64,
    pub macd_signal: f64,
    pub sma_50: f64,
    pub sma_200: f64,
}

impl Default for TechnicalIndicators {
    fn default() -> Self {
        Self {
            rsi: 50.0,
            macd: 0.0,
            macd_signal: 0.0,
            sma_50: 0.0,
            sma_200: 0.0,
        }
    }
}

/// Flat series standing in for missing price history
pub fn fallback_closes() -> Vec<f64> {
    vec![FALLBACK_CLOSE; FALLBACK_HISTORY_LEN]
}

fn indicator_err(e: impl std::fmt::Display) -> AdvisorError {
    AdvisorError::IndicatorError(e.to_string())
}

impl TechnicalIndicators {
    /// Compute indicators, falling back to the neutral defaults on any error
    pub fn from_closes(closes: &[f64]) -> Self {
        match Self::compute(closes) {
            Ok(indicators) => indicators,
            Err(e) => {
                warn!(error = %e, "technical indicator calculation failed, using defaults");
                Self::default()
            }
        }
    }

    /// Compute indicators from closes ordered oldest first
    pub fn compute(closes: &[f64]) -> Result<Self> {
        if closes.is_empty() {
            return Err(AdvisorError::IndicatorError("no closing prices".to_string()));
        }
        if closes.iter().any(|c| !c.is_finite()) {
            return Err(AdvisorError::IndicatorError("non-finite closing price".to_string()));
        }

        let (macd, macd_signal) = macd(closes)?;

        Ok(Self {
            rsi: rsi(closes)?,
            macd,
            macd_signal,
            sma_50: trailing_mean(closes, 50),
            sma_200: trailing_mean(closes, 200),
        })
    }

    pub fn rsi_signal(&self) -> &'static str {
        interpret_rsi(self.rsi)
    }
}

/// RSI over simple means of the last 14 gains and losses
///
/// The first close contributes a zero change. Fewer than 14 closes, or a window
/// with no movement at all, reads as neutral 50.
fn rsi(closes: &[f64]) -> Result<f64> {
    if closes.len() < RSI_PERIOD {
        return Ok(50.0);
    }

    let mut gains = SimpleMovingAverage::new(RSI_PERIOD).map_err(indicator_err)?;
    let mut losses = SimpleMovingAverage::new(RSI_PERIOD).map_err(indicator_err)?;
    let mut avg_gain = 0.0;
    let mut avg_loss = 0.0;
    let mut previous = closes[0];

    for &close in closes {
        let delta = close - previous;
        previous = close;
        avg_gain = gains.next(delta.max(0.0));
        avg_loss = losses.next((-delta).max(0.0));
    }

    Ok(match (avg_gain > 0.0, avg_loss > 0.0) {
        (_, true) => 100.0 - 100.0 / (1.0 + avg_gain / avg_loss),
        (true, false) => 100.0,
        (false, false) => 50.0,
    })
}

/// MACD line (EMA12 - EMA26) and its EMA9 signal, both seeded by the first value
fn macd(closes: &[f64]) -> Result<(f64, f64)> {
    let mut fast = ExponentialMovingAverage::new(12).map_err(indicator_err)?;
    let mut slow = ExponentialMovingAverage::new(26).map_err(indicator_err)?;
    let mut signal = ExponentialMovingAverage::new(9).map_err(indicator_err)?;

    let mut line = 0.0;
    let mut sig = 0.0;
    for &close in closes {
        line = fast.next(close) - slow.next(close);
        sig = signal.next(line);
    }
    Ok((line, sig))
}

fn trailing_mean(closes: &[f64], window: usize) -> f64 {
    if closes.len() < window {
        return 0.0;
    }
    let tail = &closes[closes.len() - window..];
    tail.iter().sum::<f64>() / window as f64
}

/// Overbought above 70, oversold below 30
pub fn interpret_rsi(rsi: f64) -> &'static str {
    if rsi > 70.0 {
        "Overbought"
    } else if rsi < 30.0 {
        "Oversold"
    } else {
        "Neutral"
    }
}
