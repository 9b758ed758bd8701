use serde::{Deserialize, Serialize};

use super::ema::ema_for_stage;
use crate::common::{
    macd_exception::{MacdError, Stage},
    utils::{aligned_diff, ensure_all_finite, trailing},
};

/// Fast, slow and signal periods of a MACD
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct IndicatorParameters {
    #[serde(rename = "fast")]
    pub fast_period: usize,
    #[serde(rename = "slow")]
    pub slow_period: usize,
    #[serde(rename = "signal")]
    pub signal_period: usize,
}

impl IndicatorParameters {
    pub fn new(fast_period: usize, slow_period: usize, signal_period: usize) -> Self {
        Self {
            fast_period,
            slow_period,
            signal_period,
        }
    }

    pub fn validate(&self) -> Result<(), MacdError> {
        if self.fast_period < 1 || self.slow_period < 1 || self.signal_period < 1 {
            return Err(MacdError::InvalidParameters(format!(
                "periods must be at least 1, got fast={} slow={} signal={}",
                self.fast_period, self.slow_period, self.signal_period
            )));
        }
        if self.fast_period >= self.slow_period {
            return Err(MacdError::InvalidParameters(format!(
                "fast period ({}) must be less than slow period ({})",
                self.fast_period, self.slow_period
            )));
        }
        Ok(())
    }

    /// Number of leading input observations that have no histogram value.
    /// Saturates instead of overflowing for extreme periods.
    pub fn warmup(&self) -> usize {
        self.slow_period
            .saturating_add(self.signal_period)
            .saturating_sub(2)
    }

    /// Shortest price series that yields at least one histogram value.
    pub fn min_len(&self) -> usize {
        self.warmup().saturating_add(1)
    }
}

impl Default for IndicatorParameters {
    fn default() -> Self {
        Self::new(12, 26, 9)
    }
}

/// One right-aligned sample of the three MACD series
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MacdPoint {
    pub macd: f64,
    pub signal: f64,
    pub histogram: f64,
}

/// MACD line, signal line and histogram, right-aligned on the most recent value.
///
/// `histogram.len() == signal_line.len() <= macd_line.len()`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MacdResult {
    pub macd_line: Vec<f64>,
    pub signal_line: Vec<f64>,
    pub histogram: Vec<f64>,
}

impl MacdResult {
    pub fn len(&self) -> usize {
        self.histogram.len()
    }

    pub fn is_empty(&self) -> bool {
        self.histogram.is_empty()
    }

    /// Aligned triples, oldest first
    pub fn points(&self) -> impl Iterator<Item = MacdPoint> + '_ {
        trailing(&self.macd_line, self.histogram.len())
            .iter()
            .zip(&self.signal_line)
            .zip(&self.histogram)
            .map(|((&macd, &signal), &histogram)| MacdPoint {
                macd,
                signal,
                histogram,
            })
    }

    pub fn latest(&self) -> Option<MacdPoint> {
        Some(MacdPoint {
            macd: *self.macd_line.last()?,
            signal: *self.signal_line.last()?,
            histogram: *self.histogram.last()?,
        })
    }
}

/// Compute the MACD line, signal line and histogram of `prices`.
///
/// Parameters and data sufficiency are checked before any arithmetic, so a
/// failed call never returns a partial series.
pub fn compute_macd(
    prices: &[f64],
    params: &IndicatorParameters,
) -> Result<MacdResult, MacdError> {
    params.validate()?;
    if prices.len() < params.slow_period {
        return Err(MacdError::InsufficientData {
            stage: Stage::SlowEma,
            required: params.slow_period,
            actual: prices.len(),
        });
    }
    // macd line has prices.len() - slow + 1 values
    let macd_len = prices.len() - params.slow_period + 1;
    if macd_len < params.signal_period {
        return Err(MacdError::InsufficientData {
            stage: Stage::SignalLine,
            required: params.min_len(),
            actual: prices.len(),
        });
    }

    let fast_ema = ema_for_stage(prices, params.fast_period, Stage::FastEma)?;
    let slow_ema = ema_for_stage(prices, params.slow_period, Stage::SlowEma)?;

    let macd_line = aligned_diff(&fast_ema, &slow_ema);
    ensure_all_finite(&macd_line, Stage::MacdLine)?;

    let signal_line = ema_for_stage(&macd_line, params.signal_period, Stage::SignalLine)?;

    let histogram = aligned_diff(&macd_line, &signal_line);
    ensure_all_finite(&histogram, Stage::Histogram)?;

    tracing::debug!(
        fast = fast_ema.len(),
        slow = slow_ema.len(),
        macd = macd_line.len(),
        signal = signal_line.len(),
        "macd computed"
    );

    Ok(MacdResult {
        macd_line,
        signal_line,
        histogram,
    })
}
