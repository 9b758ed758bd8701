use crate::common::{
    macd_exception::{MacdError, Stage},
    utils::{ensure_all_finite, ensure_finite},
};

/// Exponential moving average of `prices` over `period` observations.
///
/// The first value is the simple mean of the first `period` prices and sits at
/// input index `period - 1`. Every later value follows
/// `ema = alpha * price + (1 - alpha) * prev` with `alpha = 2 / (period + 1)`.
/// The output therefore has `prices.len() - period + 1` values.
pub fn compute_ema(prices: &[f64], period: usize) -> Result<Vec<f64>, MacdError> {
    ema_for_stage(prices, period, Stage::Ema)
}

pub(crate) fn ema_for_stage(
    prices: &[f64],
    period: usize,
    stage: Stage,
) -> Result<Vec<f64>, MacdError> {
    if period == 0 {
        return Err(MacdError::InvalidParameters(format!(
            "{} period must be at least 1",
            stage
        )));
    }
    if prices.len() < period {
        return Err(MacdError::InsufficientData {
            stage,
            required: period,
            actual: prices.len(),
        });
    }

    // alpha == 1, nothing to smooth
    if period == 1 {
        ensure_all_finite(prices, stage)?;
        return Ok(prices.to_vec());
    }

    let alpha = 2.0 / (period as f64 + 1.0);
    let seed = prices[..period].iter().sum::<f64>() / period as f64;

    let mut ema = Vec::with_capacity(prices.len() - period + 1);
    let mut prev = ensure_finite(seed, stage, 0)?;
    ema.push(prev);

    for &price in &prices[period..] {
        prev = ensure_finite(alpha * price + (1.0 - alpha) * prev, stage, ema.len())?;
        ema.push(prev);
    }

    tracing::trace!(%stage, period, input = prices.len(), output = ema.len(), "ema computed");
    Ok(ema)
}
