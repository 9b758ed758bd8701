use super::macd_exception::{MacdError, Stage};

/// Last `len` values of `values`, or the whole slice if it is shorter
pub fn trailing(values: &[f64], len: usize) -> &[f64] {
    &values[values.len().saturating_sub(len)..]
}

/// Element-wise `lhs - rhs` over two right-aligned series.
/// The result has the length of the shorter input.
pub fn aligned_diff(lhs: &[f64], rhs: &[f64]) -> Vec<f64> {
    let len = lhs.len().min(rhs.len());
    trailing(lhs, len)
        .iter()
        .zip(trailing(rhs, len))
        .map(|(l, r)| l - r)
        .collect()
}

/// Pass `value` through, or report it as a computation error
pub fn ensure_finite(value: f64, stage: Stage, index: usize) -> Result<f64, MacdError> {
    if value.is_finite() {
        Ok(value)
    } else {
        tracing::warn!(%stage, index, value, "non-finite value produced");
        Err(MacdError::Computation {
            stage,
            index,
            value,
        })
    }
}

/// Check a whole series for non-finite values
pub fn ensure_all_finite(values: &[f64], stage: Stage) -> Result<(), MacdError> {
    for (index, &value) in values.iter().enumerate() {
        ensure_finite(value, stage, index)?;
    }
    Ok(())
}
