use strum_macros::{Display, EnumString};
use thiserror::Error;

/// Error codes for the MACD pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[repr(i32)]
pub enum ErrCode {
    #[strum(serialize = "INVALID_PARAMETERS")]
    InvalidParameters = 1,
    #[strum(serialize = "INSUFFICIENT_DATA")]
    InsufficientData = 2,
    #[strum(serialize = "COMPUTATION_ERROR")]
    ComputationError = 3,
    #[strum(serialize = "CONFIG_ERROR")]
    ConfigError = 4,
}

/// Pipeline stage an error was raised in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum Stage {
    #[strum(serialize = "ema")]
    Ema,
    #[strum(serialize = "fast ema")]
    FastEma,
    #[strum(serialize = "slow ema")]
    SlowEma,
    #[strum(serialize = "macd line")]
    MacdLine,
    #[strum(serialize = "signal line")]
    SignalLine,
    #[strum(serialize = "histogram")]
    Histogram,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum MacdError {
    #[error("{}: {0}", ErrCode::InvalidParameters)]
    InvalidParameters(String),

    #[error(
        "{}: {stage} needs at least {required} observations, got {actual}",
        ErrCode::InsufficientData
    )]
    InsufficientData {
        stage: Stage,
        required: usize,
        actual: usize,
    },

    #[error(
        "{}: non-finite value {value} in {stage} at index {index}",
        ErrCode::ComputationError
    )]
    Computation {
        stage: Stage,
        index: usize,
        value: f64,
    },

    #[error("{}: {0}", ErrCode::ConfigError)]
    Config(String),
}

impl MacdError {
    pub fn errcode(&self) -> ErrCode {
        match self {
            MacdError::InvalidParameters(_) => ErrCode::InvalidParameters,
            MacdError::InsufficientData { .. } => ErrCode::InsufficientData,
            MacdError::Computation { .. } => ErrCode::ComputationError,
            MacdError::Config(_) => ErrCode::ConfigError,
        }
    }

    /// Errors caused by what the caller passed in.
    pub fn is_input_err(&self) -> bool {
        !self.is_internal_err()
    }

    /// A non-finite value escaped the arithmetic. Unreachable for finite input.
    pub fn is_internal_err(&self) -> bool {
        matches!(self, MacdError::Computation { .. })
    }
}
