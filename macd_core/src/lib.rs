pub mod common;
pub mod config;
pub mod math;

pub use common::macd_exception::{ErrCode, MacdError, Stage};
pub use config::macd_config::{ConfigWithCheck, MacdConfig, DEFAULT_TIME_COLUMN};
pub use math::ema::compute_ema;
pub use math::macd::{compute_macd, IndicatorParameters, MacdPoint, MacdResult};
