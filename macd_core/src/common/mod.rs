pub mod macd_exception;
pub mod utils;
