pub mod ema;
pub mod macd;
