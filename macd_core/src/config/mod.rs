pub mod macd_config;
