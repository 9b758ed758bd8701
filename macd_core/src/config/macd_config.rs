use std::collections::HashMap;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::common::macd_exception::MacdError;
use crate::math::macd::IndicatorParameters;

/// Time column assumed when none is configured; inputs may omit it
pub const DEFAULT_TIME_COLUMN: &str = "timestamp";

/// MACD run configuration
#[derive(Debug, Clone, PartialEq)]
pub struct MacdConfig {
    pub macd: IndicatorParameters,
    /// Column holding the price observations
    pub price_column: String,
    /// Column holding the observation time, `None` if the input has none
    pub time_column: Option<String>,
    /// chrono format string for `time_column`
    pub time_format: String,
}

impl MacdConfig {
    pub fn new(conf: Option<HashMap<String, Value>>) -> Result<Self, MacdError> {
        let mut conf = ConfigWithCheck::new(conf.unwrap_or_default());

        let time_column = match conf.take("time_column") {
            None => Some(DEFAULT_TIME_COLUMN.to_string()),
            Some(Value::Null) => None,
            Some(v) => Some(ConfigWithCheck::parse("time_column", v)?),
        };

        let config = Self {
            macd: conf.get("macd")?.unwrap_or_default(),
            price_column: conf.get("price_column")?.unwrap_or_else(|| "close".to_string()),
            time_column,
            time_format: conf
                .get("time_format")?
                .unwrap_or_else(|| "%Y-%m-%d %H:%M:%S".to_string()),
        };

        conf.check()?;
        config.macd.validate()?;

        Ok(config)
    }
}

impl Default for MacdConfig {
    fn default() -> Self {
        Self {
            macd: IndicatorParameters::default(),
            price_column: "close".to_string(),
            time_column: Some(DEFAULT_TIME_COLUMN.to_string()),
            time_format: "%Y-%m-%d %H:%M:%S".to_string(),
        }
    }
}

/// Loosely typed config map that remembers which keys were consumed
#[derive(Debug, Default)]
pub struct ConfigWithCheck {
    conf: HashMap<String, Value>,
}

impl ConfigWithCheck {
    pub fn new(conf: HashMap<String, Value>) -> Self {
        Self { conf }
    }

    /// Remove `key` and deserialize it
    pub fn get<T: DeserializeOwned>(&mut self, key: &str) -> Result<Option<T>, MacdError> {
        self.take(key).map(|v| Self::parse(key, v)).transpose()
    }

    /// Remove `key` without interpreting it
    pub fn take(&mut self, key: &str) -> Option<Value> {
        self.conf.remove(key)
    }

    fn parse<T: DeserializeOwned>(key: &str, value: Value) -> Result<T, MacdError> {
        serde_json::from_value(value)
            .map_err(|e| MacdError::Config(format!("invalid value for {}: {}", key, e)))
    }

    /// Fail on any key nobody asked for
    pub fn check(self) -> Result<(), MacdError> {
        let mut unknown: Vec<String> = self.conf.into_keys().collect();
        if unknown.is_empty() {
            return Ok(());
        }
        unknown.sort();
        Err(MacdError::Config(format!("unknown para = {}", unknown.join(", "))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::macd_exception::ErrCode;
    use serde_json::json;

    fn conf(value: Value) -> Option<HashMap<String, Value>> {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_defaults() {
        let config = MacdConfig::new(None).unwrap();
        assert_eq!(config, MacdConfig::default());
        assert_eq!(config.macd, IndicatorParameters::new(12, 26, 9));
        assert_eq!(config.price_column, "close");
        assert_eq!(config.time_column.as_deref(), Some("timestamp"));
    }

    #[test]
    fn test_overrides() {
        let config = MacdConfig::new(conf(json!({
            "macd": {"fast": 5, "slow": 10, "signal": 3},
            "price_column": "adj_close",
            "time_column": "date",
            "time_format": "%Y-%m-%d",
        })))
        .unwrap();
        assert_eq!(config.macd, IndicatorParameters::new(5, 10, 3));
        assert_eq!(config.price_column, "adj_close");
        assert_eq!(config.time_column.as_deref(), Some("date"));
        assert_eq!(config.time_format, "%Y-%m-%d");
    }

    #[test]
    fn test_null_time_column_disables_timestamps() {
        let config = MacdConfig::new(conf(json!({"time_column": null}))).unwrap();
        assert_eq!(config.time_column, None);
    }

    #[test]
    fn test_partial_macd_block_keeps_defaults() {
        let config = MacdConfig::new(conf(json!({"macd": {"signal": 4}}))).unwrap();
        assert_eq!(config.macd, IndicatorParameters::new(12, 26, 4));
    }

    #[test]
    fn test_unknown_key() {
        let err = MacdConfig::new(conf(json!({"rsi_cycle": 14, "boll_n": 20}))).unwrap_err();
        assert_eq!(err.errcode(), ErrCode::ConfigError);
        assert_eq!(
            err,
            MacdError::Config("unknown para = boll_n, rsi_cycle".to_string())
        );
    }

    #[test]
    fn test_wrong_type() {
        let err = MacdConfig::new(conf(json!({"price_column": 3}))).unwrap_err();
        assert_eq!(err.errcode(), ErrCode::ConfigError);

        let err = MacdConfig::new(conf(json!({"macd": {"fast": -1}}))).unwrap_err();
        assert_eq!(err.errcode(), ErrCode::ConfigError);
    }

    #[test]
    fn test_invalid_periods_rejected() {
        let err = MacdConfig::new(conf(json!({"macd": {"fast": 26, "slow": 12}}))).unwrap_err();
        assert_eq!(err.errcode(), ErrCode::InvalidParameters);
    }

    #[test]
    fn test_config_with_check_tracks_consumed_keys() {
        let mut cfg = ConfigWithCheck::new(conf(json!({"a": 1, "b": "x"})).unwrap());
        assert_eq!(cfg.get::<i32>("a").unwrap(), Some(1));
        assert_eq!(cfg.get::<i32>("missing").unwrap(), None);
        assert!(cfg.get::<i32>("b").is_err());
        assert!(cfg.check().is_ok());
    }
}
