use anyhow::{bail, Context, Result};
use chrono::NaiveDateTime;
use csv::{Reader, StringRecord, Writer};
use macd_core::{compute_macd, MacdConfig, MacdResult, DEFAULT_TIME_COLUMN};
use std::collections::HashMap;
use std::fs::File;
use std::io::{self, Read, Write};
use std::path::Path;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, PartialEq)]
struct PriceRecord {
    timestamp: Option<NaiveDateTime>,
    price: f64,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let mut args = std::env::args().skip(1);
    let Some(csv_path) = args.next() else {
        bail!("usage: macd_cli <prices.csv> [config.json]");
    };
    let config = load_config(args.next().as_deref().map(Path::new))?;

    let file = File::open(&csv_path).with_context(|| format!("opening {}", csv_path))?;
    let records = read_prices(file, &config).with_context(|| format!("reading {}", csv_path))?;
    info!(
        path = %csv_path,
        rows = records.len(),
        fast = config.macd.fast_period,
        slow = config.macd.slow_period,
        signal = config.macd.signal_period,
        "computing macd"
    );

    let prices: Vec<f64> = records.iter().map(|r| r.price).collect();
    let result = compute_macd(&prices, &config.macd)
        .with_context(|| format!("computing macd for {}", csv_path))?;
    info!(points = result.len(), "macd computed");

    write_rows(io::stdout().lock(), &records, &result)?;
    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<MacdConfig> {
    let Some(path) = path else {
        return Ok(MacdConfig::default());
    };
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let conf: HashMap<String, serde_json::Value> = serde_json::from_reader(file)
        .with_context(|| format!("parsing {}", path.display()))?;
    debug!(keys = conf.len(), "config loaded");
    Ok(MacdConfig::new(Some(conf))?)
}

fn read_prices<R: Read>(input: R, config: &MacdConfig) -> Result<Vec<PriceRecord>> {
    let mut rdr = Reader::from_reader(input);
    let headers = rdr.headers()?.clone();

    let price_idx = column_index(&headers, &config.price_column)
        .with_context(|| format!("missing price column '{}'", config.price_column))?;
    let time_idx = match config.time_column.as_deref() {
        Some(name) => match column_index(&headers, name) {
            Some(idx) => Some(idx),
            None if name == DEFAULT_TIME_COLUMN => None,
            None => bail!("missing time column '{}'", name),
        },
        None => None,
    };

    let mut records = Vec::new();
    for (line, result) in rdr.records().enumerate() {
        let record = result?;
        let parsed = parse_record(&record, price_idx, time_idx, &config.time_format)
            .with_context(|| format!("bad row {}", line + 1))?;
        records.push(parsed);
    }

    if time_idx.is_some() {
        records.sort_by_key(|r| r.timestamp);
    }

    Ok(records)
}

fn column_index(headers: &StringRecord, name: &str) -> Option<usize> {
    headers.iter().position(|h| h.trim() == name)
}

fn parse_record(
    record: &StringRecord,
    price_idx: usize,
    time_idx: Option<usize>,
    time_format: &str,
) -> Result<PriceRecord> {
    let price = record
        .get(price_idx)
        .context("price field missing")?
        .trim()
        .parse()?;
    let timestamp = match time_idx {
        Some(idx) => {
            let raw = record.get(idx).context("time field missing")?.trim();
            Some(NaiveDateTime::parse_from_str(raw, time_format)?)
        }
        None => None,
    };
    Ok(PriceRecord { timestamp, price })
}

/// One output row per histogram value, aligned to its input row.
fn write_rows<W: Write>(out: W, records: &[PriceRecord], result: &MacdResult) -> Result<()> {
    let mut wtr = Writer::from_writer(out);
    wtr.write_record(["timestamp", "price", "macd", "signal", "histogram"])?;

    let offset = records.len() - result.len();
    for (record, point) in records[offset..].iter().zip(result.points()) {
        let timestamp = record
            .timestamp
            .map(|t| t.to_string())
            .unwrap_or_default();
        wtr.write_record([
            timestamp,
            record.price.to_string(),
            point.macd.to_string(),
            point.signal.to_string(),
            point.histogram.to_string(),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use macd_core::IndicatorParameters;

    const CSV: &str = "\
timestamp,open,close
2024-01-03 00:00:00,1,12.0
2024-01-01 00:00:00,1,10.0
2024-01-02 00:00:00,1,11.0
";

    #[test]
    fn test_read_prices_sorts_by_time() {
        let records = read_prices(CSV.as_bytes(), &MacdConfig::default()).unwrap();
        let prices: Vec<f64> = records.iter().map(|r| r.price).collect();
        assert_eq!(prices, vec![10.0, 11.0, 12.0]);
        assert!(records[0].timestamp < records[1].timestamp);
    }

    #[test]
    fn test_read_prices_without_time_column() {
        let config = MacdConfig {
            time_column: None,
            ..MacdConfig::default()
        };
        let records = read_prices(CSV.as_bytes(), &config).unwrap();
        let prices: Vec<f64> = records.iter().map(|r| r.price).collect();
        assert_eq!(prices, vec![12.0, 10.0, 11.0]);
        assert!(records.iter().all(|r| r.timestamp.is_none()));
    }

    #[test]
    fn test_missing_price_column() {
        let config = MacdConfig {
            price_column: "adj_close".to_string(),
            ..MacdConfig::default()
        };
        assert!(read_prices(CSV.as_bytes(), &config).is_err());
    }

    #[test]
    fn test_default_time_column_may_be_absent() {
        let csv = "open,close\n1,12.0\n1,10.0\n";
        let records = read_prices(csv.as_bytes(), &MacdConfig::default()).unwrap();
        let prices: Vec<f64> = records.iter().map(|r| r.price).collect();
        assert_eq!(prices, vec![12.0, 10.0]);
    }

    #[test]
    fn test_configured_time_column_must_exist() {
        let config = MacdConfig {
            time_column: Some("date".to_string()),
            ..MacdConfig::default()
        };
        let err = read_prices(CSV.as_bytes(), &config).unwrap_err();
        assert!(err.to_string().contains("missing time column 'date'"));
    }

    #[test]
    fn test_bad_price_value() {
        let csv = "timestamp,close\n2024-01-01 00:00:00,abc\n";
        assert!(read_prices(csv.as_bytes(), &MacdConfig::default()).is_err());
    }

    #[test]
    fn test_write_rows_aligns_to_tail() {
        let records: Vec<PriceRecord> = (0..12)
            .map(|i| PriceRecord {
                timestamp: None,
                price: 10.0 + i as f64,
            })
            .collect();
        let prices: Vec<f64> = records.iter().map(|r| r.price).collect();
        let result = compute_macd(&prices, &IndicatorParameters::new(2, 4, 3)).unwrap();

        let mut out = Vec::new();
        write_rows(&mut out, &records, &result).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], "timestamp,price,macd,signal,histogram");
        assert_eq!(lines.len(), result.len() + 1);
        assert!(lines[1].starts_with(",15,"));
        assert!(lines.last().unwrap().starts_with(",21,"));
    }
}
