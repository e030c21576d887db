// CSV record source - local file or HTTP export
use std::path::PathBuf;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;

use crate::application::record_source::RecordSource;
use crate::domain::record::RawRecord;
use crate::infrastructure::config::SourceConfig;

#[derive(Debug, Clone)]
enum CsvLocation {
    File(PathBuf),
    Url(String),
}

/// Loads the meter export and hands it to the pipeline as raw rows. The
/// export is re-read on every load so a file the meter keeps appending to is
/// always served fresh.
#[derive(Debug, Clone)]
pub struct CsvRecordSource {
    location: CsvLocation,
    delimiter: u8,
}

impl CsvRecordSource {
    pub fn from_config(config: &SourceConfig) -> Result<Self> {
        let location = match (&config.path, &config.url) {
            (Some(path), None) => CsvLocation::File(PathBuf::from(path)),
            (None, Some(url)) => CsvLocation::Url(url.clone()),
            (Some(_), Some(_)) => {
                anyhow::bail!("source config sets both `path` and `url`; pick one")
            }
            (None, None) => anyhow::bail!("source config needs either `path` or `url`"),
        };

        Ok(Self {
            location,
            delimiter: config.delimiter_byte(),
        })
    }

    async fn fetch_url(url: &str) -> Result<Vec<u8>> {
        let url = cache_busted(url, Utc::now().timestamp_millis());

        let client = reqwest::Client::new();
        let response = client
            .get(&url)
            .send()
            .await
            .context("Failed to fetch CSV export")?;

        if !response.status().is_success() {
            let status = response.status();
            anyhow::bail!("CSV fetch failed with status {}", status);
        }

        Ok(response
            .bytes()
            .await
            .context("Failed to read CSV response body")?
            .to_vec())
    }
}

#[async_trait]
impl RecordSource for CsvRecordSource {
    async fn load_records(&self) -> Result<Vec<RawRecord>> {
        let data = match &self.location {
            CsvLocation::File(path) => tokio::fs::read(path)
                .await
                .with_context(|| format!("Failed to read CSV file `{}`", path.display()))?,
            CsvLocation::Url(url) => Self::fetch_url(url).await?,
        };

        parse_records(self.delimiter, &data)
    }
}

/// Parse delimiter-separated text into raw column-name-to-text rows. An
/// empty payload yields zero rows rather than an error; the dashboard shows
/// it as "no data".
fn parse_records(delimiter: u8, data: &[u8]) -> Result<Vec<RawRecord>> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(data);

    let headers = reader
        .headers()
        .context("Failed to read CSV headers")?
        .clone();

    let mut records = Vec::new();
    for result in reader.records() {
        let record = result.context("Failed to read CSV record")?;
        let mut row = RawRecord::with_capacity(headers.len());
        for (position, header) in headers.iter().enumerate() {
            if let Some(value) = record.get(position) {
                row.insert(header.to_string(), value.to_string());
            }
        }
        records.push(row);
    }

    Ok(records)
}

/// Append a timestamp query parameter so intermediate caches never serve a
/// stale export.
fn cache_busted(url: &str, timestamp: i64) -> String {
    let separator = if url.contains('?') { '&' } else { '?' };
    format!("{url}{separator}t={timestamp}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_semicolon_delimited() {
        let data = b"timestamp1;hora;30\n02/01/2025;10:00:00;1.5\n02/01/2025;10:00:05;2.5\n";
        let records = parse_records(b';', data).unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0]["hora"], "10:00:00");
        assert_eq!(records[1]["30"], "2.5");
    }

    #[test]
    fn test_parse_comma_delimited() {
        let data = b"hora,30\n10:00:00,1.5\n";
        let records = parse_records(b',', data).unwrap();
        assert_eq!(records[0]["30"], "1.5");
    }

    #[test]
    fn test_parse_trims_cells() {
        let data = b"hora;30\n 10:00:00 ; 1.5 \n";
        let records = parse_records(b';', data).unwrap();
        assert_eq!(records[0]["hora"], "10:00:00");
        assert_eq!(records[0]["30"], "1.5");
    }

    #[test]
    fn test_parse_short_rows_keep_present_columns() {
        let data = b"hora;30;27\n10:00:00;1.5\n";
        let records = parse_records(b';', data).unwrap();
        assert_eq!(records[0].len(), 2);
        assert!(!records[0].contains_key("27"));
    }

    #[test]
    fn test_empty_payload_is_zero_rows() {
        assert!(parse_records(b';', b"").unwrap().is_empty());
        assert!(parse_records(b';', b"hora;30\n").unwrap().is_empty());
    }

    #[test]
    fn test_cache_busted_url() {
        assert_eq!(
            cache_busted("http://meter.local/data.csv", 1700000000000),
            "http://meter.local/data.csv?t=1700000000000"
        );
        assert_eq!(
            cache_busted("http://meter.local/data.csv?site=a", 5),
            "http://meter.local/data.csv?site=a&t=5"
        );
    }

    #[test]
    fn test_from_config_needs_exactly_one_location() {
        let neither = SourceConfig {
            path: None,
            url: None,
            delimiter: ";".to_string(),
        };
        assert!(CsvRecordSource::from_config(&neither).is_err());

        let both = SourceConfig {
            path: Some("data.csv".to_string()),
            url: Some("http://meter.local/data.csv".to_string()),
            delimiter: ";".to_string(),
        };
        assert!(CsvRecordSource::from_config(&both).is_err());
    }
}
