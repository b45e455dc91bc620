/// yahoo.rs — Yahoo Finance chart API client
///
/// One request covers the whole window: hourly bars are served for up to
/// 730 days back, far more than a one-year run needs.
///
///   GET {base}/v8/finance/chart/{symbol}
///       ?period1={start 00:00 UTC}&period2={end 00:00 UTC}
///       &interval=1h&includePrePost=false&events=div,splits
///
/// Bars are stamped in the exchange's UTC offset (`meta.gmtoffset`), the
/// same wall-clock times the CSV carries.
use std::time::Duration;

use anyhow::{bail, Context, Result};
use chrono::{DateTime, FixedOffset, NaiveDate};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use vol_engine::PriceBar;

const USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36";
const MAX_RATE_LIMIT_RETRIES: u32 = 5;
const RATE_LIMIT_PAUSE: Duration = Duration::from_secs(10);

// ── Wire format ──────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: Chart,
}

#[derive(Debug, Deserialize)]
struct Chart {
    result: Option<Vec<ChartResult>>,
    error:  Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code:        String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    meta:       ChartMeta,
    #[serde(default)]
    timestamp:  Vec<i64>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
struct ChartMeta {
    #[serde(default)]
    gmtoffset: i32,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    quote: Vec<Quote>,
}

#[derive(Debug, Default, Deserialize)]
struct Quote {
    #[serde(default)]
    open:   Vec<Option<f64>>,
    #[serde(default)]
    high:   Vec<Option<f64>>,
    #[serde(default)]
    low:    Vec<Option<f64>>,
    #[serde(default)]
    close:  Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<f64>>,
}

// ── Client ───────────────────────────────────────────────────────────────

pub struct YahooClient {
    client:   Client,
    base_url: String,
}

impl YahooClient {
    pub fn new(base_url: &str, timeout_secs: u64) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .context("building HTTP client")?;
        Ok(Self { client, base_url: base_url.trim_end_matches('/').to_owned() })
    }

    pub fn chart_url(&self, symbol: &str, start: NaiveDate, end: NaiveDate, interval: &str) -> String {
        format!(
            "{}/v8/finance/chart/{}?period1={}&period2={}&interval={}&includePrePost=false&events=div%2Csplits",
            self.base_url,
            symbol,
            midnight_utc(start),
            midnight_utc(end),
            interval
        )
    }

    /// Download bars in `[start, end)`.  HTTP 429 is retried after a pause;
    /// any other failure is returned.
    pub async fn fetch_bars(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
        interval: &str,
    ) -> Result<Vec<PriceBar>> {
        let url = self.chart_url(symbol, start, end, interval);
        info!("Downloading {symbol} {interval} bars {start} → {end}");
        debug!("GET {url}");

        let mut attempt = 0;
        let body = loop {
            let response = self
                .client
                .get(&url)
                .send()
                .await
                .with_context(|| format!("requesting {symbol} chart"))?;

            let status = response.status();
            match status_action(status, attempt) {
                StatusAction::Retry => {
                    attempt += 1;
                    warn!(
                        "Rate limited (429). Sleeping {}s before retry {attempt}/{MAX_RATE_LIMIT_RETRIES}",
                        RATE_LIMIT_PAUSE.as_secs()
                    );
                    sleep(RATE_LIMIT_PAUSE).await;
                }
                StatusAction::Fail => {
                    let text = response.text().await.unwrap_or_default();
                    bail!(
                        "Yahoo chart request for {symbol} failed with {status}: {}",
                        snippet(&text)
                    );
                }
                StatusAction::Read => {
                    break response.text().await.context("reading chart response body")?;
                }
            }
        };

        let bars = parse_chart(&body).with_context(|| format!("parsing {symbol} chart"))?;
        if bars.is_empty() {
            bail!("No {interval} bars returned for {symbol} between {start} and {end}");
        }
        info!(
            "Received {} bars ({} → {})",
            bars.len(),
            bars[0].timestamp,
            bars[bars.len() - 1].timestamp
        );
        Ok(bars)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StatusAction {
    Read,
    Retry,
    Fail,
}

/// What to do with a response, given how many 429 retries were already spent.
fn status_action(status: StatusCode, retries_done: u32) -> StatusAction {
    if status == StatusCode::TOO_MANY_REQUESTS && retries_done < MAX_RATE_LIMIT_RETRIES {
        StatusAction::Retry
    } else if status.is_success() {
        StatusAction::Read
    } else {
        StatusAction::Fail
    }
}

fn snippet(text: &str) -> String {
    text.chars().take(200).collect()
}

fn midnight_utc(day: NaiveDate) -> i64 {
    day.and_hms_opt(0, 0, 0).map(|t| t.and_utc().timestamp()).unwrap_or_default()
}

/// Decode a chart API body into bars.  Rows without a complete OHLC quote
/// are dropped; a missing volume counts as zero.
pub fn parse_chart(body: &str) -> Result<Vec<PriceBar>> {
    let resp: ChartResponse = serde_json::from_str(body).map_err(|e| {
        debug!("Raw response: {}", snippet(body));
        anyhow::anyhow!("malformed chart JSON: {e}")
    })?;

    if let Some(err) = resp.chart.error {
        bail!("Yahoo returned {}: {}", err.code, err.description);
    }
    let Some(result) = resp.chart.result.and_then(|r| r.into_iter().next()) else {
        bail!("chart response has no result");
    };

    let tz = FixedOffset::east_opt(result.meta.gmtoffset)
        .with_context(|| format!("invalid gmtoffset {}", result.meta.gmtoffset))?;
    let quote = result.indicators.quote.into_iter().next().unwrap_or_default();
    let at = |v: &[Option<f64>], i: usize| v.get(i).copied().flatten();

    let mut bars = Vec::with_capacity(result.timestamp.len());
    let mut skipped = 0usize;
    for (i, &ts) in result.timestamp.iter().enumerate() {
        let ohlc = (at(&quote.open, i), at(&quote.high, i), at(&quote.low, i), at(&quote.close, i));
        let (Some(open), Some(high), Some(low), Some(close)) = ohlc else {
            skipped += 1;
            continue;
        };
        let timestamp = DateTime::from_timestamp(ts, 0)
            .with_context(|| format!("timestamp {ts} out of range"))?
            .with_timezone(&tz);
        bars.push(PriceBar {
            timestamp,
            open,
            high,
            low,
            close,
            volume: at(&quote.volume, i).unwrap_or(0.0),
        });
    }
    if skipped > 0 {
        debug!("Dropped {skipped} rows with missing quotes");
    }
    Ok(bars)
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIXTURE: &str = r#"{
      "chart": {
        "result": [{
          "meta": { "currency": "USD", "symbol": "WMT", "gmtoffset": -18000, "timezone": "EST" },
          "timestamp": [1739197800, 1739201400, 1739205000, 1739208600],
          "indicators": {
            "quote": [{
              "open":   [98.10, 98.40, null, 98.90],
              "high":   [98.60, 98.75, null, 99.20],
              "low":    [97.95, 98.20, null, 98.70],
              "close":  [98.41, 98.55, null, 99.05],
              "volume": [2451300, 1190200, null, null]
            }]
          }
        }],
        "error": null
      }
    }"#;

    #[test]
    fn parses_bars_in_exchange_time() {
        let bars = parse_chart(FIXTURE).unwrap();
        assert_eq!(bars.len(), 3);
        assert_eq!(bars[0].timestamp.to_rfc3339(), "2025-02-10T09:30:00-05:00");
        assert_eq!(bars[0].close, 98.41);
        assert_eq!(bars[1].volume, 1_190_200.0);
        // missing volume on an otherwise complete row
        assert_eq!(bars[2].volume, 0.0);
        assert_eq!(bars[2].timestamp.to_rfc3339(), "2025-02-10T12:30:00-05:00");
    }

    #[test]
    fn api_error_is_reported() {
        let body = r#"{"chart":{"result":null,"error":{"code":"Not Found","description":"No data found, symbol may be delisted"}}}"#;
        let err = parse_chart(body).unwrap_err();
        assert!(err.to_string().contains("delisted"));
    }

    #[test]
    fn empty_result_yields_no_bars() {
        let body = r#"{"chart":{"result":[{"meta":{"gmtoffset":0},"indicators":{"quote":[{}]}}],"error":null}}"#;
        assert!(parse_chart(body).unwrap().is_empty());
    }

    #[test]
    fn malformed_body_is_an_error() {
        assert!(parse_chart("<html>Too Many Requests</html>").is_err());
    }

    #[test]
    fn rate_limit_is_retried_up_to_the_cap() {
        for done in 0..MAX_RATE_LIMIT_RETRIES {
            assert_eq!(status_action(StatusCode::TOO_MANY_REQUESTS, done), StatusAction::Retry);
        }
        assert_eq!(
            status_action(StatusCode::TOO_MANY_REQUESTS, MAX_RATE_LIMIT_RETRIES),
            StatusAction::Fail
        );
    }

    #[test]
    fn other_statuses_are_not_retried() {
        assert_eq!(status_action(StatusCode::OK, 0), StatusAction::Read);
        assert_eq!(status_action(StatusCode::OK, MAX_RATE_LIMIT_RETRIES), StatusAction::Read);
        assert_eq!(status_action(StatusCode::INTERNAL_SERVER_ERROR, 0), StatusAction::Fail);
        assert_eq!(status_action(StatusCode::NOT_FOUND, 0), StatusAction::Fail);
    }

    #[test]
    fn url_uses_utc_midnights() {
        let client = YahooClient::new("https://example.test/", 5).unwrap();
        let start = NaiveDate::from_ymd_opt(2025, 2, 10).unwrap();
        let end = NaiveDate::from_ymd_opt(2026, 2, 10).unwrap();
        let url = client.chart_url("WMT", start, end, "1h");
        assert!(url.starts_with("https://example.test/v8/finance/chart/WMT?"));
        assert!(url.contains("period1=1739145600"));
        assert!(url.contains("period2=1770681600"));
        assert!(url.contains("interval=1h"));
    }
}
