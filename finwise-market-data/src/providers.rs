use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;

const POLYGON_BASE_URL: &str = "https://api.polygon.io";
const FOREX_RATES_URL: &str = "https://open.er-api.com/v6/latest/USD";

/// Per-request timeout for provider calls. Kept well under the chat
/// pipeline's generation deadlines so a hung provider cannot stall a
/// cache refresh indefinitely.
const PROVIDER_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Error)]
pub enum MarketDataError {
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("provider returned HTTP {status}: {body}")]
    Api { status: u16, body: String },
    #[error("malformed provider response: {0}")]
    Malformed(String),
}

/// Last value and percent change for one index.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IndexReading {
    pub value: f64,
    pub percent_change: f64,
}

/// Source of index quotes, looked up by provider ticker.
#[async_trait]
pub trait IndexProvider: Send + Sync {
    async fn prev_session(&self, ticker: &str) -> Result<IndexReading, MarketDataError>;
}

/// Source of the latest USD to INR conversion rate.
#[async_trait]
pub trait ForexProvider: Send + Sync {
    async fn usd_inr(&self) -> Result<f64, MarketDataError>;
}

fn http_client() -> Client {
    Client::builder()
        .timeout(PROVIDER_TIMEOUT)
        .build()
        .unwrap_or_else(|_| Client::new())
}

/// Index quotes from Polygon's previous-day aggregate endpoint.
pub struct PolygonIndexProvider {
    api_key: String,
    client: Client,
}

impl PolygonIndexProvider {
    pub fn new(api_key: String) -> Self {
        Self {
            api_key,
            client: http_client(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct PrevAggResponse {
    #[serde(default)]
    results: Vec<PrevAggBar>,
}

#[derive(Debug, Deserialize)]
struct PrevAggBar {
    o: f64,
    c: f64,
}

fn reading_from_prev_agg(parsed: &PrevAggResponse) -> Result<IndexReading, MarketDataError> {
    let bar = parsed.results.first().ok_or_else(|| {
        MarketDataError::Malformed("prev-day response carried no bars".to_string())
    })?;
    let percent_change = if bar.o.abs() > 1e-10 {
        (bar.c - bar.o) / bar.o * 100.0
    } else {
        0.0
    };
    Ok(IndexReading {
        value: bar.c,
        percent_change,
    })
}

#[async_trait]
impl IndexProvider for PolygonIndexProvider {
    async fn prev_session(&self, ticker: &str) -> Result<IndexReading, MarketDataError> {
        let url = format!("{}/v2/aggs/ticker/{}/prev", POLYGON_BASE_URL, ticker);
        let response = self
            .client
            .get(&url)
            .query(&[("adjusted", "true"), ("apiKey", self.api_key.as_str())])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(MarketDataError::Api {
                status: response.status().as_u16(),
                body: response.text().await.unwrap_or_default(),
            });
        }

        let parsed: PrevAggResponse = response.json().await?;
        reading_from_prev_agg(&parsed)
    }
}

/// USD/INR rate from the open.er-api.com public rates endpoint.
pub struct ErApiForexProvider {
    client: Client,
}

impl ErApiForexProvider {
    pub fn new() -> Self {
        Self {
            client: http_client(),
        }
    }
}

impl Default for ErApiForexProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Deserialize)]
struct RatesEnvelope {
    rates: RatesTable,
}

#[derive(Debug, Deserialize)]
struct RatesTable {
    #[serde(rename = "INR")]
    inr: Option<f64>,
}

#[async_trait]
impl ForexProvider for ErApiForexProvider {
    async fn usd_inr(&self) -> Result<f64, MarketDataError> {
        let response = self.client.get(FOREX_RATES_URL).send().await?;

        if !response.status().is_success() {
            return Err(MarketDataError::Api {
                status: response.status().as_u16(),
                body: response.text().await.unwrap_or_default(),
            });
        }

        let envelope: RatesEnvelope = response.json().await?;
        envelope
            .rates
            .inr
            .ok_or_else(|| MarketDataError::Malformed("INR missing from rates table".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prev_agg_reading_from_bar() {
        let parsed: PrevAggResponse = serde_json::from_str(
            r#"{"ticker":"NSEI","results":[{"o":22000.0,"c":22110.0,"h":22150.0,"l":21980.0}]}"#,
        )
        .unwrap();
        let reading = reading_from_prev_agg(&parsed).unwrap();
        assert_eq!(reading.value, 22110.0);
        assert!((reading.percent_change - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_prev_agg_empty_results_is_malformed() {
        let parsed: PrevAggResponse = serde_json::from_str(r#"{"ticker":"NSEI"}"#).unwrap();
        assert!(matches!(
            reading_from_prev_agg(&parsed),
            Err(MarketDataError::Malformed(_))
        ));
    }

    #[test]
    fn test_prev_agg_zero_open_yields_zero_percent() {
        let parsed = PrevAggResponse {
            results: vec![PrevAggBar { o: 0.0, c: 100.0 }],
        };
        let reading = reading_from_prev_agg(&parsed).unwrap();
        assert_eq!(reading.percent_change, 0.0);
    }

    #[test]
    fn test_rates_envelope_parses_inr() {
        let envelope: RatesEnvelope =
            serde_json::from_str(r#"{"result":"success","rates":{"INR":83.41,"EUR":0.92}}"#)
                .unwrap();
        assert_eq!(envelope.rates.inr, Some(83.41));
    }

    #[tokio::test]
    #[ignore] // hits the live er-api endpoint
    async fn test_live_usd_inr_fetch() {
        let provider = ErApiForexProvider::new();
        let rate = provider.usd_inr().await.unwrap();
        assert!(rate > 0.0);
    }
}
