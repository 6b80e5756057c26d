use std::path::PathBuf;

use chrono::Utc;
use serde::Serialize;
use tracing::warn;

use finwise_core::types::market_snapshot::ist_offset;

/// One logged exchange, written as a standalone JSON file.
#[derive(Debug, Serialize)]
pub struct InteractionRecord {
    pub timestamp: String,
    pub client_ip: String,
    pub user_agent: String,
    pub endpoint: String,
    pub query: String,
    pub history_length: usize,
    pub response: String,
}

impl InteractionRecord {
    pub fn new(
        client_ip: String,
        user_agent: String,
        endpoint: &str,
        query: &str,
        history_length: usize,
        response: &str,
    ) -> Self {
        let timestamp = Utc::now()
            .with_timezone(&ist_offset())
            .format("%Y-%m-%d_%H-%M-%S")
            .to_string();
        Self {
            timestamp,
            client_ip,
            user_agent,
            endpoint: endpoint.to_string(),
            query: query.to_string(),
            history_length,
            response: response.to_string(),
        }
    }

    /// File name for this record: timestamp plus the client address with
    /// separator characters flattened to underscores.
    fn file_name(&self) -> String {
        format!(
            "{}_{}.json",
            self.timestamp,
            self.client_ip.replace(['.', ':'], "_")
        )
    }
}

/// File-based interaction logger. Disabled when no directory is set.
/// Write failures are logged and swallowed; logging can never fail a
/// request.
pub struct InteractionLogger {
    dir: Option<PathBuf>,
}

impl InteractionLogger {
    pub fn new(dir: Option<PathBuf>) -> Self {
        Self { dir }
    }

    pub fn disabled() -> Self {
        Self { dir: None }
    }

    pub async fn record(&self, record: InteractionRecord) {
        let Some(dir) = &self.dir else {
            return;
        };

        let path = dir.join(record.file_name());
        let json = match serde_json::to_vec_pretty(&record) {
            Ok(json) => json,
            Err(err) => {
                warn!("could not serialize interaction record: {}", err);
                return;
            }
        };

        if let Err(err) = tokio::fs::write(&path, json).await {
            warn!(
                "could not write interaction log {}: {}",
                path.display(),
                err
            );
        }
    }
}
