use std::path::PathBuf;

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Market snapshot freshness window, in seconds
    pub cache_ttl_secs: u64,
    /// Stream chunk size, in characters
    pub chunk_size: usize,
    /// Directory for per-request interaction logs; disabled when unset
    pub interaction_log_dir: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 9000,
            cache_ttl_secs: 300,
            chunk_size: 50,
            interaction_log_dir: None,
        }
    }
}
