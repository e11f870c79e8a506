//! Analysis service connection settings

use serde::{Deserialize, Serialize};

/// Where the analysis service lives and how long to wait for it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// HTTP(S) base URL; the stream URL is derived by swapping the scheme to ws(s)
    pub base_url: String,
    pub upload_path: String,
    /// Prefix of the stream endpoint; the uploaded filename is appended as a path segment
    pub stream_path: String,
    pub request_timeout_seconds: u64,
    pub connect_timeout_seconds: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8000".to_string(),
            upload_path: "/upload_video/".to_string(),
            stream_path: "/ws/analyze_video".to_string(),
            request_timeout_seconds: 300,
            connect_timeout_seconds: 10,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_config_defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.base_url, "http://127.0.0.1:8000");
        assert_eq!(config.upload_path, "/upload_video/");
        assert_eq!(config.stream_path, "/ws/analyze_video");
        assert_eq!(config.request_timeout_seconds, 300);
        assert_eq!(config.connect_timeout_seconds, 10);
    }
}
