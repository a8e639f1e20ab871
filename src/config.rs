use std::env;
use std::net::SocketAddr;

use anyhow::{anyhow, Result};

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub bind_address: String,
    pub ytdlp_path: String,
    pub user_agent: String,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        let bind_address = env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
        let ytdlp_path = env::var("YTDLP_PATH").unwrap_or_else(|_| "yt-dlp".to_string());
        let user_agent = env::var("TUBEGRAB_USER_AGENT")
            .ok()
            .filter(|value| !value.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_USER_AGENT.to_string());

        Ok(Self {
            bind_address,
            ytdlp_path,
            user_agent,
        })
    }

    pub fn socket_addr(&self) -> Result<SocketAddr> {
        self.bind_address
            .parse()
            .map_err(|err| anyhow!("Invalid BIND_ADDRESS '{}': {}", self.bind_address, err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(bind: &str) -> AppConfig {
        AppConfig {
            bind_address: bind.to_string(),
            ytdlp_path: "yt-dlp".to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }

    #[test]
    fn parses_bind_address() {
        let addr = config("127.0.0.1:8080").socket_addr().unwrap();
        assert_eq!(addr.port(), 8080);
    }

    #[test]
    fn rejects_malformed_bind_address() {
        let err = config("localhost").socket_addr().unwrap_err();
        assert!(err.to_string().contains("BIND_ADDRESS"));
    }
}
