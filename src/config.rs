//! Server configuration from environment variables

use std::path::PathBuf;

const DEFAULT_PORT: u16 = 2244;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// TCP port to listen on (`PORT`)
    pub port: u16,
    /// Optional JSON deck file (`DECK_PATH`); built-in deck when unset
    pub deck_path: Option<PathBuf>,
}

impl ServerConfig {
    pub fn from_env() -> Self {
        let port = parse_port(std::env::var("PORT").ok());
        let deck_path = std::env::var("DECK_PATH")
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .map(PathBuf::from);

        Self { port, deck_path }
    }
}

fn parse_port(value: Option<String>) -> u16 {
    match value {
        Some(raw) => match raw.trim().parse() {
            Ok(port) => port,
            Err(_) => {
                tracing::warn!("Invalid PORT value {:?}, using {}", raw, DEFAULT_PORT);
                DEFAULT_PORT
            }
        },
        None => DEFAULT_PORT,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn port_defaults_when_missing_or_invalid() {
        assert_eq!(parse_port(None), DEFAULT_PORT);
        assert_eq!(parse_port(Some("not-a-port".into())), DEFAULT_PORT);
        assert_eq!(parse_port(Some("8080".into())), 8080);
    }
}
