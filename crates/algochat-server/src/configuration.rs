use crate::error::{to_env_var, ConfigError};
use config::{Config, Environment};
use serde::Deserialize;
use std::io;
use std::net::{SocketAddr, ToSocketAddrs};
use std::path::PathBuf;

pub const ENV_PREFIX: &str = "ALGOCHAT";

#[derive(Debug, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_csv_path")]
    pub csv_path: PathBuf,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            csv_path: default_csv_path(),
        }
    }
}

impl ServerSettings {
    /// Resolve `host:port`. Host names such as `localhost` and bare IPv6
    /// literals such as `::1` are accepted.
    pub fn socket_addr(&self) -> io::Result<SocketAddr> {
        (self.host.as_str(), self.port)
            .to_socket_addrs()?
            .next()
            .ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::NotFound,
                    format!("{} did not resolve to an address", self.host),
                )
            })
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerSettings,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        Self::load_and_validate()
    }

    fn load_and_validate() -> Result<Self, ConfigError> {
        let config = Config::builder()
            .set_default("server.host", default_host())?
            .set_default("server.port", default_port())?
            .set_default("server.csv_path", default_csv_path().to_string_lossy().as_ref())?
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let result: Result<Self, config::ConfigError> = config.try_deserialize();

        match result {
            Ok(settings) => Ok(settings),
            Err(err) => {
                tracing::debug!("Configuration error: {:?}", &err);
                match &err {
                    config::ConfigError::NotFound(field) => Err(ConfigError::MissingEnvVar {
                        env_var: to_env_var(field),
                    }),
                    config::ConfigError::Type {
                        key: Some(field), ..
                    } => Err(ConfigError::MissingEnvVar {
                        env_var: to_env_var(field),
                    }),
                    _ => Err(ConfigError::Other(err)),
                }
            }
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_csv_path() -> PathBuf {
    PathBuf::from("backend/data/corpus_summary.csv")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::env;

    fn clean_env() {
        for (key, _) in env::vars() {
            if key.starts_with("ALGOCHAT_") {
                env::remove_var(&key);
            }
        }
    }

    #[test]
    #[serial]
    fn test_default_settings() {
        clean_env();

        let settings = Settings::new().unwrap();
        assert_eq!(settings.server.host, "127.0.0.1");
        assert_eq!(settings.server.port, 3000);
        assert_eq!(
            settings.server.csv_path,
            PathBuf::from("backend/data/corpus_summary.csv")
        );
    }

    #[test]
    #[serial]
    fn test_environment_override() {
        clean_env();
        env::set_var("ALGOCHAT_SERVER__PORT", "8080");
        env::set_var("ALGOCHAT_SERVER__CSV_PATH", "/data/files.csv");

        let settings = Settings::new().unwrap();
        assert_eq!(settings.server.port, 8080);
        assert_eq!(settings.server.csv_path, PathBuf::from("/data/files.csv"));

        env::remove_var("ALGOCHAT_SERVER__PORT");
        env::remove_var("ALGOCHAT_SERVER__CSV_PATH");
    }

    #[test]
    #[serial]
    fn test_invalid_port_is_reported() {
        clean_env();
        env::set_var("ALGOCHAT_SERVER__PORT", "not-a-port");

        let err = Settings::new().unwrap_err();
        assert!(err.to_string().to_lowercase().contains("port"));

        env::remove_var("ALGOCHAT_SERVER__PORT");
    }

    #[test]
    fn test_socket_addr_conversion() {
        let server_settings = ServerSettings {
            host: "127.0.0.1".to_string(),
            port: 3000,
            ..Default::default()
        };
        let addr = server_settings.socket_addr().unwrap();
        assert_eq!(addr.to_string(), "127.0.0.1:3000");
    }

    #[test]
    fn test_socket_addr_accepts_names_and_ipv6() {
        let ipv6 = ServerSettings {
            host: "::1".to_string(),
            port: 8080,
            ..Default::default()
        };
        assert_eq!(ipv6.socket_addr().unwrap().to_string(), "[::1]:8080");

        let named = ServerSettings {
            host: "localhost".to_string(),
            port: 3000,
            ..Default::default()
        };
        let addr = named.socket_addr().unwrap();
        assert!(addr.ip().is_loopback());
        assert_eq!(addr.port(), 3000);
    }
}
