use thiserror::Error;

use crate::configuration::ENV_PREFIX;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing or invalid value, set environment variable {env_var}")]
    MissingEnvVar { env_var: String },
    #[error(transparent)]
    Other(#[from] config::ConfigError),
}

/// Environment variable that sets a configuration key, `server.csv_path` -> `ALGOCHAT_SERVER__CSV_PATH`
pub fn to_env_var(field: &str) -> String {
    format!("{}_{}", ENV_PREFIX, field.replace('.', "__").to_uppercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_env_var() {
        assert_eq!(to_env_var("server.port"), "ALGOCHAT_SERVER__PORT");
        assert_eq!(to_env_var("server.csv_path"), "ALGOCHAT_SERVER__CSV_PATH");
    }
}
