use std::env;

use crate::catalog::AGE_BRACKET_GEOMETRY_URLS;
use crate::merge::AlignmentPolicy;
use crate::sheet_fetcher::DEFAULT_SHEETS_BASE_URL;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {name}: {message}")]
    Invalid { name: &'static str, message: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub server_host: String,
    pub server_port: u16,
    pub sheets_base_url: String,
    pub geometry_source: String,
    pub output_path: String,
    pub alignment_policy: AlignmentPolicy,
    pub catalog_path: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let alignment_policy = match env::var("ALIGNMENT_POLICY") {
            Ok(value) => value.parse::<AlignmentPolicy>().map_err(|message| ConfigError::Invalid {
                name: "ALIGNMENT_POLICY",
                message,
            })?,
            Err(_) => AlignmentPolicy::default(),
        };

        Ok(Config {
            server_host: env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            server_port: env::var("SERVER_PORT")
                .unwrap_or_else(|_| "5000".to_string())
                .parse()
                .unwrap_or(5000),
            sheets_base_url: env::var("SHEETS_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_SHEETS_BASE_URL.to_string()),
            geometry_source: env::var("GEOMETRY_SOURCE")
                .unwrap_or_else(|_| AGE_BRACKET_GEOMETRY_URLS[0].to_string()),
            output_path: env::var("OUTPUT_PATH").unwrap_or_else(|_| "data2.geojson".to_string()),
            alignment_policy,
            catalog_path: env::var("CATALOG_PATH").ok().filter(|p| !p.is_empty()),
        })
    }

    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }
}
