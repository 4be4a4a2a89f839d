use std::env;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::services::{ExtractorConfig, PdfOptions, SizePolicy};

/// One MiB, the strictest ceiling the upload form applies.
pub const DEFAULT_MAX_FILE_SIZE_BYTES: usize = 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

impl LogFormat {
    pub fn parse(value: Option<&str>) -> Self {
        match value {
            Some(v) if v.trim().eq_ignore_ascii_case("json") => LogFormat::Json,
            _ => LogFormat::Pretty,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub server_host: String,
    pub server_port: u16,
    pub max_file_size_bytes: usize,
    pub max_request_size_mb: usize,
    pub max_files_per_request: usize,
    pub max_concurrent_requests: usize,
    /// Zero disables the per-extraction timeout.
    pub extraction_timeout_seconds: u64,
    pub pdf_max_pages: usize,
    pub pdf_fallback_extractor: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_host: "0.0.0.0".to_string(),
            server_port: 8080,
            max_file_size_bytes: DEFAULT_MAX_FILE_SIZE_BYTES,
            max_request_size_mb: 16,
            max_files_per_request: 10,
            max_concurrent_requests: 100,
            extraction_timeout_seconds: 30,
            pdf_max_pages: 2000,
            pdf_fallback_extractor: true,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        info!("Loading configuration from environment variables");
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds the configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Config::default();

        let config = Config {
            server_host: lookup("SERVER_HOST").unwrap_or_else(|| {
                info!("SERVER_HOST not set, using default: {}", defaults.server_host);
                defaults.server_host.clone()
            }),
            // PORT wins over SERVER_PORT for PaaS deployments
            server_port: match lookup("PORT") {
                Some(_) => parse_var(&lookup, "PORT", defaults.server_port),
                None => parse_var(&lookup, "SERVER_PORT", defaults.server_port),
            },
            max_file_size_bytes: parse_var(
                &lookup,
                "MAX_FILE_SIZE_BYTES",
                defaults.max_file_size_bytes,
            ),
            max_request_size_mb: parse_var(
                &lookup,
                "MAX_REQUEST_SIZE_MB",
                defaults.max_request_size_mb,
            ),
            max_files_per_request: parse_var(
                &lookup,
                "MAX_FILES_PER_REQUEST",
                defaults.max_files_per_request,
            ),
            max_concurrent_requests: parse_var(
                &lookup,
                "MAX_CONCURRENT_REQUESTS",
                defaults.max_concurrent_requests,
            ),
            extraction_timeout_seconds: parse_var(
                &lookup,
                "EXTRACTION_TIMEOUT_SECONDS",
                defaults.extraction_timeout_seconds,
            ),
            pdf_max_pages: parse_var(&lookup, "PDF_MAX_PAGES", defaults.pdf_max_pages),
            pdf_fallback_extractor: parse_var(
                &lookup,
                "PDF_FALLBACK_EXTRACTOR",
                defaults.pdf_fallback_extractor,
            ),
        };

        config.validate().context("Invalid configuration")?;

        info!("Configuration loaded successfully: {:?}", config);
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.server_port == 0 {
            return Err(anyhow::anyhow!("SERVER_PORT must be greater than 0"));
        }
        if self.max_file_size_bytes == 0 {
            return Err(anyhow::anyhow!("MAX_FILE_SIZE_BYTES must be greater than 0"));
        }
        if self.max_request_size_mb == 0 {
            return Err(anyhow::anyhow!("MAX_REQUEST_SIZE_MB must be greater than 0"));
        }
        let request_bytes = self.checked_request_bytes().ok_or_else(|| {
            anyhow::anyhow!(
                "MAX_REQUEST_SIZE_MB is too large: {} MB overflows a byte count",
                self.max_request_size_mb
            )
        })?;
        if request_bytes < self.max_file_size_bytes {
            return Err(anyhow::anyhow!(
                "MAX_REQUEST_SIZE_MB must be able to hold at least one file of MAX_FILE_SIZE_BYTES"
            ));
        }
        if self.max_files_per_request == 0 {
            return Err(anyhow::anyhow!("MAX_FILES_PER_REQUEST must be greater than 0"));
        }
        if self.max_concurrent_requests == 0 {
            return Err(anyhow::anyhow!("MAX_CONCURRENT_REQUESTS must be greater than 0"));
        }
        if self.pdf_max_pages == 0 {
            return Err(anyhow::anyhow!("PDF_MAX_PAGES must be greater than 0"));
        }
        Ok(())
    }

    fn checked_request_bytes(&self) -> Option<usize> {
        self.max_request_size_mb.checked_mul(1024 * 1024)
    }

    /// Request body cap in bytes. Saturates for configs that skipped `validate`.
    pub fn max_request_bytes(&self) -> usize {
        self.checked_request_bytes().unwrap_or(usize::MAX)
    }

    pub fn size_policy(&self) -> SizePolicy {
        SizePolicy::new(self.max_file_size_bytes)
    }

    pub fn extractor_config(&self) -> ExtractorConfig {
        let timeout = match self.extraction_timeout_seconds {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        };

        ExtractorConfig {
            timeout,
            pdf: PdfOptions {
                max_pages: self.pdf_max_pages,
                fallback_extractor: self.pdf_fallback_extractor,
            },
            ..ExtractorConfig::default()
        }
    }
}

fn parse_var<F, T>(lookup: &F, var_name: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr + Copy + std::fmt::Debug,
    T::Err: std::fmt::Display,
{
    match lookup(var_name) {
        Some(val) => match val.trim().parse() {
            Ok(parsed) => parsed,
            Err(e) => {
                warn!("Failed to parse {}: {} (using default: {:?})", var_name, e, default);
                default
            }
        },
        None => {
            info!("{} not set, using default: {:?}", var_name, default);
            default
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(vars: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn defaults_apply_when_nothing_is_set() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.server_port, 8080);
        assert_eq!(config.max_file_size_bytes, 1024 * 1024);
        assert_eq!(config.extraction_timeout_seconds, 30);
    }

    #[test]
    fn log_format_only_switches_on_json() {
        assert_eq!(LogFormat::parse(Some(" JSON ")), LogFormat::Json);
        assert_eq!(LogFormat::parse(Some("text")), LogFormat::Pretty);
        assert_eq!(LogFormat::parse(None), LogFormat::Pretty);
    }

    #[test]
    fn port_overrides_server_port() {
        let config = config_from(&[("SERVER_PORT", "9000"), ("PORT", "7000")]).unwrap();
        assert_eq!(config.server_port, 7000);
    }

    #[test]
    fn unparseable_values_fall_back_to_defaults() {
        let config = config_from(&[("MAX_FILES_PER_REQUEST", "lots")]).unwrap();
        assert_eq!(config.max_files_per_request, 10);
    }

    #[test]
    fn zero_limits_are_rejected() {
        assert!(config_from(&[("MAX_FILE_SIZE_BYTES", "0")]).is_err());
        assert!(config_from(&[("PDF_MAX_PAGES", "0")]).is_err());
    }

    #[test]
    fn file_ceiling_must_fit_in_request_body() {
        let result = config_from(&[
            ("MAX_FILE_SIZE_BYTES", "4194304"),
            ("MAX_REQUEST_SIZE_MB", "2"),
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn oversized_request_cap_is_an_error() {
        let result = config_from(&[("MAX_REQUEST_SIZE_MB", &usize::MAX.to_string())]);
        let err = result.unwrap_err();
        assert!(format!("{:#}", err).contains("too large"));

        let unchecked = Config {
            max_request_size_mb: usize::MAX,
            ..Config::default()
        };
        assert_eq!(unchecked.max_request_bytes(), usize::MAX);
    }

    #[test]
    fn zero_timeout_disables_it() {
        let config = config_from(&[("EXTRACTION_TIMEOUT_SECONDS", "0")]).unwrap();
        assert!(config.extractor_config().timeout.is_none());
    }
}
