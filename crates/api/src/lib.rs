//! Console API client.
//!
//! This crate provides a lightweight client for the catalog, data-view, interface,
//! and configuration-center endpoints the resource cataloging wizard depends on.
//! It focuses on:
//!
//! - Constructing an HTTP client with sensible defaults
//! - Discovering the bearer token from `RESCAT_API_TOKEN`
//! - Validating the base URL for safety
//! - Decoding backend error bodies into [`ApiError`] so callers can react to codes
//!
//! The engine talks to the backend exclusively through the [`CatalogBackend`]
//! trait; [`CatalogClient`] is the HTTP implementation.

use std::env;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use reqwest::{Client, Method, RequestBuilder, Url, header};
use serde::de::DeserializeOwned;
use tracing::debug;

mod backend;
pub mod codes;
mod error;
mod wire;

pub use backend::{CatalogBackend, FileMetadata};
pub use error::ApiError;

/// Environment variable overriding the configured base URL.
pub const API_BASE_ENV: &str = "RESCAT_API_BASE";
/// Environment variable holding the bearer token.
pub const API_TOKEN_ENV: &str = "RESCAT_API_TOKEN";

/// Hostnames allowed for local development regardless of scheme.
const LOCALHOST_DOMAINS: &[&str] = &["localhost", "127.0.0.1"];

/// Thin wrapper around a configured `reqwest::Client` for console API access.
#[derive(Debug, Clone)]
pub struct CatalogClient {
    pub base_url: String,
    pub http: Client,
    pub user_agent: String,
}

impl CatalogClient {
    /// Construct a client for `base_url`, sending `token` as a bearer credential when present.
    pub fn new(base_url: &str, token: Option<String>, timeout: Duration) -> Result<Self> {
        validate_base_url(base_url)?;

        let mut default_headers = header::HeaderMap::new();
        if let Some(token) = token {
            let value = header::HeaderValue::from_str(&format!("Bearer {}", token)).context("invalid api token")?;
            default_headers.insert(header::AUTHORIZATION, value);
        }
        default_headers.insert(header::ACCEPT, header::HeaderValue::from_static("application/json"));

        let http = Client::builder()
            .default_headers(default_headers)
            .timeout(timeout)
            .build()
            .context("build http client")?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
            user_agent: format!("rescat/0.1; {}", env::consts::OS),
        })
    }

    /// Construct a client from the environment, falling back to `default_base` when
    /// `RESCAT_API_BASE` is unset.
    pub fn from_env(default_base: &str, timeout: Duration) -> Result<Self> {
        let base_url = env::var(API_BASE_ENV)
            .ok()
            .filter(|value| !value.trim().is_empty())
            .unwrap_or_else(|| default_base.to_string());
        let token = env::var(API_TOKEN_ENV).ok().filter(|value| !value.trim().is_empty());
        Self::new(&base_url, token, timeout)
    }

    /// Build a `reqwest::RequestBuilder` for a method and API-relative path.
    pub fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        debug!(%url, %method, "building request");

        self.http.request(method, url).header(header::USER_AGENT, &self.user_agent)
    }

    /// Send a request and decode a JSON body, mapping non-success responses to [`ApiError`].
    pub(crate) async fn send_json<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, ApiError> {
        let text = self.send_text(builder).await?;
        serde_json::from_str(&text).map_err(|error| ApiError::Decode(error.to_string()))
    }

    /// Send a request whose response body is ignored.
    pub(crate) async fn send_unit(&self, builder: RequestBuilder) -> Result<(), ApiError> {
        self.send_text(builder).await.map(|_| ())
    }

    async fn send_text(&self, builder: RequestBuilder) -> Result<String, ApiError> {
        let response = builder.send().await.map_err(|error| ApiError::Transport(error.to_string()))?;
        let status = response.status();
        let text = response.text().await.unwrap_or_default();
        if !status.is_success() {
            return Err(ApiError::from_response(status.as_u16(), &text));
        }
        Ok(text)
    }
}

/// Validate that a base URL is acceptable for use by the client.
///
/// Rules:
/// - `localhost` or `127.0.0.1`: any http(s) scheme is allowed
/// - otherwise: scheme must be HTTPS
fn validate_base_url(base: &str) -> Result<()> {
    let parsed = Url::parse(base).map_err(|error| anyhow!("Invalid API base URL '{}': {}", base, error))?;

    let host_name = parsed.host_str().ok_or_else(|| anyhow!("API base URL must include a host"))?;

    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        return Err(anyhow!("API base URL must use http or https; got '{}://'", parsed.scheme()));
    }

    if LOCALHOST_DOMAINS.iter().any(|&allowed| host_name.eq_ignore_ascii_case(allowed)) {
        return Ok(());
    }

    if parsed.scheme() != "https" {
        return Err(anyhow!(
            "API base URL must use https for non-localhost hosts; got '{}://'",
            parsed.scheme()
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_localhost_over_http() {
        assert!(validate_base_url("http://localhost:8080").is_ok());
        assert!(validate_base_url("http://127.0.0.1").is_ok());
    }

    #[test]
    fn requires_https_for_remote_hosts() {
        assert!(validate_base_url("https://console.example.gov.cn").is_ok());
        let error = validate_base_url("http://console.example.gov.cn").unwrap_err();
        assert!(error.to_string().contains("must use https"));
    }

    #[test]
    fn rejects_non_http_schemes_and_garbage() {
        assert!(validate_base_url("ftp://localhost").is_err());
        assert!(validate_base_url("not a url").is_err());
    }

    #[test]
    fn from_env_prefers_the_environment_base() {
        temp_env::with_vars(
            [(API_BASE_ENV, Some("http://127.0.0.1:9000/")), (API_TOKEN_ENV, None::<&str>)],
            || {
                let client = CatalogClient::from_env("https://unused.example.com", Duration::from_secs(5)).expect("client");
                assert_eq!(client.base_url, "http://127.0.0.1:9000");
            },
        );
    }
}
