//! HTTP client for the filter bindings service
//!
//! A filter's schema is found in two hops: the filter's bindings document
//! names the schema file in its `schemaLocation` attribute, and that file is
//! then fetched from the schema directory of the same filter.

use crate::config::BindingsConfig;
use anyhow::{Context, Result};
use reqwest::Client;
use repose_xsd::SchemaDocument;

pub struct BindingsClient {
    http: Client,
    config: BindingsConfig,
}

impl BindingsClient {
    pub fn new(config: BindingsConfig) -> Result<Self> {
        let builder = Client::builder().timeout(config.timeout);
        Self::with_builder(config, builder)
    }

    fn with_builder(config: BindingsConfig, builder: reqwest::ClientBuilder) -> Result<Self> {
        let http = builder.build().context("Failed to create HTTP client")?;
        Ok(Self { http, config })
    }

    pub fn bindings_url(&self, version: &str, component: &str) -> String {
        format!(
            "{}{}{}{}{}",
            self.config.endpoint,
            version,
            self.config.filters_uri,
            component,
            self.config.bindings_location
        )
    }

    pub fn schema_url(&self, version: &str, component: &str, schema_location: &str) -> String {
        format!(
            "{}{}{}{}{}{}",
            self.config.endpoint,
            version,
            self.config.filters_uri,
            component,
            self.config.schema_location,
            schema_location
        )
    }

    /// XSD text of `component`'s configuration schema in gateway `version`.
    pub async fn fetch_schema(&self, version: &str, component: &str) -> Result<String> {
        let bindings = self.get_text(&self.bindings_url(version, component)).await?;
        let schema_location = parse_schema_location(&bindings)
            .with_context(|| format!("Invalid bindings for filter '{}' {}", component, version))?;
        tracing::debug!(%schema_location, "resolved schema location");

        self.get_text(&self.schema_url(version, component, &schema_location))
            .await
    }

    async fn get_text(&self, url: &str) -> Result<String> {
        tracing::info!(%url, "fetching");
        let res = self
            .http
            .get(url)
            .send()
            .await
            .with_context(|| format!("Request to {} failed", url))?;

        if !res.status().is_success() {
            let status = res.status();
            let error_text = res.text().await.unwrap_or_default();
            anyhow::bail!("GET {} failed (status {}): {}", url, status, error_text);
        }

        Ok(res.text().await?)
    }
}

/// `schemaLocation` of the first `bindings` element that carries one.
pub fn parse_schema_location(bindings_xml: &str) -> Result<String> {
    let document =
        SchemaDocument::parse(bindings_xml).context("Failed to parse bindings document")?;
    document
        .root()
        .descendants()
        .find(|node| node.name == "bindings" && node.has_attr("schemaLocation"))
        .and_then(|node| node.attr("schemaLocation"))
        .map(str::to_string)
        .context("No bindings element with a schemaLocation attribute")
}
