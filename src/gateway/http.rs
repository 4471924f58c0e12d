//! HTTP implementation of the analysis gateway

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::multipart;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::{AnalysisBackend, GatewayError};
use crate::workbench::modes::DiagramKind;

const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Debug, Serialize)]
struct AskRequest<'a> {
    question: &'a str,
}

#[derive(Debug, Deserialize)]
struct AskResponse {
    answer: String,
}

/// Shared request shape for the two generation endpoints. The diagram
/// endpoint overloads `file_name` to carry the diagram kind.
#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    file_name: &'a str,
}

#[derive(Debug, Deserialize)]
struct DocsResponse {
    markdown_docs: String,
}

#[derive(Debug, Deserialize)]
struct DiagramResponse {
    diagram_syntax: String,
}

/// Gateway over the analysis service's HTTP endpoints
pub struct HttpAnalysisGateway {
    client: reqwest::Client,
    base_url: String,
}

impl HttpAnalysisGateway {
    /// Create a gateway with the default request timeout
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        Self::with_timeout(base_url, DEFAULT_REQUEST_TIMEOUT)
    }

    /// Create a gateway with an explicit overall request timeout
    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let base_url = base_url.into();
        url::Url::parse(&base_url)
            .with_context(|| format!("invalid analysis backend URL '{base_url}'"))?;
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self { client, base_url })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), path)
    }

    /// POST a JSON body and buffer the full JSON response.
    async fn post_json<T: DeserializeOwned>(
        &self,
        path: &str,
        body: &impl Serialize,
    ) -> Result<T> {
        let url = self.url(path);
        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .with_context(|| format!("failed to reach analysis backend at {url}"))?;

        let status = response.status();
        if !status.is_success() {
            anyhow::bail!("analysis backend returned {status} for {path}");
        }

        response
            .json::<T>()
            .await
            .with_context(|| format!("malformed response from {path}"))
    }

    async fn post_archive(&self, name: &str, payload: Vec<u8>) -> Result<()> {
        let part = multipart::Part::bytes(payload).file_name(name.to_string());
        let form = multipart::Form::new().part("file", part);

        let url = self.url("upload");
        let response = self
            .client
            .post(&url)
            .multipart(form)
            .send()
            .await
            .with_context(|| format!("failed to reach analysis backend at {url}"))?;

        let status = response.status();
        if !status.is_success() {
            anyhow::bail!("analysis backend returned {status} for upload");
        }

        // The body is opaque; drain it so the connection can be reused.
        let _ = response.bytes().await;
        Ok(())
    }
}

#[async_trait]
impl AnalysisBackend for HttpAnalysisGateway {
    async fn index_archive(&self, name: &str, payload: Vec<u8>) -> Result<(), GatewayError> {
        self.post_archive(name, payload).await?;
        Ok(())
    }

    async fn ask(&self, question: &str) -> Result<String, GatewayError> {
        let response: AskResponse = self.post_json("ask", &AskRequest { question }).await?;
        Ok(response.answer)
    }

    async fn generate_documentation(&self, scope_hint: &str) -> Result<String, GatewayError> {
        let response: DocsResponse = self
            .post_json(
                "generate-docs",
                &GenerateRequest {
                    file_name: scope_hint,
                },
            )
            .await?;
        Ok(response.markdown_docs)
    }

    async fn generate_diagram(&self, kind: DiagramKind) -> Result<String, GatewayError> {
        let kind = kind.to_string();
        let response: DiagramResponse = self
            .post_json("generate-diagram", &GenerateRequest { file_name: &kind })
            .await?;
        Ok(response.diagram_syntax)
    }
}
