//! Request Gateway to the remote analysis service
//!
//! Four outbound operations, each a single attempt with a uniform failure
//! shape. The cause of a failure (unreachable host, non-2xx status, malformed
//! body) is folded into the error for logging only; callers must treat every
//! failure identically.

mod http;

pub use http::HttpAnalysisGateway;

use async_trait::async_trait;
use thiserror::Error;

use crate::workbench::modes::DiagramKind;

/// Uniform failure marker for gateway calls
#[derive(Debug, Error)]
#[error("analysis backend request failed: {0:#}")]
pub struct GatewayError(#[from] anyhow::Error);

/// Outbound operations on the remote analysis service
///
/// The backend keeps a single active index; a successful `index_archive`
/// replaces whatever was indexed before (last writer wins).
#[async_trait]
pub trait AnalysisBackend: Send + Sync {
    /// Upload an archive and replace the backend's current index with its
    /// contents. The response body is opaque beyond success/failure.
    async fn index_archive(&self, name: &str, payload: Vec<u8>) -> Result<(), GatewayError>;

    /// Answer a free-form question about the indexed codebase.
    async fn ask(&self, question: &str) -> Result<String, GatewayError>;

    /// Generate narrative documentation. `scope_hint` is empty for the whole
    /// archive; reserved for per-file scoping.
    async fn generate_documentation(&self, scope_hint: &str) -> Result<String, GatewayError>;

    /// Generate diagram description text for the given kind.
    async fn generate_diagram(&self, kind: DiagramKind) -> Result<String, GatewayError>;
}
