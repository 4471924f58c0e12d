//! Typed errors for the workbench
//!
//! One recoverable error shape across all four actions and export. The
//! display form is always fit to show to the user: remote failures collapse
//! into the action's fixed fallback text, export failures carry the engine
//! detail. The underlying cause stays on the source chain for logs.

use thiserror::Error;

use crate::export::ExportError;
use crate::gateway::GatewayError;

#[derive(Debug, Error)]
pub enum WorkbenchError {
    /// Remote failure, surfaced as the action's fixed fallback text
    /// regardless of cause.
    #[error("{fallback}")]
    Backend {
        fallback: &'static str,
        #[source]
        source: GatewayError,
    },

    #[error(transparent)]
    Export(#[from] ExportError),
}

impl WorkbenchError {
    pub fn backend(fallback: &'static str, source: GatewayError) -> Self {
        Self::Backend { fallback, source }
    }

    /// Message safe to surface directly in the UI
    pub fn user_message(&self) -> String {
        self.to_string()
    }
}
