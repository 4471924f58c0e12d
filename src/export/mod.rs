//! Diagram Export Pipeline
//!
//! Renders the session's current diagram source to SVG and delivers it
//! through a download sink as `{kind}-diagram.svg`. An empty or absent
//! source is a no-op; the staged file is released on every path.

mod renderer;
mod sink;

pub use renderer::{DiagramRenderer, MermaidCliRenderer};
pub use sink::{DownloadSink, FileSystemSink, StagedDownload};

use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;
use uuid::Uuid;

use crate::session::SessionState;

/// Export failures; the message is fit to surface to the user and carries
/// the underlying engine detail.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Failed to export SVG: {0}")]
    Render(String),

    #[error("Failed to deliver {filename}: {message}")]
    Delivery { filename: String, message: String },
}

/// A delivered export
#[derive(Debug, Clone)]
pub struct ExportOutcome {
    pub filename: String,
    pub path: PathBuf,
}

pub struct ExportPipeline {
    renderer: Arc<dyn DiagramRenderer>,
    sink: Arc<dyn DownloadSink>,
}

impl ExportPipeline {
    pub fn new(renderer: Arc<dyn DiagramRenderer>, sink: Arc<dyn DownloadSink>) -> Self {
        Self { renderer, sink }
    }

    /// Export the session's current diagram, if any.
    ///
    /// Returns `Ok(None)` when there is nothing to export (guard, not an
    /// error). Each export renders under a fresh unique element id so
    /// repeated exports in one session cannot collide.
    pub async fn export_svg(
        &self,
        session: &SessionState,
    ) -> Result<Option<ExportOutcome>, ExportError> {
        let Some(diagram) = session.diagram() else {
            return Ok(None);
        };
        if diagram.source.is_empty() {
            return Ok(None);
        }

        let element_id = format!("diagram-{}", Uuid::new_v4().simple());
        let svg = self
            .renderer
            .render(&element_id, &diagram.source)
            .await
            .map_err(|err| ExportError::Render(format!("{err:#}")))?;

        let filename = format!("{}-diagram.svg", diagram.kind);
        let staged = self
            .sink
            .stage(svg.as_bytes())
            .map_err(|err| ExportError::Delivery {
                filename: filename.clone(),
                message: format!("{err:#}"),
            })?;
        let path = staged
            .commit(&filename)
            .map_err(|err| ExportError::Delivery {
                filename: filename.clone(),
                message: format!("{err:#}"),
            })?;

        tracing::info!(file = %path.display(), "diagram exported");
        Ok(Some(ExportOutcome { filename, path }))
    }
}
