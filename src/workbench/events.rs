//! Workbench Events
//!
//! Async events sent from the controller to the attached frontend over an
//! mpsc channel. Frontends re-render from the session state when these fire.

use crate::session::Turn;
use crate::workbench::modes::{DiagramKind, ViewMode};

/// A user-facing action the controller orchestrates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionKind {
    UploadAndIndex,
    Ask,
    GenerateDocs,
    GenerateDiagram,
    ExportSvg,
}

impl ActionKind {
    pub fn label(&self) -> &'static str {
        match self {
            Self::UploadAndIndex => "Upload & Index",
            Self::Ask => "Ask",
            Self::GenerateDocs => "Generate Documentation",
            Self::GenerateDiagram => "Generate Diagram",
            Self::ExportSvg => "Export SVG",
        }
    }
}

/// Events emitted by the controller to the frontend
#[derive(Debug, Clone)]
pub enum WorkbenchEvent {
    /// A mutating action started; triggering controls should disable
    ActionStarted(ActionKind),

    /// The action resolved (success or failure); controls re-enable
    ActionFinished(ActionKind),

    /// The upload status line changed
    UploadStatusChanged(String),

    /// A turn was appended to the transcript
    TurnAppended(Turn),

    /// The documentation text was replaced
    DocumentationUpdated,

    /// The diagram source was replaced
    DiagramUpdated(DiagramKind),

    /// The active view changed
    ViewChanged(ViewMode),

    /// An exported diagram was delivered
    ExportCompleted { filename: String },

    /// A recoverable failure with a user-facing message
    ActionFailed {
        action: ActionKind,
        message: String,
    },
}
