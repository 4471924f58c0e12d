//! Workbench layer
//!
//! Sits between user intent and the analysis backend:
//!
//! - **WorkbenchController**: orchestrates the four user actions without
//!   overlapping shared state
//! - **WorkbenchEvent**: async event channel frontends subscribe to
//! - **modes**: the view-mode state machine types
//! - **WorkbenchError**: one recoverable, user-facing error shape

mod controller;
mod errors;
mod events;
pub mod modes;

pub use controller::{
    WorkbenchController, ASK_FALLBACK, DIAGRAM_FALLBACK, DOCS_FALLBACK, SELECT_ARCHIVE_HINT,
    UPLOAD_FAILURE, UPLOAD_SUCCESS,
};
pub use errors::WorkbenchError;
pub use events::{ActionKind, WorkbenchEvent};
pub use modes::{DiagramKind, DiagramViewMode, ViewMode};
