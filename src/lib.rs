//! repolens: workbench client for a remote AI code-analysis service
//!
//! This library provides:
//! - A request gateway over the four analysis endpoints (index, ask, docs, diagram)
//! - A shared session store for the transcript, generated artifacts, and view modes
//! - A workbench controller orchestrating user actions without overlapping state
//! - An SVG export pipeline over an opaque diagram-rendering engine

pub mod config;
pub mod export;
pub mod gateway;
pub mod session;
pub mod workbench;

pub use config::Config;
pub use gateway::{AnalysisBackend, HttpAnalysisGateway};
pub use session::SessionState;
pub use workbench::{WorkbenchController, WorkbenchEvent};
