//! View-mode state machine types
//!
//! Exactly one top-level view is active at a time. The diagram view carries
//! an orthogonal rendered/raw sub-view and a kind selector; the selector is
//! plain session state and does not reset the sub-view on its own.

use serde::{Deserialize, Serialize};

/// Top-level workbench view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
    /// Conversational Q&A over the indexed codebase
    #[default]
    Chat,
    /// Generated narrative documentation
    Documentation,
    /// Generated structural diagram
    Diagram,
}

impl ViewMode {
    /// Get display label for this view
    pub fn label(&self) -> &'static str {
        match self {
            Self::Chat => "Chat",
            Self::Documentation => "Documentation",
            Self::Diagram => "Diagram",
        }
    }
}

impl From<&str> for ViewMode {
    fn from(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "documentation" | "docs" => Self::Documentation,
            "diagram" => Self::Diagram,
            _ => Self::Chat,
        }
    }
}

impl std::fmt::Display for ViewMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Chat => write!(f, "chat"),
            Self::Documentation => write!(f, "documentation"),
            Self::Diagram => write!(f, "diagram"),
        }
    }
}

/// Sub-view within [`ViewMode::Diagram`]
///
/// Defaults to `Rendered` whenever the diagram view is entered through a
/// generation action; switching the kind selector alone does not reset it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagramViewMode {
    /// The materialized visual
    #[default]
    Rendered,
    /// The diagram description text as returned by the backend
    RawSource,
}

impl DiagramViewMode {
    /// Flip between rendered and raw source
    pub fn toggled(self) -> Self {
        match self {
            Self::Rendered => Self::RawSource,
            Self::RawSource => Self::Rendered,
        }
    }
}

/// Structural diagram category requested from the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagramKind {
    #[default]
    Class,
    UseCase,
    Erd,
}

impl DiagramKind {
    /// Get display label for this kind
    pub fn label(&self) -> &'static str {
        match self {
            Self::Class => "Class Diagram",
            Self::UseCase => "Use Case Diagram",
            Self::Erd => "ERD Diagram",
        }
    }

    /// All kinds, in selector order
    pub fn all() -> [Self; 3] {
        [Self::Class, Self::UseCase, Self::Erd]
    }
}

impl From<&str> for DiagramKind {
    fn from(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "usecase" => Self::UseCase,
            "erd" => Self::Erd,
            _ => Self::Class,
        }
    }
}

impl std::str::FromStr for DiagramKind {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from(s))
    }
}

impl std::fmt::Display for DiagramKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Class => write!(f, "class"),
            Self::UseCase => write!(f, "usecase"),
            Self::Erd => write!(f, "erd"),
        }
    }
}
