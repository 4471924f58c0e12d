//! Shared Session State
//!
//! Thread-safe state shared between the workbench controller and whichever
//! frontend is attached. Everything lives in process memory for the lifetime
//! of the session; nothing is persisted.

use std::sync::{Arc, RwLock};

use serde::{Deserialize, Serialize};

use crate::workbench::modes::{DiagramKind, DiagramViewMode, ViewMode};

/// Attribution of a transcript turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
    User,
    Assistant,
}

/// One message in the conversation transcript
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub role: TurnRole,
    pub text: String,
}

impl Turn {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: TurnRole::User,
            text: text.into(),
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: TurnRole::Assistant,
            text: text.into(),
        }
    }
}

/// The user-chosen archive awaiting upload
///
/// Zero or one live at a time; replaced wholesale on a new selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveSelection {
    pub name: String,
    pub payload: Vec<u8>,
}

/// Outcome line of the latest index attempt
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UploadStatus(String);

impl UploadStatus {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn text(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Classified as an error by the literal word "Error"; the status line
    /// styling keys off this.
    pub fn is_error(&self) -> bool {
        self.0.contains("Error")
    }
}

/// The most recently generated diagram, tagged with the kind that was
/// selected when the request was issued
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagramSource {
    pub kind: DiagramKind,
    pub source: String,
}

#[derive(Debug, Default)]
struct StateInner {
    archive: Option<ArchiveSelection>,
    upload_status: UploadStatus,
    archive_indexed: bool,
    question_input: String,
    transcript: Vec<Turn>,
    documentation: Option<String>,
    diagram: Option<DiagramSource>,
    busy: bool,
    view_mode: ViewMode,
    diagram_view: DiagramViewMode,
    diagram_kind: DiagramKind,
}

/// Shared session state (thread-safe)
///
/// Cheap to clone; all clones observe the same underlying state. Uses RwLock
/// for concurrent access from the controller and frontend.
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    inner: Arc<RwLock<StateInner>>,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a read lock on the inner state, recovering from poison
    fn read_inner(&self) -> std::sync::RwLockReadGuard<'_, StateInner> {
        self.inner.read().unwrap_or_else(|poisoned| {
            tracing::warn!("SessionState read lock was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    /// Get a write lock on the inner state, recovering from poison
    fn write_inner(&self) -> std::sync::RwLockWriteGuard<'_, StateInner> {
        self.inner.write().unwrap_or_else(|poisoned| {
            tracing::warn!("SessionState write lock was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    // ========== Archive ==========

    pub fn archive_selection(&self) -> Option<ArchiveSelection> {
        self.read_inner().archive.clone()
    }

    /// Replace the archive selection; any previous upload status is stale
    /// and cleared with it.
    pub fn select_archive(&self, name: impl Into<String>, payload: Vec<u8>) {
        let mut inner = self.write_inner();
        inner.archive = Some(ArchiveSelection {
            name: name.into(),
            payload,
        });
        inner.upload_status = UploadStatus::default();
    }

    pub fn upload_status(&self) -> UploadStatus {
        self.read_inner().upload_status.clone()
    }

    pub fn set_upload_status(&self, text: impl Into<String>) {
        self.write_inner().upload_status = UploadStatus::new(text);
    }

    pub fn is_archive_indexed(&self) -> bool {
        self.read_inner().archive_indexed
    }

    pub fn mark_indexed(&self) {
        self.write_inner().archive_indexed = true;
    }

    // ========== Question input ==========

    pub fn question_input(&self) -> String {
        self.read_inner().question_input.clone()
    }

    pub fn set_question_input(&self, text: impl Into<String>) {
        self.write_inner().question_input = text.into();
    }

    /// Take the pending question for sending.
    ///
    /// The guard is on the trimmed text, but the question is returned
    /// verbatim; a whitespace-only input is left in place and yields `None`.
    pub fn take_question(&self) -> Option<String> {
        let mut inner = self.write_inner();
        if inner.question_input.trim().is_empty() {
            return None;
        }
        Some(std::mem::take(&mut inner.question_input))
    }

    // ========== Transcript ==========

    pub fn transcript(&self) -> Vec<Turn> {
        self.read_inner().transcript.clone()
    }

    /// Access the transcript with a zero-copy callback (for rendering)
    pub fn with_transcript<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&[Turn]) -> R,
    {
        let inner = self.read_inner();
        f(&inner.transcript)
    }

    pub fn transcript_len(&self) -> usize {
        self.read_inner().transcript.len()
    }

    /// Append a turn; turns are append-only within a session.
    pub fn push_turn(&self, turn: Turn) {
        self.write_inner().transcript.push(turn);
    }

    pub fn clear_transcript(&self) {
        self.write_inner().transcript.clear();
    }

    // ========== Generated artifacts ==========

    pub fn documentation(&self) -> Option<String> {
        self.read_inner().documentation.clone()
    }

    /// Overwrite the documentation text; generation never appends.
    pub fn set_documentation(&self, text: impl Into<String>) {
        self.write_inner().documentation = Some(text.into());
    }

    pub fn diagram(&self) -> Option<DiagramSource> {
        self.read_inner().diagram.clone()
    }

    pub fn set_diagram(&self, diagram: DiagramSource) {
        self.write_inner().diagram = Some(diagram);
    }

    pub fn diagram_kind(&self) -> DiagramKind {
        self.read_inner().diagram_kind
    }

    pub fn set_diagram_kind(&self, kind: DiagramKind) {
        self.write_inner().diagram_kind = kind;
    }

    // ========== Busy flag ==========

    pub fn is_busy(&self) -> bool {
        self.read_inner().busy
    }

    pub fn set_busy(&self, busy: bool) {
        self.write_inner().busy = busy;
    }

    /// UI contract: action-triggering controls are interactive iff no
    /// mutating action is outstanding.
    pub fn controls_enabled(&self) -> bool {
        !self.read_inner().busy
    }

    // ========== View modes ==========

    pub fn view_mode(&self) -> ViewMode {
        self.read_inner().view_mode
    }

    pub fn diagram_view(&self) -> DiagramViewMode {
        self.read_inner().diagram_view
    }

    /// Tab selection: switches the view without triggering generation.
    pub fn select_view(&self, mode: ViewMode) {
        self.write_inner().view_mode = mode;
    }

    /// Entered when a documentation generation is issued.
    pub fn force_documentation_view(&self) {
        self.write_inner().view_mode = ViewMode::Documentation;
    }

    /// Entered when a diagram generation is issued; clears any prior
    /// raw-source selection.
    pub fn force_diagram_view(&self) {
        let mut inner = self.write_inner();
        inner.view_mode = ViewMode::Diagram;
        inner.diagram_view = DiagramViewMode::Rendered;
    }

    /// Flip rendered/raw; a no-op outside the diagram view.
    pub fn toggle_diagram_view(&self) {
        let mut inner = self.write_inner();
        if inner.view_mode == ViewMode::Diagram {
            inner.diagram_view = inner.diagram_view.toggled();
        }
    }

    /// Full session reset after a successful re-index: the transcript is
    /// cleared and the view returns to Chat. Previously generated
    /// documentation and diagram text is retained (hidden).
    pub fn reset_for_new_index(&self) {
        let mut inner = self.write_inner();
        inner.transcript.clear();
        inner.view_mode = ViewMode::Chat;
    }
}
