//! Async Action Controller
//!
//! Orchestrates each user-triggered action end-to-end: precondition guard,
//! busy flag, a single gateway call, state update, fixed fallback text on
//! failure. The busy flag is released through an RAII guard, so it clears
//! even if a success-path update unwinds.
//!
//! Mode-affecting actions draw a monotonically increasing sequence number at
//! issuance. A completion whose number is no longer the newest suppresses its
//! mode-mutating side effect; data-slot writes still land. This orders mode
//! changes by when actions were issued rather than by when they resolved.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::mpsc;

use crate::export::ExportPipeline;
use crate::gateway::AnalysisBackend;
use crate::session::{DiagramSource, SessionState, Turn};
use crate::workbench::errors::WorkbenchError;
use crate::workbench::events::{ActionKind, WorkbenchEvent};
use crate::workbench::modes::{DiagramKind, ViewMode};

/// Status line when Upload is clicked with nothing selected
pub const SELECT_ARCHIVE_HINT: &str = "Please select a .zip file first!";
/// Status line after a successful index
pub const UPLOAD_SUCCESS: &str = "Codebase indexed successfully!";
/// Status line when the index attempt fails
pub const UPLOAD_FAILURE: &str = "Error uploading file.";
/// Assistant turn appended when an ask attempt fails
pub const ASK_FALLBACK: &str = "Error: Could not connect to server or no codebase uploaded.";
/// Documentation slot content when generation fails
pub const DOCS_FALLBACK: &str = "Error generating documentation.";
/// Diagram slot content when generation fails
pub const DIAGRAM_FALLBACK: &str = "Error generating diagram.";

/// Clears the busy flag when dropped, so release is unconditional.
struct BusyGuard {
    session: SessionState,
    event_tx: mpsc::UnboundedSender<WorkbenchEvent>,
    action: ActionKind,
}

impl BusyGuard {
    fn begin(
        session: &SessionState,
        event_tx: &mpsc::UnboundedSender<WorkbenchEvent>,
        action: ActionKind,
    ) -> Self {
        session.set_busy(true);
        let _ = event_tx.send(WorkbenchEvent::ActionStarted(action));
        Self {
            session: session.clone(),
            event_tx: event_tx.clone(),
            action,
        }
    }
}

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.session.set_busy(false);
        let _ = self
            .event_tx
            .send(WorkbenchEvent::ActionFinished(self.action));
    }
}

/// Workbench Controller
///
/// Owns the wiring between the session store, the analysis gateway, and the
/// export pipeline. Frontends call its methods and re-render from the
/// session state on each [`WorkbenchEvent`].
pub struct WorkbenchController {
    backend: Arc<dyn AnalysisBackend>,
    session: SessionState,
    export: ExportPipeline,
    event_tx: mpsc::UnboundedSender<WorkbenchEvent>,
    /// Issuance counter for mode-affecting actions
    mode_seq: AtomicU64,
}

impl WorkbenchController {
    pub fn new(
        backend: Arc<dyn AnalysisBackend>,
        session: SessionState,
        export: ExportPipeline,
        event_tx: mpsc::UnboundedSender<WorkbenchEvent>,
    ) -> Self {
        Self {
            backend,
            session,
            export,
            event_tx,
            mode_seq: AtomicU64::new(0),
        }
    }

    pub fn session(&self) -> &SessionState {
        &self.session
    }

    fn emit(&self, event: WorkbenchEvent) {
        let _ = self.event_tx.send(event);
    }

    fn next_mode_seq(&self) -> u64 {
        self.mode_seq.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn is_latest_mode_seq(&self, seq: u64) -> bool {
        self.mode_seq.load(Ordering::SeqCst) == seq
    }

    fn fail(&self, action: ActionKind, err: WorkbenchError) {
        tracing::warn!(action = action.label(), error = ?err, "action failed");
        self.emit(WorkbenchEvent::ActionFailed {
            action,
            message: err.user_message(),
        });
    }

    // ========== Synchronous transitions ==========

    /// Record a new archive selection; stale upload status is cleared.
    pub fn select_archive(&self, name: impl Into<String>, payload: Vec<u8>) {
        self.session.select_archive(name, payload);
        self.emit(WorkbenchEvent::UploadStatusChanged(String::new()));
    }

    /// Tab selection; never triggers generation.
    pub fn select_view(&self, mode: ViewMode) {
        self.session.select_view(mode);
        self.emit(WorkbenchEvent::ViewChanged(mode));
    }

    /// Flip rendered/raw within the diagram view.
    pub fn toggle_diagram_view(&self) {
        self.session.toggle_diagram_view();
    }

    pub fn set_diagram_kind(&self, kind: DiagramKind) {
        self.session.set_diagram_kind(kind);
    }

    // ========== Async actions ==========

    /// Upload the selected archive and have the backend index it.
    ///
    /// A successful index is a full session reset: the transcript is cleared
    /// and the view returns to Chat, unless a newer mode-affecting action was
    /// issued while this one was in flight.
    pub async fn upload_and_index(&self) {
        let Some(archive) = self.session.archive_selection() else {
            self.session.set_upload_status(SELECT_ARCHIVE_HINT);
            self.emit(WorkbenchEvent::UploadStatusChanged(
                SELECT_ARCHIVE_HINT.to_string(),
            ));
            return;
        };

        let seq = self.next_mode_seq();
        let _busy = BusyGuard::begin(&self.session, &self.event_tx, ActionKind::UploadAndIndex);
        tracing::info!(archive = %archive.name, bytes = archive.payload.len(), "indexing archive");

        match self
            .backend
            .index_archive(&archive.name, archive.payload)
            .await
        {
            Ok(()) => {
                self.session.set_upload_status(UPLOAD_SUCCESS);
                self.session.mark_indexed();
                if self.is_latest_mode_seq(seq) {
                    self.session.reset_for_new_index();
                    self.emit(WorkbenchEvent::ViewChanged(ViewMode::Chat));
                } else {
                    // A newer docs/diagram issuance owns the view now; only
                    // the transcript part of the reset still applies.
                    tracing::debug!("stale index completion, keeping the newer view");
                    self.session.clear_transcript();
                }
                self.emit(WorkbenchEvent::UploadStatusChanged(
                    UPLOAD_SUCCESS.to_string(),
                ));
            }
            Err(err) => {
                self.session.set_upload_status(UPLOAD_FAILURE);
                self.emit(WorkbenchEvent::UploadStatusChanged(
                    UPLOAD_FAILURE.to_string(),
                ));
                self.fail(
                    ActionKind::UploadAndIndex,
                    WorkbenchError::backend(UPLOAD_FAILURE, err),
                );
            }
        }
    }

    /// Send the pending question to the backend.
    ///
    /// The user's turn is appended and the input cleared before the call
    /// resolves, so it is visible regardless of latency or failure.
    pub async fn ask(&self) {
        let Some(question) = self.session.take_question() else {
            return;
        };

        let turn = Turn::user(question.clone());
        self.session.push_turn(turn.clone());
        self.emit(WorkbenchEvent::TurnAppended(turn));

        let _busy = BusyGuard::begin(&self.session, &self.event_tx, ActionKind::Ask);

        let reply = match self.backend.ask(&question).await {
            Ok(answer) => answer,
            Err(err) => {
                self.fail(ActionKind::Ask, WorkbenchError::backend(ASK_FALLBACK, err));
                ASK_FALLBACK.to_string()
            }
        };

        let turn = Turn::assistant(reply);
        self.session.push_turn(turn.clone());
        self.emit(WorkbenchEvent::TurnAppended(turn));
    }

    /// Generate documentation for the whole indexed archive.
    pub async fn generate_documentation(&self) {
        // Orders this issuance ahead of any in-flight reset.
        self.next_mode_seq();
        self.session.force_documentation_view();
        self.emit(WorkbenchEvent::ViewChanged(ViewMode::Documentation));

        let _busy = BusyGuard::begin(&self.session, &self.event_tx, ActionKind::GenerateDocs);

        match self.backend.generate_documentation("").await {
            Ok(text) => self.session.set_documentation(text),
            Err(err) => {
                self.session.set_documentation(DOCS_FALLBACK);
                self.fail(
                    ActionKind::GenerateDocs,
                    WorkbenchError::backend(DOCS_FALLBACK, err),
                );
            }
        }
        self.emit(WorkbenchEvent::DocumentationUpdated);
    }

    /// Generate a diagram of the currently selected kind.
    pub async fn generate_diagram(&self) {
        let kind = self.session.diagram_kind();

        self.next_mode_seq();
        self.session.force_diagram_view();
        self.emit(WorkbenchEvent::ViewChanged(ViewMode::Diagram));

        let _busy = BusyGuard::begin(&self.session, &self.event_tx, ActionKind::GenerateDiagram);

        let source = match self.backend.generate_diagram(kind).await {
            Ok(text) => text,
            Err(err) => {
                self.fail(
                    ActionKind::GenerateDiagram,
                    WorkbenchError::backend(DIAGRAM_FALLBACK, err),
                );
                DIAGRAM_FALLBACK.to_string()
            }
        };

        self.session.set_diagram(DiagramSource { kind, source });
        self.emit(WorkbenchEvent::DiagramUpdated(kind));
    }

    /// Export the current diagram as `{kind}-diagram.svg`.
    ///
    /// Does not set the busy flag: export mutates no shared session state,
    /// and an empty diagram slot makes it a silent no-op.
    pub async fn export_svg(&self) {
        match self.export.export_svg(&self.session).await {
            Ok(Some(outcome)) => {
                self.emit(WorkbenchEvent::ExportCompleted {
                    filename: outcome.filename,
                });
            }
            Ok(None) => {}
            Err(err) => self.fail(ActionKind::ExportSvg, WorkbenchError::from(err)),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    use async_trait::async_trait;
    use tokio::sync::Notify;

    use super::*;
    use crate::export::{DiagramRenderer, FileSystemSink};
    use crate::gateway::GatewayError;
    use crate::session::TurnRole;
    use crate::workbench::modes::DiagramViewMode;

    /// Backend stub with per-operation failure switches and call counters.
    /// Operations with a `gate_*` switch block until `gate` is notified.
    #[derive(Default)]
    struct StubBackend {
        fail: bool,
        answer: String,
        docs: String,
        diagram: String,
        gate_index: bool,
        gate_ask: bool,
        gate: Notify,
        index_calls: AtomicUsize,
        ask_calls: AtomicUsize,
    }

    impl StubBackend {
        fn failing() -> Self {
            Self {
                fail: true,
                ..Default::default()
            }
        }

        fn erring<T>(&self) -> Result<T, GatewayError> {
            Err(GatewayError::from(anyhow::anyhow!("connection refused")))
        }
    }

    #[async_trait]
    impl AnalysisBackend for StubBackend {
        async fn index_archive(&self, _name: &str, _payload: Vec<u8>) -> Result<(), GatewayError> {
            self.index_calls.fetch_add(1, Ordering::SeqCst);
            if self.gate_index {
                self.gate.notified().await;
            }
            if self.fail {
                return self.erring();
            }
            Ok(())
        }

        async fn ask(&self, _question: &str) -> Result<String, GatewayError> {
            self.ask_calls.fetch_add(1, Ordering::SeqCst);
            if self.gate_ask {
                self.gate.notified().await;
            }
            if self.fail {
                return self.erring();
            }
            Ok(self.answer.clone())
        }

        async fn generate_documentation(&self, _scope_hint: &str) -> Result<String, GatewayError> {
            if self.fail {
                return self.erring();
            }
            Ok(self.docs.clone())
        }

        async fn generate_diagram(&self, _kind: DiagramKind) -> Result<String, GatewayError> {
            if self.fail {
                return self.erring();
            }
            Ok(self.diagram.clone())
        }
    }

    struct NoopRenderer;

    #[async_trait]
    impl DiagramRenderer for NoopRenderer {
        async fn render(&self, element_id: &str, _source: &str) -> anyhow::Result<String> {
            Ok(format!("<svg id=\"{element_id}\"/>"))
        }
    }

    struct Harness {
        controller: Arc<WorkbenchController>,
        backend: Arc<StubBackend>,
        session: SessionState,
        _export_dir: tempfile::TempDir,
    }

    fn harness(backend: StubBackend) -> Harness {
        let backend = Arc::new(backend);
        let session = SessionState::new();
        let export_dir = tempfile::tempdir().unwrap();
        let export = ExportPipeline::new(
            Arc::new(NoopRenderer),
            Arc::new(FileSystemSink::new(export_dir.path())),
        );
        let (event_tx, _event_rx) = mpsc::unbounded_channel();
        let controller = Arc::new(WorkbenchController::new(
            backend.clone(),
            session.clone(),
            export,
            event_tx,
        ));
        Harness {
            controller,
            backend,
            session,
            _export_dir: export_dir,
        }
    }

    async fn wait_until(mut cond: impl FnMut() -> bool) {
        tokio::time::timeout(Duration::from_secs(1), async {
            while !cond() {
                tokio::time::sleep(Duration::from_millis(1)).await;
            }
        })
        .await
        .expect("condition not reached in time");
    }

    #[tokio::test]
    async fn upload_without_a_selection_sets_the_hint_and_skips_the_network() {
        let h = harness(StubBackend::default());

        h.controller.upload_and_index().await;

        assert_eq!(h.session.upload_status().text(), SELECT_ARCHIVE_HINT);
        assert_eq!(h.backend.index_calls.load(Ordering::SeqCst), 0);
        assert!(!h.session.is_busy());
    }

    #[tokio::test]
    async fn successful_upload_is_a_full_session_reset() {
        let h = harness(StubBackend::default());
        h.session.push_turn(Turn::user("old question"));
        h.session.select_view(ViewMode::Documentation);
        h.controller.select_archive("project.zip", vec![0x50, 0x4b]);

        h.controller.upload_and_index().await;

        assert_eq!(h.session.upload_status().text(), UPLOAD_SUCCESS);
        assert!(!h.session.upload_status().is_error());
        assert_eq!(h.session.transcript_len(), 0);
        assert_eq!(h.session.view_mode(), ViewMode::Chat);
        assert!(h.session.is_archive_indexed());
    }

    #[tokio::test]
    async fn failed_upload_writes_the_error_status() {
        let h = harness(StubBackend::failing());
        h.controller.select_archive("project.zip", vec![1]);

        h.controller.upload_and_index().await;

        assert_eq!(h.session.upload_status().text(), UPLOAD_FAILURE);
        assert!(h.session.upload_status().is_error());
        assert!(!h.session.is_archive_indexed());
        assert!(!h.session.is_busy());
    }

    #[tokio::test]
    async fn ask_appends_the_user_turn_before_the_call_resolves() {
        let h = harness(StubBackend {
            gate_ask: true,
            answer: "It starts the app.".into(),
            ..Default::default()
        });
        h.session.set_question_input("What does main.py do?");

        let controller = h.controller.clone();
        let task = tokio::spawn(async move { controller.ask().await });

        wait_until(|| h.session.transcript_len() == 1).await;
        let transcript = h.session.transcript();
        assert_eq!(transcript[0].role, TurnRole::User);
        assert_eq!(transcript[0].text, "What does main.py do?");
        assert!(h.session.question_input().is_empty());

        h.backend.gate.notify_one();
        task.await.unwrap();

        let transcript = h.session.transcript();
        assert_eq!(transcript.len(), 2);
        assert_eq!(transcript[1].role, TurnRole::Assistant);
        assert_eq!(transcript[1].text, "It starts the app.");
    }

    #[tokio::test]
    async fn ask_failure_appends_the_fixed_fallback_turn() {
        let h = harness(StubBackend::failing());
        h.session.set_question_input("anyone home?");

        h.controller.ask().await;

        let transcript = h.session.transcript();
        assert_eq!(transcript.len(), 2);
        assert_eq!(transcript[0].role, TurnRole::User);
        assert_eq!(transcript[1].role, TurnRole::Assistant);
        assert_eq!(transcript[1].text, ASK_FALLBACK);
    }

    #[tokio::test]
    async fn ask_with_a_blank_question_is_a_noop() {
        let h = harness(StubBackend::default());
        h.session.set_question_input("   \n");

        h.controller.ask().await;

        assert_eq!(h.session.transcript_len(), 0);
        assert_eq!(h.backend.ask_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn controls_are_disabled_exactly_while_an_action_is_outstanding() {
        let h = harness(StubBackend {
            gate_ask: true,
            ..Default::default()
        });
        h.session.set_question_input("q");
        assert!(h.session.controls_enabled());

        let controller = h.controller.clone();
        let task = tokio::spawn(async move { controller.ask().await });

        wait_until(|| h.session.is_busy()).await;
        assert!(!h.session.controls_enabled());

        h.backend.gate.notify_one();
        task.await.unwrap();

        assert!(h.session.controls_enabled());
    }

    #[tokio::test]
    async fn generate_documentation_forces_the_documentation_view() {
        let h = harness(StubBackend {
            docs: "# Overview".into(),
            ..Default::default()
        });
        h.session.select_view(ViewMode::Diagram);

        h.controller.generate_documentation().await;

        assert_eq!(h.session.view_mode(), ViewMode::Documentation);
        assert_eq!(h.session.documentation().as_deref(), Some("# Overview"));
    }

    #[tokio::test]
    async fn failed_documentation_overwrites_the_slot_with_the_fallback() {
        let h = harness(StubBackend::failing());
        h.session.set_documentation("stale docs");

        h.controller.generate_documentation().await;

        assert_eq!(h.session.documentation().as_deref(), Some(DOCS_FALLBACK));
        assert!(!h.session.is_busy());
    }

    #[tokio::test]
    async fn generate_diagram_forces_rendered_and_tags_the_kind() {
        let h = harness(StubBackend {
            diagram: "erDiagram\n  USER ||--o{ ORDER : places".into(),
            ..Default::default()
        });
        h.controller.set_diagram_kind(DiagramKind::Erd);
        h.session.select_view(ViewMode::Diagram);
        h.session.toggle_diagram_view(); // raw source selected beforehand

        h.controller.generate_diagram().await;

        assert_eq!(h.session.view_mode(), ViewMode::Diagram);
        assert_eq!(h.session.diagram_view(), DiagramViewMode::Rendered);
        let diagram = h.session.diagram().unwrap();
        assert_eq!(diagram.kind, DiagramKind::Erd);
        assert!(diagram.source.starts_with("erDiagram"));
    }

    #[tokio::test]
    async fn failed_diagram_keeps_the_requested_kind_tag() {
        let h = harness(StubBackend::failing());
        h.controller.set_diagram_kind(DiagramKind::UseCase);

        h.controller.generate_diagram().await;

        let diagram = h.session.diagram().unwrap();
        assert_eq!(diagram.kind, DiagramKind::UseCase);
        assert_eq!(diagram.source, DIAGRAM_FALLBACK);
    }

    #[tokio::test]
    async fn stale_upload_completion_keeps_the_newer_view() {
        let h = harness(StubBackend {
            gate_index: true,
            diagram: "classDiagram".into(),
            ..Default::default()
        });
        h.controller.select_archive("project.zip", vec![1]);
        h.session.push_turn(Turn::user("before re-index"));

        let controller = h.controller.clone();
        let upload = tokio::spawn(async move { controller.upload_and_index().await });
        wait_until(|| h.backend.index_calls.load(Ordering::SeqCst) == 1).await;

        // A newer mode-affecting action lands while the upload is in flight.
        h.controller.generate_diagram().await;
        assert_eq!(h.session.view_mode(), ViewMode::Diagram);

        h.backend.gate.notify_one();
        upload.await.unwrap();

        // The stale completion still clears the transcript and records the
        // status, but no longer flips the view back to Chat.
        assert_eq!(h.session.view_mode(), ViewMode::Diagram);
        assert_eq!(h.session.transcript_len(), 0);
        assert_eq!(h.session.upload_status().text(), UPLOAD_SUCCESS);
    }

    #[tokio::test]
    async fn exactly_one_view_is_active_at_every_step() {
        let h = harness(StubBackend {
            docs: "docs".into(),
            diagram: "graph TD".into(),
            ..Default::default()
        });

        // ViewMode is an enum, so exclusivity holds by construction; walk the
        // transitions and confirm the active view is always the forced one.
        h.controller.generate_documentation().await;
        assert_eq!(h.session.view_mode(), ViewMode::Documentation);

        h.controller.generate_diagram().await;
        assert_eq!(h.session.view_mode(), ViewMode::Diagram);

        h.controller.select_view(ViewMode::Chat);
        assert_eq!(h.session.view_mode(), ViewMode::Chat);
    }
}
