//! repolens CLI
//!
//! Thin interactive driver over the workbench controller: reads commands from
//! stdin, prints session state as plain text, and relays workbench events.
//! All state and sequencing live in the library.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use repolens::config::Config;
use repolens::export::{ExportPipeline, FileSystemSink, MermaidCliRenderer};
use repolens::gateway::HttpAnalysisGateway;
use repolens::session::{SessionState, TurnRole};
use repolens::workbench::modes::{DiagramKind, DiagramViewMode, ViewMode};
use repolens::workbench::{WorkbenchController, WorkbenchEvent};

#[derive(Parser)]
#[command(name = "repolens")]
#[command(author, version, about = "Workbench client for a remote AI code-analysis service", long_about = None)]
struct Cli {
    /// Analysis backend base URL (overrides config)
    #[arg(long)]
    backend_url: Option<String>,

    /// Directory for exported diagrams (overrides config)
    #[arg(long)]
    export_dir: Option<PathBuf>,

    /// Config file path (default: user config dir)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        "repolens=debug"
    } else {
        "repolens=info"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let mut config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    if let Some(url) = cli.backend_url {
        config.backend.base_url = url;
    }
    if let Some(dir) = cli.export_dir {
        config.export.output_dir = dir;
    }

    tracing::info!(backend = %config.backend.base_url, "starting workbench");

    let gateway = HttpAnalysisGateway::with_timeout(
        &config.backend.base_url,
        Duration::from_secs(config.backend.request_timeout_secs),
    )?;
    let session = SessionState::new();
    let export = ExportPipeline::new(
        Arc::new(MermaidCliRenderer::new(&config.export.renderer_command)),
        Arc::new(FileSystemSink::new(&config.export.output_dir)),
    );
    let (event_tx, mut event_rx) = mpsc::unbounded_channel();
    let controller = Arc::new(WorkbenchController::new(
        Arc::new(gateway),
        session.clone(),
        export,
        event_tx,
    ));

    tokio::spawn(async move {
        while let Some(event) = event_rx.recv().await {
            print_event(&event);
        }
    });

    run_repl(controller, session).await
}

async fn run_repl(controller: Arc<WorkbenchController>, session: SessionState) -> Result<()> {
    println!("repolens workbench. Type 'help' for commands.");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        let (command, rest) = match line.split_once(' ') {
            Some((command, rest)) => (command, rest.trim()),
            None => (line, ""),
        };

        match command {
            "" => {}
            "open" => {
                if rest.is_empty() {
                    println!("usage: open <path-to-archive>");
                    continue;
                }
                let path = PathBuf::from(rest);
                let payload = std::fs::read(&path)
                    .with_context(|| format!("failed to read {}", path.display()));
                match payload {
                    Ok(payload) => {
                        let name = path
                            .file_name()
                            .map(|n| n.to_string_lossy().into_owned())
                            .unwrap_or_else(|| rest.to_string());
                        controller.select_archive(name, payload);
                    }
                    Err(err) => println!("{err:#}"),
                }
            }
            "upload" => controller.upload_and_index().await,
            "ask" => {
                session.set_question_input(rest);
                controller.ask().await;
            }
            "docs" => controller.generate_documentation().await,
            "diagram" => {
                if !rest.is_empty() {
                    controller.set_diagram_kind(DiagramKind::from(rest));
                }
                controller.generate_diagram().await;
            }
            "kind" => {
                controller.set_diagram_kind(DiagramKind::from(rest));
                println!("diagram kind: {}", session.diagram_kind().label());
            }
            "view" => controller.select_view(ViewMode::from(rest)),
            "raw" => {
                controller.toggle_diagram_view();
                println!("diagram sub-view: {:?}", session.diagram_view());
            }
            "export" => controller.export_svg().await,
            "show" => print_view(&session),
            "help" => print_help(),
            "quit" | "exit" => break,
            other => println!("unknown command '{other}'; type 'help'"),
        }
    }

    Ok(())
}

fn print_event(event: &WorkbenchEvent) {
    match event {
        WorkbenchEvent::ActionStarted(action) => println!("[busy] {}...", action.label()),
        WorkbenchEvent::ActionFinished(_) => {}
        WorkbenchEvent::UploadStatusChanged(status) if !status.is_empty() => {
            println!("[status] {status}");
        }
        WorkbenchEvent::UploadStatusChanged(_) => {}
        WorkbenchEvent::TurnAppended(turn) => {
            let who = match turn.role {
                TurnRole::User => "You",
                TurnRole::Assistant => "AI Assistant",
            };
            println!("{who}: {}", turn.text);
        }
        WorkbenchEvent::DocumentationUpdated => println!("[docs] documentation updated"),
        WorkbenchEvent::DiagramUpdated(kind) => println!("[diagram] {} updated", kind.label()),
        WorkbenchEvent::ViewChanged(mode) => println!("[view] {}", mode.label()),
        WorkbenchEvent::ExportCompleted { filename } => println!("[export] wrote {filename}"),
        WorkbenchEvent::ActionFailed { message, .. } => println!("[error] {message}"),
    }
}

fn print_view(session: &SessionState) {
    match session.view_mode() {
        ViewMode::Chat => {
            if session.transcript_len() == 0 {
                println!("No questions yet. Upload a codebase to start chatting!");
                return;
            }
            session.with_transcript(|turns| {
                for turn in turns {
                    let who = match turn.role {
                        TurnRole::User => "You",
                        TurnRole::Assistant => "AI Assistant",
                    };
                    println!("{who}: {}", turn.text);
                }
            });
        }
        ViewMode::Documentation => match session.documentation() {
            Some(docs) => println!("{docs}"),
            None => println!("No documentation generated yet."),
        },
        ViewMode::Diagram => match session.diagram() {
            Some(diagram) => {
                println!("{} [{:?}]", diagram.kind.label(), session.diagram_view());
                if session.diagram_view() == DiagramViewMode::RawSource {
                    println!("{}", diagram.source);
                } else {
                    println!("(run 'export' to materialize, or 'raw' to see the source)");
                }
            }
            None => println!("No diagram generated yet."),
        },
    }
}

fn print_help() {
    println!("commands:");
    println!("  open <path>       select a source archive");
    println!("  upload            upload & index the selected archive");
    println!("  ask <question>    ask about the indexed codebase");
    println!("  docs              generate documentation");
    println!("  diagram [kind]    generate a diagram (class | usecase | erd)");
    println!("  kind <kind>       change the diagram kind selector");
    println!("  view <name>       switch view (chat | docs | diagram)");
    println!("  raw               toggle rendered/raw diagram sub-view");
    println!("  export            export the current diagram as SVG");
    println!("  show              print the active view");
    println!("  quit              exit");
}
