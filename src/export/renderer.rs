//! Rendering-engine seam
//!
//! The engine that turns diagram description text into SVG markup is an
//! external capability; the workbench depends only on this trait.

use std::process::Stdio;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

#[async_trait]
pub trait DiagramRenderer: Send + Sync {
    /// Materialize `source` into SVG markup. `element_id` keys the render so
    /// repeated exports within one session cannot collide.
    async fn render(&self, element_id: &str, source: &str) -> Result<String>;
}

/// Renders through the mermaid CLI (`mmdc`), streaming the diagram source on
/// stdin and reading SVG from stdout.
pub struct MermaidCliRenderer {
    command: String,
}

impl MermaidCliRenderer {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }
}

impl Default for MermaidCliRenderer {
    fn default() -> Self {
        Self::new("mmdc")
    }
}

#[async_trait]
impl DiagramRenderer for MermaidCliRenderer {
    async fn render(&self, element_id: &str, source: &str) -> Result<String> {
        let mut child = Command::new(&self.command)
            .arg("--input")
            .arg("-")
            .arg("--output")
            .arg("-")
            .arg("--outputFormat")
            .arg("svg")
            .arg("--svgId")
            .arg(element_id)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .with_context(|| format!("failed to launch diagram renderer '{}'", self.command))?;

        let mut stdin = child
            .stdin
            .take()
            .context("diagram renderer stdin unavailable")?;
        stdin
            .write_all(source.as_bytes())
            .await
            .context("failed to stream diagram source to renderer")?;
        drop(stdin);

        let output = child
            .wait_with_output()
            .await
            .context("diagram renderer did not finish")?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!("diagram renderer failed: {}", stderr.trim());
        }

        String::from_utf8(output.stdout).context("diagram renderer produced non-UTF8 output")
    }
}
