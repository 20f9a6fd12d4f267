//! Optional HTML → PDF composition through an external program.

use std::io::ErrorKind;
use std::path::Path;
use std::process::{Command, Stdio};

use tracing::{debug, info};

use positioning_shared::{PositioningError, RenderConfig, Result};

/// Turns a written markup file into a binary document.
pub trait Compositor: Send + Sync {
    /// Write `pdf_path` from `html_path`.
    ///
    /// Returns `RenderDependencyMissing` when the backing tool is unavailable.
    fn compose(&self, html_path: &Path, pdf_path: &Path) -> Result<()>;

    /// Human-readable compositor name for tracing.
    fn name(&self) -> &str;
}

/// Runs `<command> <in.html> <out.pdf>`, e.g. `weasyprint`.
pub struct CommandCompositor {
    command: String,
}

impl CommandCompositor {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }
}

impl Compositor for CommandCompositor {
    fn compose(&self, html_path: &Path, pdf_path: &Path) -> Result<()> {
        debug!(command = %self.command, html = %html_path.display(), "running compositor");

        let output = Command::new(&self.command)
            .arg(html_path)
            .arg(pdf_path)
            .stdin(Stdio::null())
            .output()
            .map_err(|e| match e.kind() {
                ErrorKind::NotFound | ErrorKind::PermissionDenied => {
                    PositioningError::RenderDependencyMissing(format!(
                        "`{}` is not installed or not executable: {e}",
                        self.command
                    ))
                }
                _ => PositioningError::Compositor(format!(
                    "failed to run `{}`: {e}",
                    self.command
                )),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(PositioningError::Compositor(format!(
                "`{}` exited with {}: {}",
                self.command,
                output.status,
                stderr.trim()
            )));
        }

        if !pdf_path.exists() {
            return Err(PositioningError::Compositor(format!(
                "`{}` finished without writing {}",
                self.command,
                pdf_path.display()
            )));
        }

        info!(pdf = %pdf_path.display(), "binary document written");
        Ok(())
    }

    fn name(&self) -> &str {
        &self.command
    }
}

/// The configured compositor, or `None` when binary output is disabled.
pub fn compositor_from_config(config: &RenderConfig) -> Option<Box<dyn Compositor>> {
    let command = config.compositor.trim();
    if !config.binary_output || command.is_empty() {
        return None;
    }
    Some(Box::new(CommandCompositor::new(command)))
}
