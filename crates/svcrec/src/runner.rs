//! Invocation of the service-control tool.

use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::debug;

use crate::error::RecoveryError;

/// Program invoked when no override is given.
pub const DEFAULT_SC_PROGRAM: &str = "sc.exe";

/// Runs the service-control tool.
///
/// The trait seam keeps reconciliation testable without a live service
/// manager; everything above it works purely on argument vectors and
/// captured output text.
pub trait ScRunner {
    /// Run the tool with `args`, returning combined stdout and stderr.
    /// A nonzero exit status is an error carrying that same output.
    fn run(&self, args: &[&str]) -> Result<String, RecoveryError>;
}

/// Invokes the real tool as a child process.
#[derive(Debug, Clone)]
pub struct ScExe {
    program: PathBuf,
}

impl ScExe {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Default for ScExe {
    fn default() -> Self {
        Self::new(DEFAULT_SC_PROGRAM)
    }
}

impl ScRunner for ScExe {
    fn run(&self, args: &[&str]) -> Result<String, RecoveryError> {
        let rendered = render_command(&self.program, args);
        debug!("running: {}", rendered);

        let output = Command::new(&self.program)
            .args(args)
            .output()
            .map_err(|source| RecoveryError::Launch {
                program: self.program.display().to_string(),
                source,
            })?;

        let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
        if !output.stderr.is_empty() {
            combined.push_str(&String::from_utf8_lossy(&output.stderr));
        }

        if output.status.success() {
            Ok(combined)
        } else {
            Err(RecoveryError::CommandFailed {
                command: rendered,
                status: output.status.code().unwrap_or(-1),
                output: combined.trim().to_string(),
            })
        }
    }
}

fn render_command(program: &Path, args: &[&str]) -> String {
    let mut rendered = program.display().to_string();
    for arg in args {
        rendered.push(' ');
        rendered.push_str(arg);
    }
    rendered
}
