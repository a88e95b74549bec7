//! Best-effort copy to the system clipboard through platform tools.

use std::io::Write;
use std::process::{Command, Stdio};

use tracing::debug;

/// Script that reads stdin as UTF-8; `clip.exe` would mangle non-ASCII text.
const POWERSHELL_SCRIPT: &str =
    "[Console]::InputEncoding = [System.Text.Encoding]::UTF8; Set-Clipboard -Value ([Console]::In.ReadToEnd())";

/// Candidate tools for the current platform, in order of preference.
fn candidates() -> Vec<(&'static str, Vec<&'static str>)> {
    if cfg!(target_os = "windows") {
        vec![(
            "powershell",
            vec!["-NoProfile", "-NonInteractive", "-Command", POWERSHELL_SCRIPT],
        )]
    } else if cfg!(target_os = "macos") {
        vec![("pbcopy", vec![])]
    } else {
        vec![
            ("xclip", vec!["-selection", "clipboard"]),
            ("xsel", vec!["--clipboard", "--input"]),
        ]
    }
}

/// Copy `text`, returning the tool that succeeded. `None` when no tool worked.
pub(crate) fn copy(text: &str) -> Option<&'static str> {
    candidates()
        .into_iter()
        .find(|(tool, args)| match pipe_to(tool, args, text) {
            Ok(()) => true,
            Err(e) => {
                debug!(tool, error = %e, "clipboard tool failed");
                false
            }
        })
        .map(|(tool, _)| tool)
}

fn pipe_to(tool: &str, args: &[&str], text: &str) -> std::io::Result<()> {
    let mut child = Command::new(tool)
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()?;
    if let Some(mut stdin) = child.stdin.take() {
        stdin.write_all(text.as_bytes())?;
    }
    let status = child.wait()?;
    if status.success() {
        Ok(())
    } else {
        Err(std::io::Error::other(format!("{tool} exited with {status}")))
    }
}
