//! Sources for per-run developer notes.

use std::io::BufRead;
use std::path::PathBuf;

use tracing::debug;

use prgen_shared::{PrgenError, Result};

/// Line that ends interactive input.
pub const END_MARKER: &str = "END";

/// Where this run's notes come from. At most one source is used.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum NotesSource {
    #[default]
    None,
    Inline(String),
    File(PathBuf),
    /// Read from stdin until a line containing only [`END_MARKER`].
    Interactive,
}

impl NotesSource {
    /// Pick a source from CLI-style options; the first one set wins.
    pub fn select(inline: Option<String>, file: Option<PathBuf>, interactive: bool) -> Self {
        match (inline.filter(|s| !s.trim().is_empty()), file) {
            (Some(text), _) => Self::Inline(text),
            (None, Some(path)) => Self::File(path),
            (None, None) if interactive => Self::Interactive,
            _ => Self::None,
        }
    }

    /// Whether reading this source needs the terminal.
    pub fn is_interactive(&self) -> bool {
        matches!(self, Self::Interactive)
    }

    /// Resolve the notes text, reading stdin for [`NotesSource::Interactive`].
    pub fn read(&self) -> Result<String> {
        self.read_from(std::io::stdin().lock())
    }

    /// Like [`NotesSource::read`] with an explicit reader for interactive input.
    pub fn read_from(&self, input: impl BufRead) -> Result<String> {
        let text = match self {
            Self::None => String::new(),
            Self::Inline(text) => text.trim().to_string(),
            Self::File(path) => std::fs::read_to_string(path)
                .map_err(|e| PrgenError::io(path, e))?
                .trim()
                .to_string(),
            Self::Interactive => read_until_end(input)?,
        };
        debug!(source = ?self, len = text.len(), "notes resolved");
        Ok(text)
    }
}

/// Collect lines until one whose trimmed content is [`END_MARKER`] or EOF.
pub fn read_until_end(input: impl BufRead) -> Result<String> {
    let mut lines = Vec::new();
    for line in input.lines() {
        let line = line.map_err(|e| PrgenError::io("<stdin>", e))?;
        if line.trim() == END_MARKER {
            break;
        }
        lines.push(line);
    }
    Ok(lines.join("\n").trim().to_string())
}
