use crate::Error;
use anyhow::Result;
use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;

/// Where final snippet text goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Output {
    Stdout,
    File(PathBuf),
    Clipboard,
}

impl Output {
    /// Stdout unless a file is configured.
    pub fn from_file(path: Option<PathBuf>) -> Self {
        path.map_or(Self::Stdout, Self::File)
    }

    pub fn emit(&self, text: &str) -> Result<()> {
        match self {
            Self::Stdout => write_stdout(text).map_err(|e| Error::io("<stdout>", e))?,
            Self::File(path) => {
                fs::write(path, text).map_err(|e| Error::io(path, e))?;
                eprintln!("✓ Wrote {}", path.display());
            }
            Self::Clipboard => copy_to_clipboard(text)?,
        }
        Ok(())
    }
}

fn write_stdout(text: &str) -> io::Result<()> {
    let mut stdout = io::stdout().lock();
    stdout.write_all(text.as_bytes())?;
    if !text.ends_with('\n') {
        stdout.write_all(b"\n")?;
    }
    stdout.flush()
}

#[cfg(feature = "clipboard")]
fn copy_to_clipboard(text: &str) -> Result<()> {
    use clipboard::{ClipboardContext, ClipboardProvider};

    let mut ctx: ClipboardContext = ClipboardProvider::new()
        .map_err(|e| anyhow::anyhow!("Failed to initialize clipboard: {}", e))?;
    ctx.set_contents(text.to_string())
        .map_err(|e| anyhow::anyhow!("Failed to write to clipboard: {}", e))?;
    eprintln!("✓ Copied to clipboard");
    Ok(())
}

#[cfg(not(feature = "clipboard"))]
fn copy_to_clipboard(text: &str) -> Result<()> {
    tracing::warn!("built without clipboard support; writing to stdout");
    Output::Stdout.emit(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_file_output_writes_exact_text() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.txt");
        Output::from_file(Some(path.clone())).emit("Hello Ada!").unwrap();
        assert_eq!(fs::read_to_string(path).unwrap(), "Hello Ada!");
    }

    #[test]
    fn test_default_is_stdout() {
        assert_eq!(Output::from_file(None), Output::Stdout);
    }

    #[test]
    fn test_unwritable_file_is_an_io_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing-dir").join("out.txt");
        let err = Output::File(path).emit("text").unwrap_err();
        assert_eq!(err.downcast_ref::<Error>().map(Error::exit_code), Some(8));
    }
}
