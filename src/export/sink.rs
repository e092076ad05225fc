//! Destinations for exported notes.
//!
//! [`deliver`] tries the rich (HTML) rendering first and falls back to
//! plain text when the sink cannot take it.

use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Stdio};

use anyhow::{bail, Context, Result};

use super::ExportPayload;

/// Somewhere an export can be written.
pub trait ExportSink {
    /// Writes the rich rendering, with the plain text as an alternative
    /// where the sink supports both.
    fn write_rich(&self, payload: &ExportPayload) -> Result<()>;

    /// Writes the plain text rendering.
    fn write_plain(&self, plain: &str) -> Result<()>;
}

/// Which rendering ended up in the sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Rich,
    Plain,
}

/// Hands `payload` to `sink`, preferring the rich rendering.
pub fn deliver(sink: &dyn ExportSink, payload: &ExportPayload) -> Result<Delivery> {
    match sink.write_rich(payload) {
        Ok(()) => Ok(Delivery::Rich),
        Err(e) => {
            tracing::debug!("Rich export failed, falling back to plain text: {e:#}");
            sink.write_plain(&payload.plain)?;
            Ok(Delivery::Plain)
        }
    }
}

/// Prints plain text to stdout. Has no rich form.
pub struct StdoutSink;

impl ExportSink for StdoutSink {
    fn write_rich(&self, _payload: &ExportPayload) -> Result<()> {
        bail!("stdout only takes plain text")
    }

    fn write_plain(&self, plain: &str) -> Result<()> {
        println!("{plain}");
        Ok(())
    }
}

/// Writes to a file. Rich output is chosen by an `.html`/`.htm` extension.
pub struct FileSink {
    pub path: PathBuf,
}

impl FileSink {
    fn wants_html(&self) -> bool {
        self.path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("html") || ext.eq_ignore_ascii_case("htm"))
    }
}

impl ExportSink for FileSink {
    fn write_rich(&self, payload: &ExportPayload) -> Result<()> {
        if !self.wants_html() {
            bail!("{} is not an HTML file", self.path.display());
        }
        std::fs::write(&self.path, &payload.html)
            .with_context(|| format!("Failed to write to {}", self.path.display()))
    }

    fn write_plain(&self, plain: &str) -> Result<()> {
        std::fs::write(&self.path, plain)
            .with_context(|| format!("Failed to write to {}", self.path.display()))
    }
}

/// System clipboard through whichever copy tool is installed.
pub struct ClipboardSink;

impl ClipboardSink {
    // Tools that accept an HTML mime type.
    const RICH_TOOLS: &'static [(&'static str, &'static [&'static str])] = &[
        ("wl-copy", &["--type", "text/html"]),
        ("xclip", &["-selection", "clipboard", "-t", "text/html"]),
    ];

    const PLAIN_TOOLS: &'static [(&'static str, &'static [&'static str])] = &[
        ("pbcopy", &[]),
        ("wl-copy", &[]),
        ("xclip", &["-selection", "clipboard"]),
        ("xsel", &["--clipboard", "--input"]),
    ];

    fn pipe_to_first(tools: &[(&str, &[&str])], input: &str) -> Result<()> {
        let mut last_err = None;
        for (program, args) in tools {
            match pipe_to(program, args, input) {
                Ok(()) => {
                    tracing::debug!(program, "Copied to clipboard");
                    return Ok(());
                }
                Err(e) => last_err = Some(e),
            }
        }
        Err(last_err.unwrap_or_else(|| anyhow::anyhow!("No clipboard tool available")))
    }
}

impl ExportSink for ClipboardSink {
    fn write_rich(&self, payload: &ExportPayload) -> Result<()> {
        Self::pipe_to_first(Self::RICH_TOOLS, &payload.html)
    }

    fn write_plain(&self, plain: &str) -> Result<()> {
        Self::pipe_to_first(Self::PLAIN_TOOLS, plain)
            .context("No clipboard tool found (tried pbcopy, wl-copy, xclip, xsel)")
    }
}

fn pipe_to(program: &str, args: &[&str], input: &str) -> Result<()> {
    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .with_context(|| format!("Failed to run {program}"))?;

    child
        .stdin
        .take()
        .context("Failed to open stdin")?
        .write_all(input.as_bytes())?;

    let status = child.wait()?;
    if !status.success() {
        bail!("{program} exited with {status}");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use tempfile::tempdir;

    fn payload() -> ExportPayload {
        ExportPayload {
            plain: "Video\n\n01:05 - point A".to_string(),
            html: "<h2>Video</h2>\n".to_string(),
        }
    }

    /// Records what it was handed; optionally refuses rich output.
    struct RecordingSink {
        accept_rich: bool,
        written: RefCell<Vec<String>>,
    }

    impl ExportSink for RecordingSink {
        fn write_rich(&self, payload: &ExportPayload) -> Result<()> {
            if !self.accept_rich {
                bail!("rich not supported");
            }
            self.written.borrow_mut().push(payload.html.clone());
            Ok(())
        }

        fn write_plain(&self, plain: &str) -> Result<()> {
            self.written.borrow_mut().push(plain.to_string());
            Ok(())
        }
    }

    #[test]
    fn test_deliver_prefers_rich() {
        let sink = RecordingSink {
            accept_rich: true,
            written: RefCell::new(Vec::new()),
        };
        assert_eq!(deliver(&sink, &payload()).unwrap(), Delivery::Rich);
        assert_eq!(sink.written.borrow().as_slice(), ["<h2>Video</h2>\n"]);
    }

    #[test]
    fn test_deliver_falls_back_to_plain() {
        let sink = RecordingSink {
            accept_rich: false,
            written: RefCell::new(Vec::new()),
        };
        assert_eq!(deliver(&sink, &payload()).unwrap(), Delivery::Plain);
        assert_eq!(
            sink.written.borrow().as_slice(),
            ["Video\n\n01:05 - point A"]
        );
    }

    #[test]
    fn test_file_sink_by_extension() {
        let dir = tempdir().unwrap();

        let html_path = dir.path().join("notes.html");
        let delivery = deliver(&FileSink { path: html_path.clone() }, &payload()).unwrap();
        assert_eq!(delivery, Delivery::Rich);
        assert_eq!(std::fs::read_to_string(&html_path).unwrap(), "<h2>Video</h2>\n");

        let txt_path = dir.path().join("notes.txt");
        let delivery = deliver(&FileSink { path: txt_path.clone() }, &payload()).unwrap();
        assert_eq!(delivery, Delivery::Plain);
        assert_eq!(
            std::fs::read_to_string(&txt_path).unwrap(),
            "Video\n\n01:05 - point A"
        );
    }
}
