//! Note export.
//!
//! Renders a note list as plain text and as HTML. Rendering is pure;
//! getting the payload somewhere is the job of an [`ExportSink`].

pub mod sink;

use url::Url;

use crate::context::ContentId;
use crate::storage::NoteList;

pub use sink::{deliver, ClipboardSink, Delivery, ExportSink, FileSink, StdoutSink};

/// Formats a video position as `HH:MM:SS`, or `MM:SS` below one hour.
///
/// Fractional seconds are dropped. Every place that shows a note time
/// goes through this function.
pub fn format_time(seconds: f64) -> String {
    let total = whole_seconds(seconds);
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let secs = total % 60;

    if hours == 0 {
        format!("{minutes:02}:{secs:02}")
    } else {
        format!("{hours:02}:{minutes:02}:{secs:02}")
    }
}

/// Floors a position to whole seconds, clamping negatives and NaN to zero.
pub fn whole_seconds(seconds: f64) -> u64 {
    if seconds.is_finite() && seconds > 0.0 {
        seconds.floor() as u64
    } else {
        0
    }
}

/// Parses `SS`, `MM:SS`, or `HH:MM:SS` (seconds may be fractional).
pub fn parse_time(input: &str) -> anyhow::Result<f64> {
    let parts: Vec<&str> = input.trim().split(':').collect();
    if parts.len() > 3 || parts.iter().any(|p| p.is_empty()) {
        anyhow::bail!("Invalid timestamp '{input}'. Use SS, MM:SS, or HH:MM:SS");
    }

    let mut total = 0.0;
    for (i, part) in parts.iter().enumerate() {
        let value: f64 = part
            .parse()
            .map_err(|_| anyhow::anyhow!("Invalid timestamp '{input}'. Use SS, MM:SS, or HH:MM:SS"))?;
        let is_last = i + 1 == parts.len();
        if !value.is_finite() || value < 0.0 || (!is_last && value.fract() != 0.0) {
            anyhow::bail!("Invalid timestamp '{input}'");
        }
        total = total * 60.0 + value;
    }
    Ok(total)
}

/// Both renderings of a note list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportPayload {
    pub plain: String,
    pub html: String,
}

/// Renders notes for one video.
pub struct NoteExporter {
    watch_url: Url,
}

impl NoteExporter {
    /// Creates an exporter whose links point at `watch_url`.
    pub fn new(watch_url: &str) -> anyhow::Result<Self> {
        let watch_url = Url::parse(watch_url)
            .map_err(|e| anyhow::anyhow!("Invalid watch URL '{}': {}", watch_url, e))?;
        Ok(Self { watch_url })
    }

    /// Produces the plain text and HTML renderings.
    pub fn export(&self, notes: &NoteList, title: &str, id: &ContentId) -> ExportPayload {
        ExportPayload {
            plain: render_plain(notes, title),
            html: self.render_html(notes, title, id),
        }
    }

    /// Link that starts playback of `id` at `seconds`.
    pub fn timestamp_link(&self, id: &ContentId, seconds: f64) -> String {
        let mut link = self.watch_url.clone();
        link.query_pairs_mut()
            .append_pair("v", id.as_str())
            .append_pair("t", &format!("{}s", whole_seconds(seconds)));
        link.to_string()
    }

    fn render_html(&self, notes: &NoteList, title: &str, id: &ContentId) -> String {
        let mut html = format!("<h2>{}</h2>\n", escape_html(title));
        for note in notes {
            html.push_str(&format!(
                "<p><a href=\"{}\">{}</a> {}</p>\n",
                escape_html(&self.timestamp_link(id, note.time)),
                format_time(note.time),
                escape_html(&note.text).replace('\n', "<br>")
            ));
        }
        html
    }
}

/// Title line, blank line, then one `time - text` line per note.
pub fn render_plain(notes: &NoteList, title: &str) -> String {
    let lines: Vec<String> = notes
        .iter()
        .map(|note| format!("{} - {}", format_time(note.time), note.text))
        .collect();
    format!("{}\n\n{}", title, lines.join("\n"))
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
