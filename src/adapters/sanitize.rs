//! Log sanitization for patient data.
//!
//! Log lines may mention record identifiers or clinical dates (symptom onset,
//! hospital visit). These are redacted before the line reaches the sink.
//! Structured logging that never formats raw records remains the first line
//! of protection; this writer catches what slips through.

use std::io::Write;
use std::sync::OnceLock;

use regex::{Regex, RegexSet};
use tracing_subscriber::fmt::MakeWriter;

/// Default cap on bytes sanitized per line.
pub const DEFAULT_SANITIZE_MAX_BYTES: usize = 16 * 1024;

const RULES: [(&str, &str); 6] = [
    (
        r"[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}",
        "[REDACTED-UUID]",
    ),
    (r"\b\d{4}[-/]\d{1,2}[-/]\d{1,2}\b", "[REDACTED-DATE]"),
    (r"\b\d{1,2}[/.]\d{1,2}[/.]\d{4}\b", "[REDACTED-DATE]"),
    (
        r"(?i)\b[a-z0-9](?:[a-z0-9._%+-]{0,62}[a-z0-9])?@(?:[a-z0-9](?:[a-z0-9-]{0,61}[a-z0-9])?\.)+[a-z]{2,}\b",
        "[REDACTED-EMAIL]",
    ),
    (
        r"\b(?:\+?\d{1,3}[-.\s]?)?\(?\d{3}\)?[-.\s]?\d{3}[-.\s]?\d{4}\b",
        "[REDACTED-PHONE]",
    ),
    (
        r#"(?i)\b(?:patient[_-]?id|record[_-]?id|id)\s*[:=]\s*"?[A-Za-z0-9-]+"?"#,
        "id=[REDACTED-ID]",
    ),
];

struct Patterns {
    set: RegexSet,
    rules: Vec<(Regex, &'static str)>,
}

fn patterns() -> &'static Patterns {
    static PATTERNS: OnceLock<Patterns> = OnceLock::new();
    PATTERNS.get_or_init(|| Patterns {
        set: RegexSet::new(RULES.iter().map(|(p, _)| *p)).expect("Valid regex set"),
        rules: RULES
            .iter()
            .map(|(p, r)| (Regex::new(p).expect("Valid regex"), *r))
            .collect(),
    })
}

fn truncate_to_char_boundary(input: &str, max_bytes: usize) -> (&str, bool) {
    if input.len() <= max_bytes {
        return (input, false);
    }
    let mut end = max_bytes;
    while end > 0 && !input.is_char_boundary(end) {
        end -= 1;
    }
    (&input[..end], true)
}

/// Redact identifiers and dates, scanning at most `max_bytes`.
#[must_use]
pub fn sanitize(input: &str, max_bytes: usize) -> String {
    let p = patterns();
    let (prefix, truncated) = truncate_to_char_boundary(input, max_bytes);

    let mut out = prefix.to_string();
    for idx in p.set.matches(prefix).into_iter() {
        let (regex, replacement) = &p.rules[idx];
        out = regex.replace_all(&out, *replacement).into_owned();
    }
    if truncated {
        out.push_str(" [TRUNCATED]");
    }
    out
}

/// A `tracing_subscriber` writer factory that sanitizes each log line.
#[derive(Debug, Clone)]
pub struct SanitizingMakeWriter<M> {
    inner: M,
    max_bytes: usize,
}

impl<M> SanitizingMakeWriter<M> {
    #[must_use]
    pub fn new(inner: M, max_bytes: usize) -> Self {
        Self { inner, max_bytes }
    }
}

/// Line-buffering writer produced by [`SanitizingMakeWriter`].
pub struct SanitizingWriter<W: Write> {
    inner: W,
    buffer: Vec<u8>,
    max_bytes: usize,
}

impl<W: Write> SanitizingWriter<W> {
    fn emit(&mut self, bytes: &[u8]) -> std::io::Result<()> {
        let line = String::from_utf8_lossy(bytes);
        let mut out = sanitize(&line, self.max_bytes);
        // Truncation can cut off the line terminator.
        if line.ends_with('\n') && !out.ends_with('\n') {
            out.push('\n');
        }
        self.inner.write_all(out.as_bytes())
    }

    fn flush_lines(&mut self) -> std::io::Result<()> {
        while let Some(pos) = self.buffer.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            self.emit(&line)?;
        }
        Ok(())
    }
}

impl<W: Write> Write for SanitizingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.buffer.extend_from_slice(buf);
        self.flush_lines()?;

        // A formatter that never writes a newline must not grow the buffer forever.
        if self.buffer.len() > self.max_bytes.saturating_mul(2) {
            let mut pending = std::mem::take(&mut self.buffer);
            pending.push(b'\n');
            self.emit(&pending)?;
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.flush_lines()?;
        if !self.buffer.is_empty() {
            let pending = std::mem::take(&mut self.buffer);
            self.emit(&pending)?;
        }
        self.inner.flush()
    }
}

impl<W: Write> Drop for SanitizingWriter<W> {
    fn drop(&mut self) {
        let _ = self.flush();
    }
}

impl<'a, M> MakeWriter<'a> for SanitizingMakeWriter<M>
where
    M: MakeWriter<'a>,
{
    type Writer = SanitizingWriter<M::Writer>;

    fn make_writer(&'a self) -> Self::Writer {
        SanitizingWriter {
            inner: self.inner.make_writer(),
            buffer: Vec::new(),
            max_bytes: self.max_bytes,
        }
    }
}
