//! Python source classification.
//!
//! A candidate is Python when its extension is `py`. Files without an
//! extension are handed to a [`ContentSniffer`], and count as Python when
//! the returned description mentions `Python`. Any other extension is
//! rejected without reading the file.
//!
//! The sniffer is a seam: [`MagicSniffer`] inspects file bytes the way
//! `file(1)` does, and any `Fn(&Path) -> io::Result<String>` closure can
//! stand in for it.

use std::borrow::Cow;
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use tracing::debug;

use crate::error::CovzeroError;
use crate::Result;

/// Marker searched for in content descriptions.
const PYTHON_MARKER: &str = "Python";

/// How much of a file [`MagicSniffer`] reads.
pub const SNIFF_LIMIT: u64 = 64 * 1024;

/// Describes a file's content type in human-readable form.
pub trait ContentSniffer {
    /// Return a description such as `"Python script, ASCII text executable"`.
    fn describe(&self, path: &Path) -> io::Result<String>;
}

impl<F> ContentSniffer for F
where
    F: Fn(&Path) -> io::Result<String>,
{
    fn describe(&self, path: &Path) -> io::Result<String> {
        self(path)
    }
}

/// Decide whether `path` is a Python source file.
///
/// Sniffer failures are returned as [`CovzeroError::Sniff`]; nothing is
/// skipped silently.
pub fn is_python_source(path: &Path, sniffer: &dyn ContentSniffer) -> Result<bool> {
    let is_python = match path.extension() {
        Some(ext) => ext == "py",
        None => {
            let description = sniffer.describe(path).map_err(|source| CovzeroError::Sniff {
                path: path.to_path_buf(),
                source,
            })?;
            debug!(path = %path.display(), %description, "sniffed");
            description.contains(PYTHON_MARKER)
        }
    };
    Ok(is_python)
}

/// Content sniffer modelled on libmagic's text and script rules.
///
/// Reads at most [`SNIFF_LIMIT`] bytes. Binary formats are recognized by
/// their magic numbers through `infer`.
#[derive(Debug, Clone, Copy, Default)]
pub struct MagicSniffer;

impl MagicSniffer {
    /// Create a sniffer.
    pub fn new() -> Self {
        Self
    }
}

impl ContentSniffer for MagicSniffer {
    fn describe(&self, path: &Path) -> io::Result<String> {
        let mut buf = Vec::new();
        File::open(path)?.take(SNIFF_LIMIT).read_to_end(&mut buf)?;
        Ok(describe_bytes(&buf))
    }
}

/// Describe a content prefix.
pub fn describe_bytes(buf: &[u8]) -> String {
    if buf.is_empty() {
        return "empty".to_string();
    }

    let text = decode_text(buf);

    // infer reports every `#!` file as a shell script, so shebangs go first
    if let Some(text) = &text {
        if let Some(kind) = shebang_kind(&text.body) {
            return format!("{}, {} text executable", kind, text.encoding);
        }
    }

    if let Some(kind) = infer::get(buf) {
        return format!("{} data", kind.mime_type());
    }

    match text {
        None => "data".to_string(),
        Some(text) if looks_like_python(&text.body) => {
            format!("Python script, {} text executable", text.encoding)
        }
        Some(text) => format!("{} text", text.encoding),
    }
}

/// A content prefix read as text, with any byte order mark removed.
struct Text<'a> {
    body: Cow<'a, str>,
    encoding: &'static str,
}

/// Read `buf` as text the way libmagic classifies encodings.
///
/// UTF-8 wins when it decodes (a character cut off by the read limit is
/// tolerated). Anything else without control bytes is taken as an 8-bit
/// ISO-8859 style encoding, decoded byte-for-byte.
fn decode_text(buf: &[u8]) -> Option<Text<'_>> {
    if buf.iter().copied().any(is_binary_byte) {
        return None;
    }

    let utf8 = match std::str::from_utf8(buf) {
        Ok(text) => Some(text),
        Err(err) if err.error_len().is_none() => {
            std::str::from_utf8(&buf[..err.valid_up_to()]).ok()
        }
        Err(_) => None,
    };

    if let Some(text) = utf8 {
        let decoded = match text.strip_prefix('\u{feff}') {
            Some(body) => Text {
                body: Cow::Borrowed(body),
                encoding: "UTF-8 Unicode (with BOM)",
            },
            None if text.is_ascii() => Text {
                body: Cow::Borrowed(text),
                encoding: "ASCII",
            },
            None => Text {
                body: Cow::Borrowed(text),
                encoding: "UTF-8 Unicode",
            },
        };
        return Some(decoded);
    }

    let encoding = if buf.iter().any(|b| (0x80..=0x9f).contains(b)) {
        "Non-ISO extended-ASCII"
    } else {
        "ISO-8859"
    };
    Some(Text {
        body: Cow::Owned(buf.iter().copied().map(char::from).collect()),
        encoding,
    })
}

/// Control bytes that never occur in text: everything below 0x20 except
/// BEL..CR and ESC, plus DEL.
fn is_binary_byte(byte: u8) -> bool {
    byte == 0x7f || (byte < 0x20 && !matches!(byte, 0x07..=0x0d | 0x1b))
}

/// Name the script kind from a `#!` line, if there is one.
fn shebang_kind(text: &str) -> Option<String> {
    let line = text.strip_prefix("#!")?.lines().next().unwrap_or("");
    let mut words = line.split_whitespace();
    let program = words.next()?;

    let interpreter = if basename(program) == "env" {
        words.find(|w| !w.starts_with('-') && !w.contains('='))?
    } else {
        program
    };

    let kind = match basename(interpreter) {
        name if name.starts_with("python") => "Python script".to_string(),
        "sh" | "dash" => "POSIX shell script".to_string(),
        "bash" => "Bourne-Again shell script".to_string(),
        "zsh" => "Paul Falstad's zsh script".to_string(),
        "perl" => "Perl script".to_string(),
        "node" | "nodejs" => "Node.js script".to_string(),
        _ => format!("a {} script", line.trim()),
    };
    Some(kind)
}

fn basename(program: &str) -> &str {
    program.rsplit('/').next().unwrap_or(program)
}

/// Python without a shebang: a leading import or a `__main__` guard.
fn looks_like_python(text: &str) -> bool {
    let first_statement = text
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty() && !line.starts_with('#'));

    let leading_import = first_statement.is_some_and(|line| {
        line.strip_prefix("import ")
            .is_some_and(|rest| is_module_path(rest.split([',', ' ']).next().unwrap_or("")))
            || line.strip_prefix("from ").is_some_and(|rest| {
                rest.split_once(" import ")
                    .is_some_and(|(module, _)| is_module_path(module.trim()))
            })
    });

    leading_import || (text.contains("__name__") && text.contains("__main__"))
}

fn is_module_path(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_alphanumeric() || c == '_' || c == '.')
}
