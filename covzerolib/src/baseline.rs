//! Coverage baseline construction and serialization.
//!
//! The baseline is a coverage.py data file in its legacy JSON layout: a fixed
//! header line followed by `{"lines": {...}}`, where every tracked file maps
//! to an empty list of executed lines.
//!
//! coverage.py reads this file back with Python's `json` module, and the
//! byte layout matches what `json.dumps` would emit with default settings:
//! `", "` and `": "` separators and non-ASCII characters escaped as
//! `\uXXXX`. Two runs over the same files therefore produce identical bytes.
//!
//! Paths are kept as raw OS bytes. Bytes that are not valid UTF-8 are
//! written the way Python's `surrogateescape` handler exposes them
//! (`\xff` becomes `\udcff`), so coverage.py maps each key back to the file
//! it came from.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::ffi::{OsStr, OsString};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use serde_json::ser::{CharEscape, Formatter};

use crate::error::CovzeroError;
use crate::Result;

/// First line of every coverage.py data file in the JSON layout.
pub const HEADER: &str = "!coverage.py: This is a private format, don't read it directly!\n";

/// Name of the data file written into the output directory.
pub const BASELINE_FILE_NAME: &str = ".coverage";

/// Base of the lone surrogates Python uses for undecodable bytes.
const SURROGATE_ESCAPE_BASE: u32 = 0xdc00;

/// A tracked file path, ordered the way Python orders the decoded string.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SourceKey(OsString);

impl SourceKey {
    /// The path this key was built from.
    pub fn as_path(&self) -> &Path {
        Path::new(&self.0)
    }

    fn as_bytes(&self) -> &[u8] {
        self.0.as_encoded_bytes()
    }

    /// Code points of the path as Python sees it after `surrogateescape`.
    fn code_points(&self) -> impl Iterator<Item = u32> + '_ {
        self.as_bytes().utf8_chunks().flat_map(|chunk| {
            chunk
                .valid()
                .chars()
                .map(u32::from)
                .chain(chunk.invalid().iter().map(|b| SURROGATE_ESCAPE_BASE + u32::from(*b)))
        })
    }
}

impl From<&Path> for SourceKey {
    fn from(path: &Path) -> Self {
        Self(path.as_os_str().to_os_string())
    }
}

impl Ord for SourceKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.code_points().cmp(other.code_points())
    }
}

impl PartialOrd for SourceKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Line coverage for a set of files, keyed by absolute path.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CoverageRecord {
    /// Executed line numbers per file; always empty for a baseline
    pub lines: BTreeMap<SourceKey, Vec<u32>>,
}

impl CoverageRecord {
    /// Create an empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a baseline record with no executed lines for each path.
    pub fn from_paths<I, P>(paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let mut record = Self::new();
        for path in paths {
            record.track(path.as_ref());
        }
        record
    }

    /// Add `path` with no executed lines.
    pub fn track(&mut self, path: &Path) {
        self.lines.entry(SourceKey::from(path)).or_default();
    }

    /// Number of tracked files.
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Whether no files are tracked.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Tracked file paths in key order.
    pub fn files(&self) -> impl Iterator<Item = &Path> {
        self.lines.keys().map(SourceKey::as_path)
    }
}

/// Render the full data file contents: header line, then JSON.
pub fn render_baseline(record: &CoverageRecord) -> Result<String> {
    let mut buf = HEADER.as_bytes().to_vec();
    write_lines_object(&mut buf, record).map_err(CovzeroError::Encode)?;
    // the formatter only ever emits ASCII
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

/// Write `record` to `<output_dir>/.coverage`, creating the directory first.
///
/// An existing file is overwritten. Returns the path written.
pub fn write_baseline(output_dir: impl AsRef<Path>, record: &CoverageRecord) -> Result<PathBuf> {
    let output_dir = output_dir.as_ref();
    let contents = render_baseline(record)?;

    fs::create_dir_all(output_dir).map_err(|source| CovzeroError::CreateDir {
        path: output_dir.to_path_buf(),
        source,
    })?;

    let path = output_dir.join(BASELINE_FILE_NAME);
    fs::write(&path, contents).map_err(|source| CovzeroError::Write {
        path: path.clone(),
        source,
    })?;

    Ok(path)
}

/// Emit `{"lines": {key: [line, ...], ...}}`.
fn write_lines_object<W: ?Sized + Write>(w: &mut W, record: &CoverageRecord) -> io::Result<()> {
    let mut f = PythonJsonFormatter;

    f.begin_object(w)?;
    f.begin_object_key(w, true)?;
    write_key(&mut f, w, OsStr::new("lines"))?;
    f.end_object_key(w)?;
    f.begin_object_value(w)?;

    f.begin_object(w)?;
    for (i, (key, hits)) in record.lines.iter().enumerate() {
        f.begin_object_key(w, i == 0)?;
        write_key(&mut f, w, &key.0)?;
        f.end_object_key(w)?;
        f.begin_object_value(w)?;
        f.begin_array(w)?;
        for (j, line) in hits.iter().enumerate() {
            f.begin_array_value(w, j == 0)?;
            f.write_u32(w, *line)?;
            f.end_array_value(w)?;
        }
        f.end_array(w)?;
        f.end_object_value(w)?;
    }
    f.end_object(w)?;

    f.end_object_value(w)?;
    f.end_object(w)
}

/// Emit a JSON string from raw OS bytes.
fn write_key<W: ?Sized + Write>(
    f: &mut PythonJsonFormatter,
    w: &mut W,
    key: &OsStr,
) -> io::Result<()> {
    f.begin_string(w)?;
    for chunk in key.as_encoded_bytes().utf8_chunks() {
        let valid = chunk.valid();
        let mut start = 0;
        for (i, byte) in valid.bytes().enumerate() {
            let escape = match byte {
                b'"' => CharEscape::Quote,
                b'\\' => CharEscape::ReverseSolidus,
                b'\n' => CharEscape::LineFeed,
                b'\r' => CharEscape::CarriageReturn,
                b'\t' => CharEscape::Tab,
                0x08 => CharEscape::Backspace,
                0x0c => CharEscape::FormFeed,
                0x00..=0x1f => CharEscape::AsciiControl(byte),
                _ => continue,
            };
            f.write_string_fragment(w, &valid[start..i])?;
            f.write_char_escape(w, escape)?;
            start = i + 1;
        }
        f.write_string_fragment(w, &valid[start..])?;
        for byte in chunk.invalid() {
            write!(w, "\\u{:04x}", SURROGATE_ESCAPE_BASE + u32::from(*byte))?;
        }
    }
    f.end_string(w)
}

/// JSON layout of Python's `json.dumps` with default arguments.
struct PythonJsonFormatter;

impl Formatter for PythonJsonFormatter {
    fn begin_array_value<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_key<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_value<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        writer.write_all(b": ")
    }

    /// Quotes, backslashes and C0 controls arrive as char escapes;
    /// everything else outside printable ASCII is escaped here.
    fn write_string_fragment<W>(&mut self, writer: &mut W, fragment: &str) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        let mut start = 0;
        for (i, ch) in fragment.char_indices() {
            if ch.is_ascii() && ch != '\x7f' {
                continue;
            }
            writer.write_all(fragment[start..i].as_bytes())?;
            let mut units = [0u16; 2];
            for unit in ch.encode_utf16(&mut units) {
                write!(writer, "\\u{:04x}", unit)?;
            }
            start = i + ch.len_utf8();
        }
        writer.write_all(fragment[start..].as_bytes())
    }
}
