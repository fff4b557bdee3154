//! # covzerolib
//!
//! Build empty coverage.py baselines for a project's Python sources.
//!
//! ## Overview
//!
//! Coverage deltas need a starting point. This library writes a coverage.py
//! data file (`.coverage`) that lists every Python source in a project with
//! no executed lines, so files never touched by tests still show up as
//! uncovered in later reports.
//!
//! The pipeline has three stages:
//!
//! - **Source discovery**: walk `bin/`, `node_scripts/`, `src/` and
//!   `scripts/` under the base directory and gather regular files
//! - **Classification**: keep `.py` files, and extensionless files whose
//!   content sniffs as Python (e.g. scripts with a `python` shebang)
//! - **Baseline writing**: serialize `{"lines": {path: []}}` behind the
//!   coverage.py header, byte-for-byte what coverage.py itself would write
//!
//! ## Example
//!
//! ```rust
//! use covzerolib::{generate, MagicSniffer, HEADER};
//! use std::fs;
//! use tempfile::tempdir;
//!
//! let project = tempdir().unwrap();
//! fs::create_dir_all(project.path().join("src")).unwrap();
//! fs::write(project.path().join("src/app.py"), "print('hi')\n").unwrap();
//! fs::create_dir_all(project.path().join("bin")).unwrap();
//! fs::write(project.path().join("bin/tool"), "#!/usr/bin/env python\n").unwrap();
//!
//! let out = tempdir().unwrap();
//! let baseline = generate(project.path(), out.path(), &MagicSniffer).unwrap();
//! assert_eq!(baseline.record.len(), 2);
//!
//! let text = fs::read_to_string(&baseline.output_file).unwrap();
//! assert!(text.starts_with(HEADER));
//! ```

pub mod baseline;
pub mod classify;
pub mod error;
pub mod generate;
pub mod source;

pub use baseline::{
    render_baseline, write_baseline, CoverageRecord, SourceKey, BASELINE_FILE_NAME, HEADER,
};
pub use classify::{describe_bytes, is_python_source, ContentSniffer, MagicSniffer};
pub use error::CovzeroError;
pub use generate::{generate, python_sources, Baseline};
pub use source::{absolute_base, collect_candidates, WATCHED_DIRS};

/// Result type for covzerolib operations
pub type Result<T> = std::result::Result<T, CovzeroError>;
