//! Source discovery: find files that may belong in the baseline.
//!
//! This module handles the first stage of the pipeline:
//!
//! - **Base resolution**: turn the user-supplied base directory into a
//!   normalized absolute path
//! - **Candidate collection**: walk the watched subdirectories and gather
//!   every regular file, sorted and deduplicated
//!
//! ## Example
//!
//! ```rust,ignore
//! use covzerolib::source::{absolute_base, collect_candidates};
//!
//! let base = absolute_base("project")?;
//! let candidates = collect_candidates(&base)?;
//! ```

pub mod collect;
pub mod path;

pub use collect::{collect_candidates, WATCHED_DIRS};
pub use path::absolute_base;
