//! High-level baseline generation API.
//!
//! This module ties the pipeline together: resolve the base directory,
//! collect candidates, keep the Python ones, and write the data file.

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::baseline::{write_baseline, CoverageRecord};
use crate::classify::{is_python_source, ContentSniffer};
use crate::source::{absolute_base, collect_candidates};
use crate::Result;

/// Outcome of a baseline run.
#[derive(Debug, Clone)]
pub struct Baseline {
    /// Path of the `.coverage` file that was written
    pub output_file: PathBuf,
    /// Record written to the file
    pub record: CoverageRecord,
}

/// Collect the Python sources under the watched directories of `base`.
///
/// `base` is resolved to a normalized absolute path first, so the returned
/// paths are absolute.
pub fn python_sources(
    base: impl AsRef<Path>,
    sniffer: &dyn ContentSniffer,
) -> Result<Vec<PathBuf>> {
    let base = absolute_base(base)?;
    let candidates = collect_candidates(&base)?;
    debug!(base = %base.display(), candidates = candidates.len(), "collected candidates");

    let mut sources = Vec::new();
    for path in candidates {
        if is_python_source(&path, sniffer)? {
            sources.push(path);
        }
    }
    Ok(sources)
}

/// Write an empty coverage baseline for the Python sources under `base`.
///
/// # Example
///
/// ```rust,ignore
/// use covzerolib::{generate, MagicSniffer};
///
/// let baseline = generate("project", "project/coverage", &MagicSniffer)?;
/// println!("{} files", baseline.record.len());
/// ```
pub fn generate(
    base: impl AsRef<Path>,
    output_dir: impl AsRef<Path>,
    sniffer: &dyn ContentSniffer,
) -> Result<Baseline> {
    let sources = python_sources(base, sniffer)?;
    let record = CoverageRecord::from_paths(&sources);
    let output_file = write_baseline(output_dir, &record)?;

    info!(
        files = record.len(),
        output = %output_file.display(),
        "wrote coverage baseline"
    );

    Ok(Baseline {
        output_file,
        record,
    })
}
