//! Bundle unpacking.
//!
//! Runs synchronously; callers on the async runtime move it to a blocking
//! thread.

use std::fs::File;
use std::path::{Path, PathBuf};

use oupcrawl_core::LocalArtifacts;
use tracing::{debug, info, warn};

use crate::error::{PackageError, Result};
use crate::layout::{BundleLayout, sibling_pdfs};
use crate::staging::write_staged;

/// One XML document to extract, with the artifacts found next to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionTask {
    pub bundle_path: PathBuf,
    pub artifacts: LocalArtifacts,
}

impl ExtractionTask {
    pub fn for_xml(bundle_path: &Path, xml: PathBuf) -> Self {
        let (pdf, pdfa) = sibling_pdfs(&xml);
        Self {
            bundle_path: bundle_path.to_path_buf(),
            artifacts: LocalArtifacts {
                xml: Some(xml),
                pdf: Some(pdf),
                pdfa: Some(pdfa),
            },
        }
    }

    pub fn xml_path(&self) -> Option<&Path> {
        self.artifacts.xml.as_deref()
    }
}

fn zip_error(path: &Path, e: impl std::fmt::Display) -> PackageError {
    PackageError::Zip {
        path: path.to_path_buf(),
        reason: e.to_string(),
    }
}

/// Unpack every entry of `bundle` whose name ends with `suffix` into
/// `target_dir`, keeping the entry's relative path.
///
/// Entries already on disk are left alone, entries escaping `target_dir` are
/// skipped. Returns the destination of every matching entry.
pub fn extract_matching(bundle: &Path, target_dir: &Path, suffix: &str) -> Result<Vec<PathBuf>> {
    let file = File::open(bundle)?;
    let mut archive = zip::ZipArchive::new(file).map_err(|e| zip_error(bundle, e))?;

    let mut destinations = Vec::new();
    let mut extracted = 0usize;
    for index in 0..archive.len() {
        let mut entry = archive.by_index(index).map_err(|e| zip_error(bundle, e))?;
        if entry.is_dir() || !entry.name().ends_with(suffix) {
            continue;
        }

        let Some(relative) = entry.enclosed_name().map(Path::to_path_buf) else {
            warn!(entry = entry.name(), bundle = %bundle.display(), "skipping entry with unsafe path");
            continue;
        };
        let dest = target_dir.join(relative);

        if dest.exists() {
            debug!(dest = %dest.display(), "already unpacked");
        } else {
            if let Some(parent) = dest.parent() {
                std::fs::create_dir_all(parent)?;
            }
            write_staged(&mut entry, &dest).map_err(|e| zip_error(bundle, e))?;
            extracted += 1;
        }
        destinations.push(dest);
    }

    debug!(
        bundle = %bundle.display(),
        suffix,
        matched = destinations.len(),
        extracted,
        "unpacked entries"
    );
    Ok(destinations)
}

/// Unpack `bundle` next to itself and return one task per XML document.
pub fn unpack_bundle(bundle: &Path) -> Result<Vec<ExtractionTask>> {
    let layout = BundleLayout::from_path(bundle).ok_or_else(|| PackageError::Zip {
        path: bundle.to_path_buf(),
        reason: "bundle has no usable file name".to_string(),
    })?;

    let targets = layout.targets();
    if targets.is_empty() {
        warn!(
            bundle = %bundle.display(),
            "bundle name carries neither an xml nor a pdf marker, nothing unpacked"
        );
        return Ok(Vec::new());
    }

    let mut tasks = Vec::new();
    for target in targets {
        let paths = extract_matching(bundle, &target.dir, target.suffix)?;
        if target.suffix == ".xml" {
            tasks.extend(paths.into_iter().map(|xml| ExtractionTask::for_xml(bundle, xml)));
        }
    }

    info!(bundle = %bundle.display(), documents = tasks.len(), "bundle unpacked");
    Ok(tasks)
}
