//! Where the contents of a bundle go, derived from the bundle's file name.
//!
//! `ptac032.xml.zip` unpacks its XML into `ptac032/`, `ptac032.pdf.zip` its
//! PDFs into `ptac032/pdf/` and `ptac032_archival.pdf.zip` its PDFs into
//! `ptac032/archival/`, so the three bundles of one article meet in a single
//! directory next to the downloaded files.

use std::path::{Path, PathBuf};

const ARCHIVAL_SUFFIX: &str = "_archival";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundleLayout {
    pub parent: PathBuf,
    /// File name up to the first `.`.
    pub stem: String,
    /// Lowercased extensions after the stem, in order (`["xml", "zip"]`).
    pub extensions: Vec<String>,
    pub archival: bool,
}

/// A group of entries to unpack: every entry ending in `suffix` goes to `dir`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnpackTarget {
    pub suffix: &'static str,
    pub dir: PathBuf,
}

impl BundleLayout {
    pub fn from_path(path: &Path) -> Option<Self> {
        let name = path.file_name()?.to_str()?;
        let mut parts = name.split('.');
        let stem = parts.next().filter(|s| !s.is_empty())?.to_string();
        let extensions = parts.map(str::to_lowercase).collect();
        Some(Self {
            parent: path.parent().map(Path::to_path_buf).unwrap_or_default(),
            archival: stem.ends_with(ARCHIVAL_SUFFIX),
            stem,
            extensions,
        })
    }

    fn has_marker(&self, marker: &str) -> bool {
        self.extensions.iter().any(|ext| ext == marker)
    }

    pub fn has_xml(&self) -> bool {
        self.has_marker("xml")
    }

    pub fn has_pdf(&self) -> bool {
        self.has_marker("pdf")
    }

    pub fn article_dir(&self) -> PathBuf {
        let name = self
            .stem
            .strip_suffix(ARCHIVAL_SUFFIX)
            .unwrap_or(&self.stem);
        self.parent.join(name)
    }

    pub fn pdf_dir(&self) -> PathBuf {
        self.article_dir().join("pdf")
    }

    pub fn archival_dir(&self) -> PathBuf {
        self.article_dir().join("archival")
    }

    /// Unpack targets in extraction order. Archival routing wins over the
    /// `pdf` marker; XML always lands in the article directory.
    pub fn targets(&self) -> Vec<UnpackTarget> {
        let mut targets = Vec::new();
        if self.archival {
            targets.push(UnpackTarget {
                suffix: ".pdf",
                dir: self.archival_dir(),
            });
        } else if self.has_pdf() {
            targets.push(UnpackTarget {
                suffix: ".pdf",
                dir: self.pdf_dir(),
            });
        }
        if self.has_xml() {
            targets.push(UnpackTarget {
                suffix: ".xml",
                dir: self.article_dir(),
            });
        }
        targets
    }
}

/// `pdf` and `pdfa` siblings of an unpacked XML file. Nothing is checked on
/// disk.
pub fn sibling_pdfs(xml: &Path) -> (PathBuf, PathBuf) {
    let dir = xml.parent().unwrap_or_else(|| Path::new(""));
    let name = xml
        .file_name()
        .and_then(|n| n.to_str())
        .and_then(|n| n.split('.').next())
        .unwrap_or_default();
    let file = format!("{name}.pdf");
    (
        dir.join("pdf").join(&file),
        dir.join("archival").join(&file),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout(path: &str) -> BundleLayout {
        BundleLayout::from_path(Path::new(path)).unwrap()
    }

    #[test]
    fn stem_strips_every_extension() {
        let l = layout("/data/2022-03-14_09:05:07_ptac032.xml.zip");
        assert_eq!(l.stem, "2022-03-14_09:05:07_ptac032");
        assert_eq!(l.extensions, vec!["xml", "zip"]);
        assert!(l.has_xml());
        assert!(!l.has_pdf());
        assert!(!l.archival);
        assert_eq!(
            l.article_dir(),
            PathBuf::from("/data/2022-03-14_09:05:07_ptac032")
        );
    }

    #[test]
    fn xml_and_pdf_bundles_share_the_article_directory() {
        assert_eq!(
            layout("/d/ptac032.xml.zip").article_dir(),
            layout("/d/ptac032.pdf.zip").article_dir()
        );
    }

    #[test]
    fn xml_bundle_targets() {
        assert_eq!(
            layout("/d/x.xml.zip").targets(),
            vec![UnpackTarget {
                suffix: ".xml",
                dir: PathBuf::from("/d/x"),
            }]
        );
    }

    #[test]
    fn pdf_bundle_targets() {
        assert_eq!(
            layout("/d/x.pdf.zip").targets(),
            vec![UnpackTarget {
                suffix: ".pdf",
                dir: PathBuf::from("/d/x/pdf"),
            }]
        );
    }

    #[test]
    fn archival_takes_precedence_over_pdf_marker() {
        let l = layout("/d/x_archival.pdf.zip");
        assert!(l.archival);
        assert_eq!(
            l.targets(),
            vec![UnpackTarget {
                suffix: ".pdf",
                dir: PathBuf::from("/d/x/archival"),
            }]
        );
    }

    #[test]
    fn markers_are_case_insensitive() {
        assert!(layout("/d/x.XML.ZIP").has_xml());
    }

    #[test]
    fn plain_zip_has_no_targets() {
        assert!(layout("/d/x.zip").targets().is_empty());
    }

    #[test]
    fn dotfile_has_no_layout() {
        assert_eq!(BundleLayout::from_path(Path::new("/d/.zip")), None);
    }

    #[test]
    fn siblings_use_name_up_to_first_dot() {
        let (pdf, pdfa) = sibling_pdfs(Path::new("/d/x/ptac032.v2.xml"));
        assert_eq!(pdf, PathBuf::from("/d/x/pdf/ptac032.pdf"));
        assert_eq!(pdfa, PathBuf::from("/d/x/archival/ptac032.pdf"));
    }
}
