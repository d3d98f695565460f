use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Canonical classification of a harvested record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Doctype {
    Article,
    Corrigendum,
    Addendum,
    Other,
    #[default]
    Unknown,
}

impl std::fmt::Display for Doctype {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        use Doctype::*;
        let s = match self {
            Article => "article",
            Corrigendum => "corrigendum",
            Addendum => "addendum",
            Other => "other",
            Unknown => "unknown",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DoiValue {
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportNumber {
    pub source: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Affiliation {
    pub value: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    pub surname: String,
    pub given_names: String,
    pub full_name: String,

    pub affiliations: Vec<Affiliation>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl Author {
    pub fn new(surname: &str, given_names: &str) -> Self {
        let full_name = match (surname.is_empty(), given_names.is_empty()) {
            (false, false) => format!("{surname}, {given_names}"),
            (false, true) => surname.to_string(),
            (true, _) => given_names.to_string(),
        };
        Self {
            surname: surname.to_string(),
            given_names: given_names.to_string(),
            full_name,
            affiliations: Vec::new(),
            email: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassificationNumber {
    pub standard: String,
    pub classification_number: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct License {
    pub license: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalFile {
    pub filetype: String,
    pub path: PathBuf,
}

/// Paths of the files an article was unpacked into. The PDF paths are
/// derived from the XML name and may not exist on disk.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalArtifacts {
    pub xml: Option<PathBuf>,
    pub pdf: Option<PathBuf>,
    pub pdfa: Option<PathBuf>,
}

impl LocalArtifacts {
    pub fn to_local_files(&self) -> Vec<LocalFile> {
        [("xml", &self.xml), ("pdf", &self.pdf), ("pdf/a", &self.pdfa)]
            .into_iter()
            .filter_map(|(filetype, path)| {
                path.as_ref().map(|path| LocalFile {
                    filetype: filetype.to_string(),
                    path: path.clone(),
                })
            })
            .collect()
    }
}

/// One harvested article, in the field layout the ingestion side expects.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NormalizedRecord {
    /// Publisher display name the record was harvested from.
    pub source: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dois: Vec<DoiValue>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub related_article_doi: Vec<DoiValue>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub report_numbers: Vec<ReportNumber>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_nr: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,

    #[serde(
        rename = "abstract",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub abstract_text: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub authors: Vec<Author>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub collaborations: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub free_keywords: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub classification_numbers: Vec<ClassificationNumber>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_published: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub journal_title: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub journal_volume: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub journal_issue: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub journal_artid: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub journal_fpage: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub journal_lpage: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub journal_year: Option<i32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub copyright_holder: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub copyright_year: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub copyright_statement: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub copyright_material: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub license: Vec<License>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub collections: Vec<String>,

    pub original_doctype: String,
    pub doctype: Doctype,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub local_files: Vec<LocalFile>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_doctype_display() {
        assert_eq!(Doctype::Article.to_string(), "article");
        assert_eq!(Doctype::Corrigendum.to_string(), "corrigendum");
        assert_eq!(Doctype::Unknown.to_string(), "unknown");
    }

    #[test]
    fn test_author_full_name() {
        assert_eq!(Author::new("Yukawa", "Hideki").full_name, "Yukawa, Hideki");
        assert_eq!(Author::new("Yukawa", "").full_name, "Yukawa");
        assert_eq!(Author::new("", "Hideki").full_name, "Hideki");
    }

    #[test]
    fn test_local_files_follow_supplied_paths() {
        let none = LocalArtifacts::default();
        assert!(none.to_local_files().is_empty());

        let all = LocalArtifacts {
            xml: Some(PathBuf::from("/a/x.xml")),
            pdf: Some(PathBuf::from("/a/pdf/x.pdf")),
            pdfa: Some(PathBuf::from("/a/archival/x.pdf")),
        };
        let files = all.to_local_files();
        let types: Vec<&str> = files.iter().map(|f| f.filetype.as_str()).collect();
        assert_eq!(types, vec!["xml", "pdf", "pdf/a"]);

        let pdf_only = LocalArtifacts {
            pdf: Some(PathBuf::from("/a/pdf/x.pdf")),
            ..Default::default()
        };
        assert_eq!(pdf_only.to_local_files().len(), 1);
    }

    #[test]
    fn test_absent_fields_are_omitted() {
        let record = NormalizedRecord {
            source: "Oxford University Press".to_string(),
            title: Some("A title".to_string()),
            abstract_text: Some("Text".to_string()),
            original_doctype: "letter".to_string(),
            doctype: Doctype::Other,
            ..Default::default()
        };

        let value = serde_json::to_value(&record).unwrap();
        let obj = value.as_object().unwrap();
        assert_eq!(obj["title"], "A title");
        assert_eq!(obj["abstract"], "Text");
        assert_eq!(obj["doctype"], "other");
        assert_eq!(obj["original_doctype"], "letter");
        assert!(!obj.contains_key("dois"));
        assert!(!obj.contains_key("journal_year"));
        assert!(!obj.contains_key("local_files"));
    }
}
