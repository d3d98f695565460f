//! Turns one JATS article into a [`NormalizedRecord`].
//!
//! Every field rule is independent and yields nothing when its nodes are
//! missing. Only two conditions stop an extraction: an article type outside
//! [`ALLOWED_ARTICLE_TYPES`](crate::article_type::ALLOWED_ARTICLE_TYPES)
//! (filtered, `Ok(None)`) and a publication date too short to carry a year
//! (`Err`).

use std::path::Path;

use oupcrawl_core::{DoiValue, LocalArtifacts, NormalizedRecord, PublisherConfig, ReportNumber};
use tracing::{debug, info, warn};

use crate::article_type;
use crate::authors;
use crate::dates;
use crate::document::{ArticleDocument, Element, Node, collapse_whitespace};
use crate::error::Result;
use crate::identifiers::{ArxivId, Doi};
use crate::keywords;
use crate::license;

pub struct ArticleExtractor {
    source: String,
    collections: Vec<String>,
}

impl ArticleExtractor {
    pub fn new(source: impl Into<String>, collections: Vec<String>) -> Self {
        Self {
            source: source.into(),
            collections,
        }
    }

    pub fn from_config(config: &PublisherConfig) -> Self {
        Self::new(config.display_name.clone(), config.collections.clone())
    }

    /// Read and extract the article at `xml_path`.
    pub fn extract_file(
        &self,
        xml_path: &Path,
        artifacts: &LocalArtifacts,
    ) -> Result<Option<NormalizedRecord>> {
        let doc = ArticleDocument::from_file(xml_path)?;
        self.extract(&doc, artifacts)
    }

    pub fn extract(
        &self,
        doc: &ArticleDocument,
        artifacts: &LocalArtifacts,
    ) -> Result<Option<NormalizedRecord>> {
        let Some(raw_type) = doc
            .article()
            .attr("article-type")
            .map(|t| t.trim().to_lowercase())
        else {
            info!("skipping article without article-type");
            return Ok(None);
        };
        debug!(article_type = %raw_type, "got article type");

        if !article_type::is_allowed(&raw_type) {
            info!(article_type = %raw_type, "skipping article type that is not harvested");
            return Ok(None);
        }

        let dois = dois(doc);
        let related_article_doi = if article_type::is_amending(&raw_type) {
            related_article_dois(doc)
        } else {
            Vec::new()
        };

        let report_numbers = arxiv_eprint(doc)
            .map(|value| {
                vec![ReportNumber {
                    source: "arXiv".to_string(),
                    value,
                }]
            })
            .unwrap_or_default();

        let keywords = keywords::keywords(doc);

        let date_published = dates::published_date(doc);
        let journal_year = dates::journal_year(date_published.as_deref().unwrap_or_default())?;

        let record = NormalizedRecord {
            source: self.source.clone(),
            dois,
            related_article_doi,
            report_numbers,
            page_nr: page_count(doc),
            title: grouped_title(doc, "article-title"),
            subtitle: grouped_title(doc, "subtitle"),
            abstract_text: doc.find("abstract").and_then(abstract_text),
            authors: authors::authors(doc),
            collaborations: authors::collaborations(doc),
            free_keywords: keywords.free_keywords,
            classification_numbers: keywords.classification_numbers,
            date_published,
            journal_title: journal_title(doc),
            journal_volume: meta_text(doc, "volume"),
            journal_issue: meta_text(doc, "issue"),
            journal_artid: meta_text(doc, "elocation-id"),
            journal_fpage: meta_text(doc, "fpage"),
            journal_lpage: meta_text(doc, "lpage"),
            journal_year: Some(journal_year),
            copyright_holder: doc.first_text("copyright-holder"),
            copyright_year: doc.first_text("copyright-year"),
            copyright_statement: doc.first_text("copyright-statement"),
            copyright_material: Some("Article".to_string()),
            license: license::licenses(doc),
            collections: self.collections.clone(),
            doctype: article_type::doctype_for(&raw_type),
            original_doctype: raw_type,
            local_files: artifacts.to_local_files(),
        };

        debug!(
            dois = ?record.dois,
            doctype = %record.doctype,
            authors = record.authors.len(),
            "extracted record"
        );
        Ok(Some(record))
    }
}

fn dois(doc: &ArticleDocument) -> Vec<DoiValue> {
    doc.find_all("article-id")
        .filter(|el| el.has_attr("pub-id-type", "doi"))
        .filter_map(Element::clean_text)
        .map(|value| match Doi::parse(&value) {
            Ok(doi) => DoiValue { value: doi.bare },
            Err(e) => {
                warn!(error = %e, "keeping malformed DOI as-is");
                DoiValue { value }
            }
        })
        .collect()
}

fn related_article_dois(doc: &ArticleDocument) -> Vec<DoiValue> {
    doc.find_all("related-article")
        .filter(|el| el.has_attr("ext-link-type", "doi"))
        .filter_map(|el| el.attr("href"))
        .map(str::trim)
        .filter(|href| !href.is_empty())
        .map(|href| DoiValue {
            value: href.to_string(),
        })
        .collect()
}

/// First non-empty arXiv identifier in document order.
pub fn arxiv_eprint(doc: &ArticleDocument) -> Option<String> {
    let value = doc
        .find_all("article-id")
        .filter(|el| el.has_attr("pub-id-type", "arxiv"))
        .find_map(Element::clean_text)?;

    if let Err(e) = ArxivId::parse(&value) {
        warn!(error = %e, "arXiv identifier does not look like an eprint");
    }
    Some(value)
}

fn page_count(doc: &ArticleDocument) -> Option<u32> {
    let count = doc
        .find_all("counts")
        .flat_map(|counts| counts.children_named("page-count"))
        .find_map(|el| el.attr("count"))?;

    match count.trim().parse() {
        Ok(pages) => Some(pages),
        Err(_) => {
            warn!(count, "ignoring non-numeric page count");
            None
        }
    }
}

/// Title parts from the article's `title-group`, falling back to the first
/// element of that name anywhere in the document.
fn grouped_title(doc: &ArticleDocument, name: &str) -> Option<String> {
    doc.find_all("title-group")
        .flat_map(|group| group.children_named(name))
        .find_map(Element::clean_text)
        .or_else(|| doc.first_text(name))
}

/// First non-empty `name` inside `article-meta`, so reference lists in `back`
/// never leak into the journal fields.
fn meta_text(doc: &ArticleDocument, name: &str) -> Option<String> {
    match doc.find("article-meta") {
        Some(meta) => meta.descendants_named(name).find_map(Element::clean_text),
        None => doc.first_text(name),
    }
}

fn journal_title(doc: &ArticleDocument) -> Option<String> {
    doc.elements()
        .filter(|el| el.name == "abbrev-journal-title" || el.name == "journal-title")
        .find_map(Element::clean_text)
}

/// Abstract body with its heading dropped and markup removed, except for
/// sub- and superscripts.
pub fn abstract_text(abstract_el: &Element) -> Option<String> {
    let mut out = String::new();
    for node in &abstract_el.children {
        match node {
            Node::Element(el) if el.name == "title" => {}
            node => render_inline(node, &mut out),
        }
    }
    let text = collapse_whitespace(&out);
    (!text.is_empty()).then_some(text)
}

fn render_inline(node: &Node, out: &mut String) {
    match node {
        Node::Text(text) => out.push_str(text),
        Node::Element(el) => {
            let keep = el.name == "sub" || el.name == "sup";
            if keep {
                out.push_str(&format!("<{}>", el.name));
            } else if el.name == "p" {
                out.push(' ');
            }
            for child in &el.children {
                render_inline(child, out);
            }
            if keep {
                out.push_str(&format!("</{}>", el.name));
            }
        }
    }
}
