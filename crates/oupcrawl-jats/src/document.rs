//! Owned element tree for one JATS article.
//!
//! Names are stored without their namespace prefix, so `xlink:href` is looked
//! up as `href`. Text nodes are kept verbatim, including whitespace between
//! elements: affiliation strings are rebuilt from those separators.

use std::path::Path;

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use crate::error::{ExtractError, Result};

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Element(Element),
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Element {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<Node>,
}

impl Element {
    fn from_start(start: &BytesStart<'_>) -> Self {
        let name = String::from_utf8_lossy(start.local_name().as_ref()).into_owned();
        let attributes = start
            .attributes()
            .filter_map(|attr| attr.ok())
            .filter(|attr| !attr.key.as_ref().starts_with(b"xmlns"))
            .map(|attr| {
                let key = String::from_utf8_lossy(attr.key.local_name().as_ref()).into_owned();
                let value = attr
                    .unescape_value()
                    .map(|v| v.into_owned())
                    .unwrap_or_else(|_| String::from_utf8_lossy(&attr.value).into_owned());
                (key, value)
            })
            .collect();

        Self {
            name,
            attributes,
            children: Vec::new(),
        }
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn has_attr(&self, name: &str, value: &str) -> bool {
        self.attr(name) == Some(value)
    }

    /// Direct child elements, in document order.
    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|node| match node {
            Node::Element(el) => Some(el),
            Node::Text(_) => None,
        })
    }

    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Element> {
        self.elements().filter(move |el| el.name == name)
    }

    pub fn child(&self, name: &str) -> Option<&Element> {
        self.elements().find(|el| el.name == name)
    }

    /// All elements below this one, depth-first in document order.
    pub fn descendants(&self) -> Descendants<'_> {
        let mut stack: Vec<&Element> = self.elements().collect();
        stack.reverse();
        Descendants { stack }
    }

    pub fn descendants_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Element> {
        self.descendants().filter(move |el| el.name == name)
    }

    pub fn find(&self, name: &str) -> Option<&Element> {
        self.descendants().find(|el| el.name == name)
    }

    /// Every text node below this element, concatenated in document order.
    pub fn text(&self) -> String {
        let mut out = String::new();
        self.push_text(&mut out);
        out
    }

    fn push_text(&self, out: &mut String) {
        for node in &self.children {
            match node {
                Node::Text(text) => out.push_str(text),
                Node::Element(el) => el.push_text(out),
            }
        }
    }

    /// Text content with runs of whitespace collapsed to one space, or `None`
    /// when nothing but whitespace is left.
    pub fn clean_text(&self) -> Option<String> {
        let text = collapse_whitespace(&self.text());
        (!text.is_empty()).then_some(text)
    }
}

pub struct Descendants<'a> {
    stack: Vec<&'a Element>,
}

impl<'a> Iterator for Descendants<'a> {
    type Item = &'a Element;

    fn next(&mut self) -> Option<Self::Item> {
        let el = self.stack.pop()?;
        let start = self.stack.len();
        self.stack.extend(el.elements());
        self.stack[start..].reverse();
        Some(el)
    }
}

pub fn collapse_whitespace(input: &str) -> String {
    input.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// One parsed article file.
#[derive(Debug, Clone)]
pub struct ArticleDocument {
    root: Element,
}

impl ArticleDocument {
    pub fn parse(xml: &str) -> Result<Self> {
        let mut reader = Reader::from_str(xml);
        let mut stack: Vec<Element> = Vec::new();
        let mut root: Option<Element> = None;

        loop {
            match reader.read_event() {
                Ok(Event::Start(start)) => stack.push(Element::from_start(&start)),
                Ok(Event::Empty(start)) => {
                    attach(&mut stack, &mut root, Element::from_start(&start));
                }
                Ok(Event::End(_)) => {
                    if let Some(el) = stack.pop() {
                        attach(&mut stack, &mut root, el);
                    }
                }
                Ok(Event::Text(text)) => {
                    if let Some(parent) = stack.last_mut() {
                        let value = text
                            .unescape()
                            .map(|v| v.into_owned())
                            .unwrap_or_else(|_| String::from_utf8_lossy(&text).into_owned());
                        parent.children.push(Node::Text(value));
                    }
                }
                Ok(Event::CData(data)) => {
                    if let Some(parent) = stack.last_mut() {
                        let value = String::from_utf8_lossy(&data.into_inner()).into_owned();
                        parent.children.push(Node::Text(value));
                    }
                }
                Ok(Event::Eof) => break,
                Ok(_) => {}
                Err(e) => {
                    return Err(ExtractError::Xml(format!(
                        "at byte {}: {e}",
                        reader.buffer_position()
                    )));
                }
            }
        }

        if !stack.is_empty() {
            return Err(ExtractError::Xml("unexpected end of document".to_string()));
        }

        root.map(|root| Self { root })
            .ok_or(ExtractError::EmptyDocument)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let xml = std::fs::read_to_string(path)?;
        Self::parse(&xml)
    }

    pub fn root(&self) -> &Element {
        &self.root
    }

    /// The `article` element: the root itself, or the first one below it.
    pub fn article(&self) -> &Element {
        if self.root.name == "article" {
            return &self.root;
        }
        self.root.find("article").unwrap_or(&self.root)
    }

    /// All elements in the document, root included, in document order.
    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        std::iter::once(&self.root).chain(self.root.descendants())
    }

    pub fn find_all<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Element> {
        self.elements().filter(move |el| el.name == name)
    }

    pub fn find(&self, name: &str) -> Option<&Element> {
        self.elements().find(|el| el.name == name)
    }

    /// Cleaned text of the first element called `name`.
    pub fn first_text(&self, name: &str) -> Option<String> {
        self.find_all(name).find_map(Element::clean_text)
    }
}

fn attach(stack: &mut [Element], root: &mut Option<Element>, el: Element) {
    match stack.last_mut() {
        Some(parent) => parent.children.push(Node::Element(el)),
        None => {
            if root.is_none() {
                *root = Some(el);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE article PUBLIC "-//NLM//DTD JATS (Z39.96) Journal Publishing DTD v1.1 20151215//EN" "JATS-journalpublishing1.dtd">
<article xmlns:xlink="http://www.w3.org/1999/xlink" article-type="research-article">
  <front>
    <article-meta>
      <article-id pub-id-type="doi">10.1093/ptep/ptac032</article-id>
      <title-group><article-title>Spin &amp; <italic>charge</italic></article-title></title-group>
      <related-article ext-link-type="doi" xlink:href="10.1093/ptep/ptab001"/>
      <abstract><![CDATA[raw]]></abstract>
    </article-meta>
  </front>
</article>"#;

    #[test]
    fn parses_root_and_attributes() {
        let doc = ArticleDocument::parse(SAMPLE).unwrap();
        assert_eq!(doc.root().name, "article");
        assert_eq!(doc.article().attr("article-type"), Some("research-article"));
        assert_eq!(doc.article().attr("xlink"), None);
    }

    #[test]
    fn strips_namespace_prefix_from_attributes() {
        let doc = ArticleDocument::parse(SAMPLE).unwrap();
        let related = doc.find("related-article").unwrap();
        assert_eq!(related.attr("href"), Some("10.1093/ptep/ptab001"));
    }

    #[test]
    fn text_unescapes_and_spans_children() {
        let doc = ArticleDocument::parse(SAMPLE).unwrap();
        assert_eq!(doc.first_text("article-title").as_deref(), Some("Spin & charge"));
        assert_eq!(doc.first_text("abstract").as_deref(), Some("raw"));
    }

    #[test]
    fn descendants_are_in_document_order() {
        let doc = ArticleDocument::parse(SAMPLE).unwrap();
        let names: Vec<&str> = doc.elements().map(|el| el.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "article",
                "front",
                "article-meta",
                "article-id",
                "title-group",
                "article-title",
                "italic",
                "related-article",
                "abstract",
            ]
        );
    }

    #[test]
    fn lookups_borrow_only_the_document() {
        let doc = ArticleDocument::parse(SAMPLE).unwrap();
        let meta = {
            let name = String::from("article-meta");
            doc.find(&name)
        };
        let title = meta.and_then(|meta| {
            let group = String::from("title-group");
            meta.find(&group)
        });
        let heading = title.and_then(|group| {
            let name = String::from("article-title");
            group.child(&name)
        });
        assert_eq!(heading.map(|el| el.name.as_str()), Some("article-title"));
        assert_eq!(
            heading.and_then(Element::clean_text).as_deref(),
            Some("Spin & charge")
        );
    }

    #[test]
    fn reports_malformed_xml() {
        let err = ArticleDocument::parse("<article><front></article>").unwrap_err();
        assert!(matches!(err, ExtractError::Xml(_)));
    }

    #[test]
    fn empty_input_has_no_root() {
        let err = ArticleDocument::parse("<?xml version=\"1.0\"?>").unwrap_err();
        assert!(matches!(err, ExtractError::EmptyDocument));
    }
}
