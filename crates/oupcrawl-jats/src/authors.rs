//! Author and affiliation resolution.
//!
//! Affiliations are usually declared once (`<aff id="aff1">`) and referenced
//! from each contributor with `<xref ref-type="aff" rid="aff1"/>`, so the whole
//! document is indexed before any author is built.

use std::collections::HashMap;

use oupcrawl_core::{Affiliation, Author};

use crate::document::{ArticleDocument, Element, Node, collapse_whitespace};

/// Text of an `aff` element with its leading `label` removed.
///
/// The separators between sub-elements are taken verbatim from the XML, so an
/// empty `<addr-line/>` between two `", "` tails yields `", , "`.
pub fn affiliation_text(aff: &Element) -> Option<String> {
    let mut text = String::new();
    let mut after_label = false;

    for node in &aff.children {
        let is_label_tail = std::mem::take(&mut after_label);
        match node {
            Node::Element(el) if el.name == "label" => after_label = true,
            Node::Element(el) => text.push_str(&el.text()),
            Node::Text(_) if is_label_tail => {}
            Node::Text(value) => text.push_str(value),
        }
    }

    if !text.trim().is_empty() {
        return Some(text);
    }

    // Only whitespace outside the label: the affiliation is plain text right
    // after it.
    let after = aff
        .children
        .iter()
        .skip_while(|node| !matches!(node, Node::Element(el) if el.name == "label"))
        .skip(1)
        .map(|node| match node {
            Node::Element(el) => el.text(),
            Node::Text(value) => value.clone(),
        })
        .collect::<String>();
    let after = collapse_whitespace(&after);
    (!after.is_empty()).then_some(after)
}

/// `aff/@id` to affiliation text, for every affiliation in the document.
pub fn affiliation_lookup(doc: &ArticleDocument) -> HashMap<&str, String> {
    let mut lookup = HashMap::new();
    for aff in doc.find_all("aff") {
        let Some(id) = aff.attr("id") else { continue };
        if lookup.contains_key(id) {
            continue;
        }
        if let Some(text) = affiliation_text(aff) {
            lookup.insert(id, text);
        }
    }
    lookup
}

fn author_from_contrib(contrib: &Element, lookup: &HashMap<&str, String>) -> Author {
    let name = contrib.child("name");
    let name_part = |part: &str| {
        name.and_then(|n| n.child(part))
            .and_then(Element::clean_text)
            .unwrap_or_default()
    };

    let mut author = Author::new(&name_part("surname"), &name_part("given-names"));
    author.email = contrib.child("email").and_then(Element::clean_text);

    let inline = contrib.children_named("aff").filter_map(affiliation_text);
    let referenced = contrib
        .children_named("xref")
        .filter(|xref| xref.has_attr("ref-type", "aff"))
        .filter_map(|xref| xref.attr("rid"))
        .flat_map(str::split_whitespace)
        .filter_map(|rid| lookup.get(rid).cloned());

    author.affiliations = inline
        .chain(referenced)
        .map(|value| Affiliation { value })
        .collect();
    author
}

/// Authors in document order, each with their affiliations in reference order.
pub fn authors(doc: &ArticleDocument) -> Vec<Author> {
    let lookup = affiliation_lookup(doc);
    doc.find_all("contrib")
        .filter(|contrib| contrib.has_attr("contrib-type", "author"))
        .map(|contrib| author_from_contrib(contrib, &lookup))
        .collect()
}

pub fn collaborations(doc: &ArticleDocument) -> Vec<String> {
    doc.find_all("contrib")
        .flat_map(|contrib| contrib.children_named("collab"))
        .filter_map(Element::clean_text)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(xml: &str) -> ArticleDocument {
        ArticleDocument::parse(xml).unwrap()
    }

    #[test]
    fn keeps_empty_segments_between_separators() {
        let doc = parse(
            r#"<aff id="aff1"><label>1</label><institution>Dept</institution>, <addr-line/>, <addr-line>City</addr-line>, <country>Japan</country></aff>"#,
        );
        assert_eq!(
            affiliation_text(doc.root()).as_deref(),
            Some("Dept, , City, Japan")
        );
    }

    #[test]
    fn drops_label_and_its_tail() {
        let doc = parse("<aff id=\"a\"><label>a</label>\n<institution>Univ</institution></aff>");
        assert_eq!(affiliation_text(doc.root()).as_deref(), Some("Univ"));
    }

    #[test]
    fn plain_text_after_label() {
        let doc = parse("<aff id=\"a\"><label>2</label>  Department X,\n   Univ Y  </aff>");
        assert_eq!(
            affiliation_text(doc.root()).as_deref(),
            Some("Department X, Univ Y")
        );
    }

    #[test]
    fn empty_affiliation_is_none() {
        let doc = parse("<aff id=\"a\"><label>3</label></aff>");
        assert_eq!(affiliation_text(doc.root()), None);
    }

    #[test]
    fn resolves_references_in_order() {
        let doc = parse(
            r#"<article><front><article-meta>
                <contrib-group>
                  <contrib contrib-type="author">
                    <name><surname>Tanaka</surname><given-names>Hiro</given-names></name>
                    <xref ref-type="aff" rid="aff2"/><xref ref-type="aff" rid="aff1"/>
                    <email>tanaka@example.jp</email>
                  </contrib>
                  <contrib contrib-type="author">
                    <name><surname>Sato</surname><given-names>Yui</given-names></name>
                    <xref ref-type="aff" rid="aff1 aff2"/>
                    <xref ref-type="fn" rid="fn1"/>
                  </contrib>
                  <contrib contrib-type="editor"><name><surname>Ed</surname></name></contrib>
                  <contrib contrib-type="author"><collab>Belle II Collaboration</collab></contrib>
                </contrib-group>
                <aff id="aff1"><institution>KEK</institution>, <country>Japan</country></aff>
                <aff id="aff2"><institution>RIKEN</institution>, <country>Japan</country></aff>
              </article-meta></front></article>"#,
        );

        let authors = authors(&doc);
        assert_eq!(authors.len(), 3);

        assert_eq!(authors[0].full_name, "Tanaka, Hiro");
        assert_eq!(authors[0].email.as_deref(), Some("tanaka@example.jp"));
        let values: Vec<&str> = authors[0].affiliations.iter().map(|a| a.value.as_str()).collect();
        assert_eq!(values, vec!["RIKEN, Japan", "KEK, Japan"]);

        let values: Vec<&str> = authors[1].affiliations.iter().map(|a| a.value.as_str()).collect();
        assert_eq!(values, vec!["KEK, Japan", "RIKEN, Japan"]);
        assert_eq!(authors[1].email, None);

        assert_eq!(authors[2].surname, "");
        assert!(authors[2].affiliations.is_empty());

        assert_eq!(collaborations(&doc), vec!["Belle II Collaboration".to_string()]);
    }

    #[test]
    fn inline_affiliation_comes_first() {
        let doc = parse(
            r#"<article><contrib contrib-type="author">
                 <name><surname>Kim</surname></name>
                 <aff><institution>Inline Univ</institution></aff>
                 <xref ref-type="aff" rid="a1"/>
               </contrib>
               <aff id="a1">Referenced Lab</aff></article>"#,
        );
        let authors = authors(&doc);
        let values: Vec<&str> = authors[0].affiliations.iter().map(|a| a.value.as_str()).collect();
        assert_eq!(values, vec!["Inline Univ", "Referenced Lab"]);
    }

    #[test]
    fn unknown_reference_is_ignored() {
        let doc = parse(
            r#"<article><contrib contrib-type="author"><name><surname>Lee</surname></name><xref ref-type="aff" rid="missing"/></contrib></article>"#,
        );
        assert!(authors(&doc)[0].affiliations.is_empty());
    }
}
