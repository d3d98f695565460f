use oupcrawl_core::ClassificationNumber;

use crate::document::{ArticleDocument, Element};

/// `kwd-group-type` values whose keywords are scheme codes, not free text.
const CLASSIFICATION_SCHEMES: &[&str] = &["pacs", "msc"];

#[derive(Debug, Default, PartialEq)]
pub struct Keywords {
    pub free_keywords: Vec<String>,
    pub classification_numbers: Vec<ClassificationNumber>,
}

fn classification_scheme(group: &Element) -> Option<String> {
    let group_type = group.attr("kwd-group-type")?.trim().to_lowercase();
    CLASSIFICATION_SCHEMES
        .contains(&group_type.as_str())
        .then(|| group_type.to_uppercase())
}

pub fn keywords(doc: &ArticleDocument) -> Keywords {
    let mut keywords = Keywords::default();

    for group in doc.find_all("kwd-group") {
        let scheme = classification_scheme(group);
        for kwd in group.children_named("kwd").filter_map(Element::clean_text) {
            match &scheme {
                Some(standard) => keywords.classification_numbers.push(ClassificationNumber {
                    standard: standard.clone(),
                    classification_number: kwd,
                }),
                None => keywords.free_keywords.push(kwd),
            }
        }
    }

    keywords
}
