use oupcrawl_core::Doctype;

/// Publisher article types that are harvested. Anything else is skipped.
pub const ALLOWED_ARTICLE_TYPES: &[&str] = &[
    "research-article",
    "corrected-article",
    "original-article",
    "introduction",
    "letter",
    "correction",
    "addendum",
    "review-article",
    "rapid-communications",
];

/// Types that point at the article they amend through `related-article`.
pub const AMENDING_ARTICLE_TYPES: &[&str] = &["correction", "addendum"];

pub fn is_allowed(article_type: &str) -> bool {
    ALLOWED_ARTICLE_TYPES.contains(&article_type)
}

pub fn is_amending(article_type: &str) -> bool {
    AMENDING_ARTICLE_TYPES.contains(&article_type)
}

pub fn doctype_for(article_type: &str) -> Doctype {
    match article_type {
        "research-article" | "corrected-article" | "original-article" => Doctype::Article,
        "correction" => Doctype::Corrigendum,
        "addendum" => Doctype::Addendum,
        "introduction" | "letter" | "review-article" | "rapid-communications" => Doctype::Other,
        _ => Doctype::Unknown,
    }
}
