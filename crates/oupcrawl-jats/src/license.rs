use once_cell::sync::Lazy;
use oupcrawl_core::License;
use regex::Regex;
use tracing::debug;

use crate::document::ArticleDocument;

static VERSION: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+(?:\.\d+)?").unwrap());

static CC_TEXT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)creative\s+commons\s+attribution((?:[\s-]+(?:non-?commercial|no\s*derivatives|share\s*alike))*)[^\d]*(\d+(?:\.\d+)?)")
        .unwrap()
});

/// License URL of the article: the `ext-link` inside the license paragraph,
/// else the `href` of the license element itself.
pub fn license_url(doc: &ArticleDocument) -> Option<String> {
    let from_paragraph = doc
        .find_all("license")
        .flat_map(|license| license.children_named("license-p"))
        .flat_map(|p| p.children_named("ext-link"))
        .find_map(|link| link.clean_text());

    from_paragraph.or_else(|| {
        doc.find_all("license")
            .find_map(|license| license.attr("href"))
            .map(|href| href.trim().to_string())
            .filter(|href| !href.is_empty())
    })
}

/// Map a license URL to a short descriptor such as `CC-BY-4.0`.
pub fn license_by_url(url: &str) -> Option<String> {
    let lower = url.to_lowercase();
    if !lower.contains("creativecommons.org") {
        return None;
    }

    if let Some(rest) = lower.split("/publicdomain/zero/").nth(1) {
        let version = VERSION.find(rest).map(|m| m.as_str()).unwrap_or("1.0");
        return Some(format!("CC0-{version}"));
    }

    let rest = lower.split("/licenses/").nth(1)?;
    let mut segments = rest.split('/').filter(|s| !s.is_empty());
    let parts = segments.next()?;
    let mut license = format!("CC-{}", parts.to_uppercase());
    if let Some(version) = segments.next().and_then(|s| VERSION.find(s)) {
        license.push('-');
        license.push_str(version.as_str());
    }
    Some(license)
}

/// Map license prose ("Creative Commons Attribution 4.0 ...") to a descriptor.
pub fn license_by_text(text: &str) -> Option<String> {
    let caps = CC_TEXT.captures(text)?;
    let modifiers = caps.get(1).map(|m| m.as_str().to_lowercase()).unwrap_or_default();
    let mut license = String::from("CC-BY");
    if modifiers.contains("commercial") {
        license.push_str("-NC");
    }
    if modifiers.contains("derivative") {
        license.push_str("-ND");
    }
    if modifiers.contains("share") {
        license.push_str("-SA");
    }
    license.push('-');
    license.push_str(&caps[2]);
    Some(license)
}

/// License descriptors of the article. Empty when nothing can be recognised.
pub fn licenses(doc: &ArticleDocument) -> Vec<License> {
    let Some(url) = license_url(doc) else {
        debug!("no license URL in document");
        return Vec::new();
    };

    let descriptor = license_by_url(&url).or_else(|| {
        doc.find_all("license-p")
            .find_map(|p| p.clean_text())
            .and_then(|text| license_by_text(&text))
    });

    match descriptor {
        Some(license) => vec![License { license, url }],
        None => {
            debug!(%url, "unrecognised license URL");
            Vec::new()
        }
    }
}
