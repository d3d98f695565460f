use crate::error::{ExtractError, Result};
use once_cell::sync::Lazy;
use regex::Regex;

// New format: YYMM.NNNN or YYMM.NNNNN (with optional version)
static NEW_FORMAT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{4}\.\d{4,5})(v\d+)?$").unwrap());

// Old format: category/YYMMNNN
static OLD_FORMAT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([a-zA-Z\-]+(?:\.[A-Z]{2})?/\d{7})(v\d+)?$").unwrap());

/// An arXiv eprint identifier without prefix or version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArxivId {
    pub id: String,
}

impl ArxivId {
    pub fn parse(input: &str) -> Result<Self> {
        let input = input.trim();

        let stripped = ["https://arxiv.org/abs/", "http://arxiv.org/abs/", "arXiv:", "arxiv:"]
            .iter()
            .find_map(|prefix| input.strip_prefix(prefix))
            .unwrap_or(input);

        NEW_FORMAT
            .captures(stripped)
            .or_else(|| OLD_FORMAT.captures(stripped))
            .map(|caps| Self {
                id: caps[1].to_string(),
            })
            .ok_or_else(|| ExtractError::InvalidArxivId(input.to_string()))
    }
}
