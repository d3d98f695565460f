use crate::error::{ExtractError, Result};

/// A DOI reduced to its bare `10.<registrant>/<suffix>` form, original case.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Doi {
    pub bare: String,
}

const PREFIXES: &[&str] = &[
    "https://doi.org/",
    "http://doi.org/",
    "https://dx.doi.org/",
    "http://dx.doi.org/",
    "doi:",
    "DOI:",
];

impl Doi {
    pub fn parse(input: &str) -> Result<Self> {
        let input = input.trim();

        let stripped = PREFIXES
            .iter()
            .find_map(|prefix| input.strip_prefix(prefix))
            .map(str::trim_start)
            .unwrap_or(input);

        let suffix = stripped
            .strip_prefix("10.")
            .and_then(|rest| rest.split_once('/'))
            .map(|(_, suffix)| suffix);
        match suffix {
            Some(suffix) if !suffix.is_empty() => Ok(Self {
                bare: stripped.to_string(),
            }),
            _ => Err(ExtractError::InvalidDoi(input.to_string())),
        }
    }
}
