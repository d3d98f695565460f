//! oupcrawl JATS: article XML parsing and record extraction.

pub mod article_type;
pub mod authors;
pub mod dates;
pub mod document;
pub mod error;
pub mod extractor;
pub mod identifiers;
pub mod keywords;
pub mod license;

pub use document::ArticleDocument;
pub use error::{ExtractError, Result};
pub use extractor::ArticleExtractor;
