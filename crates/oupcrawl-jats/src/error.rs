use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("invalid DOI: {0}")]
    InvalidDoi(String),

    #[error("invalid arXiv ID: {0}")]
    InvalidArxivId(String),

    #[error("XML error: {0}")]
    Xml(String),

    #[error("document has no root element")]
    EmptyDocument,

    #[error("cannot derive journal year from publication date {0:?}")]
    InvalidPublicationDate(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ExtractError>;
