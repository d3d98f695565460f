pub mod arxiv;
pub mod doi;

pub use arxiv::ArxivId;
pub use doi::Doi;
