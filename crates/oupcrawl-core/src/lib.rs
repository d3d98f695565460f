//! oupcrawl core: harvested record model, configuration and errors.

pub mod config;
pub mod error;
pub mod models;

pub use config::{HarvestConfig, PipelineConfig, PublisherConfig, StorageConfig, TransferConfig};
pub use error::{CoreError, Result};
pub use models::*;
