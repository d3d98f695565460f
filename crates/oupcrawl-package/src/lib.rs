//! oupcrawl package handling: remote listing, bundle download and unpacking.

pub mod bundle;
pub mod credentials;
pub mod error;
pub mod ftp;
pub mod layout;
pub mod lister;
pub mod staging;
pub mod transfer;
pub mod unpack;

pub use bundle::{RemoteBundle, download_bundle, is_bundle};
pub use credentials::{Credentials, Netrc};
pub use error::{PackageError, Result, TransferError};
pub use ftp::FtpConnector;
pub use layout::BundleLayout;
pub use lister::list_new_files;
pub use transfer::{Connector, TransferSession};
pub use unpack::{ExtractionTask, unpack_bundle};
