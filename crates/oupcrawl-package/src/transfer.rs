use std::path::Path;

use async_trait::async_trait;

use crate::credentials::Credentials;
use crate::error::TransferError;

/// Opens sessions against a remote file store.
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(
        &self,
        credentials: &Credentials,
    ) -> Result<Box<dyn TransferSession>, TransferError>;
}

/// An open, logged-in session. Paths are relative to the login directory.
#[async_trait]
pub trait TransferSession: Send {
    /// Names of the entries directly under `path`, without the `path` prefix.
    async fn list(&mut self, path: &str) -> Result<Vec<String>, TransferError>;

    /// Copy `remote` into the local file `local`, replacing it if present.
    async fn download(&mut self, remote: &str, local: &Path) -> Result<(), TransferError>;

    /// End the session. Any later call fails with [`TransferError::SessionClosed`].
    async fn close(&mut self) -> Result<(), TransferError>;
}

/// Last path component of a remote path.
pub fn remote_basename(path: &str) -> &str {
    path.trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or(path)
}

/// Join remote path components with `/`, ignoring empty ones.
pub fn remote_join(base: &str, name: &str) -> String {
    let base = base.trim_end_matches('/');
    let name = name.trim_start_matches('/');
    match (base.is_empty(), name.is_empty()) {
        (true, _) => name.to_string(),
        (false, true) => base.to_string(),
        (false, false) => format!("{base}/{name}"),
    }
}
