use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use tracing::{info, warn};

use crate::credentials::Credentials;
use crate::error::Result;
use crate::transfer::{Connector, remote_basename};

/// Timestamp prefix of downloaded bundle names.
pub const DOWNLOAD_NAME_FORMAT: &str = "%Y-%m-%d_%H:%M:%S";

/// A remote bundle scheduled for download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteBundle {
    pub remote_path: String,
    pub discovered_at: DateTime<Local>,
    pub local_path: PathBuf,
}

impl RemoteBundle {
    /// Target `<download_dir>/<timestamp>_<basename>` for `remote_path`.
    pub fn new(remote_path: impl Into<String>, download_dir: &Path, discovered_at: DateTime<Local>) -> Self {
        let remote_path = remote_path.into();
        let name = format!(
            "{}_{}",
            discovered_at.format(DOWNLOAD_NAME_FORMAT),
            remote_basename(&remote_path)
        );
        Self {
            local_path: download_dir.join(name),
            remote_path,
            discovered_at,
        }
    }
}

/// Remote files worth downloading: anything with `.zip` in its name.
pub fn is_bundle(remote_path: &str) -> bool {
    remote_basename(remote_path).contains(".zip")
}

/// Download one bundle over its own session.
pub async fn download_bundle(
    connector: &dyn Connector,
    credentials: &Credentials,
    bundle: &RemoteBundle,
) -> Result<PathBuf> {
    if let Some(parent) = bundle.local_path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    let mut session = connector.connect(credentials).await?;
    let downloaded = session
        .download(&bundle.remote_path, &bundle.local_path)
        .await;
    if let Err(e) = session.close().await {
        warn!(error = %e, remote = %bundle.remote_path, "closing download session failed");
    }
    downloaded?;

    info!(
        remote = %bundle.remote_path,
        local = %bundle.local_path.display(),
        "bundle downloaded"
    );
    Ok(bundle.local_path.clone())
}
