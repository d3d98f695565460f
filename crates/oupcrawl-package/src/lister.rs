//! Discovery of remote files that have not been downloaded yet.

use std::collections::HashSet;
use std::path::Path;

use tracing::{debug, info, warn};

use crate::credentials::Credentials;
use crate::error::{Result, TransferError};
use crate::transfer::{Connector, TransferSession, remote_basename, remote_join};

/// Remote paths under `root` (`<root>/<folder>/<file>`) with no local copy in
/// `download_dir`.
///
/// One session is opened for the whole listing and closed before returning.
pub async fn list_new_files(
    connector: &dyn Connector,
    credentials: &Credentials,
    root: &str,
    download_dir: &Path,
) -> Result<Vec<String>> {
    let mut session = connector.connect(credentials).await?;
    let listed = list_remote_files(session.as_mut(), root).await;
    if let Err(e) = session.close().await {
        warn!(error = %e, "closing listing session failed");
    }
    let remote = listed?;

    let fresh = missing_files(&remote, download_dir)?;
    info!(
        root,
        listed = remote.len(),
        new = fresh.len(),
        "listed remote files"
    );
    Ok(fresh)
}

async fn list_remote_files(
    session: &mut dyn TransferSession,
    root: &str,
) -> std::result::Result<Vec<String>, TransferError> {
    let mut files = Vec::new();
    for folder in session.list(root).await? {
        if folder.starts_with('.') {
            debug!(%folder, "skipping hidden folder");
            continue;
        }
        let folder_path = remote_join(root, &folder);
        for file in session.list(&folder_path).await? {
            files.push(remote_join(&folder_path, &file));
        }
    }
    Ok(files)
}

/// Downloads carry a timestamp prefix, so a remote file counts as present when
/// a local file is named `<basename>` or ends with `_<basename>`.
pub fn missing_files(remote: &[String], download_dir: &Path) -> Result<Vec<String>> {
    let local = local_names(download_dir)?;
    Ok(remote
        .iter()
        .filter(|path| {
            let basename = remote_basename(path);
            let suffix = format!("_{basename}");
            !local
                .iter()
                .any(|name| name == basename || name.ends_with(&suffix))
        })
        .cloned()
        .collect())
}

fn local_names(dir: &Path) -> Result<HashSet<String>> {
    if !dir.exists() {
        return Ok(HashSet::new());
    }
    let mut names = HashSet::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        names.insert(entry.file_name().to_string_lossy().into_owned());
    }
    Ok(names)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    use std::collections::HashMap;
    use std::path::PathBuf;
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;

    /// In-memory remote tree: directory path to entry names, file path to bytes.
    #[derive(Default)]
    pub(crate) struct FakeRemote {
        pub dirs: HashMap<String, Vec<String>>,
        pub files: HashMap<String, Vec<u8>>,
        pub closed: Mutex<usize>,
        pub opened: Mutex<usize>,
    }

    impl FakeRemote {
        pub fn with_file(mut self, path: &str, bytes: &[u8]) -> Self {
            let mut parent = String::new();
            for part in path.split('/') {
                let entries = self.dirs.entry(parent.clone()).or_default();
                if !entries.iter().any(|e| e == part) {
                    entries.push(part.to_string());
                }
                parent = remote_join(&parent, part);
            }
            self.files.insert(path.to_string(), bytes.to_vec());
            self
        }
    }

    pub(crate) struct FakeConnector(pub Arc<FakeRemote>);

    #[async_trait]
    impl Connector for FakeConnector {
        async fn connect(
            &self,
            _credentials: &Credentials,
        ) -> std::result::Result<Box<dyn TransferSession>, TransferError> {
            *self.0.opened.lock().unwrap() += 1;
            Ok(Box::new(FakeSession {
                remote: self.0.clone(),
                open: true,
            }))
        }
    }

    struct FakeSession {
        remote: Arc<FakeRemote>,
        open: bool,
    }

    #[async_trait]
    impl TransferSession for FakeSession {
        async fn list(&mut self, path: &str) -> std::result::Result<Vec<String>, TransferError> {
            if !self.open {
                return Err(TransferError::SessionClosed);
            }
            self.remote
                .dirs
                .get(path)
                .cloned()
                .ok_or_else(|| TransferError::List {
                    path: path.to_string(),
                    reason: "no such directory".to_string(),
                })
        }

        async fn download(
            &mut self,
            remote: &str,
            local: &Path,
        ) -> std::result::Result<(), TransferError> {
            let bytes = self
                .remote
                .files
                .get(remote)
                .ok_or_else(|| TransferError::Download {
                    path: remote.to_string(),
                    reason: "no such file".to_string(),
                })?;
            std::fs::write(local, bytes)?;
            Ok(())
        }

        async fn close(&mut self) -> std::result::Result<(), TransferError> {
            self.open = false;
            *self.remote.closed.lock().unwrap() += 1;
            Ok(())
        }
    }

    pub(crate) fn credentials() -> Credentials {
        Credentials::new("ftp.example.org", "user", "secret")
    }

    fn remote() -> Arc<FakeRemote> {
        Arc::new(
            FakeRemote::default()
                .with_file("hooks/ptep_2022_1/ptac032.xml.zip", b"x")
                .with_file("hooks/ptep_2022_1/ptac032.pdf.zip", b"p")
                .with_file("hooks/ptep_2022_2/ptac100.xml.zip", b"y")
                .with_file("hooks/.staging/partial.xml.zip", b"z"),
        )
    }

    #[tokio::test]
    async fn lists_every_file_when_nothing_is_local() {
        let remote = remote();
        let dir = tempfile::tempdir().unwrap();

        let mut files = list_new_files(
            &FakeConnector(remote.clone()),
            &credentials(),
            "hooks",
            dir.path(),
        )
        .await
        .unwrap();
        files.sort();

        assert_eq!(
            files,
            vec![
                "hooks/ptep_2022_1/ptac032.pdf.zip",
                "hooks/ptep_2022_1/ptac032.xml.zip",
                "hooks/ptep_2022_2/ptac100.xml.zip",
            ]
        );
        assert_eq!(*remote.opened.lock().unwrap(), 1);
        assert_eq!(*remote.closed.lock().unwrap(), 1);
    }

    #[tokio::test]
    async fn timestamped_downloads_are_not_new() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("2022-03-01_10:00:00_ptac032.xml.zip"), b"").unwrap();
        std::fs::write(dir.path().join("ptac100.xml.zip"), b"").unwrap();

        let files = list_new_files(&FakeConnector(remote()), &credentials(), "hooks", dir.path())
            .await
            .unwrap();
        assert_eq!(files, vec!["hooks/ptep_2022_1/ptac032.pdf.zip"]);
    }

    #[tokio::test]
    async fn missing_root_is_fatal_and_session_still_closed() {
        let remote = remote();
        let dir = tempfile::tempdir().unwrap();

        let err = list_new_files(&FakeConnector(remote.clone()), &credentials(), "nope", dir.path())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            crate::error::PackageError::Transfer(TransferError::List { .. })
        ));
        assert_eq!(*remote.closed.lock().unwrap(), 1);
    }

    #[test]
    fn missing_download_dir_means_everything_is_new() {
        let remote = vec!["hooks/a/x.zip".to_string()];
        let missing = PathBuf::from("/nonexistent/oupcrawl/downloads");
        assert_eq!(missing_files(&remote, &missing).unwrap(), remote);
    }

    #[test]
    fn suffix_match_needs_the_underscore() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("oldptac032.xml.zip"), b"").unwrap();
        let remote = vec!["hooks/a/ptac032.xml.zip".to_string()];
        assert_eq!(missing_files(&remote, dir.path()).unwrap(), remote);
    }

    #[test]
    fn leftover_partial_download_is_still_new() {
        let dir = tempfile::tempdir().unwrap();
        let partial = crate::staging::partial_path(&dir.path().join("2022-03-01_10:00:00_ptac032.xml.zip"));
        std::fs::write(partial, b"PK").unwrap();
        let remote = vec!["hooks/a/ptac032.xml.zip".to_string()];
        assert_eq!(missing_files(&remote, dir.path()).unwrap(), remote);
    }
}
