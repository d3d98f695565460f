//! FTP implementation of the transfer traits.
//!
//! `suppaftp`'s synchronous stream is driven from `spawn_blocking`; the session
//! hands the stream to the blocking task and takes it back when it finishes.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use suppaftp::FtpStream;
use suppaftp::types::FileType;
use tracing::{debug, info};

use crate::credentials::Credentials;
use crate::error::TransferError;
use crate::staging::write_staged;
use crate::transfer::{Connector, TransferSession, remote_basename};

pub const DEFAULT_FTP_PORT: u16 = 21;

#[derive(Debug, Clone)]
pub struct FtpConnector {
    port: u16,
}

impl FtpConnector {
    pub fn new(port: u16) -> Self {
        Self { port }
    }
}

impl Default for FtpConnector {
    fn default() -> Self {
        Self::new(DEFAULT_FTP_PORT)
    }
}

#[async_trait]
impl Connector for FtpConnector {
    async fn connect(
        &self,
        credentials: &Credentials,
    ) -> Result<Box<dyn TransferSession>, TransferError> {
        let host = credentials.host.clone();
        let user = credentials.user.clone();
        let password = credentials.password.clone();
        let port = self.port;

        info!(%host, port, %user, "connecting to FTP server");
        let stream = tokio::task::spawn_blocking(move || {
            let mut stream =
                FtpStream::connect((host.as_str(), port)).map_err(|e| TransferError::Connect {
                    host: host.clone(),
                    reason: e.to_string(),
                })?;
            stream
                .login(user.as_str(), password.as_str())
                .map_err(|e| TransferError::Login {
                    user: user.clone(),
                    reason: e.to_string(),
                })?;
            stream
                .transfer_type(FileType::Binary)
                .map_err(|e| TransferError::Connect {
                    host,
                    reason: format!("cannot switch to binary mode: {e}"),
                })?;
            Ok::<_, TransferError>(stream)
        })
        .await
        .map_err(|e| TransferError::Join(e.to_string()))??;

        Ok(Box::new(FtpSession {
            stream: Some(stream),
        }))
    }
}

pub struct FtpSession {
    stream: Option<FtpStream>,
}

impl FtpSession {
    async fn with_stream<T, F>(&mut self, op: F) -> Result<T, TransferError>
    where
        T: Send + 'static,
        F: FnOnce(&mut FtpStream) -> Result<T, TransferError> + Send + 'static,
    {
        let mut stream = self.stream.take().ok_or(TransferError::SessionClosed)?;
        let (stream, result) = tokio::task::spawn_blocking(move || {
            let result = op(&mut stream);
            (stream, result)
        })
        .await
        .map_err(|e| TransferError::Join(e.to_string()))?;
        self.stream = Some(stream);
        result
    }
}

#[async_trait]
impl TransferSession for FtpSession {
    async fn list(&mut self, path: &str) -> Result<Vec<String>, TransferError> {
        let path = path.to_string();
        debug!(%path, "listing remote directory");
        self.with_stream(move |stream| {
            let entries = stream
                .nlst(Some(path.as_str()))
                .map_err(|e| TransferError::List {
                    path: path.clone(),
                    reason: e.to_string(),
                })?;
            Ok(entries
                .iter()
                .map(|entry| remote_basename(entry).to_string())
                .filter(|name| !name.is_empty() && name != "." && name != "..")
                .collect())
        })
        .await
    }

    async fn download(&mut self, remote: &str, local: &Path) -> Result<(), TransferError> {
        let remote = remote.to_string();
        let local: PathBuf = local.to_path_buf();
        info!(%remote, local = %local.display(), "downloading");
        self.with_stream(move |stream| {
            let download_error = |e: &dyn std::fmt::Display| TransferError::Download {
                path: remote.clone(),
                reason: e.to_string(),
            };
            let mut data = stream
                .retr_as_stream(remote.as_str())
                .map_err(|e| download_error(&e))?;
            let copied = write_staged(&mut data, &local);
            let finalized = stream.finalize_retr_stream(data);
            let bytes = copied.map_err(|e| download_error(&e))?;
            if let Err(e) = finalized {
                // The server did not confirm the transfer, so the copy may be short.
                let _ = std::fs::remove_file(&local);
                return Err(download_error(&e));
            }
            debug!(%remote, bytes, "transfer complete");
            Ok(())
        })
        .await
    }

    async fn close(&mut self) -> Result<(), TransferError> {
        let Some(mut stream) = self.stream.take() else {
            return Ok(());
        };
        tokio::task::spawn_blocking(move || stream.quit())
            .await
            .map_err(|e| TransferError::Join(e.to_string()))?
            .map_err(|e| TransferError::Io(std::io::Error::other(format!("quit failed: {e}"))))
    }
}
