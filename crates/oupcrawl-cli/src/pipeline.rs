//! The harvest run: list, fetch, unpack, extract, emit.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use futures::stream::{self, StreamExt};
use oupcrawl_core::{HarvestConfig, NormalizedRecord};
use oupcrawl_jats::ArticleExtractor;
use oupcrawl_package::{
    Connector, Credentials, ExtractionTask, RemoteBundle, download_bundle, is_bundle,
    list_new_files, unpack_bundle,
};
use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::sink::RecordSink;

/// Where the bundles of a run come from.
#[derive(Debug, Clone)]
pub enum HarvestSource {
    /// A bundle already on local disk.
    Local(PathBuf),
    /// New bundles under `folder` on the remote host.
    Remote {
        credentials: Credentials,
        folder: String,
    },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct HarvestSummary {
    /// Bundles unpacked.
    pub bundles: usize,
    /// XML documents found in those bundles.
    pub documents: usize,
    pub emitted: usize,
    /// Documents skipped for their article type.
    pub filtered: usize,
    /// Documents that could not be read or extracted.
    pub failed: usize,
}

pub struct Harvester {
    config: HarvestConfig,
    extractor: Arc<ArticleExtractor>,
    connector: Arc<dyn Connector>,
}

impl Harvester {
    pub fn new(config: HarvestConfig, connector: Arc<dyn Connector>) -> Self {
        let extractor = Arc::new(ArticleExtractor::from_config(&config.publisher));
        Self {
            config,
            extractor,
            connector,
        }
    }

    pub async fn run(
        &self,
        source: &HarvestSource,
        sink: &mut dyn RecordSink,
    ) -> Result<HarvestSummary> {
        let (bundles, interrupted) = match source {
            HarvestSource::Local(path) => (vec![path.clone()], None),
            HarvestSource::Remote {
                credentials,
                folder,
            } => self.fetch_remote(credentials, folder).await?,
        };

        let mut summary = HarvestSummary::default();
        let tasks = self.unpack_all(&bundles, &mut summary).await;
        summary.documents = tasks.len();

        self.extract_all(tasks, sink, &mut summary).await?;
        sink.finish()?;

        info!(
            bundles = summary.bundles,
            documents = summary.documents,
            emitted = summary.emitted,
            filtered = summary.filtered,
            failed = summary.failed,
            "harvest finished"
        );
        match interrupted {
            Some(e) => Err(e),
            None => Ok(summary),
        }
    }

    /// Download every new bundle under `folder`.
    ///
    /// A listing error is returned as is. A download error stops further
    /// downloads and comes back next to the bundles fetched before it, which
    /// the run still harvests.
    async fn fetch_remote(
        &self,
        credentials: &Credentials,
        folder: &str,
    ) -> Result<(Vec<PathBuf>, Option<anyhow::Error>)> {
        let download_dir = &self.config.storage.download_dir;
        let new_files = list_new_files(self.connector.as_ref(), credentials, folder, download_dir)
            .await
            .with_context(|| format!("listing {folder} on {}", credentials.host))?;

        let discovered_at = chrono::Local::now();
        let mut downloaded = Vec::new();
        let mut interrupted = None;
        for remote in new_files {
            if !is_bundle(&remote) {
                debug!(%remote, "not a bundle, skipping");
                continue;
            }
            let bundle = RemoteBundle::new(remote, download_dir, discovered_at);
            match download_bundle(self.connector.as_ref(), credentials, &bundle).await {
                Ok(path) => downloaded.push(path),
                Err(e) => {
                    error!(remote = %bundle.remote_path, error = %e, "download failed, stopping transfers");
                    interrupted =
                        Some(anyhow::Error::new(e).context(format!("downloading {}", bundle.remote_path)));
                    break;
                }
            }
        }

        info!(count = downloaded.len(), "downloaded bundles");
        Ok((downloaded, interrupted))
    }

    async fn unpack_all(&self, bundles: &[PathBuf], summary: &mut HarvestSummary) -> Vec<ExtractionTask> {
        let mut tasks = Vec::new();
        for bundle in bundles {
            let path = bundle.clone();
            match tokio::task::spawn_blocking(move || unpack_bundle(&path)).await {
                Ok(Ok(found)) => {
                    summary.bundles += 1;
                    tasks.extend(found);
                }
                Ok(Err(e)) => error!(bundle = %bundle.display(), error = %e, "cannot unpack bundle"),
                Err(e) => error!(bundle = %bundle.display(), error = %e, "unpack task panicked"),
            }
        }
        tasks
    }

    /// Extract documents on a bounded pool of blocking workers and feed the
    /// sink in completion order.
    async fn extract_all(
        &self,
        tasks: Vec<ExtractionTask>,
        sink: &mut dyn RecordSink,
        summary: &mut HarvestSummary,
    ) -> Result<()> {
        let concurrency = self.config.pipeline.concurrency.max(1);

        let mut results = stream::iter(tasks)
            .map(|task| {
                let extractor = Arc::clone(&self.extractor);
                async move {
                    let xml = task.xml_path().map(Path::to_path_buf);
                    let outcome = tokio::task::spawn_blocking(move || extract_task(&extractor, &task)).await;
                    (xml, outcome)
                }
            })
            .buffer_unordered(concurrency);

        while let Some((xml, outcome)) = results.next().await {
            let xml = xml.unwrap_or_default();
            match outcome {
                Ok(Ok(Some(record))) => {
                    sink.emit(&record)
                        .with_context(|| format!("writing record for {}", xml.display()))?;
                    summary.emitted += 1;
                }
                Ok(Ok(None)) => summary.filtered += 1,
                Ok(Err(e)) => {
                    warn!(xml = %xml.display(), error = %e, "extraction failed");
                    summary.failed += 1;
                }
                Err(e) => {
                    error!(xml = %xml.display(), error = %e, "extraction task panicked");
                    summary.failed += 1;
                }
            }
        }
        Ok(())
    }
}

fn extract_task(
    extractor: &ArticleExtractor,
    task: &ExtractionTask,
) -> oupcrawl_jats::Result<Option<NormalizedRecord>> {
    let Some(xml) = task.xml_path() else {
        return Ok(None);
    };
    debug!(xml = %xml.display(), bundle = %task.bundle_path.display(), "extracting");
    extractor.extract_file(xml, &task.artifacts)
}
