use std::{
    io::{self, ErrorKind},
    path::{Path, PathBuf},
};

use log::{error, info, trace, warn};
use thiserror::Error;
use tokio::fs;

use crate::remote::{ItemDescriptor, RemoteError, RemoteListClient};

#[derive(Debug, Error)]
pub enum ExportError {
    #[error(transparent)]
    Remote(#[from] RemoteError),
    #[error("local file error: {0}")]
    Io(#[from] io::Error),
}

/// Result of exporting a single item. Failures never stop the export of the
/// other items.
#[derive(Debug)]
pub enum ItemOutcome {
    Skipped,
    Exported,
    Failed(ExportError),
}

#[derive(Debug, Default)]
pub struct ExportReport {
    outcomes: Vec<(i64, ItemOutcome)>,
}

impl ExportReport {
    pub fn outcomes(&self) -> &[(i64, ItemOutcome)] {
        &self.outcomes
    }

    pub fn exported(&self) -> usize {
        self.count(|outcome| matches!(outcome, ItemOutcome::Exported))
    }

    pub fn skipped(&self) -> usize {
        self.count(|outcome| matches!(outcome, ItemOutcome::Skipped))
    }

    pub fn failed(&self) -> usize {
        self.count(|outcome| matches!(outcome, ItemOutcome::Failed(_)))
    }

    fn count(&self, predicate: impl Fn(&ItemOutcome) -> bool) -> usize {
        self.outcomes
            .iter()
            .filter(|(_, outcome)| predicate(outcome))
            .count()
    }
}

/// Materializes items as `<id>.<extension>` files inside one directory.
///
/// A file that exists with exactly the expected size counts as exported. There
/// is no checksum to compare against, so a same-sized file with different
/// content is never detected.
pub struct Exporter<'a, C> {
    client: &'a mut C,
    directory: &'a Path,
    extension: &'a str,
}

impl<'a, C: RemoteListClient> Exporter<'a, C> {
    pub fn new(client: &'a mut C, directory: &'a Path, extension: &'a str) -> Self {
        Self {
            client,
            directory,
            extension,
        }
    }

    pub fn filename(&self, item: &ItemDescriptor) -> String {
        format!("{}.{}", item.id(), self.extension)
    }

    pub async fn export_all(&mut self, items: &[ItemDescriptor]) -> ExportReport {
        let total = items.len();
        let mut report = ExportReport::default();
        for (index, item) in items.iter().enumerate() {
            let filename = self.filename(item);
            let outcome = self.export(item, &filename, index + 1, total).await;
            if let ItemOutcome::Failed(e) = &outcome {
                error!("failed to export {filename}: {e}");
            }
            report.outcomes.push((item.id(), outcome));
        }

        report
    }

    async fn export(
        &mut self,
        item: &ItemDescriptor,
        filename: &str,
        position: usize,
        total: usize,
    ) -> ItemOutcome {
        let path = self.directory.join(filename);
        match is_exported(&path, item.size()).await {
            Ok(true) => {
                info!("({position}/{total}) {filename} already exported");
                ItemOutcome::Skipped
            }
            Ok(false) => {
                info!("({position}/{total}) exporting {filename}");
                match self.download(item, &path).await {
                    Ok(()) => ItemOutcome::Exported,
                    Err(e) => ItemOutcome::Failed(e),
                }
            }
            Err(e) => ItemOutcome::Failed(e.into()),
        }
    }

    async fn download(&mut self, item: &ItemDescriptor, path: &Path) -> Result<(), ExportError> {
        let partial = partial_path(path);
        trace!("downloading {} to {}", item.id(), partial.display());
        if let Err(e) = self.client.download(item, &partial).await {
            remove_partial(&partial).await;
            return Err(e.into());
        }
        if let Err(e) = fs::rename(&partial, path).await {
            remove_partial(&partial).await;
            return Err(e.into());
        }

        let written = fs::metadata(path).await?.len();
        if u64::try_from(item.size()).ok() != Some(written) {
            warn!(
                "{} has {written} bytes instead of the announced {}",
                path.display(),
                item.size()
            );
        }

        Ok(())
    }
}

async fn is_exported(path: &Path, expected_size: i64) -> io::Result<bool> {
    match fs::metadata(path).await {
        Ok(metadata) => Ok(metadata.is_file()
            && u64::try_from(expected_size).is_ok_and(|size| size == metadata.len())),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e),
    }
}

fn partial_path(path: &Path) -> PathBuf {
    let mut partial = path.as_os_str().to_owned();
    partial.push(".part");
    PathBuf::from(partial)
}

async fn remove_partial(partial: &Path) {
    match fs::remove_file(partial).await {
        Ok(()) => trace!("removed {}", partial.display()),
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => warn!("could not remove {}: {e}", partial.display()),
    }
}
