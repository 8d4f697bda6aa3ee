use std::path::PathBuf;

use anyhow::{Context as _, Result, bail};
use derive_builder::Builder;
use derive_getters::Getters;
use log::{info, warn};

use crate::{
    Args,
    collection::{CollectionEngine, RunOutcome},
    config::{self, ApiCredentials, Config, WindowSizes},
    export::{ExportReport, Exporter, ItemOutcome},
    interrupt::{Interrupt, InterruptCoordinator},
    remote::{BridgeClient, RemoteError, RemoteListClient},
};

/// Everything one export run needs, with command line values taking
/// precedence over the config file.
#[derive(Builder, Getters, Debug)]
#[builder(setter(into))]
pub struct ExportSettings {
    directory: PathBuf,
    extension: String,
    bridge_cmd: String,
    credentials: ApiCredentials,
    #[getter(skip)]
    window_sizes: WindowSizes,
    #[builder(default)]
    session: Option<PathBuf>,
}

impl ExportSettings {
    pub fn window_sizes(&self) -> WindowSizes {
        self.window_sizes
    }
}

pub fn settings(args: &Args, config: &Config) -> Result<ExportSettings> {
    let credentials = match (args.app_id, &args.app_hash) {
        (Some(app_id), Some(app_hash)) => ApiCredentials::new(app_id, app_hash)?,
        _ => config.credentials()?,
    };
    let mut builder = ExportSettingsBuilder::default();
    builder
        .directory(
            args.directory
                .clone()
                .unwrap_or_else(|| config.directory().clone()),
        )
        .extension(config.extension().as_str())
        .bridge_cmd(config.bridge_cmd().as_str())
        .credentials(credentials)
        .window_sizes(config.window_size());
    if !args.dont_save_session {
        builder.session(Some(config::session_file()?));
    }

    Ok(builder.build()?)
}

pub async fn export(settings: &ExportSettings) -> Result<()> {
    config::ensure_dir(settings.directory())?;
    let mut client = BridgeClient::spawn(
        settings.bridge_cmd(),
        settings.credentials(),
        settings.session().as_deref(),
    )
    .context("could not start bridge")?;
    let coordinator = InterruptCoordinator::install();

    let result = export_with(&mut client, settings, coordinator.interrupt()).await;
    let closed = client.close().await;

    after_close(result, closed).map(|report| {
        if let Some(report) = report {
            summarize(&report);
        }
    })
}

/// A failed close is only logged, the run's own result is kept.
fn after_close<T>(result: Result<T>, closed: Result<(), RemoteError>) -> Result<T> {
    if let Err(e) = closed {
        warn!("could not close bridge: {e}");
    }
    result
}

/// Collects the whole saved collection and exports it. Returns `None` if the
/// run was interrupted before anything was exported.
async fn export_with<C: RemoteListClient>(
    client: &mut C,
    settings: &ExportSettings,
    interrupt: &Interrupt,
) -> Result<Option<ExportReport>> {
    let tier = client.who_am_i().await?;
    let window_size = settings.window_sizes().for_tier(tier);
    info!("listing saved items in windows of {window_size} ({tier:?} account)");
    warn!(
        "newer saved items are removed temporarily to reach older ones; \
         they can be lost from the saved collection if this process dies"
    );

    let items = match CollectionEngine::new(client, window_size)
        .collect(interrupt)
        .await
    {
        RunOutcome::Completed(items) => items,
        RunOutcome::Interrupted => {
            warn!("interrupted, nothing was exported");
            return Ok(None);
        }
        RunOutcome::Failed(e) => bail!("collecting saved items failed: {e}"),
    };

    let report = Exporter::new(client, settings.directory(), settings.extension())
        .export_all(&items)
        .await;

    Ok(Some(report))
}

fn summarize(report: &ExportReport) {
    info!(
        "exported {} items, {} were already exported",
        report.exported(),
        report.skipped()
    );
    if report.failed() > 0 {
        let failed: Vec<i64> = report
            .outcomes()
            .iter()
            .filter(|(_, outcome)| matches!(outcome, ItemOutcome::Failed(_)))
            .map(|(id, _)| *id)
            .collect();
        warn!("{} items failed to export: {failed:?}", failed.len());
    }
}
