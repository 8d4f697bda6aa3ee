mod export;

use anyhow::{Context as _, Result};

use crate::{Args, config::Config};

pub fn run(args: &Args, config: &Config) -> Result<()> {
    let settings = export::settings(args, config)?;
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("tokio runtime should be buildable")?;

    rt.block_on(export::export(&settings))
}
