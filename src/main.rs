mod cli;
mod collection;
mod config;
mod export;
mod interrupt;
mod logging;
mod remote;

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

use crate::config::Config;

/// Exports every saved animation of an account into a directory.
///
/// The remote service only lists the newest saved items. To reach older ones
/// the newest are temporarily removed from the saved collection and added
/// back once everything is listed. If the process is killed in between, the
/// removed items are lost from the collection. Interrupting with Ctrl+C stops
/// without restoring them either; their ids are logged.
#[derive(Parser, Debug)]
#[command(version, about, verbatim_doc_comment)]
pub struct Args {
    /// Directory to export into [default: gifs]
    #[arg(short, long)]
    directory: Option<PathBuf>,

    /// Do not persist the session in $XDG_DATA_HOME/savedexport/tg.session
    #[arg(long)]
    dont_save_session: bool,

    /// API id, requires --app-hash
    #[arg(long, requires = "app_hash")]
    app_id: Option<i32>,

    /// API hash of 32 hexadecimal characters, requires --app-id
    #[arg(long, requires = "app_id", value_parser = config::parse_app_hash)]
    app_hash: Option<String>,

    /// Config file [default: $XDG_CONFIG_HOME/savedexport/config.toml]
    #[arg(short, long)]
    config: Option<PathBuf>,
}

fn main() -> Result<()> {
    let args = Args::parse();
    logging::init();

    let config = Config::load_from_file(args.config.as_deref())?;
    cli::run(&args, &config)
}
