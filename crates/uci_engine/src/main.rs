use std::io::{self, BufWriter};
use std::path::PathBuf;

use anyhow::{bail, Context};
use tracing::info;
use tracing_subscriber::EnvFilter;
use uci_engine::{EngineOptions, UciProtocol};

fn main() -> anyhow::Result<()> {
    // stdout is the protocol channel, so logs go to stderr
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(io::stderr)
        .with_ansi(false)
        .init();

    let options = match config_path()? {
        Some(path) => EngineOptions::from_file(&path)?,
        None => EngineOptions::default(),
    };
    info!(
        hash_mb = options.hash_mb,
        move_overhead_ms = options.move_overhead_ms,
        max_time_s = options.max_time_s,
        "starting"
    );

    let mut protocol = UciProtocol::new(options)?;
    let stdin = io::stdin();
    let mut stdout = BufWriter::new(io::stdout());
    protocol
        .run(stdin.lock(), &mut stdout)
        .context("UCI session ended with an i/o error")?;
    Ok(())
}

fn config_path() -> anyhow::Result<Option<PathBuf>> {
    let mut args = std::env::args().skip(1);
    let mut path = None;
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" | "-c" => match args.next() {
                Some(p) => path = Some(PathBuf::from(p)),
                None => bail!("--config needs a path"),
            },
            other => bail!("unrecognised argument \"{other}\" (usage: uci_engine [--config <path>])"),
        }
    }
    Ok(path)
}
