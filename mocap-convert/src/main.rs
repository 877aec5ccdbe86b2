use anyhow::{Context, Result};
use log::info;
use mocap_convert::config::Config;
use std::{path::PathBuf, sync::Arc};
use structopt::StructOpt;

#[derive(Debug, Clone, StructOpt)]
/// Convert motion capture annotations into unified bundles
struct Args {
    #[structopt(long, default_value = "convert.json5")]
    /// configuration file
    pub config_file: PathBuf,
}

pub fn main() -> Result<()> {
    pretty_env_logger::init();

    // parse arguments
    let Args { config_file } = Args::from_args();
    let config = Arc::new(
        Config::open(&config_file)
            .with_context(|| format!("failed to load config file '{}'", config_file.display()))?,
    );

    // start conversion
    let outputs = mocap_convert::start(config)?;
    info!("{} bundles written", outputs.len());

    Ok(())
}
