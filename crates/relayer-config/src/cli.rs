// Copyright 2022 Webb Technologies Inc.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
// http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use crate::QgbRelayerConfig;
use anyhow::Context;
use directories_next::ProjectDirs;
use std::path::{Path, PathBuf};
use structopt::StructOpt;

/// Package identifier, where the default configuration & database are defined.
/// If the user does not start the relayer with the `--config-dir`
/// it will default to read from the default location depending on the OS.
pub const PACKAGE_ID: [&str; 3] = ["tools", "webb", "qgb-relayer"];

/// The QGB Relayer Command-line tool
///
/// Start the relayer from a config directory:
///
/// $ qgb-relayer -vvv -c <CONFIG_DIR_PATH>
#[derive(StructOpt)]
#[structopt(name = "QGB Relayer")]
pub struct Opts {
    /// A level of verbosity, and can be used multiple times
    #[structopt(short, long, parse(from_occurrences))]
    pub verbose: i32,
    /// Directory that contains configration files.
    #[structopt(
        short = "c",
        long = "config-dir",
        value_name = "PATH",
        parse(from_os_str)
    )]
    pub config_dir: Option<PathBuf>,
    /// Create the Confirm Store in a temporary directory.
    /// and will be deleted when the process exits.
    #[structopt(long)]
    pub tmp: bool,
}

fn project_dirs() -> anyhow::Result<ProjectDirs> {
    ProjectDirs::from(PACKAGE_ID[0], PACKAGE_ID[1], PACKAGE_ID[2])
        .context("failed to get project dirs")
}

/// Loads the configuration from the given directory, or from the OS
/// specific config directory when none is given.
pub fn load_config<P>(
    config_dir: Option<P>,
) -> Result<QgbRelayerConfig, anyhow::Error>
where
    P: AsRef<Path>,
{
    tracing::debug!("Getting default dirs for qgb relayer");
    let path = match config_dir {
        Some(p) => p.as_ref().to_path_buf(),
        None => project_dirs()?.config_dir().to_path_buf(),
    };
    // return an error if the path is not a directory.
    if !path.is_dir() {
        return Err(anyhow::anyhow!("{} is not a directory", path.display()));
    }
    tracing::trace!("Loading Config from {} ..", path.display());
    let v = crate::utils::load(path)?;
    tracing::trace!("Config loaded..");
    Ok(v)
}

/// Maps the number of `-v` flags to a log level.
pub fn log_level(verbosity: i32) -> tracing::Level {
    use tracing::Level;
    match verbosity {
        i32::MIN..=0 => Level::ERROR,
        1 => Level::WARN,
        2 => Level::INFO,
        3 => Level::DEBUG,
        _ => Level::TRACE,
    }
}

/// Sets up the logger for the relayer, based on the verbosity level passed in.
pub fn setup_logger(verbosity: i32) -> anyhow::Result<()> {
    let log_level = log_level(verbosity);
    let env_filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive(format!("qgb_relayer={log_level}").parse()?)
        .add_directive(
            format!("{}={log_level}", qgb_relayer_utils::probe::TARGET)
                .parse()?,
        );
    let logger = tracing_subscriber::fmt()
        .with_target(true)
        .with_max_level(log_level)
        .with_env_filter(env_filter);
    // if we are not compiling for integration tests, we should use pretty logs
    #[cfg(not(feature = "integration-tests"))]
    let logger = logger.pretty();
    // otherwise, we should use json, which is easy to parse.
    #[cfg(feature = "integration-tests")]
    let logger = logger.json().flatten_event(true).with_current_span(false);

    logger.init();
    Ok(())
}

/// Creates the confirm store for the relayer.
///
/// With `--tmp` the store lives in a temporary directory, otherwise next to
/// the config directory, or in the OS specific data directory.
pub fn create_store(
    opts: &Opts,
) -> anyhow::Result<qgb_relayer_store::SledStore> {
    if opts.tmp {
        tracing::debug!("Using temp dir for store");
        let store = qgb_relayer_store::SledStore::temporary()?;
        return Ok(store);
    }
    let db_path = match opts.config_dir.as_ref() {
        Some(p) => p.parent().unwrap_or(p).join("store"),
        None => project_dirs()?.data_local_dir().join("store"),
    };
    tracing::debug!("Opening store at {}", db_path.display());
    let store = qgb_relayer_store::SledStore::open(db_path)?;
    Ok(store)
}
