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

use config::{Config, File};
use std::path::{Path, PathBuf};

use qgb_relayer_utils::Error;

use crate::QgbRelayerConfig;

/// A helper function that will search for all config files in the given directory and return them as a vec
/// of the paths.
///
/// Supported file extensions are:
/// - `.toml`.
/// - `.json`.
pub fn search_config_files<P: AsRef<Path>>(
    base_dir: P,
) -> qgb_relayer_utils::Result<Vec<PathBuf>> {
    // A pattern that covers all toml or json files in the config directory and subdirectories.
    let toml_pattern = format!("{}/**/*.toml", base_dir.as_ref().display());
    let json_pattern = format!("{}/**/*.json", base_dir.as_ref().display());
    tracing::trace!(
        "Loading config files from {} and {}",
        toml_pattern,
        json_pattern
    );
    let toml_files = glob::glob(&toml_pattern)?;
    let json_files = glob::glob(&json_pattern)?;
    toml_files
        .chain(json_files)
        .map(|v| v.map_err(Error::from))
        .collect()
}

/// Try to parse the [`QgbRelayerConfig`] from the given config file(s).
///
/// Environment variables prefixed with `QGB` override file values, using
/// `__` to separate nesting levels, e.g. `QGB_EVM__NAME`.
pub fn parse_from_files(
    files: &[PathBuf],
) -> qgb_relayer_utils::Result<QgbRelayerConfig> {
    let mut builder = Config::builder();
    for config_file in files {
        tracing::trace!("Loading config file: {}", config_file.display());
        let ext = config_file
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("");
        let format = match ext {
            "toml" => config::FileFormat::Toml,
            "json" => config::FileFormat::Json,
            _ => {
                tracing::warn!("Unknown file extension: {}", ext);
                continue;
            }
        };
        builder = builder
            .add_source(File::from(config_file.as_path()).format(format));
    }

    let builder = builder
        .add_source(config::Environment::with_prefix("QGB").separator("__"));
    let cfg = builder.build()?;
    let config: Result<
        QgbRelayerConfig,
        serde_path_to_error::Error<config::ConfigError>,
    > = serde_path_to_error::deserialize(cfg);
    match config {
        Ok(c) => postloading_process(c),
        Err(e) => {
            tracing::error!("{}", e);
            Err(e.into())
        }
    }
}

/// Load the configuration files found in `path`.
///
/// it is the same as using the [`search_config_files`] and [`parse_from_files`] functions combined.
pub fn load<P: AsRef<Path>>(
    path: P,
) -> qgb_relayer_utils::Result<QgbRelayerConfig> {
    parse_from_files(&search_config_files(path)?)
}

/// The postloading_process exists to validate the configuration before the
/// relayer starts with it.
pub fn postloading_process(
    config: QgbRelayerConfig,
) -> qgb_relayer_utils::Result<QgbRelayerConfig> {
    tracing::trace!("Checking configration sanity ...");

    if config.evm.private_key.is_none() {
        tracing::error!(
            "evm.private-key is required to submit transactions to {}",
            config.evm.name
        );
        return Err(Error::MissingSecrets);
    }
    let policy = &config.relayer;
    if policy.relay_interval == 0 {
        return Err(Error::Generic("relayer.relay-interval must not be zero"));
    }
    if policy.confirm_poll_interval == 0 {
        return Err(Error::Generic(
            "relayer.confirm-poll-interval must not be zero",
        ));
    }
    if policy.confirm_poll_interval > policy.confirm_timeout {
        tracing::warn!(
            "!!WARNING!!: relayer.confirm-poll-interval ({}ms) is longer than
            relayer.confirm-timeout ({}ms), confirms will be polled only once.",
            policy.confirm_poll_interval,
            policy.confirm_timeout,
        );
    }
    if policy.max_retries == 0 {
        tracing::warn!(
            "!!WARNING!!: relayer.max-retries is zero, the first failed
            relay cycle will stop the relayer."
        );
    }

    tracing::trace!(
        "postloaded config: {}",
        serde_json::to_string_pretty(&config)?
    );

    Ok(config)
}
