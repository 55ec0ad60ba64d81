/* This file is part of Sovereign Seas
 *
 * Copyright (C) 2024-2026 Sovereign Seas developers
 *
 * This program is free software: you can redistribute it and/or modify
 * it under the terms of the GNU Affero General Public License as
 * published by the Free Software Foundation, either version 3 of the
 * License, or (at your option) any later version.
 *
 * This program is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU Affero General Public License for more details.
 *
 * You should have received a copy of the GNU Affero General Public License
 * along with this program.  If not, see <https://www.gnu.org/licenses/>.
 */

use std::{env, fs, path::Path};

use simplelog::{
    ColorChoice, CombinedLogger, ConfigBuilder, LevelFilter, SharedLogger, TermLogger,
    TerminalMode, WriteLogger,
};

use crate::{util::path::expand_path, Result};

/// Map a `-v` occurrence count to a log level, and build the logger
/// config. `LOG_TARGETS` takes a comma-separated list of targets to
/// allow, or to ignore when prefixed with `!`.
pub fn log_config(verbosity_level: u64) -> Result<(LevelFilter, simplelog::Config)> {
    let log_level = match verbosity_level {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };

    let mut cfg = ConfigBuilder::new();
    // ethers' transport is very chatty on debug
    cfg.add_filter_ignore("hyper".to_string());
    cfg.add_filter_ignore("reqwest".to_string());
    cfg.add_filter_ignore("rustls".to_string());

    if let Ok(targets) = env::var("LOG_TARGETS") {
        for target in targets.split(',').map(str::trim).filter(|t| !t.is_empty()) {
            match target.strip_prefix('!') {
                Some(ignored) => cfg.add_filter_ignore(ignored.to_string()),
                None => cfg.add_filter_allow(target.to_string()),
            };
        }
    }

    Ok((log_level, cfg.build()))
}

/// Initialize terminal logging, additionally writing to `log_file`
/// when one is given.
pub fn init_logger(verbosity_level: u64, log_file: Option<&str>) -> Result<()> {
    let (lvl, conf) = log_config(verbosity_level)?;

    let mut loggers: Vec<Box<dyn SharedLogger>> =
        vec![TermLogger::new(lvl, conf.clone(), TerminalMode::Mixed, ColorChoice::Auto)];

    if let Some(log_file) = log_file {
        let log_path = expand_path(log_file)?;
        if let Some(parent) = log_path.parent() {
            fs::create_dir_all(parent)?;
        }
        loggers.push(WriteLogger::new(lvl, conf, fs::File::create(log_path)?));
    }

    CombinedLogger::init(loggers)?;
    Ok(())
}

/// Write the default configuration to `path` if no file exists there yet.
pub fn spawn_config(path: &Path, contents: &[u8]) -> Result<()> {
    if path.exists() {
        return Ok(())
    }

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    fs::write(path, contents)?;
    println!("Config file created in {path:?}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbosity_levels() {
        assert_eq!(log_config(0).unwrap().0, LevelFilter::Info);
        assert_eq!(log_config(1).unwrap().0, LevelFilter::Debug);
        assert_eq!(log_config(3).unwrap().0, LevelFilter::Trace);
    }

    #[test]
    fn spawn_config_keeps_existing_file() {
        let dir = env::temp_dir().join(format!("seas-spawn-config-{}", std::process::id()));
        let path = dir.join("seasctl_config.toml");

        spawn_config(&path, b"network = \"localnet\"\n").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "network = \"localnet\"\n");

        spawn_config(&path, b"network = \"celo\"\n").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "network = \"localnet\"\n");

        fs::remove_dir_all(dir).unwrap();
    }
}
