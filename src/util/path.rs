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

use std::{
    env,
    ffi::OsString,
    path::{Path, PathBuf},
};

use crate::{Error, Result};

/// Directory name used under the user's configuration directory
const CONFIG_DIR_NAME: &str = "sovereign-seas";

/// Largest passwd buffer tried before giving up on the lookup
#[cfg(unix)]
const MAX_PASSWD_BUF: usize = 64 * 1024;

/// Home directory from the current user's passwd entry.
#[cfg(unix)]
fn passwd_home() -> Option<PathBuf> {
    use std::{
        ffi::{CStr, OsStr},
        os::unix::ffi::OsStrExt,
    };

    let mut len = match unsafe { libc::sysconf(libc::_SC_GETPW_R_SIZE_MAX) } {
        n if n > 0 => n as usize,
        _ => 1024,
    };

    loop {
        let mut buf: Vec<libc::c_char> = vec![0; len];
        let mut entry: libc::passwd = unsafe { std::mem::zeroed() };
        let mut found: *mut libc::passwd = std::ptr::null_mut();

        let rc = unsafe {
            libc::getpwuid_r(libc::getuid(), &mut entry, buf.as_mut_ptr(), len, &mut found)
        };

        match rc {
            libc::ERANGE if len < MAX_PASSWD_BUF => len *= 2,
            0 if !found.is_null() && !entry.pw_dir.is_null() => {
                // pw_dir points into buf
                let dir = unsafe { CStr::from_ptr(entry.pw_dir) };
                let dir = OsStr::from_bytes(dir.to_bytes());
                return (!dir.is_empty()).then(|| PathBuf::from(dir))
            }
            _ => return None,
        }
    }
}

#[cfg(windows)]
fn passwd_home() -> Option<PathBuf> {
    env::var_os("USERPROFILE").map(PathBuf::from)
}

/// `$HOME` when set and non-empty, otherwise the account's home from the
/// system user database.
pub fn home_dir() -> Option<PathBuf> {
    env::var_os("HOME").filter(|h| !h.is_empty()).map(PathBuf::from).or_else(passwd_home)
}

/// Returns `$XDG_CONFIG_HOME`, `$HOME/.config`, or `None`.
pub fn config_dir() -> Option<PathBuf> {
    env::var_os("XDG_CONFIG_HOME")
        .and_then(is_absolute_path)
        .or_else(|| home_dir().map(|h| h.join(".config")))
}

fn is_absolute_path(path: OsString) -> Option<PathBuf> {
    let path = PathBuf::from(path);
    if path.is_absolute() {
        Some(path)
    } else {
        None
    }
}

/// Expand a leading `~` into the user's home directory.
pub fn expand_path(path: &str) -> Result<PathBuf> {
    if let Some(remains) = path.strip_prefix("~/") {
        let Some(homedir) = home_dir() else {
            return Err(Error::Custom("Could not fetch path for home directory".to_string()))
        };
        return Ok(homedir.join(remains))
    }

    if path == "~" {
        return home_dir()
            .ok_or_else(|| Error::Custom("Could not fetch path for home directory".to_string()))
    }

    Ok(PathBuf::from(path))
}

/// Join a path with `config_dir()/sovereign-seas`.
pub fn join_config_path(file: &Path) -> Result<PathBuf> {
    let mut path = PathBuf::new();

    if let Some(v) = config_dir() {
        path.push(v);
    }

    path.push(CONFIG_DIR_NAME);
    path.push(file);

    Ok(path)
}

/// Resolve the configuration file path: an explicit argument wins,
/// otherwise `fallback` inside the default configuration directory.
pub fn get_config_path(arg: Option<String>, fallback: &str) -> Result<PathBuf> {
    if let Some(a) = arg {
        expand_path(&a)
    } else {
        join_config_path(&PathBuf::from(fallback))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expand_path_handles_home_prefix() {
        let Some(home) = home_dir() else { return };
        assert_eq!(expand_path("~/seas.toml").unwrap(), home.join("seas.toml"));
        assert_eq!(expand_path("~").unwrap(), home);
        assert_eq!(expand_path("/tmp/seas.toml").unwrap(), PathBuf::from("/tmp/seas.toml"));
    }

    #[cfg(unix)]
    #[test]
    fn passwd_home_is_absolute() {
        if let Some(home) = passwd_home() {
            assert!(home.is_absolute());
        }
    }

    #[test]
    fn explicit_config_path_wins() {
        let path = get_config_path(Some("/etc/seas.toml".to_string()), "seasctl_config.toml");
        assert_eq!(path.unwrap(), PathBuf::from("/etc/seas.toml"));

        let path = get_config_path(None, "seasctl_config.toml").unwrap();
        assert!(path.ends_with("sovereign-seas/seasctl_config.toml"));
    }
}
