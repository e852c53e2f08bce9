// DynamicSuite
// Copyright (C) 2025 Synerthink

// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.

// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.

// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <http://www.gnu.org/licenses/>.

//! Package-relative path resolution
//!
//! Manifests refer to their resources relative to the package directory.
//! A leading `/` marks a path as relative to the installation root instead.

use crate::error::{ConfigError, ConfigResult};
use std::path::{Path, PathBuf};

/// Directory under the installation root that holds installed packages
pub const PACKAGES_DIR: &str = "packages";

/// Resolves manifest paths to server paths and public URLs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathResolver {
    root: PathBuf,
    mount: String,
}

impl PathResolver {
    /// Create a resolver for an installation root served under `mount`.
    ///
    /// The mount is normalized to either the empty string or `/segment`
    /// without a trailing slash.
    pub fn new(root: impl Into<PathBuf>, mount: &str) -> Self {
        let trimmed = mount.trim_matches('/');
        let mount = if trimmed.is_empty() { String::new() } else { format!("/{}", trimmed) };
        Self { root: root.into(), mount }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn mount(&self) -> &str {
        &self.mount
    }

    /// Directory a package is installed in
    pub fn package_dir(&self, package_id: &str) -> PathBuf {
        self.root.join(PACKAGES_DIR).join(package_id)
    }

    /// Map a manifest path to an absolute server path
    pub fn format_server_path(&self, package_id: &str, path: &str) -> ConfigResult<PathBuf> {
        check_inputs(package_id, path)?;
        match path.strip_prefix('/') {
            Some(root_relative) => Ok(self.root.join(root_relative)),
            None => Ok(self.package_dir(package_id).join(path)),
        }
    }

    /// Map a manifest path to a public client URL
    pub fn format_client_path(&self, package_id: &str, path: &str) -> ConfigResult<String> {
        check_inputs(package_id, path)?;
        if path.starts_with('/') {
            Ok(path.to_string())
        } else {
            Ok(format!("{}/{}/{}/{}", self.mount, PACKAGES_DIR, package_id, path))
        }
    }

    /// Prefix an application path (`/dashboard`) with the mount
    pub fn mount_url(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.mount, path)
        } else {
            format!("{}/{}", self.mount, path)
        }
    }

    /// Strip the mount from a request path.
    ///
    /// Returns `None` for paths outside the mount. The result always starts
    /// with `/`.
    pub fn strip_mount<'a>(&self, path: &'a str) -> Option<&'a str> {
        if self.mount.is_empty() {
            return Some(if path.is_empty() { "/" } else { path });
        }
        let rest = path.strip_prefix(self.mount.as_str())?;
        if rest.is_empty() {
            Some("/")
        } else if rest.starts_with('/') {
            Some(rest)
        } else {
            None
        }
    }
}

fn check_inputs(package_id: &str, path: &str) -> ConfigResult<()> {
    if package_id.is_empty() {
        return Err(ConfigError::EmptyPackageId);
    }
    if path.is_empty() {
        return Err(ConfigError::EmptyPath {
            package_id: package_id.to_string(),
        });
    }
    Ok(())
}
