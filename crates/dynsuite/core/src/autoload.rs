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

//! Request-scoped resource lookup
//!
//! Each API call and view render gets its own [`Autoloader`]: the unit's own
//! directories first, then the registry-wide ones. Nothing is registered
//! process-wide, so concurrent requests never see each other's search path.

use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Autoloader {
    dirs: Vec<PathBuf>,
}

impl Autoloader {
    pub fn new(dirs: Vec<PathBuf>) -> Self {
        Self { dirs }
    }

    /// Search `local` before `global`, each directory once
    pub fn scoped(local: &[PathBuf], global: &[PathBuf]) -> Self {
        let mut dirs: Vec<PathBuf> = Vec::with_capacity(local.len() + global.len());
        for dir in local.iter().chain(global) {
            if !dirs.contains(dir) {
                dirs.push(dir.clone());
            }
        }
        Self { dirs }
    }

    pub fn dirs(&self) -> &[PathBuf] {
        &self.dirs
    }

    /// Find a file by name in the search path; first match wins.
    ///
    /// `::` and `\` in `name` are read as directory separators, so both
    /// `Blog::Post` and `Blog\Post` look for `Blog/Post`.
    pub fn resolve(&self, name: &str) -> Option<PathBuf> {
        let relative = relative_path(name)?;
        self.dirs.iter().map(|dir| dir.join(&relative)).find(|candidate| candidate.is_file())
    }

    /// Like [`Autoloader::resolve`] with an extension appended
    pub fn resolve_with_extension(&self, name: &str, extension: &str) -> Option<PathBuf> {
        let mut relative = relative_path(name)?;
        relative.set_extension(extension);
        self.dirs.iter().map(|dir| dir.join(&relative)).find(|candidate| candidate.is_file())
    }
}

fn relative_path(name: &str) -> Option<PathBuf> {
    let normalized = name.replace("::", "/").replace('\\', "/");
    let relative = Path::new(normalized.trim_start_matches('/'));
    if normalized.is_empty() || relative.components().any(|c| matches!(c, std::path::Component::ParentDir)) {
        return None;
    }
    Some(relative.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_scoped_order_and_dedup() {
        let loader = Autoloader::scoped(&[PathBuf::from("/a"), PathBuf::from("/b")], &[PathBuf::from("/b"), PathBuf::from("/c")]);
        assert_eq!(loader.dirs(), [PathBuf::from("/a"), PathBuf::from("/b"), PathBuf::from("/c")]);
    }

    #[test]
    fn test_first_match_wins() {
        let first = tempfile::tempdir().unwrap();
        let second = tempfile::tempdir().unwrap();
        fs::create_dir_all(first.path().join("Blog")).unwrap();
        fs::create_dir_all(second.path().join("Blog")).unwrap();
        fs::write(first.path().join("Blog/Post.rs"), "").unwrap();
        fs::write(second.path().join("Blog/Post.rs"), "").unwrap();
        fs::write(second.path().join("Blog/Tag.rs"), "").unwrap();

        let loader = Autoloader::new(vec![first.path().to_path_buf(), second.path().to_path_buf()]);
        assert_eq!(loader.resolve_with_extension("Blog::Post", "rs"), Some(first.path().join("Blog/Post.rs")));
        assert_eq!(loader.resolve("Blog\\Tag.rs"), Some(second.path().join("Blog/Tag.rs")));
        assert_eq!(loader.resolve("Blog/Missing.rs"), None);
    }

    #[test]
    fn test_parent_components_rejected() {
        let loader = Autoloader::new(vec![PathBuf::from("/srv")]);
        assert_eq!(loader.resolve("../etc/passwd"), None);
    }
}
