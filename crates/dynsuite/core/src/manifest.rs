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

//! Package manifests and where they come from

use crate::error::{ConfigError, ConfigResult};
use crate::paths::PathResolver;
use serde_json::{Map, Value};
use std::fs;
use tracing::debug;

/// File name of the per-package manifest
pub const MANIFEST_FILE: &str = "package.json";

/// Supplies the installed package ids, in load order, and their manifests
pub trait PackageSource: Send + Sync {
    /// Package ids in the order they should be loaded
    fn package_ids(&self) -> ConfigResult<Vec<String>>;

    /// Raw manifest for one package
    fn manifest(&self, package_id: &str) -> ConfigResult<Value>;
}

/// Reads `<root>/packages/<id>/package.json` from disk
#[derive(Debug, Clone)]
pub struct DirectorySource {
    resolver: PathResolver,
    packages: Option<Vec<String>>,
}

impl DirectorySource {
    /// Discover every package directory, ordered by directory name
    pub fn new(resolver: PathResolver) -> Self {
        Self { resolver, packages: None }
    }

    /// Load exactly the listed packages, in the listed order
    pub fn with_packages(resolver: PathResolver, packages: Vec<String>) -> Self {
        Self {
            resolver,
            packages: Some(packages),
        }
    }
}

impl PackageSource for DirectorySource {
    fn package_ids(&self) -> ConfigResult<Vec<String>> {
        if let Some(packages) = &self.packages {
            return Ok(packages.clone());
        }

        let dir = self.resolver.root().join(crate::paths::PACKAGES_DIR);
        let entries = fs::read_dir(&dir).map_err(|e| ConfigError::Manifest {
            path: dir.display().to_string(),
            message: e.to_string(),
        })?;

        let mut ids: Vec<String> = entries
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.path().join(MANIFEST_FILE).is_file())
            .filter_map(|entry| entry.file_name().into_string().ok())
            .collect();
        ids.sort();

        debug!("Discovered {} packages in {}", ids.len(), dir.display());
        Ok(ids)
    }

    fn manifest(&self, package_id: &str) -> ConfigResult<Value> {
        let path = self.resolver.package_dir(package_id).join(MANIFEST_FILE);
        let text = fs::read_to_string(&path).map_err(|e| ConfigError::Manifest {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        serde_json::from_str(&text).map_err(|e| ConfigError::Manifest {
            path: path.display().to_string(),
            message: e.to_string(),
        })
    }
}

/// In-memory manifests, loaded in insertion order
#[derive(Debug, Clone, Default)]
pub struct StaticSource {
    manifests: Vec<(String, Value)>,
}

impl StaticSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, package_id: impl Into<String>, manifest: Value) -> Self {
        self.manifests.push((package_id.into(), manifest));
        self
    }
}

impl PackageSource for StaticSource {
    fn package_ids(&self) -> ConfigResult<Vec<String>> {
        Ok(self.manifests.iter().map(|(id, _)| id.clone()).collect())
    }

    fn manifest(&self, package_id: &str) -> ConfigResult<Value> {
        self.manifests
            .iter()
            .find(|(id, _)| id == package_id)
            .map(|(_, manifest)| manifest.clone())
            .ok_or_else(|| ConfigError::Manifest {
                path: package_id.to_string(),
                message: "no such package".to_string(),
            })
    }
}

/// Typed reads over one manifest object.
///
/// `scope` names the package (or `package:item`) in every error.
pub(crate) struct Fields<'a> {
    scope: &'a str,
    map: &'a Map<String, Value>,
}

impl<'a> Fields<'a> {
    pub(crate) fn new(scope: &'a str, value: &'a Value) -> ConfigResult<Self> {
        match value {
            Value::Object(map) => Ok(Self { scope, map }),
            _ => Err(ConfigError::NotAnObject {
                package_id: scope.to_string(),
            }),
        }
    }

    fn wrong_type(&self, field: &str, expected: &'static str) -> ConfigError {
        ConfigError::WrongType {
            package_id: self.scope.to_string(),
            field: field.to_string(),
            expected,
        }
    }

    pub(crate) fn string(&self, field: &str) -> ConfigResult<Option<String>> {
        match self.map.get(field) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.clone())),
            Some(_) => Err(self.wrong_type(field, "a string")),
        }
    }

    pub(crate) fn required_string(&self, field: &str) -> ConfigResult<String> {
        self.string(field)?.ok_or_else(|| ConfigError::MissingField {
            package_id: self.scope.to_string(),
            field: field.to_string(),
        })
    }

    pub(crate) fn string_or(&self, field: &str, default: &str) -> ConfigResult<String> {
        Ok(self.string(field)?.unwrap_or_else(|| default.to_string()))
    }

    pub(crate) fn bool_or(&self, field: &str, default: bool) -> ConfigResult<bool> {
        match self.map.get(field) {
            None | Some(Value::Null) => Ok(default),
            Some(Value::Bool(b)) => Ok(*b),
            Some(_) => Err(self.wrong_type(field, "a boolean")),
        }
    }

    /// A list whose every entry must be a string
    pub(crate) fn string_list(&self, field: &str) -> ConfigResult<Vec<String>> {
        let items = match self.map.get(field) {
            None | Some(Value::Null) => return Ok(Vec::new()),
            Some(Value::Array(items)) => items,
            Some(_) => return Err(self.wrong_type(field, "a list of strings")),
        };

        items
            .iter()
            .enumerate()
            .map(|(index, item)| match item {
                Value::String(s) => Ok(s.clone()),
                _ => Err(ConfigError::NonStringEntry {
                    package_id: self.scope.to_string(),
                    field: field.to_string(),
                    key: index.to_string(),
                }),
            })
            .collect()
    }

    /// A keyed map of nested records, in manifest order
    pub(crate) fn object(&self, field: &str) -> ConfigResult<Option<&'a Map<String, Value>>> {
        match self.map.get(field) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Object(map)) => Ok(Some(map)),
            Some(_) => Err(self.wrong_type(field, "an object")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_string_list_rejects_non_string_entry() {
        let raw = json!({"autoload": ["lib", 4, "src"]});
        let fields = Fields::new("blog", &raw).unwrap();
        let err = fields.string_list("autoload").unwrap_err();
        assert_eq!(
            err,
            ConfigError::NonStringEntry {
                package_id: "blog".to_string(),
                field: "autoload".to_string(),
                key: "1".to_string(),
            }
        );
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let raw = json!({});
        let fields = Fields::new("blog", &raw).unwrap();
        assert!(fields.string_list("init").unwrap().is_empty());
        assert!(!fields.bool_or("public", false).unwrap());
        assert_eq!(fields.string_or("license", "none").unwrap(), "none");
        assert!(fields.required_string("entry").is_err());
    }

    #[test]
    fn test_non_object_manifest() {
        let raw = json!(["not", "a", "map"]);
        assert!(matches!(Fields::new("blog", &raw), Err(ConfigError::NotAnObject { .. })));
    }

    #[test]
    fn test_directory_source_discovers_sorted_packages() {
        let dir = tempfile::tempdir().unwrap();
        for id in ["zeta", "alpha"] {
            let pkg = dir.path().join("packages").join(id);
            fs::create_dir_all(&pkg).unwrap();
            fs::write(pkg.join(MANIFEST_FILE), r#"{"name": "x"}"#).unwrap();
        }
        fs::create_dir_all(dir.path().join("packages").join("no-manifest")).unwrap();

        let source = DirectorySource::new(PathResolver::new(dir.path(), ""));
        assert_eq!(source.package_ids().unwrap(), vec!["alpha".to_string(), "zeta".to_string()]);
        assert_eq!(source.manifest("alpha").unwrap()["name"], "x");
        assert!(source.manifest("no-manifest").is_err());
    }

    #[test]
    fn test_static_source_order() {
        let source = StaticSource::new().with("b", json!({})).with("a", json!({}));
        assert_eq!(source.package_ids().unwrap(), vec!["b".to_string(), "a".to_string()]);
    }
}
