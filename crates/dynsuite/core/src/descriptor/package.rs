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

use super::{ApiDescriptor, BuildContext, NavGroupDescriptor, OverlayActionDescriptor, Resource, ResourceKind, ViewDescriptor};
use crate::error::{ConfigError, ConfigResult};
use crate::manifest::Fields;
use crate::paths::PathResolver;
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::warn;

pub const DEFAULT_AUTHOR: &str = "Unknown";
pub const DEFAULT_VERSION: &str = "0.0.0";
pub const DEFAULT_LICENSE: &str = "none";

/// Everything one package declares, validated and with paths resolved
#[derive(Debug, Clone)]
pub struct PackageDescriptor {
    package_id: String,
    name: String,
    author: String,
    version: String,
    description: String,
    license: String,
    autoload: Vec<PathBuf>,
    init: Vec<PathBuf>,
    js: Vec<String>,
    css: Vec<String>,
    apis: Vec<Arc<ApiDescriptor>>,
    views: Vec<Arc<ViewDescriptor>>,
    nav_groups: Vec<Arc<NavGroupDescriptor>>,
    overlay_actions: Vec<Arc<OverlayActionDescriptor>>,
    issues: Vec<String>,
}

impl PackageDescriptor {
    /// Build a descriptor from a raw manifest.
    ///
    /// Fails only when the manifest as a whole is unusable. A malformed
    /// resource list is dropped and a malformed nested item is skipped; both
    /// are logged and recorded in [`PackageDescriptor::issues`].
    pub fn from_manifest(package_id: &str, raw: &Value, resolver: &PathResolver) -> ConfigResult<Self> {
        validate_package_id(package_id)?;
        let fields = Fields::new(package_id, raw)?;

        let version = fields.string_or("version", DEFAULT_VERSION)?;
        let ctx = BuildContext {
            package_id,
            version: &version,
            resolver,
        };

        let mut package = Self {
            package_id: package_id.to_string(),
            name: fields.string_or("name", package_id)?,
            author: fields.string_or("author", DEFAULT_AUTHOR)?,
            description: fields.string_or("description", "")?,
            license: fields.string_or("license", DEFAULT_LICENSE)?,
            autoload: Vec::new(),
            init: Vec::new(),
            js: Vec::new(),
            css: Vec::new(),
            apis: Vec::new(),
            views: Vec::new(),
            nav_groups: Vec::new(),
            overlay_actions: Vec::new(),
            issues: Vec::new(),
            version: version.clone(),
        };

        package.autoload = package.lenient(fields.string_list("autoload").and_then(|l| ctx.server_paths(l)));
        package.init = package.lenient(fields.string_list("init").and_then(|l| ctx.server_paths(l)));
        package.js = package.lenient(fields.string_list("js").and_then(|l| ctx.client_paths(l, &version)));
        package.css = package.lenient(fields.string_list("css").and_then(|l| ctx.client_paths(l, &version)));

        for kind in ResourceKind::ALL {
            let items = match fields.object(kind.field()) {
                Ok(Some(items)) => items,
                Ok(None) => continue,
                Err(e) => {
                    package.record(e.to_string());
                    continue;
                }
            };

            for (item_id, item) in items {
                match Resource::build(kind, &ctx, item_id, item) {
                    Ok(resource) => package.push(resource),
                    Err(e) => package.record(format!("{}:{}: {}", package_id, item_id, e)),
                }
            }
        }

        Ok(package)
    }

    fn lenient<T>(&mut self, list: ConfigResult<Vec<T>>) -> Vec<T> {
        list.unwrap_or_else(|e| {
            self.record(e.to_string());
            Vec::new()
        })
    }

    fn record(&mut self, issue: String) {
        warn!("Package load issue: {}", issue);
        self.issues.push(issue);
    }

    fn push(&mut self, resource: Resource) {
        match resource {
            Resource::Api(api) => self.apis.push(Arc::new(api)),
            Resource::View(view) => self.views.push(Arc::new(view)),
            Resource::NavGroup(group) => self.nav_groups.push(Arc::new(group)),
            Resource::OverlayAction(action) => self.overlay_actions.push(Arc::new(action)),
        }
    }

    pub fn package_id(&self) -> &str {
        &self.package_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn author(&self) -> &str {
        &self.author
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn license(&self) -> &str {
        &self.license
    }

    pub fn autoload(&self) -> &[PathBuf] {
        &self.autoload
    }

    pub fn init(&self) -> &[PathBuf] {
        &self.init
    }

    pub fn js(&self) -> &[String] {
        &self.js
    }

    pub fn css(&self) -> &[String] {
        &self.css
    }

    pub fn apis(&self) -> &[Arc<ApiDescriptor>] {
        &self.apis
    }

    pub fn views(&self) -> &[Arc<ViewDescriptor>] {
        &self.views
    }

    pub fn nav_groups(&self) -> &[Arc<NavGroupDescriptor>] {
        &self.nav_groups
    }

    pub fn overlay_actions(&self) -> &[Arc<OverlayActionDescriptor>] {
        &self.overlay_actions
    }

    /// Problems hit while loading; each one cost a list or an item
    pub fn issues(&self) -> &[String] {
        &self.issues
    }
}

fn validate_package_id(package_id: &str) -> ConfigResult<()> {
    if package_id.is_empty() {
        return Err(ConfigError::EmptyPackageId);
    }
    if package_id.contains(['/', '\\']) || package_id == "." || package_id == ".." {
        return Err(ConfigError::InvalidPackageId {
            package_id: package_id.to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn resolver() -> PathResolver {
        PathResolver::new("/srv", "")
    }

    #[test]
    fn test_metadata_defaults() {
        let package = PackageDescriptor::from_manifest("blog", &json!({}), &resolver()).unwrap();
        assert_eq!(package.name(), "blog");
        assert_eq!(package.author(), DEFAULT_AUTHOR);
        assert_eq!(package.version(), DEFAULT_VERSION);
        assert_eq!(package.license(), DEFAULT_LICENSE);
        assert!(package.issues().is_empty());
    }

    #[test]
    fn test_assets_are_versioned() {
        let raw = json!({"version": "1.2.0", "css": ["css/blog.css"], "js": ["/vendor/lib.js?x=1"]});
        let package = PackageDescriptor::from_manifest("blog", &raw, &resolver()).unwrap();
        assert_eq!(package.css(), ["/packages/blog/css/blog.css?v=1.2.0"]);
        assert_eq!(package.js(), ["/vendor/lib.js?x=1&v=1.2.0"]);
    }

    #[test]
    fn test_bad_autoload_only_drops_autoload() {
        let raw = json!({
            "autoload": ["lib", 42],
            "init": ["init/boot"],
            "apis": {"ping": {"entry": "apis/ping", "public": true}},
            "views": {"/blog": {"entry": "views/blog"}}
        });
        let package = PackageDescriptor::from_manifest("blog", &raw, &resolver()).unwrap();

        assert!(package.autoload().is_empty());
        assert_eq!(package.init().len(), 1);
        assert_eq!(package.apis().len(), 1);
        assert_eq!(package.views().len(), 1);
        assert_eq!(package.issues().len(), 1);
        assert!(package.issues()[0].contains("autoload"));
    }

    #[test]
    fn test_bad_item_is_isolated() {
        let raw = json!({
            "apis": {
                "broken": {"post": ["a"]},
                "ok": {"entry": "apis/ok"}
            }
        });
        let package = PackageDescriptor::from_manifest("blog", &raw, &resolver()).unwrap();

        assert_eq!(package.apis().len(), 1);
        assert_eq!(package.apis()[0].api_id(), "ok");
        assert!(package.issues()[0].starts_with("blog:broken: "));
    }

    #[test]
    fn test_invalid_package_rejected() {
        assert!(PackageDescriptor::from_manifest("blog", &json!("nope"), &resolver()).is_err());
        assert!(PackageDescriptor::from_manifest("../etc", &json!({}), &resolver()).is_err());
        assert!(PackageDescriptor::from_manifest("blog", &json!({"version": 3}), &resolver()).is_err());
    }
}
