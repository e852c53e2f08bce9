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

//! The package registry: every loaded package merged into flat lookup tables
//!
//! A registry is assembled once and then only read. Rebuilding (hot reload,
//! or caching disabled) produces a new registry that replaces the old one
//! through [`SharedRegistry::replace`]; requests already holding a snapshot
//! keep reading the registry they started with.

use crate::descriptor::{ApiDescriptor, NavGroupDescriptor, OverlayActionDescriptor, PackageDescriptor, ViewDescriptor};
use crate::error::{ConfigError, ConfigResult};
use crate::manifest::PackageSource;
use crate::paths::PathResolver;
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Keyed entries that keep first-insertion order; a later insert with the
/// same key replaces the value in place.
#[derive(Debug, Clone)]
struct Table<T> {
    order: Vec<String>,
    entries: HashMap<String, Arc<T>>,
}

impl<T> Default for Table<T> {
    fn default() -> Self {
        Self {
            order: Vec::new(),
            entries: HashMap::new(),
        }
    }
}

impl<T> Table<T> {
    fn insert(&mut self, key: &str, value: Arc<T>) -> Option<Arc<T>> {
        let previous = self.entries.insert(key.to_string(), value);
        if previous.is_none() {
            self.order.push(key.to_string());
        }
        previous
    }

    fn get(&self, key: &str) -> Option<&Arc<T>> {
        self.entries.get(key)
    }

    fn iter(&self) -> impl Iterator<Item = &Arc<T>> {
        self.order.iter().filter_map(|key| self.entries.get(key))
    }

    fn len(&self) -> usize {
        self.order.len()
    }
}

/// Append-if-absent, first-seen order
fn merge_list<T: PartialEq + Clone>(target: &mut Vec<T>, items: &[T]) {
    for item in items {
        if !target.contains(item) {
            target.push(item.clone());
        }
    }
}

/// All loaded packages and their flattened resources
#[derive(Debug, Clone)]
pub struct PackageRegistry {
    resolver: PathResolver,
    packages: Table<PackageDescriptor>,
    apis: HashMap<String, HashMap<String, Arc<ApiDescriptor>>>,
    views: Table<ViewDescriptor>,
    nav_groups: Table<NavGroupDescriptor>,
    overlay_actions: Table<OverlayActionDescriptor>,
    autoload: Vec<PathBuf>,
    init: Vec<PathBuf>,
    js: Vec<String>,
    css: Vec<String>,
}

impl PackageRegistry {
    /// An empty registry
    pub fn new(resolver: PathResolver) -> Self {
        Self {
            resolver,
            packages: Table::default(),
            apis: HashMap::new(),
            views: Table::default(),
            nav_groups: Table::default(),
            overlay_actions: Table::default(),
            autoload: Vec::new(),
            init: Vec::new(),
            js: Vec::new(),
            css: Vec::new(),
        }
    }

    /// Load every package the source lists, in order.
    ///
    /// A package whose manifest cannot be read or whose descriptor fails to
    /// build is logged and skipped; the rest still load.
    pub fn load(source: &dyn PackageSource, resolver: PathResolver) -> Self {
        let mut registry = Self::new(resolver);

        let package_ids = match source.package_ids() {
            Ok(ids) => ids,
            Err(e) => {
                error!("Failed to list packages: {}", e);
                return registry;
            }
        };

        for package_id in package_ids {
            let loaded = source.manifest(&package_id).and_then(|raw| registry.add_manifest(&package_id, &raw));
            if let Err(e) = loaded {
                error!("Skipping package {}: {}", package_id, e);
            }
        }

        info!(
            "Loaded {} packages ({} views, {} apis)",
            registry.packages.len(),
            registry.views.len(),
            registry.apis.values().map(HashMap::len).sum::<usize>()
        );
        registry
    }

    /// Build a descriptor from a raw manifest and merge it
    pub fn add_manifest(&mut self, package_id: &str, raw: &Value) -> ConfigResult<()> {
        let package = PackageDescriptor::from_manifest(package_id, raw, &self.resolver)?;
        self.add_package(package)
    }

    /// Merge a descriptor into the flat tables.
    ///
    /// Lists are deduplicated keeping first-seen order. Keyed entries follow
    /// "last loaded wins": a later package declaring the same view path,
    /// `(package_id, api_id)`, nav group or overlay action replaces the
    /// earlier one.
    pub fn add_package(&mut self, package: PackageDescriptor) -> ConfigResult<()> {
        let package_id = package.package_id().to_string();
        if self.packages.get(&package_id).is_some() {
            return Err(ConfigError::DuplicatePackage { package_id });
        }

        merge_list(&mut self.autoload, package.autoload());
        merge_list(&mut self.init, package.init());
        merge_list(&mut self.js, package.js());
        merge_list(&mut self.css, package.css());

        let apis = self.apis.entry(package_id.clone()).or_default();
        for api in package.apis() {
            if apis.insert(api.api_id().to_string(), api.clone()).is_some() {
                warn!("API {} declared twice, last declaration wins", api.key());
            }
        }

        for view in package.views() {
            if let Some(previous) = self.views.insert(view.view_id(), view.clone()) {
                warn!("View {} from {} replaced by {}", view.view_id(), previous.package_id(), package_id);
            }
        }

        for group in package.nav_groups() {
            if let Some(previous) = self.nav_groups.insert(group.group_id(), group.clone()) {
                warn!("Nav group {} from {} replaced by {}", group.group_id(), previous.package_id(), package_id);
            }
        }

        for action in package.overlay_actions() {
            if let Some(previous) = self.overlay_actions.insert(action.action_id(), action.clone()) {
                warn!("Overlay action {} from {} replaced by {}", action.action_id(), previous.package_id(), package_id);
            }
        }

        self.packages.insert(&package_id, Arc::new(package));
        Ok(())
    }

    pub fn resolver(&self) -> &PathResolver {
        &self.resolver
    }

    pub fn package(&self, package_id: &str) -> Option<&PackageDescriptor> {
        self.packages.get(package_id).map(Arc::as_ref)
    }

    /// Packages in load order
    pub fn packages(&self) -> impl Iterator<Item = &PackageDescriptor> {
        self.packages.iter().map(Arc::as_ref)
    }

    pub fn api(&self, package_id: &str, api_id: &str) -> Option<&Arc<ApiDescriptor>> {
        self.apis.get(package_id)?.get(api_id)
    }

    pub fn view(&self, path: &str) -> Option<&Arc<ViewDescriptor>> {
        self.views.get(path)
    }

    /// Views in first-registration order
    pub fn views(&self) -> impl Iterator<Item = &Arc<ViewDescriptor>> {
        self.views.iter()
    }

    pub fn nav_groups(&self) -> impl Iterator<Item = &Arc<NavGroupDescriptor>> {
        self.nav_groups.iter()
    }

    pub fn overlay_actions(&self) -> impl Iterator<Item = &Arc<OverlayActionDescriptor>> {
        self.overlay_actions.iter()
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
}

/// Process-wide handle to the current registry
#[derive(Debug)]
pub struct SharedRegistry {
    current: RwLock<Arc<PackageRegistry>>,
}

impl SharedRegistry {
    pub fn new(registry: PackageRegistry) -> Self {
        Self {
            current: RwLock::new(Arc::new(registry)),
        }
    }

    /// The registry in effect right now; stays valid after a swap
    pub fn snapshot(&self) -> Arc<PackageRegistry> {
        self.current.read().clone()
    }

    /// Swap in a freshly built registry, returning the previous one
    pub fn replace(&self, registry: PackageRegistry) -> Arc<PackageRegistry> {
        std::mem::replace(&mut *self.current.write(), Arc::new(registry))
    }
}
