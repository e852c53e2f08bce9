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

//! Validated, read-only descriptors built from package manifests

mod api;
mod nav;
mod package;
mod view;

pub use api::ApiDescriptor;
pub use nav::{NavGroupDescriptor, OverlayActionDescriptor};
pub use package::PackageDescriptor;
pub use view::{COMPONENT_MARKER, ViewDescriptor, ViewEntry};

use crate::error::ConfigResult;
use crate::paths::PathResolver;
use serde_json::Value;
use std::path::PathBuf;

/// The closed set of nested resources a package manifest may declare
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Api,
    View,
    NavGroup,
    OverlayAction,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 4] = [ResourceKind::Api, ResourceKind::View, ResourceKind::NavGroup, ResourceKind::OverlayAction];

    /// Manifest key holding this kind of resource
    pub fn field(self) -> &'static str {
        match self {
            ResourceKind::Api => "apis",
            ResourceKind::View => "views",
            ResourceKind::NavGroup => "nav_groups",
            ResourceKind::OverlayAction => "overlay_actions",
        }
    }
}

/// Package-wide values nested descriptors inherit
pub(crate) struct BuildContext<'a> {
    pub package_id: &'a str,
    pub version: &'a str,
    pub resolver: &'a PathResolver,
}

impl BuildContext<'_> {
    pub(crate) fn server_paths(&self, paths: Vec<String>) -> ConfigResult<Vec<PathBuf>> {
        paths.iter().map(|p| self.resolver.format_server_path(self.package_id, p)).collect()
    }

    /// Client paths with the cache-busting version appended
    pub(crate) fn client_paths(&self, paths: Vec<String>, version: &str) -> ConfigResult<Vec<String>> {
        paths
            .iter()
            .map(|p| {
                let url = self.resolver.format_client_path(self.package_id, p)?;
                let sep = if url.contains('?') { '&' } else { '?' };
                Ok(format!("{}{}v={}", url, sep, version))
            })
            .collect()
    }
}

/// One nested resource, tagged by kind
#[derive(Debug, Clone)]
pub(crate) enum Resource {
    Api(ApiDescriptor),
    View(ViewDescriptor),
    NavGroup(NavGroupDescriptor),
    OverlayAction(OverlayActionDescriptor),
}

impl Resource {
    pub(crate) fn build(kind: ResourceKind, ctx: &BuildContext<'_>, item_id: &str, raw: &Value) -> ConfigResult<Self> {
        Ok(match kind {
            ResourceKind::Api => Resource::Api(ApiDescriptor::from_manifest(ctx, item_id, raw)?),
            ResourceKind::View => Resource::View(ViewDescriptor::from_manifest(ctx, item_id, raw)?),
            ResourceKind::NavGroup => Resource::NavGroup(NavGroupDescriptor::from_manifest(ctx, item_id, raw)?),
            ResourceKind::OverlayAction => Resource::OverlayAction(OverlayActionDescriptor::from_manifest(ctx, item_id, raw)?),
        })
    }
}
