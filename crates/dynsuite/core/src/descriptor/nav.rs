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

use super::BuildContext;
use crate::error::ConfigResult;
use crate::manifest::Fields;
use serde_json::Value;

/// A navigation group views attach themselves to via `nav_group`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavGroupDescriptor {
    group_id: String,
    package_id: String,
    name: String,
    icon: Option<String>,
    public: bool,
    permissions: Vec<String>,
}

impl NavGroupDescriptor {
    pub(crate) fn from_manifest(ctx: &BuildContext<'_>, group_id: &str, raw: &Value) -> ConfigResult<Self> {
        let fields = Fields::new(ctx.package_id, raw)?;
        Ok(Self {
            group_id: group_id.to_string(),
            package_id: ctx.package_id.to_string(),
            name: fields.string_or("name", group_id)?,
            icon: fields.string("icon")?,
            public: fields.bool_or("public", false)?,
            permissions: fields.string_list("permissions")?,
        })
    }

    pub fn group_id(&self) -> &str {
        &self.group_id
    }

    pub fn package_id(&self) -> &str {
        &self.package_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn icon(&self) -> Option<&str> {
        self.icon.as_deref()
    }

    pub fn is_public(&self) -> bool {
        self.public
    }

    pub fn permissions(&self) -> &[String] {
        &self.permissions
    }
}

/// A link shown in the overlay (user menu) of every page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverlayActionDescriptor {
    action_id: String,
    package_id: String,
    text: String,
    icon: Option<String>,
    href: String,
    public: bool,
    permissions: Vec<String>,
}

impl OverlayActionDescriptor {
    pub(crate) fn from_manifest(ctx: &BuildContext<'_>, action_id: &str, raw: &Value) -> ConfigResult<Self> {
        let fields = Fields::new(ctx.package_id, raw)?;
        let href = fields.required_string("href")?;
        Ok(Self {
            action_id: action_id.to_string(),
            package_id: ctx.package_id.to_string(),
            text: fields.string_or("text", action_id)?,
            icon: fields.string("icon")?,
            href: client_href(ctx, &href)?,
            public: fields.bool_or("public", false)?,
            permissions: fields.string_list("permissions")?,
        })
    }

    pub fn action_id(&self) -> &str {
        &self.action_id
    }

    pub fn package_id(&self) -> &str {
        &self.package_id
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn icon(&self) -> Option<&str> {
        self.icon.as_deref()
    }

    pub fn href(&self) -> &str {
        &self.href
    }

    pub fn is_public(&self) -> bool {
        self.public
    }

    pub fn permissions(&self) -> &[String] {
        &self.permissions
    }
}

/// Root-relative hrefs are application paths and get the mount; relative
/// ones point into the package's client files. Absolute URLs pass through.
fn client_href(ctx: &BuildContext<'_>, href: &str) -> ConfigResult<String> {
    if href.contains("://") || href.starts_with("//") {
        Ok(href.to_string())
    } else if href.starts_with('/') {
        Ok(ctx.resolver.mount_url(href))
    } else {
        ctx.resolver.format_client_path(ctx.package_id, href)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::paths::PathResolver;
    use serde_json::json;

    #[test]
    fn test_nav_group_name_defaults_to_id() {
        let resolver = PathResolver::new("/srv", "");
        let ctx = BuildContext {
            package_id: "blog",
            version: "1",
            resolver: &resolver,
        };
        let group = NavGroupDescriptor::from_manifest(&ctx, "content", &json!({"icon": "fa-book"})).unwrap();
        assert_eq!(group.name(), "content");
        assert_eq!(group.icon(), Some("fa-book"));
    }

    #[test]
    fn test_overlay_action_requires_href() {
        let resolver = PathResolver::new("/srv", "");
        let ctx = BuildContext {
            package_id: "account",
            version: "1",
            resolver: &resolver,
        };
        assert!(OverlayActionDescriptor::from_manifest(&ctx, "logout", &json!({"text": "Log out"})).is_err());

        let action = OverlayActionDescriptor::from_manifest(&ctx, "logout", &json!({"href": "/logout", "public": true})).unwrap();
        assert_eq!(action.href(), "/logout");
        assert_eq!(action.text(), "logout");
        assert!(action.is_public());
    }

    #[test]
    fn test_overlay_href_under_mount() {
        let resolver = PathResolver::new("/srv", "/ds");
        let ctx = BuildContext {
            package_id: "account",
            version: "1",
            resolver: &resolver,
        };
        let href = |raw: &str| OverlayActionDescriptor::from_manifest(&ctx, "a", &json!({"href": raw})).unwrap().href().to_string();

        assert_eq!(href("/about"), "/ds/about");
        assert_eq!(href("docs/index.html"), "/ds/packages/account/docs/index.html");
        assert_eq!(href("https://example.com/help"), "https://example.com/help");
    }
}
