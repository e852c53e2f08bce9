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
use crate::error::{ConfigError, ConfigResult};
use crate::manifest::Fields;
use serde_json::Value;
use std::path::{Path, PathBuf};

/// Entry prefix marking a view rendered by a front-end component
pub const COMPONENT_MARKER: &str = "component:";

/// What a view executes to produce its body
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewEntry {
    /// Server path of a registered view handler
    Script(PathBuf),
    /// Custom element rendered client side
    Component(String),
}

/// A routable page bound to a URL path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewDescriptor {
    view_id: String,
    package_id: String,
    entry: ViewEntry,
    title: Option<String>,
    meta_description: Option<String>,
    permissions: Vec<String>,
    public: bool,
    hide_overlay: bool,
    hide_nav: bool,
    nav_group: Option<String>,
    nav_name: Option<String>,
    nav_icon: Option<String>,
    autoload: Vec<PathBuf>,
    init: Vec<PathBuf>,
    js: Vec<String>,
    css: Vec<String>,
    version: String,
}

impl ViewDescriptor {
    pub(crate) fn from_manifest(ctx: &BuildContext<'_>, view_id: &str, raw: &Value) -> ConfigResult<Self> {
        if !view_id.starts_with('/') {
            return Err(ConfigError::InvalidViewPath {
                package_id: ctx.package_id.to_string(),
                view_id: view_id.to_string(),
            });
        }

        let fields = Fields::new(ctx.package_id, raw)?;
        let entry = fields.required_string("entry")?;
        let entry = match entry.strip_prefix(COMPONENT_MARKER) {
            Some(tag) if !tag.trim().is_empty() => ViewEntry::Component(tag.trim().to_string()),
            Some(_) => {
                return Err(ConfigError::WrongType {
                    package_id: ctx.package_id.to_string(),
                    field: "entry".to_string(),
                    expected: "a component tag after 'component:'",
                });
            }
            None => ViewEntry::Script(ctx.resolver.format_server_path(ctx.package_id, &entry)?),
        };
        let version = fields.string_or("version", ctx.version)?;

        Ok(Self {
            view_id: normalize_view_path(view_id),
            package_id: ctx.package_id.to_string(),
            entry,
            title: fields.string("title")?,
            meta_description: fields.string("meta_description")?,
            permissions: fields.string_list("permissions")?,
            public: fields.bool_or("public", false)?,
            hide_overlay: fields.bool_or("hide_overlay", false)?,
            hide_nav: fields.bool_or("hide_nav", false)?,
            nav_group: fields.string("nav_group")?,
            nav_name: fields.string("nav_name")?,
            nav_icon: fields.string("nav_icon")?,
            autoload: ctx.server_paths(fields.string_list("autoload")?)?,
            init: ctx.server_paths(fields.string_list("init")?)?,
            js: ctx.client_paths(fields.string_list("js")?, &version)?,
            css: ctx.client_paths(fields.string_list("css")?, &version)?,
            version,
        })
    }

    /// URL path, relative to the mount
    pub fn view_id(&self) -> &str {
        &self.view_id
    }

    pub fn package_id(&self) -> &str {
        &self.package_id
    }

    pub fn entry(&self) -> &ViewEntry {
        &self.entry
    }

    /// Display form of the entry for log lines
    pub fn entry_label(&self) -> String {
        match &self.entry {
            ViewEntry::Script(path) => path.display().to_string(),
            ViewEntry::Component(tag) => format!("{}{}", COMPONENT_MARKER, tag),
        }
    }

    pub fn script(&self) -> Option<&Path> {
        match &self.entry {
            ViewEntry::Script(path) => Some(path),
            ViewEntry::Component(_) => None,
        }
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn meta_description(&self) -> Option<&str> {
        self.meta_description.as_deref()
    }

    pub fn permissions(&self) -> &[String] {
        &self.permissions
    }

    pub fn is_public(&self) -> bool {
        self.public
    }

    pub fn hide_overlay(&self) -> bool {
        self.hide_overlay
    }

    pub fn hide_nav(&self) -> bool {
        self.hide_nav
    }

    pub fn nav_group(&self) -> Option<&str> {
        self.nav_group.as_deref()
    }

    pub fn nav_name(&self) -> Option<&str> {
        self.nav_name.as_deref()
    }

    pub fn nav_icon(&self) -> Option<&str> {
        self.nav_icon.as_deref()
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

    pub fn version(&self) -> &str {
        &self.version
    }
}

/// `/a/b/` and `/a/b` name the same view
pub(crate) fn normalize_view_path(path: &str) -> String {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() { "/".to_string() } else { trimmed.to_string() }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::paths::PathResolver;
    use serde_json::json;

    fn ctx(resolver: &PathResolver) -> BuildContext<'_> {
        BuildContext {
            package_id: "blog",
            version: "2.1.0",
            resolver,
        }
    }

    #[test]
    fn test_script_view() {
        let resolver = PathResolver::new("/srv", "/ds");
        let raw = json!({
            "entry": "views/posts",
            "title": "Posts",
            "nav_group": "content",
            "nav_name": "Posts",
            "js": ["js/posts.js"]
        });
        let view = ViewDescriptor::from_manifest(&ctx(&resolver), "/blog/posts/", &raw).unwrap();

        assert_eq!(view.view_id(), "/blog/posts");
        assert_eq!(view.script(), Some(Path::new("/srv/packages/blog/views/posts")));
        assert_eq!(view.js(), ["/ds/packages/blog/js/posts.js?v=2.1.0"]);
        assert_eq!(view.version(), "2.1.0");
        assert_eq!(view.nav_group(), Some("content"));
    }

    #[test]
    fn test_component_view() {
        let resolver = PathResolver::new("/srv", "");
        let raw = json!({"entry": "component:blog-editor", "version": "9"});
        let view = ViewDescriptor::from_manifest(&ctx(&resolver), "/blog/edit", &raw).unwrap();

        assert_eq!(view.entry(), &ViewEntry::Component("blog-editor".to_string()));
        assert_eq!(view.entry_label(), "component:blog-editor");
        assert_eq!(view.version(), "9");
        assert!(view.script().is_none());
    }

    #[test]
    fn test_view_path_must_be_absolute() {
        let resolver = PathResolver::new("/srv", "");
        let err = ViewDescriptor::from_manifest(&ctx(&resolver), "posts", &json!({"entry": "x"})).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidViewPath { .. }));
    }

    #[test]
    fn test_empty_component_tag_rejected() {
        let resolver = PathResolver::new("/srv", "");
        assert!(ViewDescriptor::from_manifest(&ctx(&resolver), "/x", &json!({"entry": "component:"})).is_err());
    }
}
