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

//! View rendering: permission gate, entry execution, document assembly

use crate::autoload::Autoloader;
use crate::descriptor::{ViewDescriptor, ViewEntry};
use crate::dispatcher::guarded;
use crate::error::DispatchError;
use crate::handler::{HandlerCatalog, InitContext, ViewContext};
use crate::registry::PackageRegistry;
use crate::session::{SessionGate, permits};
use crate::template::{Document, escape_html};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Characters left alone in the `ref` query value
const REF_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC.remove(b'/').remove(b'-').remove(b'_').remove(b'.').remove(b'~');

/// Site-wide values every document carries
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteSettings {
    pub title: String,
    pub meta_description: String,
    pub authentication_view: String,
    pub default_view: String,
    pub footer_text: String,
    pub footer_link: Option<String>,
}

impl Default for SiteSettings {
    fn default() -> Self {
        Self {
            title: "DynamicSuite".to_string(),
            meta_description: String::new(),
            authentication_view: "/login".to_string(),
            default_view: "/dashboard".to_string(),
            footer_text: "DynamicSuite".to_string(),
            footer_link: None,
        }
    }
}

/// Result of rendering one view
#[derive(Debug, Clone, PartialEq)]
pub enum ViewOutcome {
    Document(Document),
    /// Absolute URL to send the client to
    Redirect(String),
    ServerError,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NavItem {
    pub name: String,
    pub icon: Option<String>,
    pub path: String,
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NavGroup {
    pub name: String,
    pub icon: Option<String>,
    pub views: Vec<NavItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverlayAction {
    pub text: String,
    pub icon: Option<String>,
    pub href: String,
}

/// Per-request data handed to the front end as JSON
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClientData {
    pub title: String,
    pub site_title: String,
    pub view: String,
    pub package_id: String,
    pub version: String,
    pub nav: Vec<NavGroup>,
    pub overlay_actions: Vec<OverlayAction>,
    pub footer_text: String,
    pub footer_link: Option<String>,
    pub hide_nav: bool,
    pub hide_overlay: bool,
    pub session_active: bool,
}

pub struct ViewRenderer {
    catalog: Arc<HandlerCatalog>,
    settings: SiteSettings,
}

impl ViewRenderer {
    pub fn new(catalog: Arc<HandlerCatalog>, settings: SiteSettings) -> Self {
        Self { catalog, settings }
    }

    pub fn settings(&self) -> &SiteSettings {
        &self.settings
    }

    /// Render `view` for a request to `requested_path` (mount and query string included)
    pub async fn render(&self, registry: &PackageRegistry, view: &ViewDescriptor, requested_path: &str, session: &dyn SessionGate) -> ViewOutcome {
        let handler = match view.entry() {
            ViewEntry::Script(path) => match self.catalog.view(path) {
                Some(handler) => Some(handler),
                None => {
                    error!("View {} has no handler for entry {}", view.view_id(), path.display());
                    return ViewOutcome::ServerError;
                }
            },
            ViewEntry::Component(_) => None,
        };

        if !permits(session, view.is_public(), view.permissions()) {
            info!("Permission denied for view {}, redirecting to authentication", view.view_id());
            return ViewOutcome::Redirect(self.authentication_redirect(registry, requested_path));
        }

        let autoloader = Autoloader::scoped(view.autoload(), registry.autoload());
        let body = match self.execute(view, handler, requested_path, session, &autoloader).await {
            Ok(body) => body,
            Err(e) => {
                error!("View {} failed: {}", view.view_id(), e);
                return ViewOutcome::ServerError;
            }
        };

        let client_data = self.client_data(registry, view, session);
        ViewOutcome::Document(self.assemble(registry, view, body, &client_data))
    }

    async fn execute(
        &self,
        view: &ViewDescriptor,
        handler: Option<Arc<dyn crate::handler::ViewHandler>>,
        requested_path: &str,
        session: &dyn SessionGate,
        autoloader: &Autoloader,
    ) -> Result<String, DispatchError> {
        let inits = view
            .init()
            .iter()
            .map(|path| self.catalog.init(path).map(|h| (path, h)).ok_or_else(|| DispatchError::EntryNotFound(path.display().to_string())))
            .collect::<Result<Vec<_>, _>>()?;

        let init_ctx = InitContext {
            autoloader,
            session: Some(session),
        };
        for (path, init) in inits {
            guarded(path, init.init(&init_ctx)).await?;
        }

        match (view.entry(), handler) {
            (ViewEntry::Script(path), Some(handler)) => {
                let mut ctx = ViewContext::new(view, requested_path, session, autoloader);
                guarded(path, handler.render(&mut ctx)).await?;
                Ok(ctx.into_body())
            }
            (ViewEntry::Component(tag), _) => Ok(format!("<{tag}></{tag}>")),
            (ViewEntry::Script(path), None) => Err(DispatchError::EntryNotFound(path.display().to_string())),
        }
    }

    fn authentication_redirect(&self, registry: &PackageRegistry, requested_path: &str) -> String {
        let target = registry.resolver().mount_url(&self.settings.authentication_view);
        format!("{}?ref={}", target, utf8_percent_encode(requested_path, REF_ENCODE_SET))
    }

    /// Navigation, overlay and layout flags for `view` as `session` may see them
    pub fn client_data(&self, registry: &PackageRegistry, view: &ViewDescriptor, session: &dyn SessionGate) -> ClientData {
        let resolver = registry.resolver();

        let nav = registry
            .nav_groups()
            .filter(|group| permits(session, group.is_public(), group.permissions()))
            .filter_map(|group| {
                let views: Vec<NavItem> = registry
                    .views()
                    .filter(|v| v.nav_group() == Some(group.group_id()))
                    .filter(|v| permits(session, v.is_public(), v.permissions()))
                    .filter_map(|v| {
                        Some(NavItem {
                            name: v.nav_name()?.to_string(),
                            icon: v.nav_icon().map(str::to_string),
                            path: resolver.mount_url(v.view_id()),
                            active: v.view_id() == view.view_id(),
                        })
                    })
                    .collect();
                (!views.is_empty()).then(|| NavGroup {
                    name: group.name().to_string(),
                    icon: group.icon().map(str::to_string),
                    views,
                })
            })
            .collect();

        let overlay_actions = registry
            .overlay_actions()
            .filter(|action| permits(session, action.is_public(), action.permissions()))
            .map(|action| OverlayAction {
                text: action.text().to_string(),
                icon: action.icon().map(str::to_string),
                href: action.href().to_string(),
            })
            .collect();

        ClientData {
            title: self.page_title(view),
            site_title: self.settings.title.clone(),
            view: view.view_id().to_string(),
            package_id: view.package_id().to_string(),
            version: view.version().to_string(),
            nav,
            overlay_actions,
            footer_text: self.settings.footer_text.clone(),
            footer_link: self.settings.footer_link.clone(),
            hide_nav: view.hide_nav(),
            hide_overlay: view.hide_overlay(),
            session_active: session.is_active(),
        }
    }

    fn page_title(&self, view: &ViewDescriptor) -> String {
        view.title().or(view.nav_name()).map(str::to_string).unwrap_or_else(|| self.settings.title.clone())
    }

    fn assemble(&self, registry: &PackageRegistry, view: &ViewDescriptor, body: String, client_data: &ClientData) -> Document {
        let mut css: Vec<&str> = Vec::new();
        for href in registry.css().iter().chain(view.css()) {
            if !css.contains(&href.as_str()) {
                css.push(href.as_str());
            }
        }
        let mut js: Vec<&str> = Vec::new();
        for src in registry.js().iter().chain(view.js()) {
            if !js.contains(&src.as_str()) {
                js.push(src.as_str());
            }
        }

        let styles: String = css.iter().map(|href| format!(r#"<link rel="stylesheet" href="{}">"#, escape_html(href))).collect();
        let scripts: String = js.iter().map(|src| format!(r#"<script src="{}"></script>"#, escape_html(src))).collect();

        Document::new()
            .set("title", escape_html(&client_data.title))
            .set(
                "meta_description",
                escape_html(view.meta_description().unwrap_or(self.settings.meta_description.as_str())),
            )
            .set("body", body)
            .set("client_data", script_json(client_data))
            .set("styles", styles)
            .set("scripts", scripts)
    }

    /// The about page: framework version and every loaded package
    pub fn render_about(&self, registry: &PackageRegistry) -> Document {
        let rows: String = registry
            .packages()
            .map(|p| {
                format!(
                    "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
                    escape_html(p.name()),
                    escape_html(p.version()),
                    escape_html(p.author()),
                    escape_html(p.license()),
                    escape_html(p.description())
                )
            })
            .collect();

        let body = format!(
            "<h1>{}</h1><p>DynamicSuite {}</p><table><thead><tr><th>Package</th><th>Version</th><th>Author</th><th>License</th><th>Description</th></tr></thead><tbody>{}</tbody></table>",
            escape_html(&self.settings.title),
            env!("CARGO_PKG_VERSION"),
            rows
        );

        self.status_document("About", body)
    }

    /// A bare document for error pages
    pub fn render_error(&self, status: u16, reason: &str) -> Document {
        self.status_document(reason, format!("<h1>{}</h1><p>{}</p>", status, escape_html(reason)))
    }

    fn status_document(&self, title: &str, body: String) -> Document {
        let data = serde_json::json!({
            "title": title,
            "site_title": self.settings.title,
            "hide_nav": true,
            "hide_overlay": true,
        });
        Document::new()
            .set("title", escape_html(title))
            .set("meta_description", escape_html(&self.settings.meta_description))
            .set("body", body)
            .set("client_data", script_json(&data))
            .set("styles", String::new())
            .set("scripts", String::new())
    }
}

/// JSON safe to embed inside a `<script>` element
fn script_json<T: Serialize>(value: &T) -> String {
    match serde_json::to_string(value) {
        Ok(json) => json.replace('<', "\\u003c").replace('>', "\\u003e").replace('&', "\\u0026"),
        Err(e) => {
            warn!("Failed to encode client data: {}", e);
            "{}".to_string()
        }
    }
}
