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

//! Request classification
//!
//! Every inbound path ends in exactly one [`Route`]. Classification never
//! fails: anything unrecognized is logged and becomes [`Route::NotFound`].

use crate::descriptor::ViewDescriptor;
use crate::error::ConfigResult;
use crate::registry::PackageRegistry;
use std::sync::Arc;
use tracing::{debug, warn};

/// Reserved path of the about page
pub const ABOUT_PATH: &str = "/about";

/// Reserved prefix of API calls
pub const API_PREFIX: &str = "/api";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Endpoint {
    About,
    Api,
}

/// Where a request goes
#[derive(Debug, Clone, PartialEq)]
pub enum Route {
    About,
    View(Arc<ViewDescriptor>),
    Api { package_id: String, api_id: String },
    /// Absolute URL, mount included
    Redirect(String),
    NotFound,
}

/// Maps mount-relative paths to routes
pub struct RequestRouter {
    reserved: matchit::Router<Endpoint>,
    default_view: String,
}

impl RequestRouter {
    /// `default_view` is where the bare mount root redirects
    pub fn new(default_view: &str) -> ConfigResult<Self> {
        let mut reserved = matchit::Router::new();
        reserved.insert(ABOUT_PATH, Endpoint::About)?;
        reserved.insert(format!("{}/{{package_id}}/{{api_id}}", API_PREFIX), Endpoint::Api)?;

        Ok(Self {
            reserved,
            default_view: default_view.to_string(),
        })
    }

    /// Classify `path` (the full request path, mount included).
    ///
    /// Order: about page, registered views, the mount root, API calls.
    pub fn classify(&self, registry: &PackageRegistry, method: &str, path: &str) -> Route {
        let resolver = registry.resolver();
        let Some(relative) = resolver.strip_mount(path) else {
            warn!("Request outside mount {}: {}", resolver.mount(), path);
            return Route::NotFound;
        };
        let relative = trim_trailing_slash(relative);

        let matched = self.reserved.at(relative).ok();
        if let Some(m) = &matched {
            if *m.value == Endpoint::About {
                return Route::About;
            }
        }

        if let Some(view) = registry.view(relative) {
            debug!("Matched view {} from {}", view.view_id(), view.package_id());
            return Route::View(view.clone());
        }

        if relative == "/" {
            return Route::Redirect(resolver.mount_url(&self.default_view));
        }

        match matched {
            Some(m) if *m.value == Endpoint::Api => {
                if !method.eq_ignore_ascii_case("POST") {
                    warn!("API call with method {}: {}", method, path);
                    return Route::NotFound;
                }
                Route::Api {
                    package_id: m.params.get("package_id").unwrap_or_default().to_string(),
                    api_id: m.params.get("api_id").unwrap_or_default().to_string(),
                }
            }
            _ => {
                if relative == API_PREFIX || relative.starts_with(&format!("{}/", API_PREFIX)) {
                    warn!("Malformed API path: {}", path);
                } else {
                    warn!("No route for {} {}", method, path);
                }
                Route::NotFound
            }
        }
    }
}

fn trim_trailing_slash(path: &str) -> &str {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() { "/" } else { trimmed }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::paths::PathResolver;
    use serde_json::json;

    fn registry(mount: &str) -> PackageRegistry {
        let mut registry = PackageRegistry::new(PathResolver::new("/srv", mount));
        registry
            .add_manifest(
                "blog",
                &json!({"views": {
                    "/blog": {"entry": "views/blog", "public": true},
                    "/api/docs": {"entry": "views/docs", "public": true}
                }}),
            )
            .unwrap();
        registry
    }

    #[test]
    fn test_about_and_views() {
        let router = RequestRouter::new("/dashboard").unwrap();
        let registry = registry("");

        assert_eq!(router.classify(&registry, "GET", "/about"), Route::About);
        assert!(matches!(router.classify(&registry, "GET", "/blog/"), Route::View(v) if v.view_id() == "/blog"));
        assert!(matches!(router.classify(&registry, "GET", "/api/docs"), Route::View(_)));
    }

    #[test]
    fn test_api_routes() {
        let router = RequestRouter::new("/dashboard").unwrap();
        let registry = registry("/ds");

        assert_eq!(
            router.classify(&registry, "POST", "/ds/api/blog/save"),
            Route::Api {
                package_id: "blog".to_string(),
                api_id: "save".to_string()
            }
        );
        assert_eq!(router.classify(&registry, "GET", "/ds/api/blog/save"), Route::NotFound);
        assert_eq!(router.classify(&registry, "POST", "/ds/api/save"), Route::NotFound);
        assert_eq!(router.classify(&registry, "POST", "/ds/api/a/b/c"), Route::NotFound);
    }

    #[test]
    fn test_root_redirects_to_default_view() {
        let router = RequestRouter::new("/dashboard").unwrap();
        assert_eq!(router.classify(&registry("/ds"), "GET", "/ds"), Route::Redirect("/ds/dashboard".to_string()));
        assert_eq!(router.classify(&registry(""), "GET", "/"), Route::Redirect("/dashboard".to_string()));
    }

    #[test]
    fn test_unmatched_paths() {
        let router = RequestRouter::new("/dashboard").unwrap();
        assert_eq!(router.classify(&registry(""), "GET", "/does/not/exist"), Route::NotFound);
        assert_eq!(router.classify(&registry("/ds"), "GET", "/elsewhere/blog"), Route::NotFound);
    }
}
