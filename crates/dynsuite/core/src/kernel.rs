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

//! The request pipeline: registry, router, dispatcher and renderer wired together

use crate::autoload::Autoloader;
use crate::dispatcher::{ApiDispatcher, guarded};
use crate::error::ConfigResult;
use crate::handler::{HandlerCatalog, InitContext};
use crate::manifest::PackageSource;
use crate::registry::{PackageRegistry, SharedRegistry};
use crate::renderer::{SiteSettings, ViewOutcome, ViewRenderer};
use crate::response::{Request, Response};
use crate::router::{RequestRouter, Route};
use crate::session::SessionGate;
use crate::template::{Document, Template};
use std::sync::Arc;
use tracing::{debug, error, warn};

/// What the transport should send back
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// API result, always HTTP 200
    Json(Response),
    Html { status: u16, body: String },
    Redirect(String),
}

impl Outcome {
    pub fn status(&self) -> u16 {
        match self {
            Outcome::Json(_) => 200,
            Outcome::Html { status, .. } => *status,
            Outcome::Redirect(_) => 302,
        }
    }
}

pub struct Kernel {
    registry: SharedRegistry,
    source: Arc<dyn PackageSource>,
    catalog: Arc<HandlerCatalog>,
    router: RequestRouter,
    dispatcher: ApiDispatcher,
    renderer: ViewRenderer,
    template: Template,
    cache_registry: bool,
}

impl Kernel {
    /// Wire up a kernel. The registry starts empty until [`Kernel::reload`].
    ///
    /// With `cache_registry` off, every request rebuilds the registry first.
    pub fn new(
        source: Arc<dyn PackageSource>,
        catalog: HandlerCatalog,
        settings: SiteSettings,
        template: Template,
        cache_registry: bool,
    ) -> ConfigResult<Self> {
        let catalog = Arc::new(catalog);
        let router = RequestRouter::new(&settings.default_view)?;
        Ok(Self {
            registry: SharedRegistry::new(PackageRegistry::new(catalog.resolver().clone())),
            source,
            router,
            dispatcher: ApiDispatcher::new(catalog.clone()),
            renderer: ViewRenderer::new(catalog.clone(), settings),
            catalog,
            template,
            cache_registry,
        })
    }

    /// The registry requests currently read
    pub fn registry(&self) -> Arc<PackageRegistry> {
        self.registry.snapshot()
    }

    pub fn settings(&self) -> &SiteSettings {
        self.renderer.settings()
    }

    /// Build a fresh registry, run its init entries and swap it in
    pub async fn reload(&self) -> Arc<PackageRegistry> {
        let registry = PackageRegistry::load(self.source.as_ref(), self.catalog.resolver().clone());
        self.run_registry_init(&registry).await;
        self.registry.replace(registry);
        self.registry.snapshot()
    }

    async fn run_registry_init(&self, registry: &PackageRegistry) {
        let autoloader = Autoloader::new(registry.autoload().to_vec());
        let ctx = InitContext {
            autoloader: &autoloader,
            session: None,
        };
        for path in registry.init() {
            match self.catalog.init(path) {
                Some(handler) => {
                    if let Err(e) = guarded(path, handler.init(&ctx)).await {
                        error!("Registry init failed: {}", e);
                    }
                }
                None => warn!("No init handler registered for {}", path.display()),
            }
        }
    }

    /// Serve one request.
    ///
    /// `target` is the request path with the mount and any query string. Only
    /// the path is routed; the query travels with it into the `ref` of an
    /// authentication redirect.
    pub async fn handle(&self, method: &str, target: &str, body: &[u8], session: &dyn SessionGate) -> Outcome {
        let registry = if self.cache_registry { self.registry.snapshot() } else { self.reload().await };
        let path = target.split_once('?').map_or(target, |(path, _)| path);

        match self.router.classify(&registry, method, path) {
            Route::About => self.html(200, &self.renderer.render_about(&registry)),
            Route::View(view) => match self.renderer.render(&registry, &view, target, session).await {
                ViewOutcome::Document(document) => self.html(200, &document),
                ViewOutcome::Redirect(url) => Outcome::Redirect(url),
                ViewOutcome::ServerError => self.error_page(500, "Internal Server Error"),
            },
            Route::Api { package_id, api_id } => {
                let request = Request::from_body(package_id, api_id, body);
                Outcome::Json(self.dispatcher.call(&registry, &request, session).await)
            }
            Route::Redirect(url) => {
                debug!("Redirecting {} to {}", path, url);
                Outcome::Redirect(url)
            }
            Route::NotFound => self.error_page(404, "Not Found"),
        }
    }

    /// A rendered error document with `status`
    pub fn error_page(&self, status: u16, reason: &str) -> Outcome {
        self.html(status, &self.renderer.render_error(status, reason))
    }

    fn html(&self, status: u16, document: &Document) -> Outcome {
        Outcome::Html {
            status,
            body: self.template.render(document),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::{api_fn, init_fn};
    use crate::manifest::StaticSource;
    use crate::paths::PathResolver;
    use crate::session::Session;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn kernel(cache_registry: bool, boots: Arc<AtomicUsize>) -> Kernel {
        let source = StaticSource::new().with(
            "core",
            json!({
                "init": ["boot"],
                "apis": {"ping": {"entry": "ping", "public": true}}
            }),
        );
        let mut catalog = HandlerCatalog::new(PathResolver::new("/srv", ""));
        catalog
            .register_api("core", "ping", api_fn(|_ctx| Ok(json!({"status": "OK", "message": "pong"}))))
            .unwrap()
            .register_init(
                "core",
                "boot",
                init_fn(move |ctx| {
                    assert!(ctx.session.is_none());
                    boots.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                }),
            )
            .unwrap();
        Kernel::new(Arc::new(source), catalog, SiteSettings::default(), Template::default(), cache_registry).unwrap()
    }

    #[tokio::test]
    async fn test_cached_registry_initializes_once() {
        let boots = Arc::new(AtomicUsize::new(0));
        let kernel = kernel(true, boots.clone());
        kernel.reload().await;

        for _ in 0..3 {
            let outcome = kernel.handle("POST", "/api/core/ping", b"{}", &Session::anonymous()).await;
            assert!(matches!(outcome, Outcome::Json(ref r) if r.message == "pong"));
        }
        assert_eq!(boots.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_uncached_registry_rebuilds_per_request() {
        let boots = Arc::new(AtomicUsize::new(0));
        let kernel = kernel(false, boots.clone());

        kernel.handle("POST", "/api/core/ping", b"{}", &Session::anonymous()).await;
        kernel.handle("POST", "/api/core/ping", b"{}", &Session::anonymous()).await;
        assert_eq!(boots.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_error_pages_and_redirects() {
        let kernel = kernel(true, Arc::new(AtomicUsize::new(0)));
        kernel.reload().await;
        let session = Session::anonymous();

        let outcome = kernel.handle("GET", "/nowhere", b"", &session).await;
        assert_eq!(outcome.status(), 404);

        let outcome = kernel.handle("GET", "/", b"", &session).await;
        assert_eq!(outcome, Outcome::Redirect("/dashboard".to_string()));

        let outcome = kernel.handle("GET", "/?from=bookmark", b"", &session).await;
        assert_eq!(outcome, Outcome::Redirect("/dashboard".to_string()));

        let Outcome::Html { status, body } = kernel.handle("GET", "/about", b"", &session).await else {
            panic!("expected the about page");
        };
        assert_eq!(status, 200);
        assert!(body.contains("<td>core</td>"));
    }
}
