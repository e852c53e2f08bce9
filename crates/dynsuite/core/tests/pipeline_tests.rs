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

use dynsuite_core::{DirectorySource, HandlerCatalog, Kernel, Outcome, PathResolver, Response, Session, SiteSettings, Template, api_fn, view_fn};
use serde_json::{Value, json};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

fn install(root: &Path, package_id: &str, manifest: Value) {
    let dir = root.join("packages").join(package_id);
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join("package.json"), serde_json::to_string_pretty(&manifest).unwrap()).unwrap();
}

fn catalog(resolver: &PathResolver) -> HandlerCatalog {
    let mut catalog = HandlerCatalog::new(resolver.clone());
    catalog
        .register_api("tools", "apis/ping", api_fn(|_ctx| Ok(Response::new("OK", "pong", Value::Null).into())))
        .unwrap()
        .register_api(
            "tools",
            "apis/greet",
            api_fn(|ctx| {
                let name = ctx.request.get("name").and_then(Value::as_str).unwrap_or_default();
                Ok(json!({"status": "OK", "message": format!("hello {}", name)}))
            }),
        )
        .unwrap()
        .register_view(
            "tools",
            "views/dashboard",
            view_fn(|ctx| {
                ctx.write("dashboard");
                Ok(())
            }),
        )
        .unwrap()
        .register_view(
            "tools",
            "views/shared",
            view_fn(|ctx| {
                ctx.write("from tools");
                Ok(())
            }),
        )
        .unwrap()
        .register_view(
            "zeta",
            "views/shared",
            view_fn(|ctx| {
                ctx.write("from zeta");
                Ok(())
            }),
        )
        .unwrap();
    catalog
}

async fn kernel(root: &TempDir, mount: &str) -> Kernel {
    install(
        root.path(),
        "tools",
        json!({
            "name": "Tools",
            "version": "2.1.0",
            "autoload": "lib",
            "apis": {
                "ping": {"entry": "apis/ping", "public": true},
                "greet": {"entry": "apis/greet", "post": ["name"], "public": true}
            },
            "views": {
                "/dashboard": {"entry": "views/dashboard", "permissions": ["tools:view"]},
                "/shared": {"entry": "views/shared", "public": true}
            }
        }),
    );
    install(
        root.path(),
        "zeta",
        json!({"views": {"/shared": {"entry": "views/shared", "public": true}}}),
    );

    let resolver = PathResolver::new(root.path(), mount);
    let source = DirectorySource::new(resolver.clone());
    let kernel = Kernel::new(Arc::new(source), catalog(&resolver), SiteSettings::default(), Template::default(), true).unwrap();
    kernel.reload().await;
    kernel
}

#[tokio::test]
async fn test_ping() {
    let root = TempDir::new().unwrap();
    let kernel = kernel(&root, "").await;

    let Outcome::Json(response) = kernel.handle("POST", "/api/tools/ping", b"{}", &Session::anonymous()).await else {
        panic!("expected JSON");
    };
    assert_eq!(serde_json::to_value(&response).unwrap(), json!({"status": "OK", "message": "pong", "data": null}));
}

#[tokio::test]
async fn test_missing_post_key_answers_empty() {
    let root = TempDir::new().unwrap();
    let kernel = kernel(&root, "").await;
    let session = Session::anonymous();

    let outcome = kernel.handle("POST", "/api/tools/greet", b"{}", &session).await;
    assert_eq!(outcome, Outcome::Json(Response::empty()));

    let outcome = kernel.handle("POST", "/api/tools/greet", br#"{"name": "Ada"}"#, &session).await;
    assert!(matches!(outcome, Outcome::Json(ref r) if r.message == "hello Ada"));
}

#[tokio::test]
async fn test_unparsable_body_is_treated_as_empty() {
    let root = TempDir::new().unwrap();
    let kernel = kernel(&root, "").await;

    let outcome = kernel.handle("POST", "/api/tools/ping", b"not json", &Session::anonymous()).await;
    assert!(matches!(outcome, Outcome::Json(ref r) if r.message == "pong"));
}

#[tokio::test]
async fn test_private_view_redirects_to_authentication() {
    let root = TempDir::new().unwrap();
    let kernel = kernel(&root, "/ds").await;

    let outcome = kernel.handle("GET", "/ds/dashboard", b"", &Session::anonymous()).await;
    assert_eq!(outcome, Outcome::Redirect("/ds/login?ref=/ds/dashboard".to_string()));

    let outcome = kernel.handle("GET", "/ds/dashboard", b"", &Session::authenticated("ada", ["tools:view"])).await;
    assert!(matches!(outcome, Outcome::Html { status: 200, ref body } if body.contains("dashboard")));
}

#[tokio::test]
async fn test_unknown_path_is_not_found() {
    let root = TempDir::new().unwrap();
    let kernel = kernel(&root, "").await;

    let outcome = kernel.handle("GET", "/does/not/exist", b"", &Session::anonymous()).await;
    assert_eq!(outcome.status(), 404);
}

#[tokio::test]
async fn test_malformed_autoload_only_drops_that_field() {
    let root = TempDir::new().unwrap();
    let kernel = kernel(&root, "").await;
    let registry = kernel.registry();

    let tools = registry.package("tools").unwrap();
    assert!(tools.autoload().is_empty());
    assert_eq!(tools.version(), "2.1.0");
    assert_eq!(tools.apis().len(), 2);
    assert!(!tools.issues().is_empty());
}

#[tokio::test]
async fn test_colliding_views_last_loaded_wins() {
    let root = TempDir::new().unwrap();
    let kernel = kernel(&root, "").await;

    let Outcome::Html { status, body } = kernel.handle("GET", "/shared", b"", &Session::anonymous()).await else {
        panic!("expected a document");
    };
    assert_eq!(status, 200);
    assert!(body.contains("from zeta"));
    assert_eq!(kernel.registry().view("/shared").unwrap().package_id(), "zeta");
}
