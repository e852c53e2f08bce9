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

//! Executable units behind API, view and init entries
//!
//! Manifests name entries by path. Handlers are linked into the binary and
//! registered in a [`HandlerCatalog`] under the same resolved server path, so
//! dispatch maps a descriptor's entry to code without loading anything at
//! run time.

use crate::autoload::Autoloader;
use crate::descriptor::{ApiDescriptor, ViewDescriptor};
use crate::error::ConfigResult;
use crate::paths::PathResolver;
use crate::response::Request;
use crate::session::SessionGate;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Everything an API entry can see while it runs
pub struct ApiContext<'a> {
    pub api: &'a ApiDescriptor,
    pub request: &'a Request,
    pub session: &'a dyn SessionGate,
    pub autoloader: &'a Autoloader,
}

/// Everything a view entry can see; output written here becomes the body
pub struct ViewContext<'a> {
    pub view: &'a ViewDescriptor,
    /// Mount included, with any query string
    pub requested_path: &'a str,
    pub session: &'a dyn SessionGate,
    pub autoloader: &'a Autoloader,
    body: String,
}

impl<'a> ViewContext<'a> {
    pub fn new(view: &'a ViewDescriptor, requested_path: &'a str, session: &'a dyn SessionGate, autoloader: &'a Autoloader) -> Self {
        Self {
            view,
            requested_path,
            session,
            autoloader,
            body: String::new(),
        }
    }

    /// Append to the captured output
    pub fn write(&mut self, output: &str) {
        self.body.push_str(output);
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    pub fn into_body(self) -> String {
        self.body
    }
}

/// What an init entry can see. Registry-level init runs with no session.
pub struct InitContext<'a> {
    pub autoloader: &'a Autoloader,
    pub session: Option<&'a dyn SessionGate>,
}

/// An API entry. The returned value must have the response shape
/// (`status`, `message`, `data`); anything else is rejected by the dispatcher.
#[async_trait]
pub trait ApiHandler: Send + Sync {
    async fn call(&self, ctx: &ApiContext<'_>) -> anyhow::Result<Value>;
}

#[async_trait]
pub trait ViewHandler: Send + Sync {
    async fn render(&self, ctx: &mut ViewContext<'_>) -> anyhow::Result<()>;
}

#[async_trait]
pub trait InitHandler: Send + Sync {
    async fn init(&self, ctx: &InitContext<'_>) -> anyhow::Result<()>;
}

/// Adapts a plain function into an [`ApiHandler`]
pub struct ApiFn<F>(pub F);

pub fn api_fn<F>(f: F) -> ApiFn<F>
where
    F: Fn(&ApiContext<'_>) -> anyhow::Result<Value> + Send + Sync,
{
    ApiFn(f)
}

#[async_trait]
impl<F> ApiHandler for ApiFn<F>
where
    F: Fn(&ApiContext<'_>) -> anyhow::Result<Value> + Send + Sync,
{
    async fn call(&self, ctx: &ApiContext<'_>) -> anyhow::Result<Value> {
        (self.0)(ctx)
    }
}

/// Adapts a plain function into a [`ViewHandler`]
pub struct ViewFn<F>(pub F);

pub fn view_fn<F>(f: F) -> ViewFn<F>
where
    F: Fn(&mut ViewContext<'_>) -> anyhow::Result<()> + Send + Sync,
{
    ViewFn(f)
}

#[async_trait]
impl<F> ViewHandler for ViewFn<F>
where
    F: Fn(&mut ViewContext<'_>) -> anyhow::Result<()> + Send + Sync,
{
    async fn render(&self, ctx: &mut ViewContext<'_>) -> anyhow::Result<()> {
        (self.0)(ctx)
    }
}

/// Adapts a plain function into an [`InitHandler`]
pub struct InitFn<F>(pub F);

pub fn init_fn<F>(f: F) -> InitFn<F>
where
    F: Fn(&InitContext<'_>) -> anyhow::Result<()> + Send + Sync,
{
    InitFn(f)
}

#[async_trait]
impl<F> InitHandler for InitFn<F>
where
    F: Fn(&InitContext<'_>) -> anyhow::Result<()> + Send + Sync,
{
    async fn init(&self, ctx: &InitContext<'_>) -> anyhow::Result<()> {
        (self.0)(ctx)
    }
}

/// Handlers keyed by the server path their manifests refer to
pub struct HandlerCatalog {
    resolver: PathResolver,
    apis: HashMap<PathBuf, Arc<dyn ApiHandler>>,
    views: HashMap<PathBuf, Arc<dyn ViewHandler>>,
    inits: HashMap<PathBuf, Arc<dyn InitHandler>>,
}

impl HandlerCatalog {
    pub fn new(resolver: PathResolver) -> Self {
        Self {
            resolver,
            apis: HashMap::new(),
            views: HashMap::new(),
            inits: HashMap::new(),
        }
    }

    /// Register under `path` as `package_id`'s manifest would spell it
    pub fn register_api(&mut self, package_id: &str, path: &str, handler: impl ApiHandler + 'static) -> ConfigResult<&mut Self> {
        let key = self.resolver.format_server_path(package_id, path)?;
        self.apis.insert(key, Arc::new(handler));
        Ok(self)
    }

    pub fn register_view(&mut self, package_id: &str, path: &str, handler: impl ViewHandler + 'static) -> ConfigResult<&mut Self> {
        let key = self.resolver.format_server_path(package_id, path)?;
        self.views.insert(key, Arc::new(handler));
        Ok(self)
    }

    pub fn register_init(&mut self, package_id: &str, path: &str, handler: impl InitHandler + 'static) -> ConfigResult<&mut Self> {
        let key = self.resolver.format_server_path(package_id, path)?;
        self.inits.insert(key, Arc::new(handler));
        Ok(self)
    }

    pub fn api(&self, entry: &Path) -> Option<Arc<dyn ApiHandler>> {
        self.apis.get(entry).cloned()
    }

    pub fn view(&self, entry: &Path) -> Option<Arc<dyn ViewHandler>> {
        self.views.get(entry).cloned()
    }

    pub fn init(&self, entry: &Path) -> Option<Arc<dyn InitHandler>> {
        self.inits.get(entry).cloned()
    }

    pub fn resolver(&self) -> &PathResolver {
        &self.resolver
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_catalog_keys_match_manifest_resolution() {
        let resolver = PathResolver::new("/srv", "");
        let mut catalog = HandlerCatalog::new(resolver);
        catalog
            .register_api("blog", "apis/ping", api_fn(|_ctx| Ok(json!({"status": "OK", "message": "pong"}))))
            .unwrap()
            .register_init("blog", "/shared/boot", init_fn(|_ctx| Ok(())))
            .unwrap();

        assert!(catalog.api(Path::new("/srv/packages/blog/apis/ping")).is_some());
        assert!(catalog.init(Path::new("/srv/shared/boot")).is_some());
        assert!(catalog.view(Path::new("/srv/packages/blog/apis/ping")).is_none());
    }

    #[test]
    fn test_register_rejects_empty_path() {
        let mut catalog = HandlerCatalog::new(PathResolver::new("/srv", ""));
        assert!(catalog.register_view("blog", "", view_fn(|_ctx| Ok(()))).is_err());
    }
}
