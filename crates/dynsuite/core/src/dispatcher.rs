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

//! API dispatch: validate a call against its descriptor and run its entry

use crate::autoload::Autoloader;
use crate::error::{DispatchError, DispatchResult};
use crate::handler::{ApiContext, HandlerCatalog, InitContext};
use crate::registry::PackageRegistry;
use crate::response::{Request, Response};
use crate::session::{SessionGate, permits};
use futures::FutureExt;
use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, error, warn};

/// Runs API calls; never fails past its own boundary
#[derive(Clone)]
pub struct ApiDispatcher {
    catalog: Arc<HandlerCatalog>,
}

impl ApiDispatcher {
    pub fn new(catalog: Arc<HandlerCatalog>) -> Self {
        Self { catalog }
    }

    /// Execute `request`, answering with the empty response on any failure
    pub async fn call(&self, registry: &PackageRegistry, request: &Request, session: &dyn SessionGate) -> Response {
        match self.try_call(registry, request, session).await {
            Ok(response) => response,
            Err(e) => {
                match &e {
                    DispatchError::ApiNotFound { .. } => warn!("API not found: {}", e),
                    DispatchError::MissingPostKey { .. } | DispatchError::PermissionDenied(_) => warn!("API call rejected ({}): {}", e.kind(), e),
                    DispatchError::BadOutput { .. } => error!("Bad output: {}", e),
                    _ => error!("API call failed ({}): {}", e.kind(), e),
                }
                Response::empty()
            }
        }
    }

    async fn try_call(&self, registry: &PackageRegistry, request: &Request, session: &dyn SessionGate) -> DispatchResult<Response> {
        let api = registry.api(request.package_id(), request.api_id()).ok_or_else(|| DispatchError::ApiNotFound {
            package_id: request.package_id().to_string(),
            api_id: request.api_id().to_string(),
        })?;

        if let Some(key) = api.post().iter().find(|key| !request.data().contains_key(key.as_str())) {
            return Err(DispatchError::MissingPostKey {
                package_id: api.package_id().to_string(),
                api_id: api.api_id().to_string(),
                key: key.clone(),
            });
        }

        if !permits(session, api.is_public(), api.permissions()) {
            return Err(DispatchError::PermissionDenied(api.key()));
        }

        // Resolve every handler before running any of them.
        let entry = self.catalog.api(api.entry()).ok_or_else(|| DispatchError::EntryNotFound(api.entry().display().to_string()))?;
        let inits = api
            .init()
            .iter()
            .map(|path| self.catalog.init(path).map(|h| (path, h)).ok_or_else(|| DispatchError::EntryNotFound(path.display().to_string())))
            .collect::<DispatchResult<Vec<_>>>()?;

        let autoloader = Autoloader::scoped(api.autoload(), registry.autoload());
        let init_ctx = InitContext {
            autoloader: &autoloader,
            session: Some(session),
        };
        for (path, init) in inits {
            guarded(path, init.init(&init_ctx)).await?;
        }

        let ctx = ApiContext {
            api,
            request,
            session,
            autoloader: &autoloader,
        };
        debug!("Executing API {}", api.key());
        let output = guarded(api.entry(), entry.call(&ctx)).await?;

        Response::from_value(output).map_err(|e| DispatchError::BadOutput {
            entry: api.entry().display().to_string(),
            message: e.to_string(),
        })
    }
}

/// Await a handler future, turning its error or panic into an execution error
pub(crate) async fn guarded<T, F>(entry: &Path, fut: F) -> DispatchResult<T>
where
    F: Future<Output = anyhow::Result<T>>,
{
    match AssertUnwindSafe(fut).catch_unwind().await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => Err(DispatchError::Execution {
            entry: entry.display().to_string(),
            message: format!("{:#}", e),
        }),
        Err(panic) => Err(DispatchError::Execution {
            entry: entry.display().to_string(),
            message: format!("panicked: {}", panic_message(panic.as_ref())),
        }),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s
    } else {
        "unknown panic"
    }
}
