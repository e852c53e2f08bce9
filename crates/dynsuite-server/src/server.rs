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

//! HTTP server implementation using Hyper

use crate::auth::SessionService;
use crate::config::Config;
use crate::error::{ServerError, ServerResult};
use crate::handlers;
use crate::middleware::LoggingLayer;
use crate::router::HttpRouter;
use dynsuite_core::{DirectorySource, Kernel, PackageSource};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::{Request, Response};
use hyper_util::rt::TokioIo;
use hyper_util::service::TowerToHyperService;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tracing::{error, info};

/// DynamicSuite application server
pub struct Server {
    bind_address: SocketAddr,
    router: Arc<HttpRouter>,
}

impl Server {
    /// Build the kernel from `config` and load the package registry
    pub async fn new(config: Config) -> ServerResult<Self> {
        let bind_address: SocketAddr = config.bind_address.parse().map_err(|source| ServerError::InvalidBindAddress {
            address: config.bind_address.clone(),
            source,
        })?;

        let resolver = config.resolver();
        let source: Arc<dyn PackageSource> = match &config.packages {
            Some(packages) => Arc::new(DirectorySource::with_packages(resolver.clone(), packages.clone())),
            None => Arc::new(DirectorySource::new(resolver.clone())),
        };
        let catalog = handlers::catalog(resolver)?;

        let kernel = Arc::new(Kernel::new(source, catalog, config.site_settings(), config.template(), config.cache_registry)?);
        let registry = kernel.reload().await;
        info!("Registry ready with {} packages", registry.packages().count());

        let sessions = Arc::new(SessionService::new(&config.jwt_secret, config.administrator_permission.clone()));
        let router = Arc::new(HttpRouter::new(kernel, sessions, config.max_body_size, config.request_timeout()));

        Ok(Self { bind_address, router })
    }

    /// Get the bind address
    pub fn bind_address(&self) -> SocketAddr {
        self.bind_address
    }

    /// Start the server
    pub async fn run(self) -> ServerResult<()> {
        let listener = TcpListener::bind(self.bind_address).await?;
        info!("DynamicSuite listening on http://{}", self.bind_address);
        self.serve(listener).await
    }

    /// Accept connections on an already bound listener
    pub async fn serve(self, listener: TcpListener) -> ServerResult<()> {
        loop {
            let (stream, remote_addr) = match listener.accept().await {
                Ok(conn) => conn,
                Err(e) => {
                    error!("Failed to accept connection: {}", e);
                    continue;
                }
            };

            let io = TokioIo::new(stream);
            let router = self.router.clone();

            tokio::task::spawn(async move {
                let service = ServiceBuilder::new().layer(LoggingLayer::new()).service(tower::service_fn(move |req: Request<Incoming>| {
                    let router = router.clone();
                    async move {
                        match router.route(req).await {
                            Ok(response) => Ok::<_, Infallible>(response),
                            Err(e) => Ok(Response::from(e)),
                        }
                    }
                }));

                if let Err(err) = http1::Builder::new().serve_connection(io, TowerToHyperService::new(service)).await {
                    error!("Error serving connection from {}: {}", remote_addr, err);
                }
            });
        }
    }
}
